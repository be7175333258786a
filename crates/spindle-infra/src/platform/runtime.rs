// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The winit-driven runtime: window registry, event routing, and the
//! per-frame driver contract.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::graphics::wgpu::GpuContext;
use crate::harness::GpuHarness;
use crate::platform::input::{translate_winit_input, InputEvent};

/// Initial window and swap-chain settings.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Window title.
    pub title: String,
    /// Initial inner width in logical pixels.
    pub width: u32,
    /// Initial inner height in logical pixels.
    pub height: u32,
    /// Whether presents start synchronized to the display.
    pub vsync: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            title: "Spindle".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// What the driver wants the runtime to do after an input event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameControl {
    /// Keep running.
    Continue,
    /// Exit the event loop.
    Exit,
}

/// Per-frame behavior supplied by the demo.
///
/// Each frame the runtime calls `update` then `render`. A conforming
/// `render` implementation follows the submission contract: acquire a list
/// from the graphics queue, record into it, execute it for a fence value,
/// present that value, then wait on the fence recorded for the buffer index
/// that just became current. That final wait is what bounds the number of
/// frames in flight to the buffer count.
pub trait FrameDriver: Sized + 'static {
    /// Creates the driver and its GPU resources.
    fn create(gpu: &mut GpuHarness) -> Result<Self>;

    /// Advances simulation state by `dt`.
    fn update(&mut self, dt: Duration);

    /// Records, executes, and presents one frame.
    fn render(&mut self, gpu: &mut GpuHarness) -> Result<()>;

    /// Reacts to an input event.
    fn handle_input(&mut self, _gpu: &mut GpuHarness, _event: &InputEvent) -> FrameControl {
        FrameControl::Continue
    }

    /// Called after the surface was actually resized.
    fn resized(&mut self, _gpu: &mut GpuHarness, _width: u32, _height: u32) {}
}

struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        dt
    }
}

struct WindowEntry<D: FrameDriver> {
    gpu: GpuHarness,
    driver: D,
    timer: FrameTimer,
    alt_held: bool,
}

/// The event-loop state: a registry of live windows keyed by their platform
/// id, owned here rather than in any global table.
pub struct Runtime<D: FrameDriver> {
    config: HarnessConfig,
    windows: HashMap<WindowId, WindowEntry<D>>,
}

impl<D: FrameDriver> Runtime<D> {
    /// Opens a window and runs the driver until the loop exits.
    pub fn run(config: HarnessConfig) -> Result<()> {
        log::info!("Starting runtime...");
        let event_loop = EventLoop::new()?;
        let mut runtime = Runtime::<D> {
            config,
            windows: HashMap::new(),
        };
        event_loop.run_app(&mut runtime)?;
        Ok(())
    }
}

impl<D: FrameDriver> ApplicationHandler for Runtime<D> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        log::info!(
            "Creating window '{}' at {}x{}",
            self.config.title,
            self.config.width,
            self.config.height
        );
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_visible(true);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .expect("Failed to create window"),
        );
        let id = window.id();

        let context = GpuContext::new().expect("Failed to initialize the GPU context");
        let mut gpu = GpuHarness::new(context, window, self.config.vsync)
            .expect("Failed to build the GPU harness");
        let driver = D::create(&mut gpu).expect("Failed to create the frame driver");

        self.windows.insert(
            id,
            WindowEntry {
                gpu,
                driver,
                timer: FrameTimer::new(),
                alt_held: false,
            },
        );
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            log::info!("Close requested; destroying window");
            self.windows.remove(&id);
            if self.windows.is_empty() {
                event_loop.exit();
            }
            return;
        }

        let Some(entry) = self.windows.get_mut(&id) else {
            return;
        };
        let WindowEntry {
            gpu,
            driver,
            timer,
            alt_held,
        } = entry;

        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                *alt_held = modifiers.state().alt_key();
            }
            WindowEvent::Resized(size) => match gpu.resize(size.width, size.height) {
                Ok(true) => {
                    let (width, height) = gpu.surface().size();
                    driver.resized(gpu, width, height);
                }
                Ok(false) => {}
                Err(e) => {
                    log::error!("Resize failed: {e}");
                    event_loop.exit();
                }
            },
            WindowEvent::RedrawRequested => {
                let dt = timer.tick();
                driver.update(dt);
                if let Err(e) = driver.render(gpu) {
                    log::error!("Rendering failed: {e}");
                    event_loop.exit();
                }
            }
            _ => {
                if let Some(input) = translate_winit_input(&event, *alt_held) {
                    if driver.handle_input(gpu, &input) == FrameControl::Exit {
                        event_loop.exit();
                    }
                }
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        for entry in self.windows.values() {
            entry.gpu.window().request_redraw();
        }
    }
}
