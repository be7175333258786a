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

//! The application root: one window's GPU state.
//!
//! The harness owns the device context, the three command queues, and the
//! presentation surface. Frame drivers receive it by mutable reference each
//! frame; they never own any of it.

use anyhow::Result;
use spindle_core::error::{QueueError, SurfaceError};
use spindle_core::gpu::{CommandQueue, QueueKind};
use spindle_core::present::PresentationSurface;
use std::sync::Arc;
use winit::window::{Fullscreen, Window};

use crate::graphics::wgpu::{GpuContext, WgpuSubmission, WgpuSurface};

/// GPU state for one window: device context, the graphics/copy/compute
/// queues, and the presentation surface.
pub struct GpuHarness {
    context: GpuContext,
    window: Arc<Window>,
    graphics: CommandQueue<WgpuSubmission>,
    copy: CommandQueue<WgpuSubmission>,
    compute: CommandQueue<WgpuSubmission>,
    surface: PresentationSurface<WgpuSurface>,
}

impl GpuHarness {
    /// Builds the harness for `window`, creating the swap chain and one
    /// command queue per kind.
    pub fn new(context: GpuContext, window: Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();
        let wgpu_surface =
            WgpuSurface::new(&context, window.clone(), size.width, size.height, vsync)?;
        let surface = PresentationSurface::new(wgpu_surface, size.width, size.height, vsync);

        let graphics = CommandQueue::new(
            QueueKind::Graphics,
            context.create_submission(QueueKind::Graphics),
        );
        let copy = CommandQueue::new(QueueKind::Copy, context.create_submission(QueueKind::Copy));
        let compute = CommandQueue::new(
            QueueKind::Compute,
            context.create_submission(QueueKind::Compute),
        );

        Ok(Self {
            context,
            window,
            graphics,
            copy,
            compute,
            surface,
        })
    }

    /// The device context.
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// The logical device, for resource creation.
    pub fn device(&self) -> &wgpu::Device {
        self.context.device()
    }

    /// The window this harness renders into.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The command queue of the given kind.
    pub fn queue_mut(&mut self, kind: QueueKind) -> &mut CommandQueue<WgpuSubmission> {
        match kind {
            QueueKind::Graphics => &mut self.graphics,
            QueueKind::Copy => &mut self.copy,
            QueueKind::Compute => &mut self.compute,
        }
    }

    /// The presentation surface.
    pub fn surface(&self) -> &PresentationSurface<WgpuSurface> {
        &self.surface
    }

    /// Mutable access to the presentation surface.
    pub fn surface_mut(&mut self) -> &mut PresentationSurface<WgpuSurface> {
        &mut self.surface
    }

    /// The graphics queue and the surface together, for the render path
    /// that needs both at once.
    pub fn frame_parts(
        &mut self,
    ) -> (
        &mut CommandQueue<WgpuSubmission>,
        &mut PresentationSurface<WgpuSurface>,
    ) {
        (&mut self.graphics, &mut self.surface)
    }

    /// Drains every queue. Called at shutdown and before destroying
    /// GPU-resident resources that in-flight work may reference.
    pub fn flush_all(&mut self) -> Result<(), QueueError> {
        self.compute.flush()?;
        self.copy.flush()?;
        self.graphics.flush()
    }

    /// Resizes the surface, flushing all queues first. Returns `false`
    /// when the size did not actually change.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, SurfaceError> {
        let Self {
            surface,
            graphics,
            copy,
            compute,
            ..
        } = self;
        surface.resize(width, height, &mut [graphics, copy, compute])
    }

    /// Flips vertical sync; takes effect at the next present.
    pub fn toggle_vsync(&mut self) {
        self.surface.toggle_vsync();
    }

    /// Switches between borderless fullscreen and windowed mode. The
    /// windowing backend restores the previous windowed geometry on the way
    /// back.
    pub fn toggle_fullscreen(&self) {
        let next = match self.window.fullscreen() {
            Some(_) => None,
            None => Some(Fullscreen::Borderless(None)),
        };
        log::info!(
            "Switching to {}",
            if next.is_some() { "fullscreen" } else { "windowed mode" }
        );
        self.window.set_fullscreen(next);
    }

    /// Whether the window is currently fullscreen.
    pub fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }
}

impl Drop for GpuHarness {
    fn drop(&mut self) {
        // Nothing GPU-resident may be destroyed while still referenced by
        // in-flight work.
        if let Err(e) = self.flush_all() {
            log::error!("Failed to flush queues during shutdown: {e}");
        }
    }
}
