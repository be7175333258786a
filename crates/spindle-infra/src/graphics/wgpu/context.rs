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

//! Holds the core WGPU state objects: instance, adapter, device, and the
//! underlying hardware queue all submission backends multiplex onto.

use anyhow::{anyhow, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use spindle_core::gpu::QueueKind;
use std::sync::Arc;

use super::submission::WgpuSubmission;

/// Connection to the graphics API, independent of any window surface.
#[derive(Debug)]
pub struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    adapter_backend: wgpu::Backend,
}

impl GpuContext {
    /// Initializes the instance, adapter, and logical device, blocking on
    /// wgpu's async setup.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::initialize())
    }

    async fn initialize() -> Result<Self> {
        log::info!("Initializing GPU context...");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("Failed to find a suitable graphics adapter: {e}"))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Spindle Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {e}"))?;
        log::info!("Logical device and hardware queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU uncaptured error: {e:?}");
        }));

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
        })
    }

    /// Creates a rendering surface for a window.
    ///
    /// The window is held by `Arc` so the surface can outlive the borrow
    /// that created it.
    pub fn create_surface<W>(&self, window: Arc<W>) -> Result<wgpu::Surface<'static>>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        self.instance
            .create_surface(window)
            .map_err(|e| anyhow!("Failed to create window surface: {e}"))
    }

    /// Creates a submission backend of the given kind.
    ///
    /// wgpu exposes a single hardware queue, so the graphics, copy, and
    /// compute backends multiplex onto it while keeping independent fence
    /// counters, preserving the three-queue submission model.
    pub fn create_submission(&self, kind: QueueKind) -> WgpuSubmission {
        WgpuSubmission::new(self.device.clone(), self.queue.clone(), kind)
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The hardware queue, for direct uploads such as uniform writes.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The adapter the device was created from.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Human-readable adapter name.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// The backend API the adapter runs on.
    pub fn adapter_backend(&self) -> wgpu::Backend {
        self.adapter_backend
    }
}
