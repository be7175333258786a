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

//! The WGPU-based implementation of the `PresentBackend` trait.
//!
//! wgpu keeps the swap-chain images internal and hands out one
//! `SurfaceTexture` at a time, cycling images in submission order. The
//! back-buffer index reported here mirrors that rotation: it advances
//! modulo [`BUFFER_COUNT`] on present and restarts at zero when the chain
//! is rebuilt, which is when the platform reassigns images. Sync-interval
//! changes (vsync on/off) map to the surface's present mode and are applied
//! at the next frame acquisition, since a configured chain cannot change
//! mode while a texture is outstanding.

use anyhow::{anyhow, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use spindle_core::error::SurfaceError;
use spindle_core::present::PresentBackend;
use std::sync::Arc;

use super::context::GpuContext;

/// Number of presentable images the harness rotates over.
pub const BUFFER_COUNT: u32 = 3;

#[derive(Debug)]
struct AcquiredFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// A window's swap chain plus the per-frame texture it currently holds.
#[derive(Debug)]
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    acquired: Option<AcquiredFrame>,
    index: u32,
    tearing_supported: bool,
    available_modes: Vec<wgpu::PresentMode>,
    desired_present_mode: wgpu::PresentMode,
}

impl WgpuSurface {
    /// Creates and configures a swap chain for `window`.
    pub fn new<W>(
        context: &GpuContext,
        window: Arc<W>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let surface = context.create_surface(window)?;
        let caps = surface.get_capabilities(context.adapter());
        if caps.formats.is_empty() {
            return Err(anyhow!("Surface reports no supported formats"));
        }

        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let tearing_supported = caps
            .present_modes
            .contains(&wgpu::PresentMode::Immediate);
        let present_mode = present_mode_for(vsync, tearing_supported, &caps.present_modes);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            // One less than the image count: the CPU may run ahead by the
            // frames whose buffers it is not currently presenting.
            desired_maximum_frame_latency: BUFFER_COUNT - 1,
        };
        surface.configure(context.device(), &config);

        log::info!(
            "Swap chain configured: {}x{}, format {:?}, present mode {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self {
            surface,
            device: context.device().clone(),
            config,
            acquired: None,
            index: 0,
            tearing_supported,
            available_modes: caps.present_modes,
            desired_present_mode: present_mode,
        })
    }

    /// The format render pipelines must target.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current swap-chain dimensions.
    pub fn extent(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// The render-target view of the current back buffer, acquiring it from
    /// the platform if this frame has not yet.
    ///
    /// A lost or outdated chain is reconfigured once before giving up.
    pub fn acquire(&mut self) -> Result<&wgpu::TextureView, SurfaceError> {
        if self.acquired.is_none() {
            self.apply_pending_present_mode();

            let texture = match self.surface.get_current_texture() {
                Ok(texture) => texture,
                Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                    log::warn!("Swap chain lost or outdated; reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                    self.surface.get_current_texture().map_err(|e| {
                        SurfaceError::AcquisitionFailed(format!(
                            "still failing after reconfigure: {e:?}"
                        ))
                    })?
                }
                Err(e) => {
                    return Err(SurfaceError::AcquisitionFailed(format!("{e:?}")));
                }
            };

            let view = texture.texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Back Buffer View"),
                ..Default::default()
            });
            self.acquired = Some(AcquiredFrame { texture, view });
        }

        match &self.acquired {
            Some(frame) => Ok(&frame.view),
            None => Err(SurfaceError::AcquisitionFailed(
                "no back buffer acquired".to_string(),
            )),
        }
    }

    fn apply_pending_present_mode(&mut self) {
        if self.desired_present_mode != self.config.present_mode {
            self.config.present_mode = self.desired_present_mode;
            self.surface.configure(&self.device, &self.config);
            log::info!("Present mode switched to {:?}", self.config.present_mode);
        }
    }
}

fn present_mode_for(
    vsync: bool,
    tearing_supported: bool,
    available: &[wgpu::PresentMode],
) -> wgpu::PresentMode {
    if vsync {
        // Fifo is guaranteed to be supported.
        wgpu::PresentMode::Fifo
    } else if tearing_supported {
        wgpu::PresentMode::Immediate
    } else if available.contains(&wgpu::PresentMode::Mailbox) {
        wgpu::PresentMode::Mailbox
    } else {
        wgpu::PresentMode::Fifo
    }
}

impl PresentBackend for WgpuSurface {
    fn buffer_count(&self) -> u32 {
        BUFFER_COUNT
    }

    fn current_index(&self) -> u32 {
        self.index
    }

    fn present(&mut self, vsync: bool, allow_tearing: bool) -> Result<(), SurfaceError> {
        // Takes effect at the next acquisition; the chain cannot change
        // mode while a texture is outstanding.
        self.desired_present_mode = present_mode_for(vsync, allow_tearing, &self.available_modes);

        match self.acquired.take() {
            Some(frame) => {
                drop(frame.view);
                frame.texture.present();
                self.index = (self.index + 1) % BUFFER_COUNT;
                Ok(())
            }
            None => Err(SurfaceError::PresentFailed(
                "no back buffer was acquired this frame".to_string(),
            )),
        }
    }

    fn release_buffers(&mut self) -> Result<(), SurfaceError> {
        // Dropping the outstanding texture returns every image to the chain.
        self.acquired = None;
        Ok(())
    }

    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        // Same buffer count, same format; only the extent changes.
        self.surface.configure(&self.device, &self.config);
        // A rebuilt chain starts handing out images from the top.
        self.index = 0;
        Ok(())
    }

    fn supports_tearing(&self) -> bool {
        self.tearing_supported
    }
}
