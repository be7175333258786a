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

//! The contract between the presentation surface and the platform swap chain.

use crate::error::SurfaceError;

/// Platform operations the presentation surface needs from the swap chain.
///
/// Under flip-model presentation the platform, not the application, decides
/// which image becomes current after a present or a resize, so the surface
/// always re-reads [`current_index`](PresentBackend::current_index) instead
/// of pre-computing it.
pub trait PresentBackend {
    /// Number of presentable images in the rotating set.
    fn buffer_count(&self) -> u32;

    /// The index the platform currently designates as the back buffer.
    fn current_index(&self) -> u32;

    /// Displays the current back buffer.
    ///
    /// `vsync` selects the sync interval; `allow_tearing` is only ever true
    /// when vsync is off and the platform reported tearing support.
    fn present(&mut self, vsync: bool, allow_tearing: bool) -> Result<(), SurfaceError>;

    /// Releases every presentable image and its view.
    ///
    /// Called only after all queues referencing the images have been
    /// flushed; destroying images referenced by in-flight commands is
    /// undefined.
    fn release_buffers(&mut self) -> Result<(), SurfaceError>;

    /// Resizes the swap mechanism in place, keeping buffer count and format.
    ///
    /// Views are recreated against the newly sized images before they are
    /// next rendered to.
    fn resize_buffers(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;

    /// Whether the platform can present without vertical sync and without
    /// blocking (tearing-allowed presentation).
    fn supports_tearing(&self) -> bool;
}
