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

//! # Spindle Infra
//!
//! Concrete implementations of the spindle core contracts: WGPU submission
//! and presentation backends, the winit window runtime, and the
//! [`GpuHarness`] application root tying them together.

pub mod graphics;
pub mod harness;
pub mod platform;

pub use graphics::wgpu::{GpuContext, WgpuSubmission, WgpuSurface, BUFFER_COUNT};
pub use harness::GpuHarness;
pub use platform::input::{InputEvent, MouseButton};
pub use platform::runtime::{FrameControl, FrameDriver, HarnessConfig, Runtime};
