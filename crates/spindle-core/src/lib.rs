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

//! # Spindle Core
//!
//! Backend-agnostic heart of the rendering harness: command queues with
//! fence-based synchronization and submission-unit recycling, and the
//! back-buffer lifecycle they coordinate with.
//!
//! Nothing in this crate touches a graphics API. Concrete backends implement
//! [`gpu::SubmissionBackend`] and [`present::PresentBackend`]; the bundled
//! [`gpu::SoftwareGpu`] drives the same logic headless.

#![warn(missing_docs)]

pub mod error;
pub mod gpu;
pub mod present;

pub use error::{QueueError, SurfaceError};
pub use gpu::{AllocatorId, CommandQueue, FenceValue, ListId, QueueKind, SubmissionBackend};
pub use present::{PresentBackend, PresentationSurface};
