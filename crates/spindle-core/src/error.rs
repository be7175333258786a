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

//! Defines the hierarchy of error types for the submission and presentation core.
//!
//! Every variant here represents an unrecoverable platform or device condition,
//! or a contract violation by the caller. There is no transient class: submitted
//! GPU work either completes or the process is in a state it cannot continue
//! past, so none of these errors are retried.

use crate::gpu::{AllocatorId, ListId};
use std::fmt;

/// An error raised by a command queue or its submission backend.
#[derive(Debug)]
pub enum QueueError {
    /// The backend failed to create a command allocator.
    AllocatorCreation(String),
    /// The backend failed to create a command list.
    ListCreation(String),
    /// The backend rejected a close-and-submit of a recorded list.
    SubmissionFailed(String),
    /// The backend rejected a fence signal on the hardware queue.
    SignalFailed(String),
    /// A blocking wait on a fence value failed.
    WaitFailed(String),
    /// The graphics device was lost (driver crash, device removed).
    DeviceLost(String),
    /// An allocator handle was used that this backend never issued.
    UnknownAllocator(AllocatorId),
    /// A list handle was used that this backend never issued, or that is not
    /// currently open for recording.
    UnknownList(ListId),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::AllocatorCreation(msg) => {
                write!(f, "Failed to create command allocator: {msg}")
            }
            QueueError::ListCreation(msg) => {
                write!(f, "Failed to create command list: {msg}")
            }
            QueueError::SubmissionFailed(msg) => {
                write!(f, "Command list submission failed: {msg}")
            }
            QueueError::SignalFailed(msg) => {
                write!(f, "Fence signal failed: {msg}")
            }
            QueueError::WaitFailed(msg) => {
                write!(f, "Fence wait failed: {msg}")
            }
            QueueError::DeviceLost(msg) => {
                write!(f, "The graphics device was lost: {msg}")
            }
            QueueError::UnknownAllocator(id) => {
                write!(f, "Unknown command allocator: {id:?}")
            }
            QueueError::UnknownList(id) => {
                write!(f, "Unknown or closed command list: {id:?}")
            }
        }
    }
}

impl std::error::Error for QueueError {}

/// An error raised by the presentation surface or its platform backend.
#[derive(Debug)]
pub enum SurfaceError {
    /// The platform could not hand out the current back buffer.
    AcquisitionFailed(String),
    /// The platform rejected a present of the current back buffer.
    PresentFailed(String),
    /// The swap mechanism could not be resized in place.
    ResizeFailed(String),
    /// A command queue operation failed while the surface was coordinating
    /// with it (e.g. the mandatory flush before a resize).
    Queue(QueueError),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::AcquisitionFailed(msg) => {
                write!(f, "Failed to acquire back buffer: {msg}")
            }
            SurfaceError::PresentFailed(msg) => {
                write!(f, "Present failed: {msg}")
            }
            SurfaceError::ResizeFailed(msg) => {
                write!(f, "Swap chain resize failed: {msg}")
            }
            SurfaceError::Queue(err) => {
                write!(f, "Queue operation failed during a surface operation: {err}")
            }
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurfaceError::Queue(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueueError> for SurfaceError {
    fn from(err: QueueError) -> Self {
        SurfaceError::Queue(err)
    }
}
