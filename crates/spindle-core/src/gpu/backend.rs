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

//! The contract between the submission core and a concrete GPU backend.

use crate::error::QueueError;

/// A monotonically increasing per-queue counter value.
///
/// A fence value is assigned exactly once per signal and is "complete" once
/// the backend's completion counter reports a value greater than or equal to
/// it. Values are never reused and never decrease.
pub type FenceValue = u64;

/// An opaque handle to a command allocator issued by a backend.
///
/// An allocator backs the recording memory of one or more command lists and
/// must not be reset while any work recorded from it is still in flight.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AllocatorId(pub u64);

/// An opaque handle to a command list issued by a backend.
///
/// A list is bound to exactly one allocator at a time and, unlike the
/// allocator, has no GPU-side lifetime of its own once submitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListId(pub u64);

/// The hardware queue a [`CommandQueue`](crate::gpu::CommandQueue) submits to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Full graphics pipeline work (draws, barriers, clears).
    Graphics,
    /// Transfer-only work (buffer and texture copies).
    Copy,
    /// Compute dispatches.
    Compute,
}

impl QueueKind {
    /// A short human-readable name, used in log messages and resource labels.
    pub fn label(&self) -> &'static str {
        match self {
            QueueKind::Graphics => "graphics",
            QueueKind::Copy => "copy",
            QueueKind::Compute => "compute",
        }
    }
}

/// Platform operations a command queue needs from the graphics API.
///
/// Implementations wrap one hardware queue plus its completion counter. All
/// fallible operations report unrecoverable conditions only; the core never
/// retries them.
///
/// The completion counter must be monotonic: values observed complete stay
/// complete, and completion is observed in signal order. That ordering is
/// what licenses the queue's head-of-line recycling check.
pub trait SubmissionBackend: Send + Sync {
    /// Creates a new command allocator.
    fn create_allocator(&self) -> Result<AllocatorId, QueueError>;

    /// Resets an allocator so its memory can back new recordings.
    ///
    /// The caller guarantees no work recorded from this allocator is still
    /// in flight.
    fn reset_allocator(&self, allocator: AllocatorId) -> Result<(), QueueError>;

    /// Creates a new command list recording into `allocator`.
    fn create_list(&self, allocator: AllocatorId) -> Result<ListId, QueueError>;

    /// Re-opens an idle list for recording, bound to `allocator`.
    fn reset_list(&self, list: ListId, allocator: AllocatorId) -> Result<(), QueueError>;

    /// Closes the recording of `list` and submits it to the hardware queue.
    fn submit(&self, list: ListId) -> Result<(), QueueError>;

    /// Issues `value` to the hardware queue's fence.
    ///
    /// The completion counter reaches `value` once all work submitted before
    /// this call has finished executing.
    fn signal(&self, value: FenceValue) -> Result<(), QueueError>;

    /// Non-blocking read of the completion counter.
    fn completed_value(&self) -> FenceValue;

    /// Blocks the calling thread until the completion counter reaches
    /// `value`.
    ///
    /// Must use an OS-level wait, not a spin loop, and must return promptly
    /// when the value is already complete. The wait is unbounded; a hung
    /// device hangs the caller.
    fn wait(&self, value: FenceValue) -> Result<(), QueueError>;
}
