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

//! Command submission: queues, fences, and allocator/list recycling.
//!
//! The unit of GPU/CPU synchronization here is the fence value: a
//! monotonically increasing 64-bit counter per queue. Work is recorded into
//! a (allocator, list) submission unit, executed, and stamped with a fresh
//! fence value; the allocator returns to its queue's pool only once that
//! value is observed complete, which is what guarantees the CPU never resets
//! memory the GPU is still reading.

mod backend;
mod queue;
pub mod software;

pub use backend::{AllocatorId, FenceValue, ListId, QueueKind, SubmissionBackend};
pub use queue::CommandQueue;
pub use software::SoftwareGpu;
