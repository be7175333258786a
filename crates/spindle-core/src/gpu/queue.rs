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

//! The command queue: fence bookkeeping and submission-unit recycling.

use std::collections::{HashMap, VecDeque};

use crate::error::QueueError;
use crate::gpu::backend::{AllocatorId, FenceValue, ListId, QueueKind, SubmissionBackend};

/// An allocator whose most recent work is still in flight, keyed by the
/// fence value at which it becomes safe to reuse.
#[derive(Debug)]
struct PendingAllocator {
    fence_value: FenceValue,
    allocator: AllocatorId,
}

/// Serializes CPU-recorded GPU work onto one hardware queue and tracks its
/// completion, recycling command allocators and lists as fences retire.
///
/// Fence values returned by [`signal`](CommandQueue::signal) and
/// [`execute`](CommandQueue::execute) are strictly increasing. Entries enter
/// the pending-allocator FIFO in execution order, so only its front entry
/// ever needs to be inspected for reuse: if the oldest fence has not
/// completed, no younger one has either.
///
/// The pools are owned exclusively by this queue and are intended to be
/// driven from a single submitting thread; there is no internal locking.
pub struct CommandQueue<B: SubmissionBackend> {
    backend: B,
    kind: QueueKind,
    last_signaled: FenceValue,
    pending_allocators: VecDeque<PendingAllocator>,
    idle_lists: VecDeque<ListId>,
    // Which allocator each list is currently recording into. Set when a list
    // is created or reset, read back at execute time so callers never pass
    // the allocator separately.
    bound_allocators: HashMap<ListId, AllocatorId>,
}

impl<B: SubmissionBackend> CommandQueue<B> {
    /// Creates a queue of the given kind over a backend.
    pub fn new(kind: QueueKind, backend: B) -> Self {
        Self {
            backend,
            kind,
            last_signaled: 0,
            pending_allocators: VecDeque::new(),
            idle_lists: VecDeque::new(),
            bound_allocators: HashMap::new(),
        }
    }

    /// The hardware queue kind this queue submits to.
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// The backend this queue submits through.
    ///
    /// Backends expose their own recording entry points; the queue only
    /// manages lifecycle and fencing.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The most recently signaled fence value.
    pub fn last_signaled_value(&self) -> FenceValue {
        self.last_signaled
    }

    /// The backend's current completion counter.
    pub fn last_completed_value(&self) -> FenceValue {
        self.backend.completed_value()
    }

    /// Advances the fence counter, issues it to the hardware queue, and
    /// returns the new value. Never blocks.
    pub fn signal(&mut self) -> Result<FenceValue, QueueError> {
        self.last_signaled += 1;
        self.backend.signal(self.last_signaled)?;
        Ok(self.last_signaled)
    }

    /// Non-blocking check whether `value` has completed on the GPU.
    pub fn is_fence_complete(&self, value: FenceValue) -> bool {
        self.backend.completed_value() >= value
    }

    /// Blocks until `value` has completed. Returns immediately if it
    /// already has.
    pub fn wait_for_fence_value(&self, value: FenceValue) -> Result<(), QueueError> {
        if !self.is_fence_complete(value) {
            self.backend.wait(value)?;
        }
        Ok(())
    }

    /// Signals a fresh fence value and waits for it, draining everything
    /// queued so far. Used at shutdown and before destructive resource
    /// operations such as a swap-chain resize.
    pub fn flush(&mut self) -> Result<(), QueueError> {
        let value = self.signal()?;
        self.wait_for_fence_value(value)
    }

    /// Returns a list that is open for recording, backed by an allocator no
    /// in-flight work references.
    ///
    /// The front of the pending FIFO is recycled when its fence value has
    /// completed; otherwise a new allocator is created, which bounds
    /// allocator creation to the number of frames genuinely in flight. An
    /// idle list is re-bound to the chosen allocator when one exists.
    pub fn acquire_list(&mut self) -> Result<ListId, QueueError> {
        let recycled = match self.pending_allocators.front() {
            Some(front) if self.is_fence_complete(front.fence_value) => {
                self.pending_allocators.pop_front()
            }
            _ => None,
        };

        let allocator = match recycled {
            Some(entry) => {
                self.backend.reset_allocator(entry.allocator)?;
                entry.allocator
            }
            None => {
                let allocator = self.backend.create_allocator()?;
                log::debug!(
                    "{} queue: created allocator {:?} ({} now pending)",
                    self.kind.label(),
                    allocator,
                    self.pending_allocators.len()
                );
                allocator
            }
        };

        let list = match self.idle_lists.pop_front() {
            Some(list) => {
                self.backend.reset_list(list, allocator)?;
                list
            }
            None => {
                let list = self.backend.create_list(allocator)?;
                log::debug!("{} queue: created list {:?}", self.kind.label(), list);
                list
            }
        };

        self.bound_allocators.insert(list, allocator);
        Ok(list)
    }

    /// Closes `list`, submits it, and signals a new fence value, which is
    /// returned so the caller can later wait for this submission.
    ///
    /// The allocator bound to the list goes onto the pending FIFO under the
    /// returned fence value; the list itself is idle again immediately.
    pub fn execute(&mut self, list: ListId) -> Result<FenceValue, QueueError> {
        let allocator = self
            .bound_allocators
            .get(&list)
            .copied()
            .ok_or(QueueError::UnknownList(list))?;

        self.backend.submit(list)?;
        let fence_value = self.signal()?;

        self.pending_allocators.push_back(PendingAllocator {
            fence_value,
            allocator,
        });
        self.idle_lists.push_back(list);

        Ok(fence_value)
    }

    /// Number of allocators currently awaiting fence completion.
    pub fn pending_allocators(&self) -> usize {
        self.pending_allocators.len()
    }

    /// Number of lists currently idle and ready to be re-bound.
    pub fn idle_lists(&self) -> usize {
        self.idle_lists.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::software::SoftwareGpu;

    fn queue() -> CommandQueue<SoftwareGpu> {
        CommandQueue::new(QueueKind::Graphics, SoftwareGpu::new())
    }

    #[test]
    fn fence_values_strictly_increase() {
        let mut queue = queue();
        let mut values = Vec::new();

        values.push(queue.signal().unwrap());
        let list = queue.acquire_list().unwrap();
        values.push(queue.execute(list).unwrap());
        values.push(queue.signal().unwrap());
        let list = queue.acquire_list().unwrap();
        values.push(queue.execute(list).unwrap());

        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "fence values must strictly increase");
        }
        assert_eq!(queue.last_signaled_value(), *values.last().unwrap());
    }

    #[test]
    fn no_reuse_while_fences_incomplete() {
        let mut queue = queue();

        for _ in 0..3 {
            let list = queue.acquire_list().unwrap();
            queue.execute(list).unwrap();
        }

        // Nothing has completed, so every acquire had to create its own
        // allocator. The list has no GPU-side lifetime and is recycled
        // every frame.
        assert_eq!(queue.backend().created_allocators(), 3);
        assert_eq!(queue.backend().created_lists(), 1);
        assert_eq!(queue.backend().submissions(), 3);
        assert_eq!(queue.pending_allocators(), 3);
    }

    #[test]
    fn front_fence_completion_enables_reuse() {
        let mut queue = queue();

        let list = queue.acquire_list().unwrap();
        let fence_one = queue.execute(list).unwrap();
        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();

        queue.backend().complete_up_to(fence_one);

        // The front entry retires, so this acquire recycles instead of
        // creating a third allocator.
        queue.acquire_list().unwrap();
        assert_eq!(queue.backend().created_allocators(), 2);
        assert_eq!(queue.backend().resets_of(AllocatorId(0)), Some(1));
        assert_eq!(queue.pending_allocators(), 1);
    }

    #[test]
    fn recycling_is_strictly_front_gated() {
        let mut queue = queue();

        let list = queue.acquire_list().unwrap();
        let fence_one = queue.execute(list).unwrap();
        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();
        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();

        queue.backend().complete_up_to(fence_one);

        // Only the front entry is eligible: the first acquire pops it, the
        // second finds fence 2 incomplete and must create a fourth
        // allocator even though the pool is non-empty.
        queue.acquire_list().unwrap();
        queue.acquire_list().unwrap();
        assert_eq!(queue.backend().created_allocators(), 4);
        assert_eq!(queue.pending_allocators(), 2);
    }

    #[test]
    fn recycled_list_is_rebound_to_fresh_allocator() {
        let mut queue = queue();

        let list = queue.acquire_list().unwrap();
        let first_allocator = queue.backend().allocator_of(list).unwrap();
        queue.execute(list).unwrap();

        // The pool front is incomplete, so the same list must come back
        // bound to a brand-new allocator, never its stale one.
        let reused = queue.acquire_list().unwrap();
        assert_eq!(reused, list);
        let second_allocator = queue.backend().allocator_of(reused).unwrap();
        assert_ne!(first_allocator, second_allocator);
    }

    #[test]
    fn flush_drains_everything() {
        let mut queue = queue();

        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();
        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();

        queue.flush().unwrap();

        let last = queue.last_signaled_value();
        assert!(queue.is_fence_complete(last));
        // A wait on an already-complete value is a no-op.
        queue.wait_for_fence_value(last).unwrap();
        assert_eq!(queue.last_completed_value(), last);
    }

    #[test]
    fn execute_rejects_unknown_list() {
        let mut queue = queue();
        let err = queue.execute(ListId(99)).unwrap_err();
        assert!(matches!(err, QueueError::UnknownList(ListId(99))));
    }

    #[test]
    fn third_acquire_scenario() {
        // Create queue, execute two units back to back, then check the
        // third acquire against the state of fence 1.
        let mut queue = queue();

        let unit_one = queue.acquire_list().unwrap();
        let fence_one = queue.execute(unit_one).unwrap();
        assert_eq!(fence_one, 1);

        let unit_two = queue.acquire_list().unwrap();
        let fence_two = queue.execute(unit_two).unwrap();
        assert_eq!(fence_two, 2);
        assert_eq!(queue.backend().created_allocators(), 2);

        queue.backend().complete_up_to(fence_one);
        queue.wait_for_fence_value(fence_one).unwrap();

        let unit_three = queue.acquire_list().unwrap();
        let _ = unit_three;
        // Fence 1 was complete, so unit one's allocator was recycled.
        assert_eq!(queue.backend().created_allocators(), 2);
    }
}
