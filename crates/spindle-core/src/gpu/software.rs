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

//! A software submission backend with a manually driven completion counter.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::QueueError;
use crate::gpu::backend::{AllocatorId, FenceValue, ListId, SubmissionBackend};

#[derive(Debug, Default)]
struct SoftwareState {
    completed: FenceValue,
    next_allocator: u64,
    next_list: u64,
    allocators: HashMap<AllocatorId, u64>,
    lists: HashMap<ListId, AllocatorId>,
    created_allocators: u64,
    created_lists: u64,
    submissions: u64,
}

/// An in-process GPU whose completion counter advances only when told to.
///
/// `SoftwareGpu` performs no rendering; it models the completion side of a
/// hardware queue so the pool and fencing logic can run headless, in tests
/// and anywhere a real device is unavailable. Completion advances through
/// [`complete_up_to`](SoftwareGpu::complete_up_to), or through a blocking
/// wait, which is modeled as the virtual device catching up to the waited
/// value.
#[derive(Debug, Default)]
pub struct SoftwareGpu {
    state: Mutex<SoftwareState>,
}

impl SoftwareGpu {
    /// Creates a software device with nothing completed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every fence value up to and including `value` as complete.
    ///
    /// Completion is monotonic: passing a value below the current counter
    /// does nothing.
    pub fn complete_up_to(&self, value: FenceValue) {
        let mut state = self.lock();
        if state.completed < value {
            state.completed = value;
        }
    }

    /// Total number of allocators ever created.
    pub fn created_allocators(&self) -> u64 {
        self.lock().created_allocators
    }

    /// Total number of lists ever created.
    pub fn created_lists(&self) -> u64 {
        self.lock().created_lists
    }

    /// Total number of submissions accepted.
    pub fn submissions(&self) -> u64 {
        self.lock().submissions
    }

    /// The allocator a live list is currently bound to.
    pub fn allocator_of(&self, list: ListId) -> Option<AllocatorId> {
        self.lock().lists.get(&list).copied()
    }

    /// How many times an allocator has been reset.
    pub fn resets_of(&self, allocator: AllocatorId) -> Option<u64> {
        self.lock().allocators.get(&allocator).copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SoftwareState> {
        // A poisoned lock means a test already panicked; propagating the
        // panic is the only sensible behavior here.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SubmissionBackend for SoftwareGpu {
    fn create_allocator(&self) -> Result<AllocatorId, QueueError> {
        let mut state = self.lock();
        let id = AllocatorId(state.next_allocator);
        state.next_allocator += 1;
        state.allocators.insert(id, 0);
        state.created_allocators += 1;
        Ok(id)
    }

    fn reset_allocator(&self, allocator: AllocatorId) -> Result<(), QueueError> {
        let mut state = self.lock();
        match state.allocators.get_mut(&allocator) {
            Some(resets) => {
                *resets += 1;
                Ok(())
            }
            None => Err(QueueError::UnknownAllocator(allocator)),
        }
    }

    fn create_list(&self, allocator: AllocatorId) -> Result<ListId, QueueError> {
        let mut state = self.lock();
        if !state.allocators.contains_key(&allocator) {
            return Err(QueueError::UnknownAllocator(allocator));
        }
        let id = ListId(state.next_list);
        state.next_list += 1;
        state.lists.insert(id, allocator);
        state.created_lists += 1;
        Ok(id)
    }

    fn reset_list(&self, list: ListId, allocator: AllocatorId) -> Result<(), QueueError> {
        let mut state = self.lock();
        if !state.allocators.contains_key(&allocator) {
            return Err(QueueError::UnknownAllocator(allocator));
        }
        match state.lists.get_mut(&list) {
            Some(bound) => {
                *bound = allocator;
                Ok(())
            }
            None => Err(QueueError::UnknownList(list)),
        }
    }

    fn submit(&self, list: ListId) -> Result<(), QueueError> {
        let mut state = self.lock();
        if !state.lists.contains_key(&list) {
            return Err(QueueError::UnknownList(list));
        }
        state.submissions += 1;
        Ok(())
    }

    fn signal(&self, _value: FenceValue) -> Result<(), QueueError> {
        Ok(())
    }

    fn completed_value(&self) -> FenceValue {
        self.lock().completed
    }

    fn wait(&self, value: FenceValue) -> Result<(), QueueError> {
        // Waiting on the virtual device makes it catch up instantly; there
        // is no asynchronous executor to block on.
        self.complete_up_to(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_monotonic() {
        let gpu = SoftwareGpu::new();
        gpu.complete_up_to(5);
        gpu.complete_up_to(3);
        assert_eq!(gpu.completed_value(), 5);
    }

    #[test]
    fn wait_advances_completion() {
        let gpu = SoftwareGpu::new();
        gpu.wait(7).unwrap();
        assert_eq!(gpu.completed_value(), 7);
    }

    #[test]
    fn list_binding_is_tracked() {
        let gpu = SoftwareGpu::new();
        let a = gpu.create_allocator().unwrap();
        let b = gpu.create_allocator().unwrap();
        let list = gpu.create_list(a).unwrap();
        assert_eq!(gpu.allocator_of(list), Some(a));

        gpu.reset_list(list, b).unwrap();
        assert_eq!(gpu.allocator_of(list), Some(b));
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let gpu = SoftwareGpu::new();
        assert!(matches!(
            gpu.reset_allocator(AllocatorId(42)),
            Err(QueueError::UnknownAllocator(AllocatorId(42)))
        ));
        assert!(matches!(
            gpu.submit(ListId(42)),
            Err(QueueError::UnknownList(ListId(42)))
        ));
    }
}
