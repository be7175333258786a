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

//! The WGPU-based implementation of the `SubmissionBackend` trait.
//!
//! wgpu has no user-visible command allocators: encoder memory is pooled
//! internally and reclaimed when a submission finishes. The allocator
//! handles issued here are therefore bookkeeping identities (resetting one
//! is free), while list handles map to real `wgpu::CommandEncoder`s. The
//! monotonic completion counter is rebuilt from wgpu's submission callbacks:
//! each fence signal registers an `on_submitted_work_done` callback that
//! raises the counter to the signaled value, and waits drive `device.poll`
//! until the counter catches up.

use spindle_core::error::QueueError;
use spindle_core::gpu::{AllocatorId, FenceValue, ListId, QueueKind, SubmissionBackend};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct ListEntry {
    allocator: AllocatorId,
    // None between submit and the next reset.
    encoder: Option<wgpu::CommandEncoder>,
}

#[derive(Debug, Default)]
struct SubmissionState {
    allocators: HashMap<AllocatorId, u64>,
    lists: HashMap<ListId, ListEntry>,
    next_allocator: u64,
    next_list: u64,
}

/// One submission queue multiplexed onto the wgpu hardware queue, with its
/// own fence counter.
#[derive(Debug)]
pub struct WgpuSubmission {
    device: wgpu::Device,
    queue: wgpu::Queue,
    kind: QueueKind,
    state: Mutex<SubmissionState>,
    completed: Arc<AtomicU64>,
}

impl WgpuSubmission {
    /// Creates a submission backend over the shared device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, kind: QueueKind) -> Self {
        Self {
            device,
            queue,
            kind,
            state: Mutex::new(SubmissionState::default()),
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The queue kind this backend was created for.
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Records commands into an open list.
    ///
    /// This is the recording escape hatch: the core only manages lifecycle
    /// and fencing, so frame drivers encode their passes against the raw
    /// `wgpu::CommandEncoder` here. The closure must not call back into this
    /// backend.
    pub fn with_encoder<R>(
        &self,
        list: ListId,
        record: impl FnOnce(&mut wgpu::CommandEncoder) -> R,
    ) -> Result<R, QueueError> {
        let mut state = self.lock();
        let entry = state.lists.get_mut(&list).ok_or(QueueError::UnknownList(list))?;
        match entry.encoder.as_mut() {
            Some(encoder) => Ok(record(encoder)),
            None => Err(QueueError::UnknownList(list)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SubmissionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn new_encoder(&self, list_id: u64) -> wgpu::CommandEncoder {
        let label = format!("{} list {list_id}", self.kind.label());
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&label),
            })
    }
}

impl SubmissionBackend for WgpuSubmission {
    fn create_allocator(&self) -> Result<AllocatorId, QueueError> {
        let mut state = self.lock();
        let id = AllocatorId(state.next_allocator);
        state.next_allocator += 1;
        state.allocators.insert(id, 0);
        Ok(id)
    }

    fn reset_allocator(&self, allocator: AllocatorId) -> Result<(), QueueError> {
        let mut state = self.lock();
        // Encoder memory was reclaimed by wgpu when the submission finished;
        // only the reset count is tracked.
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
        let encoder = self.new_encoder(id.0);
        state.lists.insert(
            id,
            ListEntry {
                allocator,
                encoder: Some(encoder),
            },
        );
        Ok(id)
    }

    fn reset_list(&self, list: ListId, allocator: AllocatorId) -> Result<(), QueueError> {
        let mut state = self.lock();
        if !state.allocators.contains_key(&allocator) {
            return Err(QueueError::UnknownAllocator(allocator));
        }
        let encoder = self.new_encoder(list.0);
        match state.lists.get_mut(&list) {
            Some(entry) => {
                entry.allocator = allocator;
                entry.encoder = Some(encoder);
                Ok(())
            }
            None => Err(QueueError::UnknownList(list)),
        }
    }

    fn submit(&self, list: ListId) -> Result<(), QueueError> {
        let encoder = {
            let mut state = self.lock();
            let entry = state.lists.get_mut(&list).ok_or(QueueError::UnknownList(list))?;
            entry.encoder.take().ok_or_else(|| {
                QueueError::SubmissionFailed(format!("{list:?} has no open recording"))
            })?
        };

        let command_buffer = encoder.finish();
        self.queue.submit(std::iter::once(command_buffer));
        Ok(())
    }

    fn signal(&self, value: FenceValue) -> Result<(), QueueError> {
        let completed = Arc::clone(&self.completed);
        // Fires once everything submitted before this call has executed,
        // which is exactly the fence contract.
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::SeqCst);
        });
        Ok(())
    }

    fn completed_value(&self) -> FenceValue {
        // Completion callbacks only run while the device is polled.
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("{} queue: non-blocking poll failed: {e:?}", self.kind.label());
        }
        self.completed.load(Ordering::SeqCst)
    }

    fn wait(&self, value: FenceValue) -> Result<(), QueueError> {
        loop {
            if self.completed.load(Ordering::SeqCst) >= value {
                return Ok(());
            }
            // PollType::Wait parks the thread on the driver's own completion
            // primitive until outstanding submissions retire.
            if let Err(e) = self.device.poll(wgpu::PollType::Wait) {
                return Err(QueueError::DeviceLost(format!(
                    "{} queue: wait for fence {value} failed: {e:?}",
                    self.kind.label()
                )));
            }
        }
    }
}
