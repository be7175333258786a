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

//! Back-buffer lifecycle: present rotation, the frame fence table, and
//! resize coordination with the command queues.

use crate::error::SurfaceError;
use crate::gpu::{CommandQueue, FenceValue, SubmissionBackend};
use crate::present::backend::PresentBackend;

/// Owns the rotating set of presentable buffers and keeps them, their views,
/// and in-flight GPU work mutually consistent across present and resize.
///
/// One fence value is recorded per present, at the index that was just
/// rendered; the frame driver waits on the table entry at the *new* current
/// index before reusing that index's resources, which bounds the number of
/// frames in flight to the buffer count.
pub struct PresentationSurface<B: PresentBackend> {
    backend: B,
    width: u32,
    height: u32,
    vsync: bool,
    tearing_supported: bool,
    current_index: u32,
    frame_fences: Vec<FenceValue>,
    frames_presented: u64,
}

impl<B: PresentBackend> PresentationSurface<B> {
    /// Wraps a platform swap chain of `width` × `height` pixels.
    pub fn new(backend: B, width: u32, height: u32, vsync: bool) -> Self {
        let tearing_supported = backend.supports_tearing();
        let buffer_count = backend.buffer_count();
        let current_index = backend.current_index();
        log::info!(
            "Presentation surface created: {}x{}, {} buffers, vsync {}, tearing {}",
            width,
            height,
            buffer_count,
            if vsync { "on" } else { "off" },
            if tearing_supported { "available" } else { "unavailable" },
        );
        Self {
            backend,
            width: width.max(1),
            height: height.max(1),
            vsync,
            tearing_supported,
            current_index,
            frame_fences: vec![0; buffer_count as usize],
            frames_presented: 0,
        }
    }

    /// The platform backend, for backend-specific operations such as
    /// acquiring the current image's view.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the platform backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current surface dimensions in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of presentable buffers in the rotation.
    pub fn buffer_count(&self) -> u32 {
        self.frame_fences.len() as u32
    }

    /// Whether presents wait for vertical sync.
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// Sets the vsync flag, consumed at the next present.
    pub fn set_vsync(&mut self, vsync: bool) {
        self.vsync = vsync;
    }

    /// Flips the vsync flag, consumed at the next present.
    pub fn toggle_vsync(&mut self) {
        self.vsync = !self.vsync;
        log::info!("VSync {}", if self.vsync { "enabled" } else { "disabled" });
    }

    /// The index the platform currently designates as the back buffer.
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    /// Total number of frames presented since creation.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// The fence value that must complete before buffer `index` may be
    /// reused.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the buffer count.
    pub fn fence_for(&self, index: u32) -> FenceValue {
        self.frame_fences[index as usize]
    }

    /// Displays the frame that was just executed and returns the new current
    /// back-buffer index.
    ///
    /// `submitted` is the fence value returned by executing this frame's
    /// command list; it is recorded into the fence table at the index that
    /// was rendered, before the platform reassigns the index. The caller
    /// must wait on [`fence_for`](Self::fence_for) at the returned index
    /// before touching that index's resources again.
    pub fn present(&mut self, submitted: FenceValue) -> Result<u32, SurfaceError> {
        let allow_tearing = self.tearing_supported && !self.vsync;
        self.frame_fences[self.current_index as usize] = submitted;

        self.backend.present(self.vsync, allow_tearing)?;

        // Flip model: the platform decides the next index.
        self.current_index = self.backend.current_index();
        self.frames_presented += 1;
        Ok(self.current_index)
    }

    /// Resizes the back-buffer set, draining `queues` first.
    ///
    /// Dimensions are clamped to a minimum of 1×1; when the clamped size
    /// equals the current size nothing happens and `false` is returned.
    /// Otherwise the order is load-bearing: every queue is flushed before
    /// any image is released, the swap mechanism is resized in place, and
    /// the current index is re-read from the platform.
    pub fn resize<Q: SubmissionBackend>(
        &mut self,
        width: u32,
        height: u32,
        queues: &mut [&mut CommandQueue<Q>],
    ) -> Result<bool, SurfaceError> {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return Ok(false);
        }

        log::info!(
            "Resizing surface from {}x{} to {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;

        // In-flight commands may still reference the images about to be
        // destroyed; every queue must drain first.
        for queue in queues.iter_mut() {
            queue.flush()?;
        }

        self.backend.release_buffers()?;
        self.backend.resize_buffers(width, height)?;
        self.current_index = self.backend.current_index();

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;
    use crate::gpu::{AllocatorId, ListId, QueueKind};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Signaled(FenceValue),
        Waited(FenceValue),
        Presented { vsync: bool, allow_tearing: bool },
        Released,
        Resized(u32, u32),
    }

    type EventLog = Arc<Mutex<Vec<Event>>>;

    /// Swap-chain stand-in that rotates its index like a flip-model chain.
    struct FlipChain {
        log: EventLog,
        buffer_count: u32,
        index: u32,
        tearing: bool,
    }

    impl FlipChain {
        fn new(log: EventLog, buffer_count: u32, tearing: bool) -> Self {
            Self {
                log,
                buffer_count,
                index: 0,
                tearing,
            }
        }
    }

    impl PresentBackend for FlipChain {
        fn buffer_count(&self) -> u32 {
            self.buffer_count
        }

        fn current_index(&self) -> u32 {
            self.index
        }

        fn present(&mut self, vsync: bool, allow_tearing: bool) -> Result<(), SurfaceError> {
            self.log.lock().unwrap().push(Event::Presented {
                vsync,
                allow_tearing,
            });
            self.index = (self.index + 1) % self.buffer_count;
            Ok(())
        }

        fn release_buffers(&mut self) -> Result<(), SurfaceError> {
            self.log.lock().unwrap().push(Event::Released);
            Ok(())
        }

        fn resize_buffers(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
            self.log.lock().unwrap().push(Event::Resized(width, height));
            self.index = 0;
            Ok(())
        }

        fn supports_tearing(&self) -> bool {
            self.tearing
        }
    }

    /// Submission stand-in that records signals and waits into the shared
    /// log, completing work the moment it is waited on.
    struct LoggingGpu {
        log: EventLog,
        completed: Mutex<FenceValue>,
    }

    impl LoggingGpu {
        fn new(log: EventLog) -> Self {
            Self {
                log,
                completed: Mutex::new(0),
            }
        }
    }

    impl SubmissionBackend for LoggingGpu {
        fn create_allocator(&self) -> Result<AllocatorId, QueueError> {
            Ok(AllocatorId(0))
        }

        fn reset_allocator(&self, _allocator: AllocatorId) -> Result<(), QueueError> {
            Ok(())
        }

        fn create_list(&self, _allocator: AllocatorId) -> Result<ListId, QueueError> {
            Ok(ListId(0))
        }

        fn reset_list(&self, _list: ListId, _allocator: AllocatorId) -> Result<(), QueueError> {
            Ok(())
        }

        fn submit(&self, _list: ListId) -> Result<(), QueueError> {
            Ok(())
        }

        fn signal(&self, value: FenceValue) -> Result<(), QueueError> {
            self.log.lock().unwrap().push(Event::Signaled(value));
            Ok(())
        }

        fn completed_value(&self) -> FenceValue {
            *self.completed.lock().unwrap()
        }

        fn wait(&self, value: FenceValue) -> Result<(), QueueError> {
            self.log.lock().unwrap().push(Event::Waited(value));
            let mut completed = self.completed.lock().unwrap();
            if *completed < value {
                *completed = value;
            }
            Ok(())
        }
    }

    fn surface(buffer_count: u32, tearing: bool) -> (PresentationSurface<FlipChain>, EventLog) {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let chain = FlipChain::new(log.clone(), buffer_count, tearing);
        (PresentationSurface::new(chain, 1280, 720, true), log)
    }

    #[test]
    fn index_stays_in_bounds_across_presents() {
        let (mut surface, _log) = surface(3, false);
        for fence in 1..=10u64 {
            let index = surface.present(fence).unwrap();
            assert!(index < 3);
            assert_eq!(index, surface.current_index());
        }
        assert_eq!(surface.frames_presented(), 10);
    }

    #[test]
    fn one_fence_recorded_per_present_at_rendered_index() {
        let (mut surface, _log) = surface(3, false);

        assert_eq!(surface.current_index(), 0);
        surface.present(7).unwrap();
        // Fence 7 belongs to the buffer that was just rendered (index 0),
        // not to the one the platform handed out next.
        assert_eq!(surface.fence_for(0), 7);
        assert_eq!(surface.fence_for(1), 0);
        assert_eq!(surface.fence_for(2), 0);

        surface.present(9).unwrap();
        assert_eq!(surface.fence_for(1), 9);
    }

    #[test]
    fn wait_target_comes_around_after_full_rotation() {
        let (mut surface, _log) = surface(3, false);

        surface.present(1).unwrap();
        surface.present(2).unwrap();
        let index = surface.present(3).unwrap();
        // Three buffers deep, the new index is the one frame 1 rendered to.
        assert_eq!(index, 0);
        assert_eq!(surface.fence_for(index), 1);
    }

    #[test]
    fn same_size_resize_is_a_no_op() {
        let (mut surface, log) = surface(3, false);
        let mut queue = CommandQueue::new(QueueKind::Graphics, LoggingGpu::new(log.clone()));

        let resized = surface.resize(1280, 720, &mut [&mut queue]).unwrap();
        assert!(!resized);
        assert!(log.lock().unwrap().is_empty(), "no flush, release, or resize");
        assert_eq!(queue.last_signaled_value(), 0);
    }

    #[test]
    fn resize_clamps_to_one_by_one() {
        let (mut surface, log) = surface(3, false);
        let mut queue = CommandQueue::new(QueueKind::Graphics, LoggingGpu::new(log.clone()));

        let resized = surface.resize(0, 0, &mut [&mut queue]).unwrap();
        assert!(resized);
        assert_eq!(surface.size(), (1, 1));
        assert!(log.lock().unwrap().contains(&Event::Resized(1, 1)));
    }

    #[test]
    fn resize_flushes_before_releasing_buffers() {
        let (mut surface, log) = surface(3, false);
        let mut queue = CommandQueue::new(QueueKind::Graphics, LoggingGpu::new(log.clone()));

        // Two frames in flight when the resize arrives.
        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();
        let list = queue.acquire_list().unwrap();
        queue.execute(list).unwrap();

        surface.resize(1920, 1080, &mut [&mut queue]).unwrap();

        let events = log.lock().unwrap();
        let wait_at = events
            .iter()
            .position(|e| matches!(e, Event::Waited(_)))
            .expect("resize must flush the queue");
        let release_at = events
            .iter()
            .position(|e| *e == Event::Released)
            .expect("resize must release the buffers");
        let resize_at = events
            .iter()
            .position(|e| matches!(e, Event::Resized(_, _)))
            .expect("resize must resize the buffers");

        assert!(wait_at < release_at, "flush must complete before release");
        assert!(release_at < resize_at, "release must precede the resize");
        // Both in-flight fences had retired by the time the flush returned.
        assert!(queue.is_fence_complete(2));
        assert_eq!(surface.current_index(), 0);
    }

    #[test]
    fn vsync_toggle_is_consumed_at_next_present() {
        let (mut surface, log) = surface(3, true);

        surface.present(1).unwrap();
        surface.toggle_vsync();
        surface.present(2).unwrap();

        let events = log.lock().unwrap();
        let presents: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, Event::Presented { .. }))
            .collect();
        assert_eq!(
            presents,
            vec![
                &Event::Presented {
                    vsync: true,
                    allow_tearing: false
                },
                &Event::Presented {
                    vsync: false,
                    allow_tearing: true
                },
            ]
        );
    }

    #[test]
    fn tearing_requires_platform_support() {
        let (mut surface, log) = surface(3, false);
        surface.set_vsync(false);
        surface.present(1).unwrap();

        let events = log.lock().unwrap();
        assert!(events.contains(&Event::Presented {
            vsync: false,
            allow_tearing: false
        }));
    }
}
