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

//! End-to-end pacing tests: a frame driver loop over the software backend,
//! exercising the acquire → execute → present → wait contract.

use spindle_core::error::SurfaceError;
use spindle_core::gpu::{CommandQueue, QueueKind, SoftwareGpu};
use spindle_core::present::{PresentBackend, PresentationSurface};

/// Minimal flip-model swap chain: three images, index advances on present.
struct TestChain {
    index: u32,
}

impl PresentBackend for TestChain {
    fn buffer_count(&self) -> u32 {
        3
    }

    fn current_index(&self) -> u32 {
        self.index
    }

    fn present(&mut self, _vsync: bool, _allow_tearing: bool) -> Result<(), SurfaceError> {
        self.index = (self.index + 1) % 3;
        Ok(())
    }

    fn release_buffers(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn resize_buffers(&mut self, _width: u32, _height: u32) -> Result<(), SurfaceError> {
        self.index = 0;
        Ok(())
    }

    fn supports_tearing(&self) -> bool {
        false
    }
}

#[test]
fn allocator_growth_is_bounded_by_frames_in_flight() {
    let mut queue = CommandQueue::new(QueueKind::Graphics, SoftwareGpu::new());
    let mut surface = PresentationSurface::new(TestChain { index: 0 }, 1280, 720, true);

    // Drive the per-frame contract: acquire, execute, present, then block on
    // the fence recorded for the buffer that just became current. The wait
    // is what keeps at most three frames outstanding.
    for _ in 0..60 {
        let list = queue.acquire_list().unwrap();
        let fence = queue.execute(list).unwrap();
        let index = surface.present(fence).unwrap();
        queue.wait_for_fence_value(surface.fence_for(index)).unwrap();
    }

    assert!(
        queue.backend().created_allocators() <= 3,
        "a triple-buffered loop must never need more than three allocators, got {}",
        queue.backend().created_allocators()
    );
    assert_eq!(
        queue.backend().created_lists(),
        1,
        "a single list should be recycled across every frame"
    );
    assert_eq!(surface.frames_presented(), 60);
}

#[test]
fn fences_observed_in_presentation_order() {
    let mut queue = CommandQueue::new(QueueKind::Graphics, SoftwareGpu::new());
    let mut surface = PresentationSurface::new(TestChain { index: 0 }, 800, 600, true);

    let mut fences = Vec::new();
    for _ in 0..9 {
        let list = queue.acquire_list().unwrap();
        let fence = queue.execute(list).unwrap();
        fences.push(fence);
        let index = surface.present(fence).unwrap();
        queue.wait_for_fence_value(surface.fence_for(index)).unwrap();
    }

    for pair in fences.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    // After nine frames on three buffers, the table holds the last three
    // fences, each at the slot its frame rendered to.
    assert_eq!(surface.fence_for(0), fences[6]);
    assert_eq!(surface.fence_for(1), fences[7]);
    assert_eq!(surface.fence_for(2), fences[8]);
}

#[test]
fn mid_loop_resize_drains_and_restarts_rotation() {
    let mut queue = CommandQueue::new(QueueKind::Graphics, SoftwareGpu::new());
    let mut surface = PresentationSurface::new(TestChain { index: 0 }, 1280, 720, true);

    for _ in 0..2 {
        let list = queue.acquire_list().unwrap();
        let fence = queue.execute(list).unwrap();
        surface.present(fence).unwrap();
    }

    // Two frames in flight; the resize must drain them before touching the
    // buffers.
    let resized = surface.resize(1920, 1080, &mut [&mut queue]).unwrap();
    assert!(resized);
    assert!(queue.is_fence_complete(queue.last_signaled_value()));
    assert_eq!(surface.current_index(), 0);
    assert_eq!(surface.size(), (1920, 1080));

    // The loop keeps working after the resize.
    let list = queue.acquire_list().unwrap();
    let fence = queue.execute(list).unwrap();
    let index = surface.present(fence).unwrap();
    assert!(index < 3);
}
