//! Heap usage probe.
//!
//! Install [`TrackingAllocator`] as the global allocator to make the probe
//! work; without it every measurement reads as zero.
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: rebench_core::memory::TrackingAllocator = rebench_core::memory::TrackingAllocator;
//! ```

use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    sync::atomic::{self, AtomicBool, Ordering},
};

static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    // Bytes allocated minus bytes freed by the current thread.
    static LIVE_BYTES: Cell<i64> = const { Cell::new(0) };
}

/// System allocator wrapper keeping a per-thread live-heap gauge.
pub struct TrackingAllocator;

#[inline]
fn record(delta: i64) {
    if !INSTALLED.load(Ordering::Relaxed) {
        INSTALLED.store(true, Ordering::Relaxed);
    }
    // Fails only while the thread is being torn down.
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + delta));
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            record(layout.size() as i64);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            record(layout.size() as i64);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        record(-(layout.size() as i64));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            record(new_size as i64 - layout.size() as i64);
        }
        new_ptr
    }
}

/// Whether [`TrackingAllocator`] is serving allocations in this process.
pub fn is_tracking() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// Net heap bytes held by the current thread.
pub fn live_bytes() -> i64 {
    atomic::compiler_fence(Ordering::SeqCst);
    LIVE_BYTES.try_with(Cell::get).unwrap_or(0)
}

/// Measures how much the current thread's live heap grows between
/// [`MemoryProbe::start`] and [`MemoryProbe::finish`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryProbe {
    baseline: i64,
}

impl MemoryProbe {
    pub fn start() -> Self {
        Self {
            baseline: live_bytes(),
        }
    }

    /// Negative growth is measurement noise and reads as zero.
    pub fn finish(self) -> u64 {
        (live_bytes() - self.baseline).max(0) as u64
    }
}
