//! Kernel Heap Allocator
//!
//! Uses `linked_list_allocator` for heap management on bare-metal
//! targets. Frame copies made by fork and the argument vectors built by
//! execv live here.
//!
//! # Security Considerations
//! - Heap is initialized once during boot
//! - Exhaustion surfaces as a null allocation, which fork and execv turn
//!   into `ENOMEM` through their fallible allocation paths

use core::ptr::addr_of_mut;

use linked_list_allocator::LockedHeap;

/// Global heap allocator instance
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Heap size (256 KiB: room for a few hundred forked frames and argv copies)
const HEAP_SIZE: usize = 256 * 1024;

/// Static heap memory region
static mut HEAP_MEMORY: [u8; HEAP_SIZE] = [0; HEAP_SIZE];

/// Initialize the kernel heap
///
/// Must run exactly once, before the first allocation.
pub fn init_heap() {
    // SAFETY:
    // - HEAP_MEMORY is a valid static array that nothing else touches
    // - This function is only called once during boot from crate::init
    // Audited: 2025-01-04
    unsafe {
        let heap_start = addr_of_mut!(HEAP_MEMORY) as *mut u8;
        ALLOCATOR.lock().init(heap_start, HEAP_SIZE);
    }
}

/// Get the size of the kernel heap
pub fn heap_size() -> usize {
    HEAP_SIZE
}
