//! trapgate - the PantherOS user/kernel boundary
//!
//! Everything between an `svc` from EL0 and the `eret` back:
//!
//! - [`syscall::dispatch`]: decode the call number and arguments from the
//!   saved frame, run the handler, encode the result
//! - [`proc::fork`]: duplicate the caller and hand the copy to the scheduler
//! - [`proc::child_entry`]: the first thing a fork child runs
//! - [`proc::execv`]: replace the caller's program image
//! - [`exception::handle_lower_el_sync`]: route EL0 synchronous exceptions
//!
//! # Architecture
//! - Target: AArch64 (ARM64), QEMU virt machine
//! - Address spaces, scheduling, program loading and devices are reached
//!   only through traits, so the core also runs in hosted unit tests
//!
//! # Security Features
//! - User pointers are opaque [`mm::UserAddr`] values, copied through
//!   [`mm::UserMemory`] and never dereferenced
//! - Every user-supplied length is bounded before any allocation
//! - Ownership of a fork child's frame and address space is moved, never
//!   shared

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod arch;
pub mod config;
pub mod drivers;
pub mod exception;
pub mod frame;
pub mod logger;
pub mod mm;
pub mod proc;
pub mod syscall;

#[cfg(test)]
mod testing;

pub use config::KernelConfig;
pub use frame::TrapFrame;
pub use syscall::{dispatch, Disposition, Kernel};

use drivers::uart::UART;
use log::info;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bring up the pieces the syscall boundary needs before the first trap:
/// heap, console and logging.
///
/// # Safety
/// Must be called exactly once, early in boot, on the boot CPU, with the
/// PL011 window mapped.
pub unsafe fn init(config: &KernelConfig) {
    #[cfg(target_os = "none")]
    mm::init_heap();

    // SAFETY: the caller guarantees single, early invocation with the UART
    // mapped.
    // Audited: 2025-01-04
    unsafe {
        UART.lock().init();
    }

    if logger::init(config.log_level).is_err() {
        crate::kprintln!("[BOOT] logger already installed");
    }

    info!("[BOOT] trapgate v{} ready", VERSION);
    #[cfg(target_os = "none")]
    info!("[BOOT] heap initialized ({} KiB)", mm::heap_size() / 1024);
}
