//! System Call Interface
//!
//! Turns a trapped `svc` into a typed call, runs it, and encodes the
//! result back into the saved frame.
//!
//! # Security Model
//! - Whitelist approach: only explicitly decoded syscalls are allowed
//! - All parameters are validated before use
//! - Invalid inputs return errors, never panic
//! - Internal invariant violations (masked exceptions) abort the kernel
//!
//! # Current Syscalls
//! - 0: exit(status)
//! - 1: execv(path, argv)
//! - 2: fork()
//! - 5: read(fd, buf, len)
//! - 6: write(fd, buf, len)
//! - 8: reboot(how)
//! - 11: getpid()

pub mod abi;
mod decode;
mod error;
mod handler;
pub mod io;
mod validate;

use crate::arch::InterruptControl;
use crate::config::KernelConfig;
use crate::mm::AddressSpaceManager;
use crate::proc::{Loader, Scheduler};

pub use decode::{RebootMode, Syscall};
pub use error::Errno;
pub use handler::{dispatch, Disposition};
pub use io::{DeviceHandle, DeviceIo, Fd, OpenMode};
pub use validate::{validate_user_range, UserRange};

/// Collaborators a syscall may reach, borrowed for one trap.
pub struct Kernel<'a, S> {
    pub vm: &'a mut dyn AddressSpaceManager<Space = S>,
    pub sched: &'a mut dyn Scheduler<S>,
    pub loader: &'a mut dyn Loader<S>,
    pub devices: &'a mut dyn DeviceIo,
    pub irq: &'a dyn InterruptControl,
    pub config: &'a KernelConfig,
}
