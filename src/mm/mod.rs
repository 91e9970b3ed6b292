//! Memory management seams for the syscall core
//!
//! The page-table machinery lives in the VM subsystem. This core only
//! consumes two contracts from it:
//! - an [`AddressSpaceManager`] that can duplicate, activate and destroy
//!   whole address spaces
//! - [`UserMemory`] access to a space's user half, used by every call that
//!   takes a pointer
//!
//! # Security Principles
//! - User pointers are wrapped in [`UserAddr`] and never dereferenced
//! - Every copy reports faults instead of trapping in the kernel
//! - Duplication failures never mutate the source space

mod address;
#[cfg(target_os = "none")]
mod allocator;
mod usercopy;

use core::fmt;

pub use address::{UserAddr, KERNEL_VIRT_BASE};
#[cfg(target_os = "none")]
pub use allocator::{heap_size, init_heap};
pub use usercopy::{copy_in_str, copy_in_word};

/// A user access touched an unmapped or forbidden address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// First address that could not be accessed.
    pub addr: UserAddr,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user access fault at {}", self.addr)
    }
}

/// Errors reported by the address-space manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// Frames or page tables could not be allocated.
    OutOfMemory,
    /// The source space contains a mapping that cannot be copied.
    BadAddress,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::BadAddress => write!(f, "bad address in source space"),
        }
    }
}

/// Byte access to the user half of an address space.
pub trait UserMemory {
    /// Copy `dst.len()` bytes starting at `src` into kernel memory.
    fn copy_in(&self, src: UserAddr, dst: &mut [u8]) -> Result<(), Fault>;

    /// Copy `src` into user memory starting at `dst`.
    fn copy_out(&mut self, dst: UserAddr, src: &[u8]) -> Result<(), Fault>;
}

/// Address-space operations consumed by fork, execv and exit.
pub trait AddressSpaceManager {
    /// Concrete address-space handle, exclusively owned by one context.
    type Space;

    /// Deep copy of `space`. On failure `space` is left untouched.
    fn duplicate(&mut self, space: &Self::Space) -> Result<Self::Space, VmError>;

    /// Install `space` as the hardware-visible mapping of the running context.
    fn activate(&mut self, space: &Self::Space);

    /// Tear down a space nobody owns anymore.
    fn destroy(&mut self, space: Self::Space);
}
