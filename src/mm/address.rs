//! User Virtual Address Types
//!
//! Type-safe wrapper for addresses that arrive from user mode in
//! syscall registers. A `UserAddr` is never dereferenced by the kernel;
//! every access goes through [`UserMemory`](super::UserMemory) after the
//! range has been validated.
//!
//! # Security Properties
//! - User addresses cannot be mixed up with kernel pointers
//! - Arithmetic is checked; wrapping past the top of the address space
//!   is reported instead of silently folding back to low memory

use core::fmt;

/// Kernel virtual address base (higher-half).
/// Anything at or above this is never a valid user address.
pub const KERNEL_VIRT_BASE: usize = 0xFFFF_0000_0000_0000;

/// An address supplied by user mode.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct UserAddr(usize);

impl UserAddr {
    /// The null user address.
    pub const NULL: Self = Self(0);

    /// Wrap a raw register value.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Get the raw address as u64 (register width).
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check if this address lies in the lower (user) half.
    #[inline]
    pub const fn is_lower_half(self) -> bool {
        self.0 < KERNEL_VIRT_BASE
    }

    /// Add a byte offset, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl fmt::Debug for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserAddr({:#018x})", self.0)
    }
}

impl fmt::Display for UserAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl From<u64> for UserAddr {
    fn from(raw: u64) -> Self {
        Self(raw as usize)
    }
}
