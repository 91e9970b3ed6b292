//! System Call Error Codes
//!
//! Error codes travel back to user mode in the value register with the
//! status register set to 1. User-level stubs turn them into `errno`.

use core::fmt;

use crate::mm::{Fault, VmError};
use crate::proc::SpawnError;

/// System call error codes
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    /// I/O error reported by a device
    Eio = 5,
    /// Argument list too long
    E2big = 7,
    /// Executable format error
    Enoexec = 8,
    /// Bad file descriptor
    Ebadf = 9,
    /// Process table full, try again
    Eagain = 11,
    /// Out of memory
    Enomem = 12,
    /// Bad address (invalid pointer)
    Efault = 14,
    /// No such device
    Enodev = 19,
    /// Invalid argument
    Einval = 22,
    /// String longer than the kernel accepts
    Enametoolong = 36,
    /// Invalid system call number
    Enosys = 38,
}

impl Errno {
    /// The numeric code written into the value register.
    #[inline]
    pub const fn code(self) -> u64 {
        self as u32 as u64
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Eio => "EIO",
            Self::E2big => "E2BIG",
            Self::Enoexec => "ENOEXEC",
            Self::Ebadf => "EBADF",
            Self::Eagain => "EAGAIN",
            Self::Enomem => "ENOMEM",
            Self::Efault => "EFAULT",
            Self::Enodev => "ENODEV",
            Self::Einval => "EINVAL",
            Self::Enametoolong => "ENAMETOOLONG",
            Self::Enosys => "ENOSYS",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), *self as u32)
    }
}

impl From<Fault> for Errno {
    fn from(_: Fault) -> Self {
        Self::Efault
    }
}

impl From<VmError> for Errno {
    fn from(err: VmError) -> Self {
        match err {
            VmError::OutOfMemory => Self::Enomem,
            VmError::BadAddress => Self::Efault,
        }
    }
}

impl From<SpawnError> for Errno {
    fn from(err: SpawnError) -> Self {
        match err {
            SpawnError::OutOfMemory => Self::Enomem,
            SpawnError::ProcessTableFull => Self::Eagain,
        }
    }
}

impl From<alloc::collections::TryReserveError> for Errno {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Self::Enomem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::UserAddr;

    #[test]
    fn test_codes_are_positive() {
        assert_eq!(Errno::Enosys.code(), 38);
        assert_eq!(Errno::Efault.code(), 14);
        assert_eq!(Errno::Enomem.code(), 12);
    }

    #[test]
    fn test_conversions() {
        let fault = Fault {
            addr: UserAddr::new(0x10),
        };
        assert_eq!(Errno::from(fault), Errno::Efault);
        assert_eq!(Errno::from(VmError::OutOfMemory), Errno::Enomem);
        assert_eq!(Errno::from(SpawnError::ProcessTableFull), Errno::Eagain);
    }
}
