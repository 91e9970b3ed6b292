//! Bounded copies out of user memory
//!
//! Strings are pulled in one byte at a time so that a string ending just
//! before an unmapped page never faults on bytes past its terminator.

use alloc::ffi::CString;
use alloc::vec::Vec;
use core::mem::size_of;

use super::{UserAddr, UserMemory};
use crate::syscall::Errno;

/// Read one native-endian pointer-sized word from user memory.
pub fn copy_in_word<M>(mem: &M, addr: UserAddr) -> Result<usize, Errno>
where
    M: UserMemory + ?Sized,
{
    let mut bytes = [0u8; size_of::<usize>()];
    mem.copy_in(addr, &mut bytes)?;
    Ok(usize::from_ne_bytes(bytes))
}

/// Copy a NUL-terminated string into kernel memory.
///
/// `max_len` bounds the string including its terminator. Running past it
/// yields `ENAMETOOLONG`; a fault on any byte yields `EFAULT`.
pub fn copy_in_str<M>(mem: &M, addr: UserAddr, max_len: usize) -> Result<CString, Errno>
where
    M: UserMemory + ?Sized,
{
    if addr.is_null() {
        return Err(Errno::Efault);
    }

    let mut bytes = Vec::new();
    for offset in 0..max_len {
        let at = addr.checked_add(offset).ok_or(Errno::Efault)?;
        let mut byte = [0u8; 1];
        mem.copy_in(at, &mut byte)?;
        if byte[0] == 0 {
            bytes.try_reserve_exact(1)?;
            // No interior NUL: we stopped at the first one.
            return CString::new(bytes).map_err(|_| Errno::Einval);
        }
        bytes.try_reserve(1)?;
        bytes.push(byte[0]);
    }

    Err(Errno::Enametoolong)
}
