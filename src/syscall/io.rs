//! Console read/write calls
//!
//! Only the three standard descriptors exist at this boundary. Each one
//! is bound to a character device and an access mode; a call opens the
//! device, moves bytes through a small bounce buffer and closes it again.

use bitflags::bitflags;
use log::trace;

use super::validate::validate_user_range;
use super::Errno;
use crate::config::KernelConfig;
use crate::mm::{UserAddr, UserMemory};

/// Size of the kernel bounce buffer.
const BOUNCE_SIZE: usize = 256;

/// A user file descriptor number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Fd(pub i32);

impl Fd {
    pub const STDIN: Self = Self(0);
    pub const STDOUT: Self = Self(1);
    pub const STDERR: Self = Self(2);
}

bitflags! {
    /// Access requested when opening a device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

/// Handle to an open device, valid until `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHandle(pub u32);

/// Character-device I/O, as consumed by read and write.
pub trait DeviceIo {
    fn open(&mut self, device: &str, mode: OpenMode) -> Result<DeviceHandle, Errno>;

    /// Read up to `buf.len()` bytes; returns how many arrived.
    fn read(&mut self, handle: DeviceHandle, buf: &mut [u8]) -> Result<usize, Errno>;

    /// Write `buf`; returns how many bytes the device accepted.
    fn write(&mut self, handle: DeviceHandle, buf: &[u8]) -> Result<usize, Errno>;

    fn close(&mut self, handle: DeviceHandle);
}

/// Open the device bound to `fd` for `want`, run `f`, always close.
fn with_device<D, T>(
    devices: &mut D,
    config: &KernelConfig,
    fd: Fd,
    want: OpenMode,
    f: impl FnOnce(&mut D, DeviceHandle) -> Result<T, Errno>,
) -> Result<T, Errno>
where
    D: DeviceIo + ?Sized,
{
    let binding = config.stdio.get(fd).ok_or(Errno::Ebadf)?;
    if !binding.mode.contains(want) {
        return Err(Errno::Ebadf);
    }
    let handle = devices.open(binding.device, binding.mode)?;
    let result = f(devices, handle);
    devices.close(handle);
    result
}

/// write(fd, buf, len)
pub fn sys_write<M, D>(
    mem: &M,
    devices: &mut D,
    config: &KernelConfig,
    fd: Fd,
    buf: UserAddr,
    len: usize,
) -> Result<usize, Errno>
where
    M: UserMemory + ?Sized,
    D: DeviceIo + ?Sized,
{
    let range = validate_user_range(&config.user_region, buf, len)?;
    if range.is_empty() {
        // Still reject descriptors that could never be written.
        return match config.stdio.get(fd) {
            Some(b) if b.mode.contains(OpenMode::WRITE) => Ok(0),
            _ => Err(Errno::Ebadf),
        };
    }

    with_device(devices, config, fd, OpenMode::WRITE, |devices, handle| {
        let mut bounce = [0u8; BOUNCE_SIZE];
        let mut done = 0;
        for (addr, n) in range.chunks(BOUNCE_SIZE) {
            mem.copy_in(addr, &mut bounce[..n])?;
            let wrote = devices.write(handle, &bounce[..n])?;
            done += wrote;
            if wrote < n {
                break;
            }
        }
        trace!("[SYSCALL] write({}) = {}", fd.0, done);
        Ok(done)
    })
}

/// read(fd, buf, len)
pub fn sys_read<M, D>(
    mem: &mut M,
    devices: &mut D,
    config: &KernelConfig,
    fd: Fd,
    buf: UserAddr,
    len: usize,
) -> Result<usize, Errno>
where
    M: UserMemory + ?Sized,
    D: DeviceIo + ?Sized,
{
    let range = validate_user_range(&config.user_region, buf, len)?;
    if range.is_empty() {
        return match config.stdio.get(fd) {
            Some(b) if b.mode.contains(OpenMode::READ) => Ok(0),
            _ => Err(Errno::Ebadf),
        };
    }

    with_device(devices, config, fd, OpenMode::READ, |devices, handle| {
        let mut bounce = [0u8; BOUNCE_SIZE];
        let mut done = 0;
        for (addr, n) in range.chunks(BOUNCE_SIZE) {
            let got = devices.read(handle, &mut bounce[..n])?;
            mem.copy_out(addr, &bounce[..got])?;
            done += got;
            if got < n {
                break;
            }
        }
        trace!("[SYSCALL] read({}) = {}", fd.0, done);
        Ok(done)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConsole, MockSpace};

    const BUF: usize = 0x1000_0000;

    #[test]
    fn test_write_stdout() {
        let mut space = MockSpace::new(1);
        space.map(BUF, b"hello, console");
        let mut con = MockConsole::new();
        let n = sys_write(
            &space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDOUT,
            UserAddr::new(BUF),
            14,
        )
        .unwrap();
        assert_eq!(n, 14);
        assert_eq!(con.output, b"hello, console");
        assert_eq!(con.open_handles, 0);
    }

    #[test]
    fn test_write_spans_bounce_buffer() {
        let mut space = MockSpace::new(1);
        let data: alloc::vec::Vec<u8> = (0..700u32).map(|i| (i % 251) as u8).collect();
        space.map(BUF, &data);
        let mut con = MockConsole::new();
        let n = sys_write(
            &space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDERR,
            UserAddr::new(BUF),
            700,
        )
        .unwrap();
        assert_eq!(n, 700);
        assert_eq!(con.output, data);
    }

    #[test]
    fn test_write_to_stdin_is_ebadf() {
        let mut space = MockSpace::new(1);
        space.map(BUF, b"x");
        let mut con = MockConsole::new();
        let err = sys_write(
            &space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDIN,
            UserAddr::new(BUF),
            1,
        );
        assert_eq!(err, Err(Errno::Ebadf));
        assert_eq!(con.opens, 0);
    }

    #[test]
    fn test_write_unknown_fd() {
        let space = MockSpace::new(1);
        let mut con = MockConsole::new();
        let err = sys_write(
            &space,
            &mut con,
            &KernelConfig::default(),
            Fd(7),
            UserAddr::new(BUF),
            0,
        );
        assert_eq!(err, Err(Errno::Ebadf));
    }

    #[test]
    fn test_write_null_buffer() {
        let space = MockSpace::new(1);
        let mut con = MockConsole::new();
        let err = sys_write(
            &space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDOUT,
            UserAddr::NULL,
            4,
        );
        assert_eq!(err, Err(Errno::Efault));
        assert_eq!(con.opens, 0);
    }

    #[test]
    fn test_write_fault_closes_device() {
        let mut space = MockSpace::new(1);
        space.map(BUF, b"abc");
        let mut con = MockConsole::new();
        let err = sys_write(
            &space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDOUT,
            UserAddr::new(BUF),
            10,
        );
        assert_eq!(err, Err(Errno::Efault));
        assert_eq!(con.opens, 1);
        assert_eq!(con.open_handles, 0);
    }

    #[test]
    fn test_read_stdin() {
        let mut space = MockSpace::new(1);
        space.map(BUF, &[0u8; 32]);
        let mut con = MockConsole::new();
        con.input.extend_from_slice(b"ls\n");
        let n = sys_read(
            &mut space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDIN,
            UserAddr::new(BUF),
            32,
        )
        .unwrap();
        assert_eq!(n, 3);
        let mut got = [0u8; 3];
        space.copy_in(UserAddr::new(BUF), &mut got).unwrap();
        assert_eq!(&got, b"ls\n");
        assert_eq!(con.last_mode, Some(OpenMode::READ));
    }

    #[test]
    fn test_read_stdout_is_ebadf() {
        let mut space = MockSpace::new(1);
        space.map(BUF, &[0u8; 4]);
        let mut con = MockConsole::new();
        let err = sys_read(
            &mut space,
            &mut con,
            &KernelConfig::default(),
            Fd::STDOUT,
            UserAddr::new(BUF),
            4,
        );
        assert_eq!(err, Err(Errno::Ebadf));
    }
}
