//! Typed syscall decoding
//!
//! Register words are interpreted exactly once, here. Handlers only ever
//! see the typed variant.

use crate::frame::TrapFrame;
use crate::mm::UserAddr;

use super::abi::{numbers, reboot};
use super::io::Fd;
use super::Errno;

/// What `SYS_REBOOT` asks the machine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootMode {
    Reboot,
    Halt,
    PowerOff,
}

/// A decoded system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Exit { status: i32 },
    Execv { path: UserAddr, argv: UserAddr },
    Fork,
    Read { fd: Fd, buf: UserAddr, len: usize },
    Write { fd: Fd, buf: UserAddr, len: usize },
    Reboot { mode: RebootMode },
    Getpid,
}

impl Syscall {
    /// Decode the call number and arguments held in `frame`.
    ///
    /// Unknown numbers yield `ENOSYS`, descriptors wider than `i32`
    /// `EBADF`, other malformed arguments `EINVAL`.
    pub fn decode(frame: &TrapFrame) -> Result<Self, Errno> {
        let [a0, a1, a2, _] = frame.args();
        let call = match frame.callno() {
            numbers::SYS_EXIT => Self::Exit { status: a0 as i32 },
            numbers::SYS_EXECV => Self::Execv {
                path: UserAddr::from(a0),
                argv: UserAddr::from(a1),
            },
            numbers::SYS_FORK => Self::Fork,
            numbers::SYS_READ => Self::Read {
                fd: descriptor(a0)?,
                buf: UserAddr::from(a1),
                len: a2 as usize,
            },
            numbers::SYS_WRITE => Self::Write {
                fd: descriptor(a0)?,
                buf: UserAddr::from(a1),
                len: a2 as usize,
            },
            numbers::SYS_REBOOT => Self::Reboot {
                mode: match a0 as usize {
                    reboot::RB_REBOOT => RebootMode::Reboot,
                    reboot::RB_HALT => RebootMode::Halt,
                    reboot::RB_POWEROFF => RebootMode::PowerOff,
                    _ => return Err(Errno::Einval),
                },
            },
            numbers::SYS_GETPID => Self::Getpid,
            _ => return Err(Errno::Enosys),
        };
        Ok(call)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Exit { .. } => "exit",
            Self::Execv { .. } => "execv",
            Self::Fork => "fork",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Reboot { .. } => "reboot",
            Self::Getpid => "getpid",
        }
    }
}

/// A descriptor word that does not fit the descriptor type names no
/// descriptor at all.
fn descriptor(word: u64) -> Result<Fd, Errno> {
    i32::try_from(word).map(Fd).map_err(|_| Errno::Ebadf)
}
