//! Kernel configuration
//!
//! Everything tunable about the syscall boundary, passed explicitly to the
//! code that needs it. Defaults are `const` so a static configuration can
//! live in the kernel image.

use log::LevelFilter;

use crate::mm::UserAddr;
use crate::syscall::io::{Fd, OpenMode};

/// The window of virtual addresses user pointers may point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRegion {
    /// First valid user address (the null page is excluded).
    pub start: usize,
    /// One past the last valid user address.
    pub end: usize,
}

impl UserRegion {
    pub const fn contains(&self, addr: UserAddr) -> bool {
        addr.as_usize() >= self.start && addr.as_usize() < self.end
    }
}

/// Device and access mode behind one standard descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioBinding {
    pub device: &'static str,
    pub mode: OpenMode,
}

/// Bindings for descriptors 0, 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioBindings {
    pub stdin: StdioBinding,
    pub stdout: StdioBinding,
    pub stderr: StdioBinding,
}

impl StdioBindings {
    pub const fn console() -> Self {
        Self {
            stdin: StdioBinding {
                device: CONSOLE_DEVICE,
                mode: OpenMode::READ,
            },
            stdout: StdioBinding {
                device: CONSOLE_DEVICE,
                mode: OpenMode::WRITE,
            },
            stderr: StdioBinding {
                device: CONSOLE_DEVICE,
                mode: OpenMode::WRITE,
            },
        }
    }

    pub fn get(&self, fd: Fd) -> Option<&StdioBinding> {
        match fd {
            Fd::STDIN => Some(&self.stdin),
            Fd::STDOUT => Some(&self.stdout),
            Fd::STDERR => Some(&self.stderr),
            _ => None,
        }
    }
}

/// Name of the console character device.
pub const CONSOLE_DEVICE: &str = "con:";

/// Syscall-boundary configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Where user pointers may point.
    pub user_region: UserRegion,
    /// Longest accepted execv path, terminator included.
    pub path_max: usize,
    /// Most argv entries execv accepts.
    pub max_args: usize,
    /// Total argv bytes, terminators included.
    pub arg_max: usize,
    /// Standard descriptor bindings.
    pub stdio: StdioBindings,
    /// Console log verbosity.
    pub log_level: LevelFilter,
}

impl KernelConfig {
    pub const fn new() -> Self {
        Self {
            user_region: UserRegion {
                start: 0x0000_0000_0001_0000,
                end: 0x0000_8000_0000_0000,
            },
            path_max: 1024,
            max_args: 64,
            arg_max: 64 * 1024,
            stdio: StdioBindings::console(),
            log_level: default_log_level(),
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Log level selected by Cargo features.
const fn default_log_level() -> LevelFilter {
    if cfg!(feature = "no_logs") {
        LevelFilter::Off
    } else if cfg!(feature = "log_trace") {
        LevelFilter::Trace
    } else if cfg!(feature = "log_info") {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    }
}
