//! User/Kernel Register Convention
//!
//! Bit-exact contract shared with the trap entry stub and the user-level
//! syscall stubs:
//!
//! ```text
//!   svc #0        x8 = call number, x0..x3 = arguments
//!   on return     x0 = value (or errno), x3 = 0 success / 1 error
//!   resume at     trapping svc + 4
//! ```
//!
//! No call takes more than four word-sized arguments. Wider operands
//! would need register pairs and are not supported by any handler.

/// Register holding the call number.
pub const REG_CALLNO: usize = 8;

/// Registers holding the four arguments, in order.
pub const REG_ARGS: [usize; 4] = [0, 1, 2, 3];

/// Register receiving the return value or the error code.
pub const REG_VALUE: usize = 0;

/// Register receiving the success/error flag.
pub const REG_STATUS: usize = 3;

/// Second register of a freshly loaded image's entry state (argv).
pub const REG_ENTRY_ARGV: usize = 1;

/// Status flag values.
pub const STATUS_OK: u64 = 0;
pub const STATUS_ERROR: u64 = 1;

/// Width of the `svc` instruction.
pub const INSTRUCTION_WIDTH: u64 = 4;

/// System call numbers
pub mod numbers {
    pub const SYS_EXIT: usize = 0;
    pub const SYS_EXECV: usize = 1;
    pub const SYS_FORK: usize = 2;
    pub const SYS_READ: usize = 5;
    pub const SYS_WRITE: usize = 6;
    pub const SYS_REBOOT: usize = 8;
    pub const SYS_GETPID: usize = 11;
}

/// Reboot request codes (first argument of `SYS_REBOOT`).
pub mod reboot {
    pub const RB_REBOOT: usize = 0;
    pub const RB_HALT: usize = 1;
    pub const RB_POWEROFF: usize = 2;
}
