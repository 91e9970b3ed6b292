//! Synchronous exceptions from EL0
//!
//! The vector table and register save/restore live in the entry stub.
//! By the time Rust runs, the stub has built a [`TrapFrame`] and the
//! scheduler has identified the running context; this module decides what
//! kind of trap it was.
//!
//! # Exception Types
//! - SVC: system calls, handed to the dispatcher
//! - Data/instruction aborts: the faulting context is terminated
//! - Anything else from EL0: logged and the context is terminated
//!
//! A user fault never halts the machine.

use log::{error, warn};

use crate::frame::TrapFrame;
use crate::mm::UserMemory;
use crate::proc::{self, ExecutionContext};
use crate::syscall::{self, Disposition, Kernel};

/// Exit status reported for contexts killed by a fault.
pub const FAULT_EXIT_STATUS: i32 = 255;

/// Exception class extracted from ESR_EL1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionClass {
    Unknown = 0x00,
    SvcAarch64 = 0x15,
    InstructionAbortLowerEl = 0x20,
    InstructionAbortSameEl = 0x21,
    DataAbortLowerEl = 0x24,
    DataAbortSameEl = 0x25,
    Other = 0xFF,
}

impl From<u64> for ExceptionClass {
    fn from(esr: u64) -> Self {
        let ec = ((esr >> 26) & 0x3F) as u8;
        match ec {
            0x00 => ExceptionClass::Unknown,
            0x15 => ExceptionClass::SvcAarch64,
            0x20 => ExceptionClass::InstructionAbortLowerEl,
            0x21 => ExceptionClass::InstructionAbortSameEl,
            0x24 => ExceptionClass::DataAbortLowerEl,
            0x25 => ExceptionClass::DataAbortSameEl,
            _ => ExceptionClass::Other,
        }
    }
}

/// Handle a synchronous exception taken from user mode.
pub fn handle_lower_el_sync<S: UserMemory>(
    kernel: &mut Kernel<'_, S>,
    ctx: &mut ExecutionContext<S>,
    frame: &mut TrapFrame,
) -> Disposition {
    let ec = ExceptionClass::from(frame.esr);

    match ec {
        ExceptionClass::SvcAarch64 => syscall::dispatch(kernel, ctx, frame),
        ExceptionClass::DataAbortLowerEl | ExceptionClass::InstructionAbortLowerEl => {
            warn!(
                "[EXCEPTION] pid {}: user abort at {:#018x} (pc {:#x}, ESR {:#x})",
                ctx.pid(),
                frame.far,
                frame.elr,
                frame.esr
            );
            proc::exit(&mut *kernel.vm, ctx, FAULT_EXIT_STATUS);
            Disposition::Exit(FAULT_EXIT_STATUS)
        }
        _ => {
            error!(
                "[EXCEPTION] pid {}: unhandled {:?} from user mode (ESR {:#x})",
                ctx.pid(),
                ec,
                frame.esr
            );
            proc::exit(&mut *kernel.vm, ctx, FAULT_EXIT_STATUS);
            Disposition::Exit(FAULT_EXIT_STATUS)
        }
    }
}
