//! Saved Trap Frame
//!
//! The register snapshot the trap entry stub pushes before calling into
//! Rust. The layout is shared with assembly and must not change without
//! changing the stub.
//!
//! # Ownership
//! `TrapFrame` is deliberately `Clone` but not `Copy`: duplicating a frame
//! is always an explicit [`TrapFrame::snapshot`] or [`TrapFrame::try_boxed`],
//! never an accident of passing it by value.

use alloc::alloc::{alloc, Layout};
use alloc::boxed::Box;

use static_assertions::const_assert_eq;

use crate::mm::UserAddr;
use crate::syscall::abi::{
    INSTRUCTION_WIDTH, REG_ARGS, REG_CALLNO, REG_ENTRY_ARGV, REG_STATUS, REG_VALUE, STATUS_ERROR,
    STATUS_OK,
};
use crate::syscall::Errno;

/// Register state saved on entry from EL0
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrapFrame {
    /// General purpose registers x0-x30
    pub gpr: [u64; 31],
    /// User stack pointer (SP_EL0)
    pub sp: u64,
    /// Address of the trapping instruction (ELR_EL1 as rewound by the stub)
    pub elr: u64,
    /// Saved Program Status Register
    pub spsr: u64,
    /// Exception Syndrome Register
    pub esr: u64,
    /// Fault Address Register
    pub far: u64,
}

const_assert_eq!(core::mem::size_of::<TrapFrame>(), 36 * 8);

/// Raw argument words as they sit in the frame.
pub type RawArgs = [u64; 4];

impl TrapFrame {
    /// The call number register.
    #[inline]
    pub fn callno(&self) -> usize {
        self.gpr[REG_CALLNO] as usize
    }

    /// The four argument registers.
    #[inline]
    pub fn args(&self) -> RawArgs {
        REG_ARGS.map(|reg| self.gpr[reg])
    }

    /// Encode a handler outcome into the value and status registers.
    pub fn encode(&mut self, result: Result<u64, Errno>) {
        match result {
            Ok(value) => {
                self.gpr[REG_VALUE] = value;
                self.gpr[REG_STATUS] = STATUS_OK;
            }
            Err(errno) => {
                self.gpr[REG_VALUE] = errno.code();
                self.gpr[REG_STATUS] = STATUS_ERROR;
            }
        }
    }

    /// Step the resume address past the trapping instruction.
    #[inline]
    pub fn advance_pc(&mut self) {
        self.elr = self.elr.wrapping_add(INSTRUCTION_WIDTH);
    }

    /// Explicit by-value copy.
    #[inline]
    pub fn snapshot(&self) -> TrapFrame {
        self.clone()
    }

    /// Copy this frame into fresh heap storage, reporting exhaustion
    /// instead of aborting.
    pub fn try_boxed(&self) -> Option<Box<TrapFrame>> {
        let layout = Layout::new::<TrapFrame>();
        // SAFETY: TrapFrame has a non-zero size, so the layout is valid for alloc.
        let raw = unsafe { alloc(layout) } as *mut TrapFrame;
        if raw.is_null() {
            return None;
        }
        // SAFETY:
        // - raw is non-null and was allocated with TrapFrame's layout
        // - write initializes it before Box takes ownership
        // - Box frees with the same global allocator and layout
        // Audited: 2025-01-04
        unsafe {
            raw.write(self.snapshot());
            Some(Box::from_raw(raw))
        }
    }

    /// Initial register state for a freshly loaded program image.
    ///
    /// `x0 = argc`, `x1 = argv`, `sp = stack`, resume at `entry` in EL0t.
    pub fn for_entry(entry: UserAddr, stack: UserAddr, argc: usize, argv: UserAddr) -> Self {
        let mut frame = Self::default();
        frame.gpr[REG_VALUE] = argc as u64;
        frame.gpr[REG_ENTRY_ARGV] = argv.as_u64();
        frame.sp = stack.as_u64();
        frame.elr = entry.as_u64();
        frame.spsr = SPSR_EL0T;
        frame
    }
}

/// SPSR for returning to EL0 with AArch64 state and all interrupts unmasked.
const SPSR_EL0T: u64 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_success_clears_status() {
        let mut frame = TrapFrame::default();
        frame.gpr[REG_STATUS] = 1;
        frame.encode(Ok(42));
        assert_eq!(frame.gpr[REG_VALUE], 42);
        assert_eq!(frame.gpr[REG_STATUS], STATUS_OK);
    }

    #[test]
    fn test_encode_error_sets_status() {
        let mut frame = TrapFrame::default();
        frame.encode(Err(Errno::Efault));
        assert_eq!(frame.gpr[REG_VALUE], Errno::Efault.code());
        assert_eq!(frame.gpr[REG_STATUS], STATUS_ERROR);
    }

    #[test]
    fn test_advance_pc() {
        let mut frame = TrapFrame {
            elr: 0x40_1000,
            ..TrapFrame::default()
        };
        frame.advance_pc();
        assert_eq!(frame.elr, 0x40_1004);
    }

    #[test]
    fn test_try_boxed_is_independent_copy() {
        let mut frame = TrapFrame::default();
        frame.gpr[7] = 0xdead;
        let boxed = frame.try_boxed().unwrap();
        frame.gpr[7] = 0;
        assert_eq!(boxed.gpr[7], 0xdead);
    }

    #[test]
    fn test_for_entry_layout() {
        let frame = TrapFrame::for_entry(
            UserAddr::new(0x40_0000),
            UserAddr::new(0x7fff_f000),
            3,
            UserAddr::new(0x7fff_ff00),
        );
        assert_eq!(frame.elr, 0x40_0000);
        assert_eq!(frame.sp, 0x7fff_f000);
        assert_eq!(frame.gpr[0], 3);
        assert_eq!(frame.gpr[1], 0x7fff_ff00);
        assert_eq!(frame.gpr[8], 0);
    }
}
