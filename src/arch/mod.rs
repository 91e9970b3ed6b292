//! AArch64 CPU state used at the syscall boundary
//!
//! Two things cross from Rust into the hardware here: reading the
//! interrupt mask (DAIF) for the dispatcher's entry/exit check, and the
//! one-way return to EL0 that consumes a finished frame.

use bitflags::bitflags;

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
use crate::proc::UserResume;

bitflags! {
    /// DAIF exception mask bits. Empty means every exception is enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Daif: u64 {
        /// Debug exceptions masked
        const D = 1 << 9;
        /// SError masked
        const A = 1 << 8;
        /// IRQ masked
        const I = 1 << 7;
        /// FIQ masked
        const F = 1 << 6;
    }
}

/// Source of the current exception mask.
pub trait InterruptControl {
    fn masked(&self) -> Daif;

    /// True when no exception class is masked.
    fn fully_enabled(&self) -> bool {
        self.masked().is_empty()
    }
}

/// The executing CPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cpu;

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
impl InterruptControl for Cpu {
    fn masked(&self) -> Daif {
        let daif: u64;
        // SAFETY: reading DAIF has no side effects and is permitted at EL1.
        // Audited: 2025-01-04
        unsafe {
            core::arch::asm!("mrs {d}, daif", d = out(reg) daif, options(nomem, nostack, preserves_flags));
        }
        Daif::from_bits_truncate(daif)
    }
}

/// Hosted builds have no exception mask to read.
#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
impl InterruptControl for Cpu {
    fn masked(&self) -> Daif {
        Daif::empty()
    }
}

/// Restore `resume`'s registers and `eret` to EL0. Never returns.
#[cfg(all(target_arch = "aarch64", target_os = "none"))]
pub fn enter_user(resume: UserResume) -> ! {
    extern "C" {
        /// Exit half of the trap entry stub: reloads a saved frame and erets.
        fn __trap_restore(frame: *const crate::frame::TrapFrame) -> !;
    }

    let frame = resume.into_frame();
    // SAFETY:
    // - frame has the #[repr(C)] layout the stub expects
    // - __trap_restore copies it onto the kernel stack before eret, so the
    //   local going out of scope afterwards is irrelevant (it never does)
    // Audited: 2025-01-04
    unsafe { __trap_restore(&frame) }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Masked(Daif);

    impl InterruptControl for Masked {
        fn masked(&self) -> Daif {
            self.0
        }
    }

    #[test]
    fn test_fully_enabled() {
        assert!(Masked(Daif::empty()).fully_enabled());
        assert!(!Masked(Daif::I).fully_enabled());
        assert!(!Masked(Daif::D | Daif::A).fully_enabled());
    }

    #[test]
    fn test_daif_bits() {
        assert_eq!(Daif::from_bits_truncate(0x3c0), Daif::all());
        assert_eq!(Daif::from_bits_truncate(0x80), Daif::I);
    }
}
