//! System Call Handler
//!
//! Dispatches decoded system calls and encodes their outcome.
//!
//! # Invariants
//! - Exceptions are fully unmasked on entry and on return; anything else
//!   is a kernel bug and panics
//! - Every path that resumes the caller's image steps `elr` past the
//!   `svc`; only exit (which never resumes) and a successful execv (which
//!   resumes a different image) skip it

use log::{debug, info, trace, warn};

use super::decode::{RebootMode, Syscall};
use super::{io, Errno, Kernel};
use crate::frame::TrapFrame;
use crate::mm::UserMemory;
use crate::proc::{self, ExecutionContext, UserEntry};

/// What the scheduler glue does after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Restore the (updated) frame and return to user mode.
    Resume,
    /// The context is gone; its space has been destroyed.
    Exit(i32),
    /// The frame is encoded; the platform should now act on the request.
    Reboot(RebootMode),
}

/// Handler outcome before it is written into the frame.
enum Outcome {
    Return(u64),
    Exit(i32),
    Reboot(RebootMode),
    Replaced(UserEntry),
}

/// Dispatch the system call trapped in `frame` on behalf of `ctx`.
pub fn dispatch<S: UserMemory>(
    kernel: &mut Kernel<'_, S>,
    ctx: &mut ExecutionContext<S>,
    frame: &mut TrapFrame,
) -> Disposition {
    assert!(
        kernel.irq.fully_enabled(),
        "syscall entered with exceptions masked ({:?})",
        kernel.irq.masked()
    );

    let callno = frame.callno();
    let outcome = match Syscall::decode(frame) {
        Ok(call) => {
            trace!("[SYSCALL] pid {}: {:?}", ctx.pid(), call);
            execute(kernel, ctx, frame, call).map_err(|err| {
                debug!("[SYSCALL] pid {}: {} failed: {}", ctx.pid(), call.name(), err);
                err
            })
        }
        Err(err) => {
            warn!("[SYSCALL] pid {}: rejected syscall {}: {}", ctx.pid(), callno, err);
            Err(err)
        }
    };

    let disposition = match outcome {
        Ok(Outcome::Return(value)) => {
            frame.encode(Ok(value));
            frame.advance_pc();
            Disposition::Resume
        }
        Err(err) => {
            frame.encode(Err(err));
            frame.advance_pc();
            Disposition::Resume
        }
        Ok(Outcome::Reboot(mode)) => {
            frame.encode(Ok(0));
            frame.advance_pc();
            Disposition::Reboot(mode)
        }
        Ok(Outcome::Replaced(entry)) => {
            *frame = TrapFrame::for_entry(entry.entry, entry.stack, entry.argc, entry.argv);
            Disposition::Resume
        }
        Ok(Outcome::Exit(status)) => {
            proc::exit(&mut *kernel.vm, ctx, status);
            Disposition::Exit(status)
        }
    };

    assert!(
        kernel.irq.fully_enabled(),
        "syscall {} returned with exceptions masked ({:?})",
        callno,
        kernel.irq.masked()
    );
    disposition
}

fn execute<S: UserMemory>(
    kernel: &mut Kernel<'_, S>,
    ctx: &mut ExecutionContext<S>,
    frame: &TrapFrame,
    call: Syscall,
) -> Result<Outcome, Errno> {
    match call {
        Syscall::Exit { status } => Ok(Outcome::Exit(status)),
        Syscall::Reboot { mode } => {
            info!("[SYSCALL] pid {} requested {:?}", ctx.pid(), mode);
            Ok(Outcome::Reboot(mode))
        }
        Syscall::Write { fd, buf, len } => {
            let space = ctx.space().ok_or(Errno::Efault)?;
            io::sys_write(space, &mut *kernel.devices, kernel.config, fd, buf, len)
                .map(|n| Outcome::Return(n as u64))
        }
        Syscall::Read { fd, buf, len } => {
            let space = ctx.space_mut().ok_or(Errno::Efault)?;
            io::sys_read(space, &mut *kernel.devices, kernel.config, fd, buf, len)
                .map(|n| Outcome::Return(n as u64))
        }
        Syscall::Fork => proc::fork(&mut *kernel.vm, &mut *kernel.sched, ctx, frame)
            .map(|child| Outcome::Return(child.as_u64())),
        Syscall::Getpid => Ok(Outcome::Return(ctx.pid().as_u64())),
        Syscall::Execv { path, argv } => proc::execv(
            &mut *kernel.vm,
            &mut *kernel.loader,
            kernel.config,
            ctx,
            path,
            argv,
        )
        .map(Outcome::Replaced),
    }
}
