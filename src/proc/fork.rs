//! Process duplication (fork)
//!
//! All-or-nothing from the caller's point of view: every failure path
//! releases what was allocated so far and leaves the caller's frame and
//! space exactly as they were.

use log::{debug, warn};

use super::sched::{ChildStart, Scheduler, SpawnRejected, StartState};
use super::trampoline::child_entry;
use super::{ExecutionContext, Pid};
use crate::frame::TrapFrame;
use crate::mm::AddressSpaceManager;
use crate::syscall::Errno;

/// Duplicate the calling context.
///
/// Returns the child's pid to the parent. The child never returns from
/// here; it starts in [`child_entry`] when the scheduler first runs it.
pub fn fork<S>(
    vm: &mut dyn AddressSpaceManager<Space = S>,
    sched: &mut dyn Scheduler<S>,
    ctx: &ExecutionContext<S>,
    frame: &TrapFrame,
) -> Result<Pid, Errno> {
    let space = ctx.space().ok_or_else(|| {
        warn!("[FORK] pid {} has no address space", ctx.pid());
        Errno::Einval
    })?;

    let child_frame = frame.try_boxed().ok_or_else(|| {
        warn!("[FORK] pid {}: no memory for frame copy", ctx.pid());
        Errno::Enomem
    })?;

    // child_frame is dropped on this error path.
    let child_space = vm.duplicate(space).map_err(|err| {
        warn!("[FORK] pid {}: address space copy failed: {}", ctx.pid(), err);
        Errno::Enomem
    })?;

    let start = StartState::Entry {
        entry: child_entry::<S>,
        arg: ChildStart::new(child_frame, child_space),
    };

    match sched.spawn(ctx.pid(), start) {
        Ok(child) => {
            debug!("[FORK] pid {} -> child {}", ctx.pid(), child);
            Ok(child)
        }
        Err(SpawnRejected { reason, start }) => {
            warn!("[FORK] pid {}: spawn refused: {}", ctx.pid(), reason);
            match start {
                StartState::Entry { arg, .. } => vm.destroy(arg.space),
                StartState::Resume(_) => {}
            }
            Err(reason.into())
        }
    }
}
