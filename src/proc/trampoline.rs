//! Child entry trampoline
//!
//! The first and only function a forked context runs before user mode.
//! It is never called for any other purpose.

use log::trace;

use super::sched::{ChildStart, UserResume};
use super::ExecutionContext;
use crate::mm::AddressSpaceManager;

/// Finish a fork on the child's side.
///
/// 1. Take ownership of the duplicated space and make it current
/// 2. Make the copied frame report "fork returned 0, no error"
/// 3. Step past the `svc` so the child does not fork again
///
/// The heap copy of the frame is consumed here; the returned token is the
/// only remaining copy and goes straight to the user-mode return path.
pub fn child_entry<S>(
    ctx: &mut ExecutionContext<S>,
    vm: &mut dyn AddressSpaceManager<Space = S>,
    start: ChildStart<S>,
) -> UserResume {
    ctx.begin_entry();

    let ChildStart { frame, space } = start;
    let space = ctx.install_space(space);
    vm.activate(space);

    let mut frame = *frame;
    frame.encode(Ok(0));
    frame.advance_pc();

    ctx.enter_user();
    trace!(
        "[FORK] child {} entering user mode at {:#x}",
        ctx.pid(),
        frame.elr
    );
    UserResume::new(frame)
}
