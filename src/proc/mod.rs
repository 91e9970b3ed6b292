//! Process management at the syscall boundary
//!
//! - [`ExecutionContext`]: the explicit handle every operation receives
//! - [`fork`]: duplicate the caller into a new schedulable context
//! - [`child_entry`]: the one-shot trampoline a fork child starts in
//! - [`execv`]: replace the caller's program image
//!
//! Run queues and context switching belong to the scheduler, reached only
//! through [`Scheduler::spawn`].

mod context;
mod exec;
mod fork;
mod sched;
mod trampoline;

use log::debug;

use crate::mm::AddressSpaceManager;

pub use context::{ExecutionContext, Lifecycle, Pid};
pub use exec::{copy_in_args, execv, ArgVector, LoadedImage, Loader, UserEntry};
pub use fork::fork;
pub use sched::{
    ChildStart, EntryFn, Scheduler, SpawnError, SpawnRejected, StartState, UserResume,
};
pub use trampoline::child_entry;

/// Terminate `ctx` and destroy the address space it owned.
pub fn exit<S>(vm: &mut dyn AddressSpaceManager<Space = S>, ctx: &mut ExecutionContext<S>, status: i32) {
    if let Some(space) = ctx.terminate(status) {
        vm.destroy(space);
    }
    debug!("[PROCESS] pid {} exited with status {}", ctx.pid(), status);
}
