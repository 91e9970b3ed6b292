//! Scheduler hand-off types
//!
//! The run queue and context switch belong to the scheduler. What this
//! core defines is the value a new context starts from, and the one-way
//! token that carries a finished frame to the user-mode return path.

use alloc::boxed::Box;
use core::fmt;

use super::{ExecutionContext, Pid};
use crate::frame::TrapFrame;
use crate::mm::AddressSpaceManager;

/// First function run by a new context instead of returning from a call.
pub type EntryFn<S> =
    fn(&mut ExecutionContext<S>, &mut dyn AddressSpaceManager<Space = S>, ChildStart<S>) -> UserResume;

/// Payload fork hands to its child: the frame copy and the duplicated
/// space, both owned by nobody else.
///
/// Neither `Clone` nor `Copy`. Once moved into [`Scheduler::spawn`] the
/// parent has no way back to it.
#[derive(Debug)]
pub struct ChildStart<S> {
    pub(crate) frame: Box<TrapFrame>,
    pub(crate) space: S,
}

impl<S> ChildStart<S> {
    pub(crate) fn new(frame: Box<TrapFrame>, space: S) -> Self {
        Self { frame, space }
    }

    /// The frame the child will resume from (before trampoline fix-ups).
    pub fn frame(&self) -> &TrapFrame {
        &self.frame
    }
}

/// How a context begins executing the first time it is switched in.
pub enum StartState<S> {
    /// Restore a saved register state (ordinary switch-in).
    Resume(Box<TrapFrame>),
    /// Call `entry` with its argument (fork children).
    Entry { entry: EntryFn<S>, arg: ChildStart<S> },
}

impl<S> StartState<S> {
    /// Run the start state on `ctx`, producing the frame to enter user
    /// mode with.
    pub fn run(
        self,
        ctx: &mut ExecutionContext<S>,
        vm: &mut dyn AddressSpaceManager<Space = S>,
    ) -> UserResume {
        match self {
            Self::Resume(frame) => UserResume::new(*frame),
            Self::Entry { entry, arg } => entry(ctx, vm, arg),
        }
    }
}

impl<S> fmt::Debug for StartState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resume(frame) => write!(f, "Resume(elr={:#x})", frame.elr),
            Self::Entry { arg, .. } => write!(f, "Entry(elr={:#x})", arg.frame.elr),
        }
    }
}

/// Register state ready for `eret`. Only the arch return path consumes it.
#[must_use = "a UserResume must be handed to the user-mode return path"]
#[derive(Debug)]
pub struct UserResume {
    frame: TrapFrame,
}

impl UserResume {
    pub(crate) fn new(frame: TrapFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &TrapFrame {
        &self.frame
    }

    pub fn into_frame(self) -> TrapFrame {
        self.frame
    }
}

/// Why the scheduler refused to create a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// No memory for the context's kernel stack or control block.
    OutOfMemory,
    /// Every pid is in use.
    ProcessTableFull,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::ProcessTableFull => write!(f, "process table full"),
        }
    }
}

/// A refused spawn gives the start state back so the caller can roll back.
#[derive(Debug)]
pub struct SpawnRejected<S> {
    pub reason: SpawnError,
    pub start: StartState<S>,
}

/// Context creation, as consumed by fork.
pub trait Scheduler<S> {
    /// Create a runnable child of `parent` whose first execution is
    /// `start`. No pid is observably consumed on failure.
    fn spawn(&mut self, parent: Pid, start: StartState<S>) -> Result<Pid, SpawnRejected<S>>;
}
