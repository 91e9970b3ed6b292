//! Execution contexts
//!
//! An `ExecutionContext` is what the scheduler hands to every core
//! operation explicitly; there is no ambient "current thread". The context
//! is the single owner of its address space.

use core::fmt;
use core::num::NonZeroU32;

/// Process identifier. Zero is reserved for "fork returned in the child".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pid(NonZeroU32);

impl Pid {
    /// Returns `None` for the reserved value 0.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Register-width value handed back to user mode.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0.get() as u64
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pid({})", self.0)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a context is in its life.
///
/// ```text
/// Created ──► Entering ──► User ──► Exited
///  (forked,    (trampoline   (trap/dispatch
///   not run)    running)      cycle)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Spawned with a start state, never scheduled.
    Created,
    /// First run: the child trampoline is installing state.
    Entering,
    /// Running user code between traps.
    User,
    /// Terminated with the given status.
    Exited(i32),
}

/// An independently schedulable unit of control.
#[derive(Debug)]
pub struct ExecutionContext<S> {
    pid: Pid,
    parent: Option<Pid>,
    space: Option<S>,
    lifecycle: Lifecycle,
}

impl<S> ExecutionContext<S> {
    /// A context already running user code in `space`.
    pub fn new(pid: Pid, space: S) -> Self {
        Self {
            pid,
            parent: None,
            space: Some(space),
            lifecycle: Lifecycle::User,
        }
    }

    /// A context created by fork. It owns no space until its trampoline
    /// installs the duplicated one.
    pub fn forked(pid: Pid, parent: Pid) -> Self {
        Self {
            pid,
            parent: Some(parent),
            space: None,
            lifecycle: Lifecycle::Created,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[inline]
    pub fn space(&self) -> Option<&S> {
        self.space.as_ref()
    }

    #[inline]
    pub fn space_mut(&mut self) -> Option<&mut S> {
        self.space.as_mut()
    }

    /// Mark the start of the first run.
    pub(crate) fn begin_entry(&mut self) {
        assert_eq!(
            self.lifecycle,
            Lifecycle::Created,
            "context {} entered twice",
            self.pid
        );
        self.lifecycle = Lifecycle::Entering;
    }

    /// Take ownership of the duplicated space handed over by fork.
    pub(crate) fn install_space(&mut self, space: S) -> &S {
        assert!(
            self.space.is_none(),
            "context {} already owns an address space",
            self.pid
        );
        self.space.insert(space)
    }

    pub(crate) fn enter_user(&mut self) {
        self.lifecycle = Lifecycle::User;
    }

    /// Swap in a new program's space, returning the old one.
    pub(crate) fn replace_space(&mut self, space: S) -> Option<S> {
        self.space.replace(space)
    }

    /// Move to `Exited` and give up the address space for destruction.
    pub(crate) fn terminate(&mut self, status: i32) -> Option<S> {
        self.lifecycle = Lifecycle::Exited(status);
        self.space.take()
    }
}
