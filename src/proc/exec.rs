//! Program replacement (execv)
//!
//! Marshals the path and argument vector out of user memory, then hands
//! them to the loader. Nothing reaches the loader until every string has
//! been copied; a fault anywhere leaves the old image running untouched.

use alloc::ffi::CString;
use alloc::vec::Vec;
use core::mem::size_of;

use log::{debug, warn};

use super::ExecutionContext;
use crate::config::KernelConfig;
use crate::mm::{copy_in_str, copy_in_word, AddressSpaceManager, UserAddr, UserMemory};
use crate::syscall::{validate_user_range, Errno};

/// Kernel-owned argument vector. Each element is independently
/// NUL-terminated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ArgVector {
    args: Vec<CString>,
}

impl ArgVector {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CString> {
        self.args.iter()
    }

    /// Bytes needed to store every argument including terminators.
    pub fn total_bytes(&self) -> usize {
        self.args.iter().map(|a| a.as_bytes_with_nul().len()).sum()
    }
}

/// A program image built by the loader, not yet installed.
#[derive(Debug)]
pub struct LoadedImage<S> {
    /// Fresh address space containing the program and its stack.
    pub space: S,
    /// Program entry point.
    pub entry: UserAddr,
    /// Initial stack pointer.
    pub stack: UserAddr,
    /// User address of the argv array the loader laid out on the stack.
    pub argv: UserAddr,
}

/// Where a replaced context resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserEntry {
    pub entry: UserAddr,
    pub stack: UserAddr,
    pub argc: usize,
    pub argv: UserAddr,
}

/// Executable loader, as consumed by execv.
pub trait Loader<S> {
    /// Build a new address space for `path` with `argv` on its stack.
    /// Load failures (missing file, bad format) come back as errno.
    fn load(&mut self, path: &CString, argv: &ArgVector) -> Result<LoadedImage<S>, Errno>;
}

/// Collect the user argv array into kernel memory.
///
/// Scans pointer words until a null entry, bounded by `max_args`. Each
/// string is copied against the remaining `arg_max` byte budget. Every
/// pointer, table slots included, must lie in the user window.
pub fn copy_in_args<M>(mem: &M, argv: UserAddr, config: &KernelConfig) -> Result<ArgVector, Errno>
where
    M: UserMemory + ?Sized,
{
    let region = &config.user_region;
    validate_user_range(region, argv, size_of::<usize>())?;

    let mut ptrs = Vec::new();
    loop {
        let slot = ptrs
            .len()
            .checked_mul(size_of::<usize>())
            .and_then(|off| argv.checked_add(off))
            .ok_or(Errno::Efault)?;
        validate_user_range(region, slot, size_of::<usize>())?;
        let ptr = UserAddr::new(copy_in_word(mem, slot)?);
        if ptr.is_null() {
            break;
        }
        if ptrs.len() == config.max_args {
            return Err(Errno::E2big);
        }
        validate_user_range(region, ptr, 1)?;
        ptrs.try_reserve(1)?;
        ptrs.push(ptr);
    }

    let mut args = Vec::new();
    args.try_reserve_exact(ptrs.len())?;
    let mut budget = config.arg_max;
    for ptr in ptrs {
        let arg = copy_in_str(mem, ptr, budget).map_err(|err| match err {
            Errno::Enametoolong => Errno::E2big,
            other => other,
        })?;
        budget -= arg.as_bytes_with_nul().len();
        args.push(arg);
    }

    Ok(ArgVector { args })
}

/// Replace the program running in `ctx`.
///
/// On success the old space has been destroyed and the new one is active;
/// the caller must resume at the returned entry, not at the old `svc`.
pub fn execv<S, L>(
    vm: &mut dyn AddressSpaceManager<Space = S>,
    loader: &mut L,
    config: &KernelConfig,
    ctx: &mut ExecutionContext<S>,
    path: UserAddr,
    argv: UserAddr,
) -> Result<UserEntry, Errno>
where
    S: UserMemory,
    L: Loader<S> + ?Sized,
{
    let space = ctx.space().ok_or(Errno::Efault)?;

    validate_user_range(&config.user_region, path, 1)?;
    let path = copy_in_str(space, path, config.path_max)?;
    if path.as_bytes().is_empty() {
        return Err(Errno::Einval);
    }
    let args = copy_in_args(space, argv, config)?;

    let image = loader.load(&path, &args).map_err(|err| {
        warn!("[EXEC] pid {}: load {:?} failed: {}", ctx.pid(), path, err);
        err
    })?;

    let entry = UserEntry {
        entry: image.entry,
        stack: image.stack,
        argc: args.len(),
        argv: image.argv,
    };

    if let Some(old) = ctx.replace_space(image.space) {
        vm.destroy(old);
    }
    if let Some(space) = ctx.space() {
        vm.activate(space);
    }

    debug!(
        "[EXEC] pid {}: {:?} argc={} ({} bytes) entry={}",
        ctx.pid(),
        path,
        entry.argc,
        args.total_bytes(),
        entry.entry
    );
    Ok(entry)
}
