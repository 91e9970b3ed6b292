//! In-crate collaborators for unit tests.

use alloc::ffi::CString;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::arch::{Daif, InterruptControl};
use crate::config::KernelConfig;
use crate::frame::TrapFrame;
use crate::mm::{AddressSpaceManager, Fault, UserAddr, UserMemory, VmError};
use crate::proc::{
    ArgVector, ExecutionContext, LoadedImage, Loader, Pid, Scheduler, SpawnError, SpawnRejected,
    StartState, UserResume,
};
use crate::syscall::{self, DeviceHandle, DeviceIo, Disposition, Errno, Kernel, OpenMode};

/// Address space backed by a list of byte regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSpace {
    pub id: u32,
    regions: Vec<(usize, Vec<u8>)>,
}

impl MockSpace {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            regions: Vec::new(),
        }
    }

    pub fn map(&mut self, base: usize, bytes: &[u8]) {
        self.regions.push((base, bytes.to_vec()));
    }

    fn locate(&self, addr: UserAddr, len: usize) -> Result<(usize, usize), Fault> {
        let start = addr.as_usize();
        for (i, (base, bytes)) in self.regions.iter().enumerate() {
            if start >= *base && start - base + len <= bytes.len() {
                return Ok((i, start - base));
            }
        }
        Err(Fault { addr })
    }
}

impl UserMemory for MockSpace {
    fn copy_in(&self, src: UserAddr, dst: &mut [u8]) -> Result<(), Fault> {
        let (i, off) = self.locate(src, dst.len())?;
        dst.copy_from_slice(&self.regions[i].1[off..off + dst.len()]);
        Ok(())
    }

    fn copy_out(&mut self, dst: UserAddr, src: &[u8]) -> Result<(), Fault> {
        let (i, off) = self.locate(dst, src.len())?;
        self.regions[i].1[off..off + src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// Address-space manager that counts what it creates and destroys.
#[derive(Debug)]
pub struct MockVm {
    next_id: u32,
    pub live: isize,
    pub destroyed: usize,
    pub active: Option<u32>,
    pub fail_duplicate: bool,
}

impl MockVm {
    pub fn new() -> Self {
        Self {
            next_id: 100,
            live: 0,
            destroyed: 0,
            active: None,
            fail_duplicate: false,
        }
    }
}

impl AddressSpaceManager for MockVm {
    type Space = MockSpace;

    fn duplicate(&mut self, space: &MockSpace) -> Result<MockSpace, VmError> {
        if self.fail_duplicate {
            return Err(VmError::OutOfMemory);
        }
        let mut copy = space.clone();
        copy.id = self.next_id;
        self.next_id += 1;
        self.live += 1;
        Ok(copy)
    }

    fn activate(&mut self, space: &MockSpace) {
        self.active = Some(space.id);
    }

    fn destroy(&mut self, _space: MockSpace) {
        self.live -= 1;
        self.destroyed += 1;
    }
}

/// Scheduler that keeps spawned contexts in a list until run.
pub struct MockScheduler {
    capacity: usize,
    pub next_pid: u32,
    pub spawned: Vec<(ExecutionContext<MockSpace>, Option<StartState<MockSpace>>)>,
}

impl MockScheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_pid: 2,
            spawned: Vec::new(),
        }
    }

    fn index(&self, pid: Pid) -> usize {
        self.spawned
            .iter()
            .position(|(ctx, _)| ctx.pid() == pid)
            .unwrap()
    }

    /// Switch `pid` in for the first time.
    pub fn run_first(&mut self, pid: Pid, vm: &mut MockVm) -> UserResume {
        let i = self.index(pid);
        let (ctx, start) = &mut self.spawned[i];
        start.take().unwrap().run(ctx, vm)
    }

    pub fn context(&self, pid: Pid) -> &ExecutionContext<MockSpace> {
        &self.spawned[self.index(pid)].0
    }

    pub fn take_context(&mut self, pid: Pid) -> ExecutionContext<MockSpace> {
        let i = self.index(pid);
        self.spawned.remove(i).0
    }
}

impl Scheduler<MockSpace> for MockScheduler {
    fn spawn(
        &mut self,
        parent: Pid,
        start: StartState<MockSpace>,
    ) -> Result<Pid, SpawnRejected<MockSpace>> {
        if self.spawned.len() >= self.capacity {
            return Err(SpawnRejected {
                reason: SpawnError::ProcessTableFull,
                start,
            });
        }
        let pid = Pid::new(self.next_pid).unwrap();
        self.next_pid += 1;
        self.spawned
            .push((ExecutionContext::forked(pid, parent), Some(start)));
        Ok(pid)
    }
}

/// Loader that records requests and hands out empty spaces.
pub struct MockLoader {
    next_id: u32,
    pub fail: Option<Errno>,
    pub loaded: Vec<(CString, Vec<CString>)>,
}

impl MockLoader {
    pub const ENTRY: UserAddr = UserAddr::new(0x40_0000);
    pub const STACK: UserAddr = UserAddr::new(0x7fff_f000);
    pub const ARGV: UserAddr = UserAddr::new(0x7fff_ff00);

    pub fn new() -> Self {
        Self {
            next_id: 500,
            fail: None,
            loaded: Vec::new(),
        }
    }
}

impl Loader<MockSpace> for MockLoader {
    fn load(&mut self, path: &CString, argv: &ArgVector) -> Result<LoadedImage<MockSpace>, Errno> {
        if let Some(err) = self.fail {
            return Err(err);
        }
        self.loaded
            .push((path.clone(), argv.iter().cloned().collect()));
        let space = MockSpace::new(self.next_id);
        self.next_id += 1;
        Ok(LoadedImage {
            space,
            entry: Self::ENTRY,
            stack: Self::STACK,
            argv: Self::ARGV,
        })
    }
}

/// Console with scripted input and captured output.
#[derive(Debug, Default)]
pub struct MockConsole {
    pub input: Vec<u8>,
    pub output: Vec<u8>,
    pub opens: usize,
    pub open_handles: usize,
    pub last_mode: Option<OpenMode>,
}

impl MockConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceIo for MockConsole {
    fn open(&mut self, device: &str, mode: OpenMode) -> Result<DeviceHandle, Errno> {
        if device != crate::config::CONSOLE_DEVICE {
            return Err(Errno::Enodev);
        }
        self.opens += 1;
        self.open_handles += 1;
        self.last_mode = Some(mode);
        Ok(DeviceHandle(self.opens as u32))
    }

    fn read(&mut self, _handle: DeviceHandle, buf: &mut [u8]) -> Result<usize, Errno> {
        let n = buf.len().min(self.input.len());
        buf[..n].copy_from_slice(&self.input[..n]);
        self.input.drain(..n);
        Ok(n)
    }

    fn write(&mut self, _handle: DeviceHandle, buf: &[u8]) -> Result<usize, Errno> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self, _handle: DeviceHandle) {
        self.open_handles -= 1;
    }
}

/// Exception mask under test control.
///
/// `then` replaces the mask after the first read, which lets a test mask
/// exceptions part-way through a dispatch.
#[derive(Debug)]
pub struct MockIrq {
    pub mask: Cell<Daif>,
    pub then: Option<Daif>,
}

impl MockIrq {
    pub fn new(mask: Daif) -> Self {
        Self {
            mask: Cell::new(mask),
            then: None,
        }
    }
}

impl InterruptControl for MockIrq {
    fn masked(&self) -> Daif {
        let now = self.mask.get();
        if let Some(next) = self.then {
            self.mask.set(next);
        }
        now
    }
}

/// A full set of collaborators.
pub struct Rig {
    pub vm: MockVm,
    pub sched: MockScheduler,
    pub loader: MockLoader,
    pub console: MockConsole,
    pub irq: MockIrq,
    pub config: KernelConfig,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            vm: MockVm::new(),
            sched: MockScheduler::new(16),
            loader: MockLoader::new(),
            console: MockConsole::new(),
            irq: MockIrq::new(Daif::empty()),
            config: KernelConfig::default(),
        }
    }

    pub fn kernel(&mut self) -> Kernel<'_, MockSpace> {
        Kernel {
            vm: &mut self.vm,
            sched: &mut self.sched,
            loader: &mut self.loader,
            devices: &mut self.console,
            irq: &self.irq,
            config: &self.config,
        }
    }

    pub fn dispatch(
        &mut self,
        ctx: &mut ExecutionContext<MockSpace>,
        frame: &mut TrapFrame,
    ) -> Disposition {
        let mut kernel = self.kernel();
        syscall::dispatch(&mut kernel, ctx, frame)
    }
}
