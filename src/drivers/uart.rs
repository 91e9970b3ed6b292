//! PL011 UART Driver for QEMU virt machine
//!
//! Serial console for kernel logging and for the `con:` device user
//! programs reach through read and write.
//!
//! # Memory Map (QEMU virt)
//! - Base address: 0x0900_0000
//! - Register size: 0x1000 bytes
//!
//! # Security Considerations
//! - MMIO is only touched after `init`; before that every access is a no-op
//! - Unsafe code is minimal and well-documented
//! - Uses spinlock for thread-safe access

use core::fmt::{self, Write};
use spin::Mutex;

use crate::config::CONSOLE_DEVICE;
use crate::syscall::{DeviceHandle, DeviceIo, Errno, OpenMode};

/// QEMU virt machine PL011 UART base address
const UART_BASE: usize = 0x0900_0000;

/// PL011 Register offsets
mod regs {
    /// Data Register - read/write data
    pub const DR: usize = 0x00;
    /// Flag Register - status flags
    pub const FR: usize = 0x18;
}

/// Flag Register bits
mod flags {
    /// Receive FIFO empty
    pub const RXFE: u32 = 1 << 4;
    /// Transmit FIFO full
    pub const TXFF: u32 = 1 << 5;
}

/// PL011 UART driver
pub struct Uart {
    base: usize,
    initialized: bool,
}

impl Uart {
    /// Create a new UART instance (not yet initialized)
    pub const fn new(base: usize) -> Self {
        Self {
            base,
            initialized: false,
        }
    }

    /// Initialize the UART
    ///
    /// # Safety
    /// - Must only be called once
    /// - UART base address must be valid and mapped
    ///
    /// SAFETY AUDIT: 2025-01-04
    /// - Base address 0x0900_0000 is guaranteed by QEMU virt machine specification
    pub unsafe fn init(&mut self) {
        // PL011 is already initialized by QEMU, just mark as ready
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn flags(&self) -> u32 {
        // SAFETY: only called once initialized; FR is a read-only MMIO
        // register inside the PL011 window.
        // Audited: 2025-01-04
        unsafe { core::ptr::read_volatile((self.base + regs::FR) as *const u32) }
    }

    /// Write a single byte to the UART
    ///
    /// SAFETY AUDIT: 2025-01-04
    /// - Pointer is constructed from known-valid base address
    /// - Volatile write is appropriate for MMIO
    fn write_byte(&self, byte: u8) {
        if !self.initialized {
            return;
        }

        while self.flags() & flags::TXFF != 0 {
            core::hint::spin_loop();
        }

        // SAFETY: Base address is validated during init()
        // Audited: 2025-01-04
        unsafe {
            core::ptr::write_volatile((self.base + regs::DR) as *mut u32, byte as u32);
        }
    }

    /// Take one byte from the receive FIFO, if any is waiting.
    pub fn try_read_byte(&self) -> Option<u8> {
        if !self.initialized || self.flags() & flags::RXFE != 0 {
            return None;
        }

        // SAFETY: Base address is validated during init(); reading DR pops
        // exactly the byte RXFE said was present.
        // Audited: 2025-01-04
        let data = unsafe { core::ptr::read_volatile((self.base + regs::DR) as *const u32) };
        Some(data as u8)
    }

    /// Write raw bytes, translating `\n` to `\r\n`.
    pub fn write_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }

    /// Write a string to the UART
    pub fn write_str(&self, s: &str) {
        self.write_bytes(s.as_bytes());
    }
}

impl Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Uart::write_str(self, s);
        Ok(())
    }
}

/// Global UART instance protected by spinlock
pub static UART: Mutex<Uart> = Mutex::new(Uart::new(UART_BASE));

/// The `con:` device on top of a UART.
///
/// Reads wait for the first byte and then drain whatever else is already
/// in the FIFO. The UART lock is never held across the wait. Before the
/// UART is initialized reads see end-of-file and writes are swallowed.
pub struct Console<'a> {
    uart: &'a Mutex<Uart>,
    next_handle: u32,
}

impl<'a> Console<'a> {
    pub const fn new(uart: &'a Mutex<Uart>) -> Self {
        Self {
            uart,
            next_handle: 1,
        }
    }
}

impl Console<'static> {
    /// Console on the board's PL011.
    pub const fn system() -> Self {
        Self::new(&UART)
    }
}

impl DeviceIo for Console<'_> {
    fn open(&mut self, device: &str, mode: OpenMode) -> Result<DeviceHandle, Errno> {
        if device != CONSOLE_DEVICE {
            return Err(Errno::Enodev);
        }
        if mode.is_empty() {
            return Err(Errno::Einval);
        }
        let handle = DeviceHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        Ok(handle)
    }

    fn read(&mut self, _handle: DeviceHandle, buf: &mut [u8]) -> Result<usize, Errno> {
        if buf.is_empty() || !self.uart.lock().is_initialized() {
            return Ok(0);
        }

        // The lock is only held for one poll at a time so console output
        // from other contexts keeps flowing while this one waits.
        let first = loop {
            if let Some(byte) = self.uart.lock().try_read_byte() {
                break byte;
            }
            core::hint::spin_loop();
        };
        buf[0] = first;

        let uart = self.uart.lock();
        let mut n = 1;
        while n < buf.len() {
            match uart.try_read_byte() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write(&mut self, _handle: DeviceHandle, buf: &[u8]) -> Result<usize, Errno> {
        self.uart.lock().write_bytes(buf);
        Ok(buf.len())
    }

    fn close(&mut self, _handle: DeviceHandle) {}
}

/// Print macro for kernel output
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut uart = $crate::drivers::uart::UART.lock();
        let _ = write!(uart, $($arg)*);
    }};
}

/// Println macro for kernel output
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}
