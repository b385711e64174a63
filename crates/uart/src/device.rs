use core::ptr::NonNull;

use crate::regs::{Flags, DR, FR};

/// The two register accesses the transmit path needs.
pub trait UartDevice {
    fn read_flags(&mut self) -> Flags;
    fn write_data(&mut self, byte: u8);
}

impl<D: UartDevice + ?Sized> UartDevice for &mut D {
    fn read_flags(&mut self) -> Flags {
        (**self).read_flags()
    }

    fn write_data(&mut self, byte: u8) {
        (**self).write_data(byte)
    }
}

/// Memory-mapped PL011.
#[derive(Debug)]
pub struct Pl011 {
    base: NonNull<u32>,
}

impl Pl011 {
    /// # Safety
    /// - `base` must point to a PL011 register block (or memory laid out like
    ///   one, at least `FR + 4` bytes long) valid for volatile access.
    /// - Only one `Pl011` may exist per register block.
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }

    /// # Safety
    /// Same as [`Pl011::new`]. Returns `None` for a null address.
    pub unsafe fn from_addr(addr: usize) -> Option<Self> {
        NonNull::new(addr as *mut u32).map(|base| unsafe { Self::new(base) })
    }

    pub fn base_address(&self) -> usize {
        self.base.as_ptr() as usize
    }

    fn reg(&self, offset: usize) -> *mut u32 {
        // Offsets are word aligned, see `regs`.
        self.base.as_ptr().wrapping_add(offset / core::mem::size_of::<u32>())
    }
}

impl UartDevice for Pl011 {
    fn read_flags(&mut self) -> Flags {
        let raw = unsafe { self.reg(FR).read_volatile() };
        Flags::from_bits_retain(raw)
    }

    fn write_data(&mut self, byte: u8) {
        unsafe {
            self.reg(DR).write_volatile(u32::from(byte));
        }
    }
}

// The register block is exclusively owned by this handle.
unsafe impl Send for Pl011 {}
