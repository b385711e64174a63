//! PL011 register map as exposed by QEMU `virt`.

use bitflags::bitflags;

/// Physical address of UART0 on QEMU `virt`.
pub const UART0_BASE: usize = 0x0900_0000;

/// Data register offset. Only the low byte is significant on write.
pub const DR: usize = 0x00;
/// Flag register offset.
pub const FR: usize = 0x18;

bitflags! {
    /// Flag register (UARTFR) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u32 {
        const CTS = 1 << 0;
        const BUSY = 1 << 3;
        /// Receive FIFO empty
        const RXFE = 1 << 4;
        /// Transmit FIFO full
        const TXFF = 1 << 5;
        const RXFF = 1 << 6;
        /// Transmit FIFO empty
        const TXFE = 1 << 7;
    }
}

impl Flags {
    pub fn tx_full(self) -> bool {
        self.contains(Flags::TXFF)
    }
}
