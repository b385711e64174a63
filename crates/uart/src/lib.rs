//! PL011 transmit path for the QEMU `virt` machine.
//!
//! Raw register access lives in [`device::Pl011`]; everything above it works
//! against the [`UartDevice`] trait so the same logic runs on the target and
//! against a simulated register file.
#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod device;
pub mod poll;
pub mod regs;
pub mod shared;
pub mod transmitter;

pub use boot::BootStub;
pub use device::{Pl011, UartDevice};
pub use poll::PollStrategy;
pub use regs::Flags;
pub use shared::SharedTransmitter;
pub use transmitter::{TransmitConfig, UartTransmitter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    #[error("transmit FIFO still full after {polls} polls")]
    Timeout { polls: u32 },
}

pub type TxResult<T> = Result<T, TxError>;
