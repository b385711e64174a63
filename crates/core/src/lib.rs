pub mod metrics;
pub mod peripherals;
pub mod runner;

use virtboot_uart::Flags;


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Data register written while TX FIFO full (byte {0:#04x} lost)")]
    FifoOverrun(u8),
    #[error("Unmapped register offset {0:#x}")]
    UnmappedRegister(u64),
    #[error("Write to read-only register at offset {0:#x}")]
    ReadOnlyRegister(u64),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait for observing UART register traffic in a modular way.
pub trait UartObserver: std::fmt::Debug + Send + Sync {
    fn on_flag_read(&self, _flags: Flags) {}
    fn on_data_write(&self, _byte: u8, _fifo_full: bool) {}
}

/// Trait representing a memory-mapped peripheral with 32-bit registers
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&mut self, offset: u64) -> SimResult<u32>;
    fn write(&mut self, offset: u64, value: u32) -> SimResult<()>;
}

pub use metrics::TransmitMetrics;
pub use peripherals::{Access, FifoModel, SimPl011};
pub use runner::{run_scenario, transmit_config, AssertionResult, RunReport, RunStatus};
