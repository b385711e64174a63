use crate::{SimResult, SimulationError, UartObserver};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{trace, warn};
use virtboot_uart::regs::{DR, FR};
use virtboot_uart::{Flags, UartDevice};

const DR_OFFSET: u64 = DR as u64;
const FR_OFFSET: u64 = FR as u64;

/// Transmit-side timing of the simulated FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoModel {
    pub depth: usize,
    /// Clocks per byte shifted out of the FIFO.
    pub drain_interval: u32,
    /// TXFF is forced on for the first `initial_stall` clocks.
    pub initial_stall: u32,
}

impl Default for FifoModel {
    fn default() -> Self {
        Self {
            depth: 16,
            drain_interval: 1,
            initial_stall: 0,
        }
    }
}

impl From<&virtboot_config::FifoSettings> for FifoModel {
    fn from(fifo: &virtboot_config::FifoSettings) -> Self {
        Self {
            depth: fifo.depth.max(1),
            drain_interval: fifo.drain_interval.max(1),
            initial_stall: fifo.initial_stall,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    FlagRead(Flags),
    DataWrite(u8),
}

/// PL011 transmit path over a register file.
///
/// Every flag read advances the clock by one, as does every external event
/// (`signal_event`). Data writes do not.
#[derive(Debug, Default)]
pub struct SimPl011 {
    model: FifoModel,
    fifo: VecDeque<u8>,
    transmitted: Vec<u8>,
    log: Vec<Access>,
    overruns: Vec<SimulationError>,
    clock: u64,
    events: u64,
    observers: Vec<Arc<dyn UartObserver>>,
}

impl SimPl011 {
    /// A zero `depth` or `drain_interval` is raised to one.
    pub fn new(model: FifoModel) -> Self {
        Self {
            model: FifoModel {
                depth: model.depth.max(1),
                drain_interval: model.drain_interval.max(1),
                ..model
            },
            ..Default::default()
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn UartObserver>) {
        self.observers.push(observer);
    }

    pub fn flags(&self) -> Flags {
        let mut flags = Flags::RXFE;
        if self.fifo.len() >= self.model.depth || self.clock < u64::from(self.model.initial_stall)
        {
            flags |= Flags::TXFF;
        }
        if self.fifo.is_empty() {
            flags |= Flags::TXFE;
        } else {
            flags |= Flags::BUSY;
        }
        flags
    }

    fn read_flag_register(&mut self) -> Flags {
        let flags = self.flags();
        self.log.push(Access::FlagRead(flags));
        if flags.tx_full() {
            trace!(clock = self.clock, "TX FIFO full");
        }
        for observer in &self.observers {
            observer.on_flag_read(flags);
        }
        self.tick_clock();
        flags
    }

    fn write_data_register(&mut self, byte: u8) -> SimResult<()> {
        self.log.push(Access::DataWrite(byte));
        let full = self.flags().tx_full();
        for observer in &self.observers {
            observer.on_data_write(byte, full);
        }

        if full {
            let err = SimulationError::FifoOverrun(byte);
            warn!(clock = self.clock, "{}", err);
            self.overruns.push(err.clone());
            return Err(err);
        }
        self.fifo.push_back(byte);
        Ok(())
    }

    fn tick_clock(&mut self) {
        self.clock += 1;
        if self.clock % u64::from(self.model.drain_interval) == 0 {
            if let Some(byte) = self.fifo.pop_front() {
                self.transmitted.push(byte);
            }
        }
    }

    /// An event unrelated to the UART (timer, another core's `sev`, ...).
    /// Time passes, no register is accessed.
    pub fn signal_event(&mut self) {
        self.events += 1;
        self.tick_clock();
    }

    /// Shift out everything still queued.
    pub fn flush(&mut self) {
        self.transmitted.extend(self.fifo.drain(..));
    }

    /// Bytes software wrote to DR, in order, including overruns.
    pub fn data_writes(&self) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|access| match access {
                Access::DataWrite(byte) => Some(*byte),
                Access::FlagRead(_) => None,
            })
            .collect()
    }

    /// Bytes that left the FIFO on the wire.
    pub fn transmitted(&self) -> &[u8] {
        &self.transmitted
    }

    pub fn queued(&self) -> usize {
        self.fifo.len()
    }

    pub fn log(&self) -> &[Access] {
        &self.log
    }

    pub fn access_count(&self) -> usize {
        self.log.len()
    }

    pub fn flag_reads(&self) -> usize {
        self.log
            .iter()
            .filter(|access| matches!(access, Access::FlagRead(_)))
            .count()
    }

    pub fn overruns(&self) -> &[SimulationError] {
        &self.overruns
    }

    pub fn events(&self) -> u64 {
        self.events
    }
}

impl crate::Peripheral for SimPl011 {
    fn read(&mut self, offset: u64) -> SimResult<u32> {
        match offset {
            // No receive path: reads of DR return an empty character.
            DR_OFFSET => Ok(0),
            FR_OFFSET => Ok(self.read_flag_register().bits()),
            _ => Err(SimulationError::UnmappedRegister(offset)),
        }
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        match offset {
            DR_OFFSET => self.write_data_register((value & 0xFF) as u8),
            FR_OFFSET => Err(SimulationError::ReadOnlyRegister(offset)),
            _ => Err(SimulationError::UnmappedRegister(offset)),
        }
    }
}

impl UartDevice for SimPl011 {
    fn read_flags(&mut self) -> Flags {
        self.read_flag_register()
    }

    fn write_data(&mut self, byte: u8) {
        // Already logged and recorded in `overruns`.
        let _ = self.write_data_register(byte);
    }
}
