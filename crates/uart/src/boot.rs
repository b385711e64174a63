//! Boot sequence: print the banner once, then idle forever.

use crate::device::UartDevice;
use crate::poll::PollStrategy;
use crate::transmitter::UartTransmitter;
use crate::TxResult;

pub struct BootStub<'a, D> {
    tx: UartTransmitter<D>,
    banner: &'a str,
    booted: bool,
}

impl<'a, D: UartDevice> BootStub<'a, D> {
    pub fn new(tx: UartTransmitter<D>, banner: &'a str) -> Self {
        Self {
            tx,
            banner,
            booted: false,
        }
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Prints the banner. Only the first call transmits anything.
    pub fn boot(&mut self) {
        if !self.booted {
            self.booted = true;
            self.tx.print(self.banner);
        }
    }

    /// [`boot`](Self::boot) with a per-byte poll budget. A timed out banner
    /// still counts as booted; it is not retried.
    pub fn boot_bounded(&mut self, max_polls: u32) -> TxResult<()> {
        if self.booted {
            return Ok(());
        }
        self.booted = true;
        self.tx.write_bytes_bounded(self.banner.as_bytes(), max_polls)
    }

    /// One pass of the idle loop. Sleeps until the next event and touches no
    /// register, whatever woke the core.
    pub fn idle_tick(&self) {
        PollStrategy::WaitForEvent.relax();
    }

    pub fn run(mut self) -> ! {
        self.boot();
        loop {
            self.idle_tick();
        }
    }

    pub fn transmitter(&self) -> &UartTransmitter<D> {
        &self.tx
    }

    pub fn transmitter_mut(&mut self) -> &mut UartTransmitter<D> {
        &mut self.tx
    }
}
