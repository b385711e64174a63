use crate::UartObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use virtboot_uart::Flags;

#[derive(Debug, Default)]
pub struct TransmitMetrics {
    flag_reads: AtomicU64,
    full_polls: AtomicU64,
    data_writes: AtomicU64,
    overruns: AtomicU64,
}

impl TransmitMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.flag_reads.store(0, Ordering::SeqCst);
        self.full_polls.store(0, Ordering::SeqCst);
        self.data_writes.store(0, Ordering::SeqCst);
        self.overruns.store(0, Ordering::SeqCst);
    }

    pub fn get_flag_reads(&self) -> u64 {
        self.flag_reads.load(Ordering::SeqCst)
    }

    /// Flag reads that found the FIFO full.
    pub fn get_full_polls(&self) -> u64 {
        self.full_polls.load(Ordering::SeqCst)
    }

    pub fn get_data_writes(&self) -> u64 {
        self.data_writes.load(Ordering::SeqCst)
    }

    pub fn get_overruns(&self) -> u64 {
        self.overruns.load(Ordering::SeqCst)
    }
}

impl UartObserver for TransmitMetrics {
    fn on_flag_read(&self, flags: Flags) {
        self.flag_reads.fetch_add(1, Ordering::SeqCst);
        if flags.tx_full() {
            self.full_polls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_data_write(&self, _byte: u8, fifo_full: bool) {
        self.data_writes.fetch_add(1, Ordering::SeqCst);
        if fifo_full {
            self.overruns.fetch_add(1, Ordering::SeqCst);
        }
    }
}
