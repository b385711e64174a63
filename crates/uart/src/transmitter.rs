use core::fmt;

use crate::device::UartDevice;
use crate::poll::PollStrategy;
use crate::{TxError, TxResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitConfig {
    /// Emit `\r` before every `\n`.
    pub translate_newlines: bool,
    pub poll: PollStrategy,
}

impl TransmitConfig {
    pub const fn new() -> Self {
        Self {
            translate_newlines: true,
            poll: PollStrategy::Spin,
        }
    }

    pub const fn with_translate_newlines(mut self, translate: bool) -> Self {
        self.translate_newlines = translate;
        self
    }

    pub const fn with_poll(mut self, poll: PollStrategy) -> Self {
        self.poll = poll;
        self
    }
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes bytes onto a UART, honouring TX FIFO backpressure.
#[derive(Debug)]
pub struct UartTransmitter<D> {
    device: D,
    config: TransmitConfig,
}

impl<D: UartDevice> UartTransmitter<D> {
    pub const fn new(device: D, config: TransmitConfig) -> Self {
        Self { device, config }
    }

    pub fn config(&self) -> TransmitConfig {
        self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    /// Blocks until the TX FIFO has room, then writes `byte` once.
    ///
    /// There is no timeout: a FIFO that never drains blocks forever.
    pub fn write_byte(&mut self, byte: u8) {
        while self.device.read_flags().tx_full() {
            self.config.poll.relax();
        }
        self.device.write_data(byte);
    }

    /// Like [`write_byte`](Self::write_byte), but gives up once `max_polls`
    /// consecutive flag reads have reported the FIFO full. Nothing is written
    /// on timeout. A budget of zero is treated as one.
    pub fn write_byte_bounded(&mut self, byte: u8, max_polls: u32) -> TxResult<()> {
        let max_polls = max_polls.max(1);
        let mut polls = 0;
        while self.device.read_flags().tx_full() {
            polls += 1;
            if polls >= max_polls {
                return Err(TxError::Timeout { polls });
            }
            self.config.poll.relax();
        }
        self.device.write_data(byte);
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' && self.config.translate_newlines {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }

    /// Stops at the first byte that times out; earlier bytes stay sent.
    pub fn write_bytes_bounded(&mut self, bytes: &[u8], max_polls: u32) -> TxResult<()> {
        for &byte in bytes {
            if byte == b'\n' && self.config.translate_newlines {
                self.write_byte_bounded(b'\r', max_polls)?;
            }
            self.write_byte_bounded(byte, max_polls)?;
        }
        Ok(())
    }

    pub fn print(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }
}

impl<D: UartDevice> fmt::Write for UartTransmitter<D> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::Flags;
    use std::fmt::Write as _;

    /// Reports TXFF for the next `busy` reads, then ready.
    #[derive(Debug, Default)]
    struct ScriptedUart {
        busy: u32,
        reads: u32,
        data: Vec<u8>,
        writes_while_full: u32,
    }

    impl ScriptedUart {
        fn stalled(busy: u32) -> Self {
            Self {
                busy,
                ..Default::default()
            }
        }
    }

    impl UartDevice for ScriptedUart {
        fn read_flags(&mut self) -> Flags {
            self.reads += 1;
            if self.busy > 0 {
                self.busy -= 1;
                Flags::TXFF
            } else {
                Flags::TXFE
            }
        }

        fn write_data(&mut self, byte: u8) {
            if self.busy > 0 {
                self.writes_while_full += 1;
            }
            self.data.push(byte);
        }
    }

    fn raw() -> TransmitConfig {
        TransmitConfig::new().with_translate_newlines(false)
    }

    #[test]
    fn test_write_byte_waits_for_fifo() {
        let mut tx = UartTransmitter::new(ScriptedUart::stalled(7), raw());
        tx.write_byte(b'x');

        let uart = tx.into_inner();
        assert_eq!(uart.reads, 8);
        assert_eq!(uart.data, b"x");
        assert_eq!(uart.writes_while_full, 0);
    }

    #[test]
    fn test_write_byte_every_value() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), raw());
        for b in 0..=255u8 {
            tx.write_byte(b);
        }
        let expected: Vec<u8> = (0..=255u8).collect();
        assert_eq!(tx.device().data, expected);
    }

    #[test]
    fn test_newline_translation() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), TransmitConfig::new());
        tx.print("Hi\n");
        assert_eq!(tx.device().data, b"Hi\r\n");

        let mut tx = UartTransmitter::new(ScriptedUart::default(), raw());
        tx.print("Hi\n");
        assert_eq!(tx.device().data, b"Hi\n");
    }

    #[test]
    fn test_existing_cr_is_kept() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), TransmitConfig::new());
        tx.print("a\r\nb\n\n");
        assert_eq!(tx.device().data, b"a\r\r\nb\r\n\r\n");
    }

    #[test]
    fn test_bounded_write_times_out() {
        let mut tx = UartTransmitter::new(ScriptedUart::stalled(10), raw());
        assert_eq!(tx.write_byte_bounded(b'a', 4), Err(TxError::Timeout { polls: 4 }));
        assert!(tx.device().data.is_empty());

        // 6 busy reads left, budget 7 is enough
        assert_eq!(tx.write_byte_bounded(b'a', 7), Ok(()));
        assert_eq!(tx.device().data, b"a");
    }

    #[test]
    fn test_bounded_zero_budget() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), raw());
        assert!(tx.write_byte_bounded(b'a', 0).is_ok());

        let mut tx = UartTransmitter::new(ScriptedUart::stalled(1), raw());
        assert_eq!(tx.write_byte_bounded(b'a', 0), Err(TxError::Timeout { polls: 1 }));
    }

    #[test]
    fn test_bounded_string_stops_at_first_timeout() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), TransmitConfig::new());
        tx.write_bytes_bounded(b"ok\n", 1).unwrap();
        tx.device_mut().busy = 3;
        let err = tx.write_bytes_bounded(b"zz", 2).unwrap_err();
        assert_eq!(err, TxError::Timeout { polls: 2 });
        assert_eq!(tx.device().data, b"ok\r\n");
    }

    #[test]
    fn test_bounded_timeout_on_inserted_cr() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), TransmitConfig::new());
        tx.write_bytes_bounded(b"ab", 3).unwrap();

        // FIFO fills up just as the line ends: the CR never gets a slot.
        tx.device_mut().busy = 5;
        let err = tx.write_bytes_bounded(b"\n", 3).unwrap_err();
        assert_eq!(err, TxError::Timeout { polls: 3 });
        assert_eq!(tx.device().data, b"ab");
        assert!(!tx.device().data.contains(&b'\r'));
        assert!(!tx.device().data.contains(&b'\n'));
        assert_eq!(tx.device().writes_while_full, 0);
    }

    #[test]
    fn test_fmt_write() {
        let mut tx = UartTransmitter::new(ScriptedUart::default(), TransmitConfig::new());
        writeln!(tx, "{}-{:02x}", "id", 0x2a).unwrap();
        assert_eq!(tx.device().data, b"id-2a\r\n");
    }

    #[test]
    fn test_wait_for_event_rechecks_flag() {
        let config = raw().with_poll(PollStrategy::WaitForEvent);
        let mut tx = UartTransmitter::new(ScriptedUart::stalled(3), config);
        tx.write_byte(b'!');
        assert_eq!(tx.device().reads, 4);
        assert_eq!(tx.device().data, b"!");
    }

    #[test]
    fn test_borrowed_device() {
        let mut uart = ScriptedUart::default();
        {
            let mut tx = UartTransmitter::new(&mut uart, raw());
            tx.print("ab");
        }
        assert_eq!(uart.data, b"ab");
    }
}
