use spinning_top::Spinlock;

use crate::device::UartDevice;
use crate::transmitter::UartTransmitter;

/// A transmitter that several threads may print through.
///
/// The lock is held for a whole string, so output from different callers
/// never interleaves inside one `print`.
#[derive(Debug)]
pub struct SharedTransmitter<D> {
    inner: Spinlock<UartTransmitter<D>>,
}

impl<D: UartDevice> SharedTransmitter<D> {
    pub fn new(transmitter: UartTransmitter<D>) -> Self {
        Self {
            inner: Spinlock::new(transmitter),
        }
    }

    pub fn print(&self, s: &str) {
        self.inner.lock().print(s);
    }

    pub fn write_bytes(&self, bytes: &[u8]) {
        self.inner.lock().write_bytes(bytes);
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut UartTransmitter<D>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    pub fn into_inner(self) -> UartTransmitter<D> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::Flags;
    use crate::transmitter::TransmitConfig;
    use std::thread;

    /// Every other flag read reports FIFO full, to widen the race window.
    #[derive(Debug, Default)]
    struct Flaky {
        reads: u64,
        data: Vec<u8>,
    }

    impl UartDevice for Flaky {
        fn read_flags(&mut self) -> Flags {
            self.reads += 1;
            if self.reads % 2 == 0 {
                Flags::TXFF
            } else {
                Flags::empty()
            }
        }

        fn write_data(&mut self, byte: u8) {
            self.data.push(byte);
        }
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let shared = SharedTransmitter::new(UartTransmitter::new(
            Flaky::default(),
            TransmitConfig::new(),
        ));

        thread::scope(|s| {
            for fill in [b'a', b'b', b'c', b'd'] {
                let shared = &shared;
                s.spawn(move || {
                    let line = String::from_utf8(vec![fill; 32]).unwrap() + "\n";
                    for _ in 0..50 {
                        shared.print(&line);
                    }
                });
            }
        });

        let data = shared.into_inner().into_inner().data;
        let text = String::from_utf8(data).unwrap();
        let lines: Vec<&str> = text.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 200);
        for line in lines {
            assert_eq!(line.len(), 32);
            let first = line.as_bytes()[0];
            assert!(line.bytes().all(|b| b == first), "interleaved line: {line:?}");
        }
    }

    #[test]
    fn test_with_exposes_transmitter() {
        let shared = SharedTransmitter::new(UartTransmitter::new(
            Flaky::default(),
            TransmitConfig::new().with_translate_newlines(false),
        ));
        shared.write_bytes(b"x\n");
        let len = shared.with(|tx| tx.device().data.len());
        assert_eq!(len, 2);
    }
}
