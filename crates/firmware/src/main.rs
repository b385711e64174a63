#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(target_os = "none", no_std)]

#[cfg(target_os = "none")]
mod kernel {
    use panic_halt as _;
    use virtboot_uart::{BootStub, Pl011, PollStrategy, TransmitConfig, UartTransmitter};

    mod board {
        use virtboot_uart::PollStrategy;

        include!(concat!(env!("OUT_DIR"), "/board.rs"));
    }

    core::arch::global_asm!(include_str!("boot.s"));

    /// Called from `_start` on core 0 once the stack is set up and `.bss` is zeroed.
    #[no_mangle]
    pub extern "C" fn kernel_main() -> ! {
        let config = TransmitConfig::new()
            .with_translate_newlines(board::TRANSLATE_NEWLINES)
            .with_poll(board::POLL);

        // Unreachable for a board that passed validation.
        let Some(uart) = (unsafe { Pl011::from_addr(board::UART_BASE) }) else {
            loop {
                PollStrategy::WaitForEvent.relax();
            }
        };

        BootStub::new(UartTransmitter::new(uart, config), board::BANNER).run()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("firmware only runs on aarch64-unknown-none; build it from crates/firmware");
}
