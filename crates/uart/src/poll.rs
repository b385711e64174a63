/// What the CPU does between two reads of a busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStrategy {
    /// Plain busy loop with a spin hint.
    #[default]
    Spin,
    /// Sleep until the next event (`wfe`). Any event wakes the core, so the
    /// caller must re-test its condition after every return.
    WaitForEvent,
}

impl PollStrategy {
    #[inline]
    pub fn relax(self) {
        match self {
            PollStrategy::Spin => core::hint::spin_loop(),
            PollStrategy::WaitForEvent => wait_for_event(),
        }
    }
}

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
#[inline]
fn wait_for_event() {
    aarch64_cpu::asm::wfe();
}

// Hosted builds have no event source to sleep on.
#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
#[inline]
fn wait_for_event() {
    core::hint::spin_loop();
}
