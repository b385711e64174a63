use crate::{FifoModel, SimPl011, TransmitMetrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use virtboot_config::{Assertion, BoardConfig, PollMode, Scenario};
use virtboot_uart::{BootStub, PollStrategy, TransmitConfig, UartTransmitter};

pub fn transmit_config(board: &BoardConfig) -> TransmitConfig {
    let poll = match board.transmit.poll {
        PollMode::Spin => PollStrategy::Spin,
        PollMode::WaitForEvent => PollStrategy::WaitForEvent,
    };
    TransmitConfig::new()
        .with_translate_newlines(board.transmit.translate_newlines)
        .with_poll(poll)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pass,
    Fail,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssertionResult {
    pub assertion: Assertion,
    pub passed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub board: String,
    /// Everything software wrote to DR.
    pub uart_output: String,
    /// Bytes shifted out of the FIFO once the run was flushed.
    pub transmitted: usize,
    pub flag_reads: u64,
    pub full_polls: u64,
    pub data_writes: u64,
    pub overruns: u64,
    pub idle_ticks: u64,
    /// Register accesses made after the banner. Anything but zero is a bug.
    pub idle_accesses: usize,
    pub timeout: Option<String>,
    pub assertions: Vec<AssertionResult>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.status == RunStatus::Pass
    }
}

fn check(assertion: &Assertion, output: &str) -> bool {
    match assertion {
        Assertion::UartContains(a) => output.contains(&a.uart_contains),
        Assertion::UartExact(a) => output == a.uart_exact,
    }
}

/// Boots `board` against a simulated PL011 and idles for the scenario's
/// tick count, feeding a wake event into every idle pass.
pub fn run_scenario(board: &BoardConfig, scenario: &Scenario) -> RunReport {
    let metrics = Arc::new(TransmitMetrics::new());
    let mut device = SimPl011::new(FifoModel::from(&scenario.fifo));
    device.add_observer(metrics.clone());

    let tx = UartTransmitter::new(device, transmit_config(board));
    let mut stub = BootStub::new(tx, &board.banner);

    info!("Booting board '{}'", board.name);
    let timeout = match scenario.limits.poll_budget {
        Some(budget) => stub.boot_bounded(budget).err().map(|e| e.to_string()),
        None => {
            stub.boot();
            None
        }
    };
    if let Some(err) = &timeout {
        warn!("Banner aborted: {}", err);
    }

    let before = stub.transmitter().device().access_count();
    for _ in 0..scenario.limits.idle_ticks {
        stub.idle_tick();
        stub.transmitter_mut().device_mut().signal_event();
    }
    let device = stub.transmitter_mut().device_mut();
    let idle_accesses = device.access_count() - before;
    debug!(
        "Idled {} ticks, {} register accesses",
        scenario.limits.idle_ticks, idle_accesses
    );

    device.flush();
    let uart_output = String::from_utf8_lossy(&device.data_writes()).into_owned();
    let transmitted = device.transmitted().len();

    let assertions: Vec<AssertionResult> = scenario
        .assertions
        .iter()
        .map(|assertion| AssertionResult {
            assertion: assertion.clone(),
            passed: check(assertion, &uart_output),
        })
        .collect();

    let ok = timeout.is_none()
        && metrics.get_overruns() == 0
        && idle_accesses == 0
        && assertions.iter().all(|a| a.passed);
    let status = if ok { RunStatus::Pass } else { RunStatus::Fail };

    info!(
        "Run finished: {:?}, {} bytes written, {} polls ({} full)",
        status,
        metrics.get_data_writes(),
        metrics.get_flag_reads(),
        metrics.get_full_polls()
    );

    RunReport {
        status,
        board: board.name.clone(),
        uart_output,
        transmitted,
        flag_reads: metrics.get_flag_reads(),
        full_polls: metrics.get_full_polls(),
        data_writes: metrics.get_data_writes(),
        overruns: metrics.get_overruns(),
        idle_ticks: scenario.limits.idle_ticks,
        idle_accesses,
        timeout,
        assertions,
    }
}
