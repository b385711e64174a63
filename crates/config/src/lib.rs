use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const DEFAULT_BANNER: &str = "Booting minimal ARM64 kernel on QEMU virt...\n";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    #[default]
    Spin,
    WaitForEvent,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UartConfig {
    pub base_address: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransmitSettings {
    #[serde(default = "default_true")]
    pub translate_newlines: bool,
    #[serde(default)]
    pub poll: PollMode,
}

impl Default for TransmitSettings {
    fn default() -> Self {
        Self {
            translate_newlines: true,
            poll: PollMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    pub name: String,
    pub uart: UartConfig,
    #[serde(default)]
    pub transmit: TransmitSettings,
    pub banner: String,
}

impl BoardConfig {
    /// QEMU `virt` with UART0 at `0x0900_0000`.
    pub fn qemu_virt() -> Self {
        Self {
            name: "qemu-virt".to_string(),
            uart: UartConfig {
                base_address: 0x0900_0000,
            },
            transmit: TransmitSettings {
                translate_newlines: true,
                poll: PollMode::WaitForEvent,
            },
            banner: DEFAULT_BANNER.to_string(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open board descriptor at {:?}", path.as_ref()))?;
        let board: Self =
            serde_yaml::from_reader(f).context("Failed to parse Board Descriptor YAML")?;
        board.validate()?;
        Ok(board)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uart.base_address == 0 {
            anyhow::bail!("UART 'base_address' cannot be zero");
        }
        if self.uart.base_address % 4 != 0 {
            anyhow::bail!(
                "UART 'base_address' {:#x} is not 4-byte aligned",
                self.uart.base_address
            );
        }
        if usize::try_from(self.uart.base_address).is_err() {
            anyhow::bail!(
                "UART 'base_address' {:#x} does not fit the address space",
                self.uart.base_address
            );
        }

        if !self.banner.is_ascii() {
            anyhow::bail!("Banner must be ASCII");
        }
        match self.banner.find('\n') {
            None => anyhow::bail!("Banner must end with a single '\\n'"),
            Some(pos) if pos + 1 != self.banner.len() => {
                anyhow::bail!("Banner must end with a single '\\n' and contain no other newline")
            }
            Some(0) => anyhow::bail!("Banner cannot be empty"),
            Some(_) => {}
        }

        Ok(())
    }

    /// Rust source with the board constants, for inclusion by the firmware
    /// build script. Expects `PollStrategy` in scope at the include site.
    pub fn render_constants(&self) -> String {
        let poll = match self.transmit.poll {
            PollMode::Spin => "Spin",
            PollMode::WaitForEvent => "WaitForEvent",
        };

        let mut out = String::new();
        let _ = writeln!(out, "// Generated from board '{}'.", self.name);
        let _ = writeln!(out, "pub const UART_BASE: usize = {:#x};", self.uart.base_address);
        let _ = writeln!(
            out,
            "pub const TRANSLATE_NEWLINES: bool = {};",
            self.transmit.translate_newlines
        );
        let _ = writeln!(out, "pub const POLL: PollStrategy = PollStrategy::{poll};");
        let _ = writeln!(out, "pub const BANNER: &str = {:?};", self.banner);
        out
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FifoSettings {
    #[serde(default = "default_fifo_depth")]
    pub depth: usize,
    /// Flag polls per byte drained from the FIFO.
    #[serde(default = "default_drain_interval")]
    pub drain_interval: u32,
    /// The flag reads full for this many initial polls regardless of depth.
    #[serde(default)]
    pub initial_stall: u32,
}

fn default_fifo_depth() -> usize {
    16
}

fn default_drain_interval() -> u32 {
    1
}

impl Default for FifoSettings {
    fn default() -> Self {
        Self {
            depth: default_fifo_depth(),
            drain_interval: default_drain_interval(),
            initial_stall: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioLimits {
    #[serde(default = "default_idle_ticks")]
    pub idle_ticks: u64,
    #[serde(default)]
    pub poll_budget: Option<u32>,
}

fn default_idle_ticks() -> u64 {
    1000
}

impl Default for ScenarioLimits {
    fn default() -> Self {
        Self {
            idle_ticks: default_idle_ticks(),
            poll_budget: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UartContainsAssertion {
    pub uart_contains: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UartExactAssertion {
    pub uart_exact: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Assertion {
    UartContains(UartContainsAssertion),
    UartExact(UartExactAssertion),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub schema_version: String,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub fifo: FifoSettings,
    #[serde(default)]
    pub limits: ScenarioLimits,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            board: None,
            fifo: FifoSettings::default(),
            limits: ScenarioLimits::default(),
            assertions: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open scenario at {:?}", path.as_ref()))?;
        let scenario: Self =
            serde_yaml::from_reader(f).context("Failed to parse Scenario YAML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.fifo.depth == 0 {
            anyhow::bail!("FIFO 'depth' must be greater than zero");
        }

        if self.fifo.drain_interval == 0 {
            anyhow::bail!("FIFO 'drain_interval' must be greater than zero");
        }

        if let Some(board) = &self.board {
            if board.trim().is_empty() {
                anyhow::bail!("Input 'board' path cannot be empty");
            }
        }

        Ok(())
    }

    /// Board path relative to the directory holding the scenario file.
    pub fn board_path(&self, scenario_path: &Path) -> Option<PathBuf> {
        let board = self.board.as_ref()?;
        let dir = scenario_path.parent().unwrap_or_else(|| Path::new("."));
        Some(dir.join(board))
    }
}
