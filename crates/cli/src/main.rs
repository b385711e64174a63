use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use virtboot_config::{BoardConfig, Scenario};

#[derive(Parser, Debug)]
#[command(author, version, about = "virtboot PL011 boot stub simulator", long_about = None)]
struct Args {
    /// Path to the board descriptor (YAML). Overrides the scenario's board.
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Path to a simulation scenario (YAML)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Idle loop passes to simulate after the banner
    #[arg(long)]
    idle_ticks: Option<u64>,

    /// Force the TX FIFO full for this many initial polls
    #[arg(long)]
    stall: Option<u32>,

    /// Enable debug-level tracing
    #[arg(short, long)]
    trace: bool,

    /// Print the run report as JSON instead of the UART output
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the UART stream.
    let level = if args.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting virtboot simulator");

    let mut scenario = match &args.scenario {
        Some(path) => {
            info!("Loading scenario: {:?}", path);
            Scenario::from_file(path)?
        }
        None => Scenario::default(),
    };

    let board_path = args.board.clone().or_else(|| {
        args.scenario
            .as_ref()
            .and_then(|path| scenario.board_path(path))
    });
    let board = match board_path {
        Some(path) => {
            info!("Loading board descriptor: {:?}", path);
            BoardConfig::from_file(&path)?
        }
        None => {
            info!("Using default board: qemu-virt");
            BoardConfig::qemu_virt()
        }
    };

    if let Some(ticks) = args.idle_ticks {
        scenario.limits.idle_ticks = ticks;
    }
    if let Some(stall) = args.stall {
        scenario.fifo.initial_stall = stall;
    }

    let report = virtboot_sim::run_scenario(&board, &scenario);

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        stdout.write_all(report.uart_output.as_bytes())?;
    }
    stdout.flush()?;

    if let Some(timeout) = &report.timeout {
        anyhow::bail!("Boot banner aborted: {}", timeout);
    }
    if report.overruns > 0 {
        anyhow::bail!("{} byte(s) written while the TX FIFO was full", report.overruns);
    }
    if report.idle_accesses > 0 {
        anyhow::bail!(
            "{} register access(es) after the banner",
            report.idle_accesses
        );
    }
    let failed = report.assertions.iter().filter(|a| !a.passed).count();
    if failed > 0 {
        anyhow::bail!("{} assertion(s) failed", failed);
    }

    info!("Simulation passed");
    Ok(())
}
