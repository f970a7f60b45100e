//! Frosting plotter front end on the simulated board.
//!
//! Mirrors the machine's operator commands: homing, a full two-layer job,
//! the emergency stop and the single-extruder test and reset routines.
//! The simulated clock advances instantly, so a job that would take
//! minutes on the machine finishes at once while logging its real timings.
//!
//! Run with: `cargo run --example frosting -- job bgd_coordinates.csv img_coordinates.csv`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use frosting_motion::hardware::{Axis, ExtruderId};
use frosting_motion::sim::SimBoard;
use frosting_motion::{load_config, load_drawing, JobOrchestrator, MachineConfig, Result};

#[derive(Parser)]
#[command(name = "frosting", about = "Two-axis frosting plotter (simulated board)")]
struct Cli {
    /// Machine configuration (TOML). Stock settings when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Initial carriage offset from the endstops, in steps.
    #[arg(long, default_value_t = 150, global = true)]
    start_steps: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Home both axes.
    Home,
    /// Draw the white background, then the black image.
    Job {
        /// Background drawing (x,y,e per line).
        background: PathBuf,
        /// Foreground drawing (x,y,e per line).
        foreground: PathBuf,
        /// Raise the emergency stop after this many steps.
        #[arg(long)]
        abort_after: Option<u64>,
    },
    /// Release both axes and brake both extruders.
    Estop,
    /// Run one extruder forward at full duty.
    TestExtruder {
        /// `white`, `black` or a channel number.
        extruder: ExtruderId,
        /// How long to run.
        #[arg(long, default_value_t = 1_000)]
        ms: u32,
    },
    /// Retract one extruder at full duty.
    ResetExtruder {
        /// `white`, `black` or a channel number.
        extruder: ExtruderId,
        /// How long to run.
        #[arg(long, default_value_t = 6_000)]
        ms: u32,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => MachineConfig::default(),
    };

    let board = SimBoard::new();
    for axis in Axis::ALL {
        board.set_endstop_position(axis, 0);
        board.set_position_steps(axis, cli.start_steps);
    }
    let mut ctl = board.controller(config).with_abort(board.abort_signal());
    ctl.init()?;

    match cli.command {
        Command::Home => {
            ctl.home_all()?;
            ctl.shutdown()?;
        }
        Command::Job {
            background,
            foreground,
            abort_after,
        } => {
            let background = load_drawing(&background)?;
            let foreground = load_drawing(&foreground)?;
            if let Some(steps) = abort_after {
                board.abort_after_steps(steps);
            }

            let mut job = JobOrchestrator::new();
            let result = job.run(&mut ctl, background.commands(), foreground.commands());
            tracing::info!("Job history: {:?}", job.history());
            let report = result?;
            tracing::info!(
                "Background: {} commands ({} skipped), foreground: {} commands ({} skipped)",
                report.background.commands,
                report.background.skipped,
                report.foreground.commands,
                report.foreground.skipped
            );
            let (dx, dy) = ctl.drift();
            tracing::info!("Final drift: {:.3} mm, {:.3} mm", dx.0, dy.0);
        }
        Command::Estop => {
            tracing::warn!("E-STOP!");
            ctl.emergency_stop()?;
            tracing::info!("Stopped all motors.");
        }
        Command::TestExtruder { extruder, ms } => ctl.test_extruder(extruder, ms)?,
        Command::ResetExtruder { extruder, ms } => ctl.reset_extruder(extruder, ms)?,
    }

    tracing::info!(
        "Simulated time: {:.3} s, steps: X {} Y {}",
        board.now_us() as f64 / 1e6,
        board.step_count(Axis::X),
        board.step_count(Axis::Y)
    );
    Ok(())
}
