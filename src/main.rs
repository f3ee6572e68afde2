//! Runs the planner against the simulator's event frames.
//!
//! Frames are read one per line from stdin, and replies written one per line to stdout.
//! Logs go to stderr.

use color_eyre::{eyre::WrapErr, Result};
use highway_planner::message::{self, Frame};
use highway_planner::track::loader;
use highway_planner::{Planner, PlannerConfig, Telemetry};
use log::{info, warn, LevelFilter};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "highway-planner", about = "Plans trajectories for the highway simulator.")]
struct Opt {
    /// The waypoint table of the track.
    #[structopt(parse(from_os_str))]
    map_file: PathBuf,

    /// A JSON file overriding the default planner constants.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Logs more detail; repeat for more.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    logger_init(level).wrap_err("Failed to initialise logging")?;

    let config = match &opt.config {
        Some(path) => PlannerConfig::load(path)
            .wrap_err_with(|| format!("Failed to load the configuration from {:?}", path))?,
        None => PlannerConfig::default(),
    };

    let track = loader::load_track_file(&opt.map_file, config.max_s)
        .wrap_err_with(|| format!("Failed to load the track from {:?}", opt.map_file))?;
    let planner = Planner::new(track, &config);
    let mut state = planner.initial_state();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", message::RESET)?;
    out.flush()?;
    info!("Planner ready, waiting for telemetry");

    for line in std::io::stdin().lock().lines() {
        let line = line.wrap_err("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match message::parse_frame(&line) {
            Ok(Frame::Telemetry(msg)) => {
                let telemetry = Telemetry::from(*msg);
                let (next, trajectory) = planner.plan(state, &telemetry);
                state = next;
                message::control_frame(&trajectory)?
            }
            Ok(Frame::Manual) => message::MANUAL.to_string(),
            Ok(Frame::Ignored) => continue,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                continue;
            }
        };
        writeln!(out, "{}", reply)?;
        out.flush()?;
    }

    info!("Input closed, shutting down");
    Ok(())
}

/// Sends log records to stderr, leaving stdout for replies.
fn logger_init(min_level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:5}] {}: {}",
                    record.level(),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!("[{:5}] {}", record.level(), message))
            }
        })
        .level(min_level)
        .chain(std::io::stderr())
        .apply()?;

    info!("Logging initialised at {:?}", min_level);
    Ok(())
}
