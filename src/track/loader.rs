//! Loading of the waypoint table.
//!
//! The table holds one waypoint per line as five space separated numbers:
//! `x y s normal_dx normal_dy`, sorted by ascending `s`.

use super::{TrackModel, Waypoint};
use log::info;
use smallvec::SmallVec;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// An error that occurs while loading the waypoint table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot open the waypoint table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read the waypoint table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {source}")]
    Parse {
        line: u64,
        source: std::num::ParseFloatError,
    },

    #[error("Line {line}: expected 5 values, found {found}")]
    FieldCount { line: u64, found: usize },

    #[error("Line {line}: waypoint `s` of {s} is out of order or outside the track")]
    BadDistance { line: u64, s: f64 },

    #[error("The waypoint table has {0} waypoints, at least 2 are needed")]
    TooFew(usize),
}

/// Reads waypoints from a table.
pub fn read_waypoints(reader: impl Read, max_s: f64) -> Result<Vec<Waypoint>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut waypoints: Vec<Waypoint> = vec![];
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(idx as u64 + 1);

        // Runs of spaces show up as empty fields
        let values = record
            .iter()
            .filter(|field| !field.is_empty())
            .map(str::parse::<f64>)
            .collect::<Result<SmallVec<[f64; 5]>, _>>()
            .map_err(|source| LoadError::Parse { line, source })?;
        if values.is_empty() {
            continue;
        }
        let [x, y, s, normal_dx, normal_dy]: [f64; 5] = values
            .as_slice()
            .try_into()
            .map_err(|_| LoadError::FieldCount {
                line,
                found: values.len(),
            })?;

        let in_order = waypoints.last().map_or(true, |prev| prev.s < s);
        if !in_order || !(0.0..max_s).contains(&s) {
            return Err(LoadError::BadDistance { line, s });
        }

        waypoints.push(Waypoint {
            x,
            y,
            s,
            normal_dx,
            normal_dy,
        });
    }

    Ok(waypoints)
}

/// Builds a [TrackModel] from a waypoint table.
pub fn load_track(reader: impl Read, max_s: f64) -> Result<TrackModel, LoadError> {
    let waypoints = read_waypoints(reader, max_s)?;
    if waypoints.len() < 2 {
        return Err(LoadError::TooFew(waypoints.len()));
    }
    info!(
        "Loaded {} waypoints, track length {:.3} m",
        waypoints.len(),
        max_s
    );
    Ok(TrackModel::new(waypoints, max_s))
}

/// Builds a [TrackModel] from the waypoint table file at `path`.
pub fn load_track_file(path: impl AsRef<Path>, max_s: f64) -> Result<TrackModel, LoadError> {
    let file = File::open(path)?;
    load_track(file, max_s)
}
