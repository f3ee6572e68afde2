pub use cgmath;
pub use config::{ConfigError, PlannerConfig};
pub use gap::{GapAnalyzer, LaneGaps, Manoeuvre};
pub use planner::{Planner, PlannerState, Telemetry, VehicleObservation};
pub use track::{RoadCoord, TrackModel, Waypoint};
pub use trajectory::{EgoPose, Trajectory, TrajectorySynthesizer};
pub use util::Interval;

mod config;
mod gap;
pub mod math;
pub mod message;
mod planner;
pub mod track;
mod trajectory;
mod util;
