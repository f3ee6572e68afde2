use crate::config::PlannerConfig;
use crate::gap::GapAnalyzer;
use crate::math::Point2d;
use crate::track::{RoadCoord, TrackModel};
use crate::trajectory::{EgoPose, Trajectory, TrajectorySynthesizer};
use cgmath::{Deg, Rad};
use log::debug;
use serde::Deserialize;

/// The planner state carried from one cycle to the next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannerState {
    /// The target lane.
    pub lane: usize,
    /// The target speed, in display units.
    pub reference_speed: f64,
}

impl PlannerState {
    /// The state at startup: stationary, in the configured initial lane.
    pub fn initial(config: &PlannerConfig) -> Self {
        Self {
            lane: config.initial_lane,
            reference_speed: 0.0,
        }
    }
}

/// Another vehicle seen by the ego vehicle's sensors.
///
/// Deserialises from the simulator's `[id, x, y, vx, vy, s, d]` arrays.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct VehicleObservation {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    /// The world space velocity, in m/s.
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

impl VehicleObservation {
    /// The vehicle's speed in m/s.
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// The inputs to one planning cycle.
#[derive(Clone, Debug)]
pub struct Telemetry {
    /// The world space position of the ego vehicle.
    pub position: Point2d,
    pub s: f64,
    pub d: f64,
    /// The ego heading, in degrees.
    pub yaw: f64,
    /// The ego speed, in display units.
    pub speed: f64,
    /// The unconsumed points of the previous trajectory.
    pub previous_path: Vec<Point2d>,
    /// The road frame position of the last point of `previous_path`.
    pub previous_path_end: RoadCoord,
    pub observations: Vec<VehicleObservation>,
}

/// Runs planning cycles against a track.
///
/// The planner itself is immutable; the state that changes between cycles
/// is passed in and returned by [Planner::plan].
#[derive(Clone, Debug)]
pub struct Planner {
    track: TrackModel,
    initial: PlannerState,
    gaps: GapAnalyzer,
    synthesizer: TrajectorySynthesizer,
}

impl Planner {
    /// Creates a planner for `track`. Gaps are measured around the track's own
    /// length, whatever `config.max_s` says.
    pub fn new(track: TrackModel, config: &PlannerConfig) -> Self {
        Self {
            gaps: GapAnalyzer::new(config, track.max_s()),
            initial: PlannerState::initial(config),
            synthesizer: TrajectorySynthesizer::new(config),
            track,
        }
    }

    pub fn track(&self) -> &TrackModel {
        &self.track
    }

    /// The state to start the first cycle with.
    pub fn initial_state(&self) -> PlannerState {
        self.initial
    }

    /// Runs one planning cycle, returning the updated state and the next trajectory.
    pub fn plan(&self, state: PlannerState, telemetry: &Telemetry) -> (PlannerState, Trajectory) {
        let previous = &telemetry.previous_path;
        let reference_s = if previous.is_empty() {
            telemetry.s
        } else {
            telemetry.previous_path_end.s
        };

        let (state, manoeuvre) =
            self.gaps
                .analyze(state, reference_s, previous.len(), &telemetry.observations);

        let ego = EgoPose {
            position: telemetry.position,
            yaw: Rad::from(Deg(telemetry.yaw)).0,
        };
        let trajectory = self.synthesizer.synthesize(
            &self.track,
            &ego,
            previous,
            reference_s,
            state.lane,
            state.reference_speed,
        );

        debug!(
            "Cycle at s = {:.1}: {:?}, {} queued, {} observed",
            reference_s,
            manoeuvre,
            previous.len(),
            telemetry.observations.len()
        );

        (state, trajectory)
    }
}
