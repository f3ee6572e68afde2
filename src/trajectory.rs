//! Trajectory synthesis.
//!
//! New points are blended onto the unconsumed tail of the previous trajectory by fitting a
//! spline through anchor points: two near the end of the previous trajectory, and a few
//! further down the road in the centre of the target lane. The spline is fitted in a
//! frame aligned with the end of the previous trajectory, where it is a function of x.

use crate::config::PlannerConfig;
use crate::math::{heading_vector, CubicSpline, LocalFrame, Point2d};
use crate::track::TrackModel;
use cgmath::prelude::*;
use log::trace;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use smallvec::SmallVec;

/// The last two points of the previous trajectory closer than this, in m, are
/// treated as coincident and carry no heading.
const MIN_HEADING_BASELINE: f64 = 1e-6;

/// A sequence of world space points, one consumed per time step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub points: Vec<Point2d>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The x-coordinates of the points.
    pub fn next_x(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    /// The y-coordinates of the points.
    pub fn next_y(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// Serialises as the simulator's `{ "next_x": [..], "next_y": [..] }` record.
impl Serialize for Trajectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Trajectory", 2)?;
        record.serialize_field("next_x", &self.next_x())?;
        record.serialize_field("next_y", &self.next_y())?;
        record.end()
    }
}

/// The vehicle's pose at the start of a cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EgoPose {
    pub position: Point2d,
    /// The heading in radians.
    pub yaw: f64,
}

/// Produces smooth trajectories towards a target lane and speed.
#[derive(Clone, Debug)]
pub struct TrajectorySynthesizer {
    lane_width: f64,
    lookahead: f64,
    anchor_count: usize,
    horizon: usize,
    time_step: f64,
    mph_per_mps: f64,
}

impl TrajectorySynthesizer {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            lane_width: config.lane_width,
            lookahead: config.lookahead,
            anchor_count: config.anchor_count,
            horizon: config.horizon,
            time_step: config.time_step,
            mph_per_mps: config.mph_per_mps,
        }
    }

    /// Synthesizes the next trajectory.
    ///
    /// The points of `previous` are kept unchanged at the start of the trajectory,
    /// and new points are appended until it holds `horizon` points.
    ///
    /// # Parameters
    /// * `track` - The track geometry
    /// * `ego` - The vehicle's current pose
    /// * `previous` - The unconsumed points of the previous trajectory
    /// * `reference_s` - The road frame `s` at the end of `previous`, or of the vehicle
    ///   if `previous` is empty
    /// * `lane` - The target lane
    /// * `speed` - The target speed, in display units
    ///
    /// # Panics
    /// If the anchor points are not strictly increasing along the reference heading.
    pub fn synthesize(
        &self,
        track: &TrackModel,
        ego: &EgoPose,
        previous: &[Point2d],
        reference_s: f64,
        lane: usize,
        speed: f64,
    ) -> Trajectory {
        let previous = &previous[..previous.len().min(self.horizon)];
        let (behind, frame) = self.reference_frame(ego, previous);

        // Two anchors at the end of the previous path, the rest down the road
        let centre_d = self.lane_width * (lane as f64 + 0.5);
        let far_anchors = (1..=self.anchor_count)
            .map(|i| track.to_cartesian(reference_s + self.lookahead * i as f64, centre_d));
        let anchors = [behind, frame.origin()]
            .into_iter()
            .chain(far_anchors)
            .map(|p| frame.to_local(p))
            .collect::<SmallVec<[Point2d; 8]>>();
        trace!("Trajectory anchors (local frame): {:?}", anchors);

        let spline = CubicSpline::new(&anchors);

        // Choose the step along local x so the arc length per step matches the speed
        let target = Point2d::new(self.lookahead, spline.y(self.lookahead));
        let target_dist = target.to_vec().magnitude();
        let step_dist = self.time_step * speed / self.mph_per_mps;
        let x_step = target.x * step_dist / target_dist;

        let mut points = Vec::with_capacity(self.horizon);
        points.extend_from_slice(previous);
        let new_points = (1..)
            .map(|i| i as f64 * x_step)
            .map(|x| frame.to_world(Point2d::new(x, spline.y(x))));
        points.extend(new_points.take(self.horizon - points.len()));

        Trajectory { points }
    }

    /// Finds the frame the spline is fitted in, with its origin at the end of the previous
    /// trajectory, and a point behind the origin along the reference heading.
    fn reference_frame(&self, ego: &EgoPose, previous: &[Point2d]) -> (Point2d, LocalFrame) {
        if let [.., prior, last] = previous {
            let delta = *last - *prior;
            if delta.magnitude() > MIN_HEADING_BASELINE {
                let yaw = delta.y.atan2(delta.x);
                return (*prior, LocalFrame::new(*last, yaw));
            }
            // A stationary trajectory has no heading of its own
            let behind = *last - heading_vector(ego.yaw);
            return (behind, LocalFrame::new(*last, ego.yaw));
        }

        let behind = ego.position - heading_vector(ego.yaw);
        (behind, LocalFrame::new(ego.position, ego.yaw))
    }
}
