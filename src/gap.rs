//! Lane and speed selection.
//!
//! A one-step greedy heuristic: each cycle the observed vehicles are sorted into the
//! ego lane and the lanes either side of it, and the planner either speeds up, moves
//! one lane over, or slows down.
//!
//! Vehicles are sorted only by which side of the ego lane they are on, so a vehicle two
//! lanes away blocks a change into the lane between just as one in that lane would.

use crate::config::PlannerConfig;
use crate::planner::{PlannerState, VehicleObservation};
use crate::util::{loop_offset, Interval};
use log::{debug, trace};
use std::cmp::Ordering;

/// Which of the lanes around the ego vehicle are blocked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaneGaps {
    /// A vehicle ahead in the ego lane is within the following distance.
    pub ahead_blocked: bool,
    /// A vehicle to the left is alongside or close ahead.
    pub left_blocked: bool,
    /// A vehicle to the right is alongside or close ahead.
    pub right_blocked: bool,
}

/// The action chosen by the [GapAnalyzer] in one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Manoeuvre {
    /// The lane ahead is clear; speed up towards the speed limit.
    Accelerate,
    /// Move one lane to the left.
    ChangeLeft,
    /// Move one lane to the right.
    ChangeRight,
    /// Boxed in; slow down.
    Decelerate,
}

/// Chooses the target lane and reference speed each cycle.
#[derive(Clone, Debug)]
pub struct GapAnalyzer {
    lane_width: f64,
    lane_count: usize,
    max_s: f64,
    time_step: f64,
    speed_limit: f64,
    speed_step: f64,
    /// Offsets from the ego position at which a vehicle in the ego lane blocks it.
    follow_window: Interval<f64>,
    /// Offsets from the ego position at which a vehicle in a neighbouring lane blocks it.
    adjacent_window: Interval<f64>,
}

impl GapAnalyzer {
    /// Creates an analyzer for a track whose centre line is `max_s` long.
    pub fn new(config: &PlannerConfig, max_s: f64) -> Self {
        Self {
            lane_width: config.lane_width,
            lane_count: config.lane_count,
            max_s,
            time_step: config.time_step,
            speed_limit: config.speed_limit,
            speed_step: config.speed_step,
            follow_window: Interval::new(0.0, config.follow_distance),
            adjacent_window: Interval::new(-config.adjacent_gap_behind, config.adjacent_gap_ahead),
        }
    }

    /// The lane containing the lateral offset `d`, if it is on the carriageway.
    pub fn lane_of(&self, d: f64) -> Option<usize> {
        let lane = (d / self.lane_width).floor();
        if d >= 0.0 && lane < self.lane_count as f64 {
            Some(lane as usize)
        } else {
            None
        }
    }

    /// Works out which lanes around `lane` are blocked.
    ///
    /// # Parameters
    /// * `lane` - The ego lane
    /// * `ego_s` - The ego position at the end of its queued path
    /// * `queued` - The number of points left on the queued path, which is how far
    ///   each observed vehicle is projected forward in time
    /// * `observations` - The vehicles around the ego vehicle
    pub fn find_gaps(
        &self,
        lane: usize,
        ego_s: f64,
        queued: usize,
        observations: &[VehicleObservation],
    ) -> LaneGaps {
        let latency = queued as f64 * self.time_step;
        let mut gaps = LaneGaps::default();

        for obs in observations {
            let Some(obs_lane) = self.lane_of(obs.d) else {
                continue;
            };
            let projected_s = obs.s + latency * obs.speed();
            let offset = loop_offset(ego_s, projected_s, self.max_s);

            let blocked = match obs_lane.cmp(&lane) {
                Ordering::Equal => &mut gaps.ahead_blocked,
                Ordering::Less => &mut gaps.left_blocked,
                Ordering::Greater => &mut gaps.right_blocked,
            };
            let window = if obs_lane == lane {
                self.follow_window
            } else {
                self.adjacent_window
            };
            if window.surrounds(offset) {
                trace!(
                    "Vehicle {} in lane {} at {:+.1} m blocks (ego lane {})",
                    obs.id,
                    obs_lane,
                    offset,
                    lane
                );
                *blocked = true;
            }
        }

        gaps
    }

    /// Runs one cycle of the heuristic, returning the updated state and the
    /// manoeuvre taken.
    pub fn analyze(
        &self,
        state: PlannerState,
        ego_s: f64,
        queued: usize,
        observations: &[VehicleObservation],
    ) -> (PlannerState, Manoeuvre) {
        let lane = state.lane.min(self.lane_count - 1);
        let gaps = self.find_gaps(lane, ego_s, queued, observations);

        let manoeuvre = if !gaps.ahead_blocked {
            Manoeuvre::Accelerate
        } else if lane > 0 && !gaps.left_blocked {
            Manoeuvre::ChangeLeft
        } else if lane + 1 < self.lane_count && !gaps.right_blocked {
            Manoeuvre::ChangeRight
        } else {
            Manoeuvre::Decelerate
        };

        let next = match manoeuvre {
            Manoeuvre::Accelerate => PlannerState {
                lane,
                reference_speed: f64::min(state.reference_speed + self.speed_step, self.speed_limit),
            },
            Manoeuvre::ChangeLeft => PlannerState {
                lane: lane - 1,
                ..state
            },
            Manoeuvre::ChangeRight => PlannerState {
                lane: lane + 1,
                ..state
            },
            Manoeuvre::Decelerate => PlannerState {
                lane,
                reference_speed: f64::max(state.reference_speed - self.speed_step, 0.0),
            },
        };

        debug!(
            "{:?}: lane {} -> {}, speed {:.3} -> {:.3} ({:?})",
            manoeuvre, state.lane, next.lane, state.reference_speed, next.reference_speed, gaps
        );

        (next, manoeuvre)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn analyzer() -> GapAnalyzer {
        let config = PlannerConfig::default();
        GapAnalyzer::new(&config, config.max_s)
    }

    /// A vehicle at `s` in the centre of `lane`, travelling along the x-axis.
    fn vehicle(id: u32, lane: usize, s: f64, speed: f64) -> VehicleObservation {
        VehicleObservation {
            id,
            x: s,
            y: 0.0,
            vx: speed,
            vy: 0.0,
            s,
            d: 4.0 * lane as f64 + 2.0,
        }
    }

    fn state(lane: usize, reference_speed: f64) -> PlannerState {
        PlannerState {
            lane,
            reference_speed,
        }
    }

    #[test]
    fn lanes_from_offsets() {
        let gaps = analyzer();
        assert_eq!(gaps.lane_of(0.0), Some(0));
        assert_eq!(gaps.lane_of(3.9), Some(0));
        assert_eq!(gaps.lane_of(6.0), Some(1));
        assert_eq!(gaps.lane_of(11.9), Some(2));
        assert_eq!(gaps.lane_of(12.0), None);
        assert_eq!(gaps.lane_of(-0.5), None);
    }

    #[test]
    fn clear_road_accelerates_up_to_the_limit() {
        let gaps = analyzer();
        let mut current = state(1, 0.0);
        let mut prev_speed = 0.0;
        for _ in 0..300 {
            let (next, manoeuvre) = gaps.analyze(current, 100.0, 0, &[]);
            assert_eq!(manoeuvre, Manoeuvre::Accelerate);
            assert_eq!(next.lane, 1);
            assert!(next.reference_speed <= 49.5);
            if prev_speed < 49.5 - 0.224 {
                assert_approx_eq!(next.reference_speed, prev_speed + 0.224);
            }
            prev_speed = next.reference_speed;
            current = next;
        }
        assert_eq!(current.reference_speed, 49.5);
    }

    #[test]
    fn blocked_ahead_changes_left_first() {
        let mvmt = analyzer().analyze(state(1, 40.0), 100.0, 0, &[vehicle(0, 1, 115.0, 17.8)]);
        assert_eq!(mvmt, (state(0, 40.0), Manoeuvre::ChangeLeft));
    }

    #[test]
    fn blocked_left_changes_right() {
        let obs = [vehicle(0, 1, 115.0, 17.8), vehicle(1, 0, 95.0, 17.8)];
        let mvmt = analyzer().analyze(state(1, 40.0), 100.0, 0, &obs);
        assert_eq!(mvmt, (state(2, 40.0), Manoeuvre::ChangeRight));
    }

    #[test]
    fn boxed_in_decelerates() {
        let obs = [
            vehicle(0, 1, 115.0, 17.8),
            vehicle(1, 0, 100.0, 17.8),
            vehicle(2, 2, 120.0, 17.8),
        ];
        let (next, manoeuvre) = analyzer().analyze(state(1, 40.0), 100.0, 0, &obs);
        assert_eq!(manoeuvre, Manoeuvre::Decelerate);
        assert_eq!(next.lane, 1);
        assert_approx_eq!(next.reference_speed, 40.0 - 0.224);

        let (next, _) = analyzer().analyze(state(1, 0.1), 100.0, 0, &obs);
        assert_eq!(next.reference_speed, 0.0);
    }

    #[test]
    fn edge_lanes_do_not_change_outwards() {
        let ahead = |lane| [vehicle(0, lane, 110.0, 10.0)];
        let (next, manoeuvre) = analyzer().analyze(state(0, 30.0), 100.0, 0, &ahead(0));
        assert_eq!((next.lane, manoeuvre), (1, Manoeuvre::ChangeRight));

        let obs = [vehicle(0, 2, 110.0, 10.0), vehicle(1, 1, 101.0, 10.0)];
        let (next, manoeuvre) = analyzer().analyze(state(2, 30.0), 100.0, 0, &obs);
        assert_eq!((next.lane, manoeuvre), (2, Manoeuvre::Decelerate));
    }

    #[test]
    fn adjacent_window_is_asymmetric() {
        let gaps = analyzer();
        // 15 m behind in the left lane is clear, 15 m ahead is not
        let behind = gaps.find_gaps(1, 100.0, 0, &[vehicle(0, 0, 85.0, 0.0)]);
        assert!(!behind.left_blocked);
        let ahead = gaps.find_gaps(1, 100.0, 0, &[vehicle(0, 0, 115.0, 0.0)]);
        assert!(ahead.left_blocked);
        // A vehicle ahead in the ego lane is ignored once it is far enough away
        let far = gaps.find_gaps(1, 100.0, 0, &[vehicle(0, 1, 131.0, 0.0)]);
        assert!(!far.ahead_blocked);
        // A vehicle behind in the ego lane never blocks it
        let back = gaps.find_gaps(1, 100.0, 0, &[vehicle(0, 1, 95.0, 0.0)]);
        assert!(!back.ahead_blocked);
    }

    #[test]
    fn observations_are_projected_over_the_queued_path() {
        let gaps = analyzer();
        // 25 m ahead now, but 40 queued points of 0.02 s at 10 m/s puts it 33 m ahead
        let obs = [vehicle(0, 1, 125.0, 10.0)];
        assert!(gaps.find_gaps(1, 100.0, 0, &obs).ahead_blocked);
        assert!(!gaps.find_gaps(1, 100.0, 40, &obs).ahead_blocked);

        // 25 m behind in the right lane, fast enough to come alongside in 0.8 s
        let obs = [vehicle(0, 2, 75.0, 25.0)];
        assert!(!gaps.find_gaps(1, 100.0, 0, &obs).right_blocked);
        assert!(gaps.find_gaps(1, 100.0, 40, &obs).right_blocked);
    }

    #[test]
    fn vehicles_two_lanes_away_block_the_lane_between() {
        let gaps = analyzer().find_gaps(2, 100.0, 0, &[vehicle(0, 0, 100.0, 10.0)]);
        assert!(gaps.left_blocked);
    }

    #[test]
    fn gaps_wrap_around_the_track() {
        let gaps = analyzer();
        let max_s = PlannerConfig::default().max_s;
        let obs = [vehicle(0, 1, 5.0, 0.0)];
        assert!(gaps.find_gaps(1, max_s - 10.0, 0, &obs).ahead_blocked);
        let obs = [vehicle(0, 0, max_s - 5.0, 0.0)];
        assert!(gaps.find_gaps(1, 2.0, 0, &obs).left_blocked);
    }

    #[test]
    fn vehicles_off_the_carriageway_are_ignored() {
        let mut obs = vehicle(0, 1, 110.0, 0.0);
        obs.d = -6.0;
        let (next, manoeuvre) = analyzer().analyze(state(1, 20.0), 100.0, 0, &[obs]);
        assert_eq!(manoeuvre, Manoeuvre::Accelerate);
        assert_eq!(next.lane, 1);
    }
}
