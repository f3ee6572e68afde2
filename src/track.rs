//! The track coordinate model.
//!
//! Positions on the track are expressed either in world space, or in the road frame:
//! the longitudinal distance `s` along the centre line, and the lateral offset `d`
//! from it. The centre line is described by a sparse, cyclic table of [Waypoint]s,
//! and is treated as piecewise linear between them.
//!
//! Positive `d` lies in the direction of the waypoint normals, which for the simulator
//! track is to the right of the direction of travel.

use crate::math::{heading_difference, Point2d, Vector2d};
use crate::util::wrap_distance;
use cgmath::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub mod loader;

/// A sampled point on the track centre line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// The world space x-coordinate, in m.
    pub x: f64,
    /// The world space y-coordinate, in m.
    pub y: f64,
    /// The distance along the centre line, in m.
    pub s: f64,
    /// The x component of the unit normal, pointing towards increasing `d`.
    pub normal_dx: f64,
    /// The y component of the unit normal, pointing towards increasing `d`.
    pub normal_dy: f64,
}

impl Waypoint {
    pub fn position(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }

    pub fn normal(&self) -> Vector2d {
        Vector2d::new(self.normal_dx, self.normal_dy)
    }
}

/// A position in the road frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoadCoord {
    /// The longitudinal distance along the centre line, in `[0, max_s)`.
    pub s: f64,
    /// The signed lateral offset from the centre line.
    pub d: f64,
}

/// The track geometry, used to convert between world space and the road frame.
///
/// Immutable once built, so it can be shared freely between readers.
#[derive(Clone, Debug)]
pub struct TrackModel {
    /// The waypoints, sorted by `s`.
    waypoints: Vec<Waypoint>,
    /// The length of one lap of the centre line.
    max_s: f64,
}

impl TrackModel {
    /// Creates a track model from waypoints sorted by ascending `s`.
    ///
    /// # Panics
    /// If there are fewer than two waypoints, or `max_s` is not positive.
    pub fn new(waypoints: Vec<Waypoint>, max_s: f64) -> Self {
        assert!(waypoints.len() >= 2, "a track needs at least two waypoints");
        assert!(max_s > 0.0, "the track length must be positive");
        Self { waypoints, max_s }
    }

    /// The waypoints defining the centre line.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// The number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the waypoint table is empty.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// The length of one lap of the centre line.
    pub fn max_s(&self) -> f64 {
        self.max_s
    }

    /// Wraps a longitudinal position into `[0, max_s)`.
    pub fn wrap_s(&self, s: f64) -> f64 {
        wrap_distance(s, self.max_s)
    }

    /// Finds the index of the waypoint nearest to `point`.
    pub fn closest_waypoint(&self, point: Point2d) -> usize {
        self.waypoints
            .iter()
            .map(|wp| (wp.position() - point).magnitude2())
            .position_min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0)
    }

    /// Finds the index of the first waypoint ahead of a vehicle at `point`
    /// travelling in the direction `heading`, in radians.
    pub fn next_waypoint(&self, point: Point2d, heading: f64) -> usize {
        let closest = self.closest_waypoint(point);
        let to_waypoint = self.waypoints[closest].position() - point;
        let bearing = to_waypoint.y.atan2(to_waypoint.x);

        if heading_difference(heading, bearing) > std::f64::consts::FRAC_PI_2 {
            (closest + 1) % self.len()
        } else {
            closest
        }
    }

    /// Converts a world space position into the road frame.
    ///
    /// # Parameters
    /// * `point` - The position to convert
    /// * `heading` - The direction of travel at `point` in radians, used to pick
    ///   the segment of the centre line the point belongs to.
    pub fn to_road_frame(&self, point: Point2d, heading: f64) -> RoadCoord {
        let next = self.next_waypoint(point, heading);
        let prev = (next + self.len() - 1) % self.len();
        let (wp_prev, wp_next) = (&self.waypoints[prev], &self.waypoints[next]);

        let segment = wp_next.position() - wp_prev.position();
        let seg_len = segment.magnitude();
        let tangent = segment / seg_len;

        // Longitudinal projection onto the segment
        let along = (point - wp_prev.position()).dot(tangent);
        let foot = wp_prev.position() + tangent * along;

        // Lateral distance, signed by the normal at the foot of the projection
        let lateral = point - foot;
        let normal = self.blend_normals(wp_prev, wp_next, along / seg_len);
        let d = lateral.magnitude().copysign(lateral.dot(normal));

        RoadCoord {
            s: self.wrap_s(wp_prev.s + along),
            d,
        }
    }

    /// Converts a road frame position into world space.
    ///
    /// `s` may lie outside `[0, max_s)`; it is wrapped onto the track.
    pub fn to_cartesian(&self, s: f64, d: f64) -> Point2d {
        let s = self.wrap_s(s);

        // The last waypoint at or before `s`, wrapping to the end of the table
        // when `s` precedes the first waypoint.
        let prev = self
            .waypoints
            .partition_point(|wp| wp.s <= s)
            .checked_sub(1)
            .unwrap_or(self.len() - 1);
        let next = (prev + 1) % self.len();
        let (wp_prev, wp_next) = (&self.waypoints[prev], &self.waypoints[next]);

        let t = self.wrap_s(s - wp_prev.s) / self.span(wp_prev, wp_next);
        let centre = wp_prev.position() + (wp_next.position() - wp_prev.position()) * t;
        centre + self.blend_normals(wp_prev, wp_next, t) * d
    }

    /// The longitudinal distance from one waypoint to the next, across the seam if needed.
    fn span(&self, from: &Waypoint, to: &Waypoint) -> f64 {
        let span = to.s - from.s;
        if span > 0.0 {
            span
        } else {
            span + self.max_s
        }
    }

    /// Linearly interpolates the normals of two waypoints, clamping `t` to the segment.
    fn blend_normals(&self, from: &Waypoint, to: &Waypoint, t: f64) -> Vector2d {
        let t = t.clamp(0.0, 1.0);
        let normal = from.normal().lerp(to.normal(), t);
        if normal.magnitude2() > 0.0 {
            normal.normalize()
        } else {
            from.normal()
        }
    }
}

/// Builds a circular track running anti-clockwise around the origin.
///
/// The waypoint normals point outwards, so `d` increases to the right of the
/// direction of travel, and `s` is measured along the chords between waypoints.
#[cfg(test)]
pub(crate) fn circular_track(radius: f64, count: usize) -> TrackModel {
    let step = std::f64::consts::TAU / count as f64;
    let chord = 2.0 * radius * (0.5 * step).sin();
    let waypoints = (0..count)
        .map(|i| {
            let (sin, cos) = (i as f64 * step).sin_cos();
            Waypoint {
                x: radius * cos,
                y: radius * sin,
                s: i as f64 * chord,
                normal_dx: cos,
                normal_dy: sin,
            }
        })
        .collect();
    TrackModel::new(waypoints, count as f64 * chord)
}
