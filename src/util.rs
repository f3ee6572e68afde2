//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if the value lies strictly inside this interval.
    pub fn surrounds(&self, value: T) -> bool {
        value > self.min && value < self.max
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

/// Wraps a longitudinal position into `[0, length)`.
pub fn wrap_distance(pos: f64, length: f64) -> f64 {
    let pos = pos.rem_euclid(length);
    // `rem_euclid` can round up to `length` for tiny negative inputs
    if pos >= length {
        0.0
    } else {
        pos
    }
}

/// The signed distance from `from` to `to` along a loop of the given length,
/// choosing the shorter way round. The result lies in `[-length / 2, length / 2)`.
pub fn loop_offset(from: f64, to: f64, length: f64) -> f64 {
    let half = 0.5 * length;
    wrap_distance(to - from + half, length) - half
}
