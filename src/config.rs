//! Planner configuration.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// An error in loading or validating a [PlannerConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read the configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse the configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The constants governing the planner.
///
/// Speeds are in the simulator's display units (mph), distances in m and times in s.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// The length of the track centre line, after which `s` wraps back to zero.
    pub max_s: f64,
    /// The width of a lane.
    pub lane_width: f64,
    /// The number of lanes, numbered from 0 at the centre line outwards.
    pub lane_count: usize,
    /// The lane the vehicle starts in.
    pub initial_lane: usize,
    /// The reference speed is never raised above this.
    pub speed_limit: f64,
    /// The amount the reference speed changes by in one cycle.
    pub speed_step: f64,
    /// A vehicle ahead in the same lane closer than this blocks the lane.
    pub follow_distance: f64,
    /// How far behind the ego vehicle a vehicle in an adjacent lane blocks it.
    pub adjacent_gap_behind: f64,
    /// How far ahead of the ego vehicle a vehicle in an adjacent lane blocks it.
    pub adjacent_gap_ahead: f64,
    /// The spacing of the far anchor points, also used as the spline target distance.
    pub lookahead: f64,
    /// The number of far anchor points.
    pub anchor_count: usize,
    /// The number of points in each trajectory.
    pub horizon: usize,
    /// The time between consecutive trajectory points.
    pub time_step: f64,
    /// Display speed units per m/s.
    pub mph_per_mps: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_s: 6945.554,
            lane_width: 4.0,
            lane_count: 3,
            initial_lane: 1,
            speed_limit: 49.5,
            speed_step: 0.224,
            follow_distance: 30.0,
            adjacent_gap_behind: 10.0,
            adjacent_gap_ahead: 30.0,
            lookahead: 30.0,
            anchor_count: 3,
            horizon: 50,
            time_step: 0.02,
            mph_per_mps: 2.24,
        }
    }
}

impl PlannerConfig {
    /// Loads a configuration from a JSON file. Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a usable planner.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_s", self.max_s),
            ("lane_width", self.lane_width),
            ("speed_limit", self.speed_limit),
            ("speed_step", self.speed_step),
            ("follow_distance", self.follow_distance),
            ("lookahead", self.lookahead),
            ("time_step", self.time_step),
            ("mph_per_mps", self.mph_per_mps),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(*v > 0.0 && v.is_finite())) {
            return Err(ConfigError::Invalid(format!(
                "`{}` must be positive, found {}",
                name, value
            )));
        }
        if !(self.adjacent_gap_behind >= 0.0 && self.adjacent_gap_ahead >= 0.0) {
            return Err(ConfigError::Invalid(
                "adjacent lane gaps must not be negative".into(),
            ));
        }
        if self.lane_count == 0 {
            return Err(ConfigError::Invalid("there must be at least one lane".into()));
        }
        if self.initial_lane >= self.lane_count {
            return Err(ConfigError::Invalid(format!(
                "initial lane {} is outside the {} lanes",
                self.initial_lane, self.lane_count
            )));
        }
        if self.anchor_count == 0 || self.horizon == 0 {
            return Err(ConfigError::Invalid(
                "`anchor_count` and `horizon` must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PlannerConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{ "lane_count": 4, "speed_limit": 45.0 }"#).unwrap();
        assert_eq!(config.lane_count, 4);
        assert_eq!(config.speed_limit, 45.0);
        assert_eq!(config.horizon, 50);
    }

    #[test]
    fn rejects_bad_values() {
        let config = PlannerConfig {
            initial_lane: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PlannerConfig {
            time_step: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

}
