//! The simulator's message framing.
//!
//! Each message is an event frame: the prefix `42` followed by a JSON array holding
//! the event name and its payload, e.g. `42["telemetry",{...}]`.

use crate::math::Point2d;
use crate::planner::{Telemetry, VehicleObservation};
use crate::track::RoadCoord;
use crate::trajectory::Trajectory;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// The prefix of every event frame.
const EVENT_PREFIX: &str = "42";

/// Tells the simulator to keep driving manually.
pub const MANUAL: &str = r#"42["manual",{}]"#;

/// Tells the simulator to reset the vehicle to the start of the track.
pub const RESET: &str = r#"42["reset",{}]"#;

/// An error in decoding or encoding an event frame.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed event frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The previous path has {x} x-coordinates but {y} y-coordinates")]
    PathLength { x: usize, y: usize },
}

/// A decoded event frame.
#[derive(Clone, Debug)]
pub enum Frame {
    /// A telemetry event to plan against.
    Telemetry(Box<TelemetryMessage>),
    /// A telemetry event without data, sent while the vehicle is driven manually.
    Manual,
    /// Any other message.
    Ignored,
}

/// The payload of a telemetry event, as sent by the simulator.
#[derive(Clone, Debug, Deserialize)]
pub struct TelemetryMessage {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub d: f64,
    /// In degrees.
    pub yaw: f64,
    pub speed: f64,
    pub previous_path_x: Vec<f64>,
    pub previous_path_y: Vec<f64>,
    pub end_path_s: f64,
    pub end_path_d: f64,
    pub sensor_fusion: Vec<VehicleObservation>,
}

impl From<TelemetryMessage> for Telemetry {
    fn from(msg: TelemetryMessage) -> Self {
        let previous_path = msg
            .previous_path_x
            .iter()
            .zip(&msg.previous_path_y)
            .map(|(&x, &y)| Point2d::new(x, y))
            .collect();

        Telemetry {
            position: Point2d::new(msg.x, msg.y),
            s: msg.s,
            d: msg.d,
            yaw: msg.yaw,
            speed: msg.speed,
            previous_path,
            previous_path_end: RoadCoord {
                s: msg.end_path_s,
                d: msg.end_path_d,
            },
            observations: msg.sensor_fusion,
        }
    }
}

/// Decodes one message from the simulator.
pub fn parse_frame(line: &str) -> Result<Frame, MessageError> {
    let Some(body) = line.trim().strip_prefix(EVENT_PREFIX) else {
        return Ok(Frame::Ignored);
    };

    let mut items: Vec<Value> = serde_json::from_str(body)?;
    if items.first().and_then(Value::as_str) != Some("telemetry") {
        return Ok(Frame::Ignored);
    }
    let payload = if items.len() > 1 {
        items.swap_remove(1)
    } else {
        Value::Null
    };
    if payload.is_null() {
        return Ok(Frame::Manual);
    }

    let msg: TelemetryMessage = serde_json::from_value(payload)?;
    if msg.previous_path_x.len() != msg.previous_path_y.len() {
        return Err(MessageError::PathLength {
            x: msg.previous_path_x.len(),
            y: msg.previous_path_y.len(),
        });
    }
    Ok(Frame::Telemetry(Box::new(msg)))
}

/// Encodes a trajectory as a control event.
pub fn control_frame(trajectory: &Trajectory) -> Result<String, MessageError> {
    let body = serde_json::to_string(&("control", trajectory))?;
    Ok(format!("{}{}", EVENT_PREFIX, body))
}
