use super::{heading_vector, project_local, rot90, Point2d, Vector2d};

/// A right-handed coordinate frame with its origin at a reference pose,
/// and its x-axis pointing along the reference heading.
#[derive(Clone, Copy, Debug)]
pub struct LocalFrame {
    origin: Point2d,
    x_axis: Vector2d,
    y_axis: Vector2d,
}

impl LocalFrame {
    /// Creates a frame at `origin` rotated by `heading` radians.
    pub fn new(origin: Point2d, heading: f64) -> Self {
        let x_axis = heading_vector(heading);
        Self {
            origin,
            x_axis,
            y_axis: rot90(x_axis),
        }
    }

    /// The world space position of the frame's origin.
    pub fn origin(&self) -> Point2d {
        self.origin
    }

    /// Transforms a world space point into the frame.
    pub fn to_local(&self, point: Point2d) -> Point2d {
        project_local(point, self.origin, self.x_axis, self.y_axis)
    }

    /// Transforms a point in the frame back into world space.
    pub fn to_world(&self, point: Point2d) -> Point2d {
        self.origin + self.x_axis * point.x + self.y_axis * point.y
    }
}
