use super::{CubicFn, Point2d};
use crate::util::Interval;
use itertools::Itertools;

/// A natural cubic spline `y = f(x)` interpolating a set of knots.
///
/// Each span between two knots is stored as a [CubicFn] fitted to the values and
/// slopes of the spline at its ends. Outside the knots the spline is extended
/// linearly, which keeps extrapolated values finite and continuous.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    /// The x-coordinates of the interior knots, which separate the spans.
    breaks: Vec<f64>,
    /// The polynomial for each span.
    spans: Vec<CubicFn>,
    /// The range of x covered by the knots.
    bounds: Interval<f64>,
}

impl CubicSpline {
    /// Fits a natural cubic spline through the given knots.
    ///
    /// # Panics
    /// If there are fewer than two knots, or the knots are not strictly increasing in x.
    pub fn new(knots: &[Point2d]) -> Self {
        assert!(knots.len() >= 2, "a spline needs at least two knots");
        assert!(
            knots.iter().tuple_windows().all(|(a, b)| a.x < b.x),
            "spline knots must be strictly increasing in x: {:?}",
            knots
        );

        let slopes = knot_slopes(knots);
        let spans = knots
            .iter()
            .zip(&slopes)
            .tuple_windows()
            .map(|((p1, m1), (p2, m2))| CubicFn::fit(p1.x, p1.y, *m1, p2.x, p2.y, *m2))
            .collect();

        Self {
            breaks: knots[1..knots.len() - 1].iter().map(|p| p.x).collect(),
            spans,
            bounds: Interval::new(knots[0].x, knots[knots.len() - 1].x),
        }
    }

    /// Evaluates the spline at `x`.
    pub fn y(&self, x: f64) -> f64 {
        let Interval { min, max } = self.bounds;
        if x < min {
            let (y, dy) = self.span(min).y_and_dy(min);
            y + dy * (x - min)
        } else if x > max {
            let (y, dy) = self.span(max).y_and_dy(max);
            y + dy * (x - max)
        } else {
            self.span(x).y(x)
        }
    }

    /// Evaluates the derivative of the spline at `x`.
    pub fn dy(&self, x: f64) -> f64 {
        let x = x.clamp(self.bounds.min, self.bounds.max);
        self.span(x).dy(x)
    }

    /// Gets the span covering `x`.
    fn span(&self, x: f64) -> &CubicFn {
        let idx = self.breaks.partition_point(|b| *b <= x);
        &self.spans[idx]
    }
}

/// Computes the slope of the natural spline at each knot.
///
/// Solves the tridiagonal system for the second derivatives at the interior knots
/// (they are zero at both ends), then derives the slopes from them.
fn knot_slopes(knots: &[Point2d]) -> Vec<f64> {
    let n = knots.len();
    let h = knots.iter().tuple_windows().map(|(a, b)| b.x - a.x).collect::<Vec<_>>();
    let delta = knots
        .iter()
        .tuple_windows()
        .zip(&h)
        .map(|((a, b), h)| (b.y - a.y) / h)
        .collect::<Vec<_>>();

    let mut m = vec![0.0; n];
    if n > 2 {
        let mut diag = vec![0.0; n];
        let mut rhs = vec![0.0; n];
        for i in 1..n - 1 {
            diag[i] = 2.0 * (h[i - 1] + h[i]);
            rhs[i] = 6.0 * (delta[i] - delta[i - 1]);
        }
        // Forward elimination; the off-diagonals of row `i` are `h[i - 1]` and `h[i]`
        for i in 2..n - 1 {
            let w = h[i - 1] / diag[i - 1];
            diag[i] -= w * h[i - 1];
            rhs[i] -= w * rhs[i - 1];
        }
        for i in (1..n - 1).rev() {
            m[i] = (rhs[i] - h[i] * m[i + 1]) / diag[i];
        }
    }

    (0..n)
        .map(|i| {
            if i + 1 < n {
                delta[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0
            } else {
                delta[i - 1] + h[i - 1] * (m[i - 1] + 2.0 * m[i]) / 6.0
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn knots(points: &[(f64, f64)]) -> Vec<Point2d> {
        points.iter().map(|(x, y)| Point2d::new(*x, *y)).collect()
    }

    #[test]
    fn passes_through_knots() {
        let points = knots(&[(-1.0, 0.0), (0.0, 0.0), (30.0, 1.5), (60.0, 4.0), (90.0, 4.0)]);
        let spline = CubicSpline::new(&points);
        for p in &points {
            assert_approx_eq!(spline.y(p.x), p.y, 1e-9);
        }
    }

    #[test]
    fn slope_is_continuous_across_knots() {
        let points = knots(&[(-2.0, 1.0), (0.0, 0.0), (25.0, 3.0), (55.0, -1.0), (80.0, 2.0)]);
        let spline = CubicSpline::new(&points);
        for p in &points[1..points.len() - 1] {
            assert_approx_eq!(spline.dy(p.x - 1e-7), spline.dy(p.x + 1e-7), 1e-5);
        }
    }

    #[test]
    fn natural_end_conditions() {
        let points = knots(&[(0.0, 0.0), (10.0, 5.0), (20.0, -3.0), (35.0, 2.0)]);
        let spline = CubicSpline::new(&points);
        assert_approx_eq!(spline.spans[0].dy2(0.0), 0.0, 1e-9);
        assert_approx_eq!(spline.spans[2].dy2(35.0), 0.0, 1e-9);
    }

    #[test]
    fn reproduces_straight_lines() {
        let points = knots(&[(-1.0, -1.5), (0.0, 1.0), (4.0, 11.0), (9.0, 23.5)]);
        let spline = CubicSpline::new(&points);
        for x in [-3.0, -0.5, 2.0, 7.5, 12.0] {
            assert_approx_eq!(spline.y(x), 1.0 + 2.5 * x, 1e-9);
        }
    }

    #[test]
    fn two_knots_is_a_line() {
        let spline = CubicSpline::new(&knots(&[(0.0, 1.0), (2.0, 2.0)]));
        assert_approx_eq!(spline.y(1.0), 1.5);
        assert_approx_eq!(spline.dy(1.0), 0.5);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn rejects_unordered_knots() {
        CubicSpline::new(&knots(&[(0.0, 0.0), (10.0, 1.0), (5.0, 2.0)]));
    }
}
