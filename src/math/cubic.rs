//! Mathematical functions.

/// A cubic function.
#[derive(Clone, Copy, Debug)]
pub struct CubicFn {
    coeffs: [f64; 4],
    offset: f64,
}

impl CubicFn {
    /// Fits the cubic which passes through `(x1, y1)` and `(x2, y2)`
    /// with the given slopes at each end.
    pub fn fit(x1: f64, y1: f64, dydx1: f64, x2: f64, y2: f64, dydx2: f64) -> Self {
        let w = x2 - x1;
        let a = 2. * y1 - 2. * y2 + w * dydx1 + w * dydx2;
        let b = -3. * y1 + 3. * y2 - 2. * w * dydx1 - w * dydx2;
        let c = w * dydx1;
        let d = y1;
        Self {
            coeffs: [a * w.powi(-3), b * w.powi(-2), c * w.powi(-1), d],
            offset: -x1,
        }
    }

    pub fn y(&self, x: f64) -> f64 {
        self.y_and_dy(x).0
    }

    pub fn dy(&self, x: f64) -> f64 {
        self.y_and_dy(x).1
    }

    /// The second derivative at `x`.
    pub fn dy2(&self, x: f64) -> f64 {
        let c = &self.coeffs;
        let x = x + self.offset;
        6. * c[0] * x + 2. * c[1]
    }

    pub fn y_and_dy(&self, x: f64) -> (f64, f64) {
        let c = &self.coeffs;
        let x = x + self.offset;

        let y = ((c[0] * x + c[1]) * x + c[2]) * x + c[3];
        let dy = (3. * c[0] * x + 2. * c[1]) * x + c[2];

        (y, dy)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    pub fn fit_matches_end_conditions() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"seven lanes of traffic at dusk..");
        for _ in 0..100 {
            let x1 = rng.gen_range(-100.0..0.0);
            let x2 = rng.gen_range(1.0..100.0);
            let y1 = rng.gen_range(-20.0..20.0);
            let y2 = rng.gen_range(-20.0..20.0);
            let dydx1 = rng.gen_range(-2.0..2.0);
            let dydx2 = rng.gen_range(-2.0..2.0);
            let cubic = CubicFn::fit(x1, y1, dydx1, x2, y2, dydx2);

            assert_approx_eq!(cubic.y(x1), y1, 0.01);
            assert_approx_eq!(cubic.dy(x1), dydx1, 0.01);
            assert_approx_eq!(cubic.y(x2), y2, 0.01);
            assert_approx_eq!(cubic.dy(x2), dydx2, 0.01);
        }
    }

    #[test]
    pub fn straight_line_has_no_curvature() {
        let cubic = CubicFn::fit(-4.0, 1.0, 0.5, 6.0, 6.0, 0.5);
        for x in [-4.0, 0.0, 2.5, 6.0] {
            assert_approx_eq!(cubic.y(x), 3.0 + 0.5 * x, 1e-9);
            assert_approx_eq!(cubic.dy2(x), 0.0, 1e-9);
        }
    }
}
