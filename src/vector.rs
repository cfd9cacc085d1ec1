// Copyright 2023 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Vector kernel and tolerance-aware comparisons.
//!
//! Dot and cross products come straight from [`nalgebra`]; what is added here
//! is the normalized cross product with an explicit degenerate case and a
//! [`Tolerance`] that every geometric comparison in the crate goes through.

use float_cmp::{ApproxEq, F64Margin};
use nalgebra::{UnitVector3, Vector3};
use serde::{Deserialize, Serialize};

pub type Point = Vector3<f64>;

/// Default absolute tolerance for scalar and vector comparisons.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Unit vector along `a × b`.
///
/// Returns `None` if the cross product vanishes, i.e. the vectors are parallel
/// or one of them is zero.
pub fn normalized_cross(a: &Point, b: &Point) -> Option<UnitVector3<f64>> {
    UnitVector3::try_new(a.cross(b), 0.0)
}

/// Absolute tolerance used for floating point comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tolerance {
    epsilon: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

impl Tolerance {
    pub const fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    const fn margin(&self) -> F64Margin {
        F64Margin {
            epsilon: self.epsilon,
            ulps: 0,
        }
    }

    /// `a == b` within tolerance
    pub fn eq(&self, a: f64, b: f64) -> bool {
        a.approx_eq(b, self.margin())
    }

    /// `a >= b` within tolerance
    pub fn geq(&self, a: f64, b: f64) -> bool {
        a > b - self.epsilon
    }

    /// `a > b` by more than the tolerance
    pub fn gt(&self, a: f64, b: f64) -> bool {
        a > b + self.epsilon
    }

    /// Component-wise equality of two points.
    pub fn points_eq(&self, a: &Point, b: &Point) -> bool {
        a.iter().zip(b.iter()).all(|(&x, &y)| self.eq(x, y))
    }

    /// Sign of `x` as -1, 0 or 1 where anything within tolerance of zero is zero.
    pub fn sign(&self, x: f64) -> f64 {
        if self.eq(x, 0.0) {
            0.0
        } else {
            x.signum()
        }
    }

    /// Snap `x` into `[-1, 1]`; values within tolerance of a bound are set to that bound.
    ///
    /// Keeps `asin` defined when round-off pushes a dot product of unit vectors past ±1.
    pub fn clamp_unit(&self, x: f64) -> f64 {
        if self.geq(x, 1.0) {
            1.0
        } else if self.geq(-1.0, x) {
            -1.0
        } else {
            x
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn normalized_cross_product() {
        let x = Point::x();
        let y = Point::y();
        let n = normalized_cross(&(2.0 * x), &(3.0 * y)).unwrap();
        assert_approx_eq!(f64, n.z, 1.0);
        assert_approx_eq!(f64, n.norm(), 1.0);

        // parallel and zero vectors are degenerate
        assert!(normalized_cross(&x, &(4.0 * x)).is_none());
        assert!(normalized_cross(&x, &Point::zeros()).is_none());
    }

    #[test]
    fn scalar_comparisons() {
        let tol = Tolerance::default();
        assert!(tol.eq(1.0, 1.0 + 0.5e-4));
        assert!(!tol.eq(1.0, 1.0 + 2e-4));
        assert!(tol.geq(1.0 - 0.5e-4, 1.0));
        assert!(!tol.geq(1.0 - 2e-4, 1.0));
        assert!(tol.gt(1.0 + 2e-4, 1.0));
        assert!(!tol.gt(1.0 + 0.5e-4, 1.0));
    }

    #[test]
    fn sign_and_clamp() {
        let tol = Tolerance::new(1e-3);
        assert_eq!(tol.sign(5e-4), 0.0);
        assert_eq!(tol.sign(-2.0), -1.0);
        assert_eq!(tol.sign(0.1), 1.0);

        assert_eq!(tol.clamp_unit(1.0005), 1.0);
        assert_eq!(tol.clamp_unit(0.9995), 1.0);
        assert_eq!(tol.clamp_unit(-1.2), -1.0);
        assert_eq!(tol.clamp_unit(0.25), 0.25);
    }

    #[test]
    fn point_comparison() {
        let tol = Tolerance::default();
        let a = Point::new(1.0, 2.0, 3.0);
        assert!(tol.points_eq(&a, &Point::new(1.00001, 2.0, 2.99999)));
        assert!(!tol.points_eq(&a, &Point::new(1.0, 2.001, 3.0)));
    }
}
