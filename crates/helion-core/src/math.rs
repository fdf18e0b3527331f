//! Fixed-size linear algebra for track stepping.
//!
//! [`Vector3`] carries positions, directions, field values and Runge–Kutta
//! k-terms. [`Jacobian`] is the 7×7 transport matrix over the free track
//! parameters `(x, y, z, tx, ty, tz, q/p)`, also used to hold covariances.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of free track parameters: position (3), direction (3), q/p (1).
pub const FREE_PARAMS: usize = 7;

/// Row index of q/p in the free parameter vector.
pub const QOP_INDEX: usize = 6;

/// A 3-component `f64` vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3(pub [f64; 3]);

impl Vector3 {
    /// The zero vector.
    pub const ZERO: Self = Self([0.0; 3]);

    /// Construct from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// The x component.
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    /// The y component.
    pub fn y(&self) -> f64 {
        self.0[1]
    }

    /// The z component.
    pub fn z(&self) -> f64 {
        self.0[2]
    }

    /// Dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2]
    }

    /// Cross product `self × other`.
    pub fn cross(&self, other: &Self) -> Self {
        let [a0, a1, a2] = self.0;
        let [b0, b1, b2] = other.0;
        Self([a1 * b2 - a2 * b1, a2 * b0 - a0 * b2, a0 * b1 - a1 * b0])
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Sum of absolute components (L1 norm).
    pub fn abs_sum(&self) -> f64 {
        self.0.iter().map(|c| c.abs()).sum()
    }

    /// Unit vector in the same direction, or `None` for a zero or
    /// non-finite vector.
    pub fn normalized(&self) -> Option<Self> {
        let n = self.norm();
        if n > 0.0 && n.is_finite() {
            Some(*self * (1.0 / n))
        } else {
            None
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self(v)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

impl Index<usize> for Vector3 {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Vector3 {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self([self.0[0] * s, self.0[1] * s, self.0[2] * s])
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, v: Vector3) -> Vector3 {
        v * self
    }
}

impl MulAssign<f64> for Vector3 {
    fn mul_assign(&mut self, s: f64) {
        *self = *self * s;
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        self * -1.0
    }
}

/// A 7×7 row-major matrix over the free track parameters.
///
/// Used both as the per-step transport jacobian `D` and as the track
/// covariance `C`; [`transport`](Jacobian::transport) computes `D·C·Dᵀ`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jacobian(pub [[f64; FREE_PARAMS]; FREE_PARAMS]);

impl Jacobian {
    /// The all-zero matrix.
    pub const fn zeros() -> Self {
        Self([[0.0; FREE_PARAMS]; FREE_PARAMS])
    }

    /// The identity matrix.
    pub fn identity() -> Self {
        let mut m = Self::zeros();
        for i in 0..FREE_PARAMS {
            m.0[i][i] = 1.0;
        }
        m
    }

    /// A diagonal matrix with the given entries.
    pub fn diagonal(values: [f64; FREE_PARAMS]) -> Self {
        let mut m = Self::zeros();
        for (i, v) in values.into_iter().enumerate() {
            m.0[i][i] = v;
        }
        m
    }

    /// Whether this is exactly the identity matrix.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros();
        for i in 0..FREE_PARAMS {
            for j in 0..FREE_PARAMS {
                t.0[j][i] = self.0[i][j];
            }
        }
        t
    }

    /// Transport a covariance through this jacobian: `self · cov · selfᵀ`.
    pub fn transport(&self, cov: &Jacobian) -> Jacobian {
        *self * *cov * self.transpose()
    }

    /// Write a 3-vector into column `col`, rows `row..row + 3`.
    pub fn set_column_block(&mut self, row: usize, col: usize, v: Vector3) {
        for k in 0..3 {
            self.0[row + k][col] = v.0[k];
        }
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Jacobian {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<(usize, usize)> for Jacobian {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.0[r][c]
    }
}

impl IndexMut<(usize, usize)> for Jacobian {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.0[r][c]
    }
}

impl Mul for Jacobian {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = Self::zeros();
        for i in 0..FREE_PARAMS {
            for k in 0..FREE_PARAMS {
                let a = self.0[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..FREE_PARAMS {
                    out.0[i][j] += a * rhs.0[k][j];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cross_of_basis_vectors() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(&x), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn normalized_rejects_zero() {
        assert!(Vector3::ZERO.normalized().is_none());
        let n = Vector3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.norm() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn abs_sum_is_l1() {
        assert_eq!(Vector3::new(-1.0, 2.0, -3.0).abs_sum(), 6.0);
    }

    #[test]
    fn identity_transport_preserves_covariance() {
        let cov = Jacobian::diagonal([1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 1e-4]);
        assert_eq!(Jacobian::identity().transport(&cov), cov);
    }

    #[test]
    fn transport_applies_off_diagonal_coupling() {
        // x' = x + h * tx
        let h = 2.0;
        let mut d = Jacobian::identity();
        d[(0, 3)] = h;
        let cov = Jacobian::diagonal([1.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0]);
        let out = d.transport(&cov);
        assert!((out[(0, 0)] - (1.0 + h * h * 0.5)).abs() < 1e-12);
        assert!((out[(0, 3)] - h * 0.5).abs() < 1e-12);
        assert_eq!(out[(0, 3)], out[(3, 0)]);
    }

    fn arb_vector() -> impl Strategy<Value = Vector3> {
        prop::array::uniform3(-1e3f64..1e3).prop_map(Vector3)
    }

    proptest! {
        #[test]
        fn cross_is_orthogonal(a in arb_vector(), b in arb_vector()) {
            let c = a.cross(&b);
            let scale = 1.0 + a.norm() * b.norm() * (a.norm() + b.norm());
            prop_assert!(c.dot(&a).abs() <= 1e-9 * scale);
            prop_assert!(c.dot(&b).abs() <= 1e-9 * scale);
        }

        #[test]
        fn cross_is_anticommutative(a in arb_vector(), b in arb_vector()) {
            prop_assert_eq!(a.cross(&b), -b.cross(&a));
        }
    }
}
