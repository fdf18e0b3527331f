//! Magnetic field service contract.
//!
//! The stepper samples the field at up to three points per step; the
//! extension registry never calls the field itself.

use crate::math::Vector3;

/// Conversion from Tesla to the stepping unit system (GeV, mm, e).
///
/// A particle with `q/p` in e/GeV in a field of `B` Tesla bends with
/// `d²r/ds² = q/p · (dr/ds × B) · TESLA`.
pub const TESLA: f64 = 0.000_299_792_458;

/// Spatial derivatives `∂B_i/∂x_j` in Tesla/mm, row `i` column `j`.
pub type FieldGradient = [[f64; 3]; 3];

/// Source of magnetic field values.
pub trait MagneticField {
    /// Field at `position` (mm), in Tesla.
    fn field(&self, position: &Vector3) -> Vector3;

    /// Field plus its spatial gradient, when the provider can compute one.
    ///
    /// Default: the plain field with no gradient.
    fn field_with_gradient(&self, position: &Vector3) -> (Vector3, Option<FieldGradient>) {
        (self.field(position), None)
    }
}

impl<T: MagneticField + ?Sized> MagneticField for &T {
    fn field(&self, position: &Vector3) -> Vector3 {
        (**self).field(position)
    }

    fn field_with_gradient(&self, position: &Vector3) -> (Vector3, Option<FieldGradient>) {
        (**self).field_with_gradient(position)
    }
}

impl<T: MagneticField + ?Sized> MagneticField for Box<T> {
    fn field(&self, position: &Vector3) -> Vector3 {
        (**self).field(position)
    }

    fn field_with_gradient(&self, position: &Vector3) -> (Vector3, Option<FieldGradient>) {
        (**self).field_with_gradient(position)
    }
}

/// Lorentz-force k-term `q/p · (dir × B) · TESLA`.
///
/// `dir` is the (possibly offset) direction at the sub-stage, `b` the field
/// in Tesla, `qop` in e/GeV.
pub fn lorentz_k(qop: f64, dir: &Vector3, b: &Vector3) -> Vector3 {
    dir.cross(b) * (qop * TESLA)
}
