//! Simple magnetic field providers.

use helion_core::{FieldGradient, MagneticField, Vector3};

/// The same field value everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantField {
    value: Vector3,
}

impl ConstantField {
    /// A uniform field of `value` Tesla.
    pub fn new(value: Vector3) -> Self {
        Self { value }
    }

    /// A uniform solenoid-like field along +z.
    pub fn along_z(tesla: f64) -> Self {
        Self::new(Vector3::new(0.0, 0.0, tesla))
    }

    /// The field value.
    pub fn value(&self) -> Vector3 {
        self.value
    }
}

impl MagneticField for ConstantField {
    fn field(&self, _position: &Vector3) -> Vector3 {
        self.value
    }

    fn field_with_gradient(&self, _position: &Vector3) -> (Vector3, Option<FieldGradient>) {
        (self.value, Some([[0.0; 3]; 3]))
    }
}

/// No field anywhere; tracks fly straight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullField;

impl MagneticField for NullField {
    fn field(&self, _position: &Vector3) -> Vector3 {
        Vector3::ZERO
    }

    fn field_with_gradient(&self, _position: &Vector3) -> (Vector3, Option<FieldGradient>) {
        (Vector3::ZERO, Some([[0.0; 3]; 3]))
    }
}
