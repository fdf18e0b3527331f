//! Material description for dense-environment stepping.

use crate::error::ConfigError;

/// Bulk properties of the material a track is traversing.
///
/// Lengths are in mm, atomic mass in g/mol, density in g/cm³.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialProperties {
    x0: f64,
    l0: f64,
    a: f64,
    z: f64,
    density: f64,
    thickness: f64,
}

impl MaterialProperties {
    /// Build a validated material slab.
    ///
    /// Radiation and interaction lengths must be positive (infinite is
    /// allowed), the remaining quantities finite and non-negative.
    pub fn new(
        x0: f64,
        l0: f64,
        a: f64,
        z: f64,
        density: f64,
        thickness: f64,
    ) -> Result<Self, ConfigError> {
        let positive = |name: &str, v: f64| {
            if v.is_nan() || v <= 0.0 {
                Err(ConfigError::InvalidMaterial {
                    reason: format!("{name} must be positive, got {v}"),
                })
            } else {
                Ok(())
            }
        };
        let non_negative = |name: &str, v: f64| {
            if !v.is_finite() || v < 0.0 {
                Err(ConfigError::InvalidMaterial {
                    reason: format!("{name} must be finite and non-negative, got {v}"),
                })
            } else {
                Ok(())
            }
        };
        positive("x0", x0)?;
        positive("l0", l0)?;
        non_negative("a", a)?;
        non_negative("z", z)?;
        non_negative("density", density)?;
        non_negative("thickness", thickness)?;
        Ok(Self {
            x0,
            l0,
            a,
            z,
            density,
            thickness,
        })
    }

    /// Empty space.
    pub fn vacuum() -> Self {
        Self {
            x0: f64::INFINITY,
            l0: f64::INFINITY,
            a: 0.0,
            z: 0.0,
            density: 0.0,
            thickness: 0.0,
        }
    }

    /// A silicon slab of the given thickness in mm.
    pub fn silicon(thickness: f64) -> Result<Self, ConfigError> {
        Self::new(93.7, 465.2, 28.0855, 14.0, 2.329, thickness)
    }

    /// The same material as a slab of `thickness` mm.
    ///
    /// Negative or non-finite thicknesses collapse to zero.
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = if thickness.is_finite() && thickness > 0.0 {
            thickness
        } else {
            0.0
        };
        self
    }

    /// Radiation length in mm.
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// Nuclear interaction length in mm.
    pub fn l0(&self) -> f64 {
        self.l0
    }

    /// Atomic mass in g/mol.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Atomic number.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Density in g/cm³.
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Slab thickness in mm.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Whether the material has no effect on a traversing track.
    pub fn is_vacuum(&self) -> bool {
        self.density == 0.0 || self.z == 0.0 || self.a == 0.0
    }

    /// Thickness in units of radiation length.
    pub fn thickness_in_x0(&self) -> f64 {
        if self.x0.is_infinite() {
            0.0
        } else {
            self.thickness / self.x0
        }
    }

    /// `Z/A` in mol/g, zero for vacuum.
    pub fn z_over_a(&self) -> f64 {
        if self.a == 0.0 {
            0.0
        } else {
            self.z / self.a
        }
    }

    /// Approximate mean excitation energy `I ≈ 16 eV · Z^0.9`, in GeV.
    pub fn mean_excitation_energy(&self) -> f64 {
        16.0e-9 * self.z.powf(0.9)
    }
}
