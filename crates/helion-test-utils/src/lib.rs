//! Test utilities and mock types for Helion development.
//!
//! Provides a mock track state ([`MockTrack`]), a counting uniform field
//! ([`CountingField`]), and configurable stub extensions in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use helion_core::{MagneticField, MaterialProperties, ParticleHypothesis, TrackState, Vector3};

pub use fixtures::{CallCounts, CallLog, StubExtension, ValiditySwitch};

/// Plain-field implementation of [`TrackState`].
///
/// All fields are public so tests can set up and inspect any situation.
#[derive(Clone, Debug, PartialEq)]
pub struct MockTrack {
    pub position: Vector3,
    pub direction: Vector3,
    pub momentum: f64,
    pub charge: f64,
    pub time: f64,
    pub path_length: f64,
    pub particle: ParticleHypothesis,
    pub material: Option<MaterialProperties>,
}

impl MockTrack {
    /// A 1 GeV positive pion at the origin flying along +x, in vacuum.
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            direction: Vector3::new(1.0, 0.0, 0.0),
            momentum: 1.0,
            charge: 1.0,
            time: 0.0,
            path_length: 0.0,
            particle: ParticleHypothesis::Pion,
            material: None,
        }
    }

    /// The same track inside `material`.
    pub fn in_material(mut self, material: MaterialProperties) -> Self {
        self.material = Some(material);
        self
    }

    /// The same track with a different absolute momentum.
    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }
}

impl Default for MockTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackState for MockTrack {
    fn position(&self) -> Vector3 {
        self.position
    }

    fn direction(&self) -> Vector3 {
        self.direction
    }

    fn momentum(&self) -> f64 {
        self.momentum
    }

    fn charge(&self) -> f64 {
        self.charge
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn path_length(&self) -> f64 {
        self.path_length
    }

    fn particle(&self) -> ParticleHypothesis {
        self.particle
    }

    fn material(&self) -> Option<&MaterialProperties> {
        self.material.as_ref()
    }

    fn set_momentum(&mut self, momentum: f64) {
        self.momentum = momentum;
    }

    fn set_time(&mut self, time: f64) {
        self.time = time;
    }
}

/// Uniform field that counts how often it is sampled.
pub struct CountingField {
    value: Vector3,
    samples: AtomicUsize,
}

impl CountingField {
    pub fn new(value: Vector3) -> Self {
        Self {
            value,
            samples: AtomicUsize::new(0),
        }
    }

    /// How many times the field has been sampled.
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }
}

impl MagneticField for CountingField {
    fn field(&self, _position: &Vector3) -> Vector3 {
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.value
    }
}
