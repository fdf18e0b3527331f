//! The stepper's track state.

use helion_core::{
    ConfigError, Jacobian, MaterialProperties, ParticleHypothesis, TrackState, Vector3,
};

/// Free-parameter track state advanced by [`RkStepper`](crate::RkStepper).
///
/// Carries the kinematics extensions read through [`TrackState`], the
/// material at the current position, and, when covariance transport is
/// enabled, a 7×7 covariance plus the jacobian accumulated since the state
/// was created.
#[derive(Clone, Debug, PartialEq)]
pub struct StepperState {
    pub(crate) position: Vector3,
    pub(crate) direction: Vector3,
    momentum: f64,
    charge: f64,
    time: f64,
    pub(crate) path_length: f64,
    particle: ParticleHypothesis,
    material: Option<MaterialProperties>,
    pub(crate) covariance: Option<Jacobian>,
    pub(crate) jacobian: Jacobian,
    pub(crate) step_size: Option<f64>,
}

impl StepperState {
    /// A pion with the given kinematics, in vacuum.
    ///
    /// `direction` is normalized; it must be non-zero and `momentum` finite
    /// and positive.
    pub fn new(
        position: Vector3,
        direction: Vector3,
        momentum: f64,
        charge: f64,
    ) -> Result<Self, ConfigError> {
        let direction = direction
            .normalized()
            .ok_or(ConfigError::InvalidParameter {
                name: "direction",
                value: direction.norm(),
            })?;
        if !position.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "position",
                value: position.abs_sum(),
            });
        }
        if !momentum.is_finite() || momentum <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "momentum",
                value: momentum,
            });
        }
        if !charge.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "charge",
                value: charge,
            });
        }
        Ok(Self {
            position,
            direction,
            momentum,
            charge,
            time: 0.0,
            path_length: 0.0,
            particle: ParticleHypothesis::default(),
            material: None,
            covariance: None,
            jacobian: Jacobian::identity(),
            step_size: None,
        })
    }

    /// Use a different particle hypothesis.
    pub fn with_particle(mut self, particle: ParticleHypothesis) -> Self {
        self.particle = particle;
        self
    }

    /// Start inside `material`.
    pub fn with_material(mut self, material: MaterialProperties) -> Self {
        self.material = Some(material);
        self
    }

    /// Attach an initial covariance (transported only when the stepper is
    /// configured to).
    pub fn with_covariance(mut self, covariance: Jacobian) -> Self {
        self.covariance = Some(covariance);
        self
    }

    /// Replace the material at the current position.
    pub fn set_material(&mut self, material: Option<MaterialProperties>) {
        self.material = material;
    }

    /// Covariance of the free parameters, if one was attached.
    pub fn covariance(&self) -> Option<&Jacobian> {
        self.covariance.as_ref()
    }

    /// Product of all step jacobians applied so far.
    ///
    /// Stays the identity unless covariance transport is enabled.
    pub fn jacobian(&self) -> &Jacobian {
        &self.jacobian
    }

    /// Step size the next step will start from, once a step was taken.
    pub fn step_size(&self) -> Option<f64> {
        self.step_size
    }

    /// Forget the adapted step size; the next step starts from the
    /// configured initial one.
    pub fn reset_step_size(&mut self) {
        self.step_size = None;
    }
}

impl TrackState for StepperState {
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
