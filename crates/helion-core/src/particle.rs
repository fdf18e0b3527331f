//! Particle species assumed when computing material interactions.

use std::fmt;

/// Species hypothesis for a track.
///
/// Only the mass enters the stepping physics; charge is carried by the
/// track state itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParticleHypothesis {
    /// Electron / positron.
    Electron,
    /// Muon.
    Muon,
    /// Charged pion.
    #[default]
    Pion,
    /// Charged kaon.
    Kaon,
    /// Proton / antiproton.
    Proton,
}

impl ParticleHypothesis {
    /// Rest mass in GeV.
    pub fn mass(self) -> f64 {
        match self {
            Self::Electron => 0.000_510_998_950,
            Self::Muon => 0.105_658_375_5,
            Self::Pion => 0.139_570_39,
            Self::Kaon => 0.493_677,
            Self::Proton => 0.938_272_088_16,
        }
    }
}

impl fmt::Display for ParticleHypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Electron => "electron",
            Self::Muon => "muon",
            Self::Pion => "pion",
            Self::Kaon => "kaon",
            Self::Proton => "proton",
        };
        f.write_str(name)
    }
}
