use crate::error::{TransportError, TransportResult};
use crate::particle::{Particle, ParticleKind};
use crate::stats::AngularDistribution;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Point source emitting particles of a single kind and energy.
///
/// `space` is in mm and `energy` is the kinetic energy in MeV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndependentSource {
    #[serde(default)]
    pub space: [f64; 3],
    #[serde(default)]
    pub angle: AngularDistribution,
    pub energy: f64,
    #[serde(default)]
    pub kind: ParticleKind,
}

impl IndependentSource {
    /// 100 MeV proton pencil beam along +z starting at the origin
    pub fn new() -> Self {
        Self {
            space: [0.0, 0.0, 0.0],
            angle: AngularDistribution::default(),
            energy: 100.0,
            kind: ParticleKind::Proton,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TransportResult<Particle> {
        let direction = self.angle.sample(rng);
        Particle::with_kind(self.space, direction, self.energy, self.kind)
    }

    pub fn validate(&self) -> TransportResult<()> {
        if !self.energy.is_finite() || self.energy <= 0.0 {
            return Err(TransportError::invalid(format!(
                "source energy must be finite and positive, got {}",
                self.energy
            )));
        }
        if self.space.iter().any(|c| !c.is_finite()) {
            return Err(TransportError::invalid(format!(
                "source position must be finite, got {:?}",
                self.space
            )));
        }
        if let AngularDistribution::Monodirectional { reference_uvw } = self.angle {
            AngularDistribution::new_monodirectional(reference_uvw[0], reference_uvw[1], reference_uvw[2])?;
        }
        Ok(())
    }
}

impl Default for IndependentSource {
    fn default() -> Self {
        Self::new()
    }
}
