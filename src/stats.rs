use crate::error::{TransportError, TransportResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Angular distribution of source particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AngularDistribution {
    Isotropic,
    Monodirectional { reference_uvw: [f64; 3] },
}

impl Default for AngularDistribution {
    /// Pencil beam along +z
    fn default() -> Self {
        AngularDistribution::Monodirectional {
            reference_uvw: [0.0, 0.0, 1.0],
        }
    }
}

impl AngularDistribution {
    /// Create a new monodirectional distribution (direction is normalized)
    pub fn new_monodirectional(u: f64, v: f64, w: f64) -> TransportResult<Self> {
        let mag = (u * u + v * v + w * w).sqrt();
        if mag == 0.0 || !mag.is_finite() {
            return Err(TransportError::invalid(format!(
                "monodirectional reference must be finite and non-zero, got [{}, {}, {}]",
                u, v, w
            )));
        }
        Ok(Self::Monodirectional {
            reference_uvw: [u / mag, v / mag, w / mag],
        })
    }

    pub fn new_isotropic() -> Self {
        Self::Isotropic
    }

    /// Sample a unit direction from this distribution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; 3] {
        match self {
            AngularDistribution::Isotropic => {
                let mu = 2.0 * rng.gen::<f64>() - 1.0;
                let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
                let sin_theta = (1.0 - mu * mu).sqrt();
                [sin_theta * phi.cos(), sin_theta * phi.sin(), mu]
            }
            AngularDistribution::Monodirectional { reference_uvw } => *reference_uvw,
        }
    }
}
