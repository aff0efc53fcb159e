use crate::data::{ALPHA_MASS_MEV, DEUTERON_MASS_MEV, PROTON_MASS_MEV};
use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};

/// Charged species that can be transported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    #[default]
    Proton,
    Deuteron,
    Alpha,
    /// Arbitrary ion: rest mass in MeV, charge in units of e
    Custom { mass: f64, charge: f64 },
}

impl ParticleKind {
    /// Rest mass in MeV
    pub fn mass(&self) -> f64 {
        match self {
            ParticleKind::Proton => PROTON_MASS_MEV,
            ParticleKind::Deuteron => DEUTERON_MASS_MEV,
            ParticleKind::Alpha => ALPHA_MASS_MEV,
            ParticleKind::Custom { mass, .. } => *mass,
        }
    }

    /// Charge number z
    pub fn charge(&self) -> f64 {
        match self {
            ParticleKind::Proton | ParticleKind::Deuteron => 1.0,
            ParticleKind::Alpha => 2.0,
            ParticleKind::Custom { charge, .. } => *charge,
        }
    }
}

/// Transport state of a single charged particle.
///
/// Positions are in mm, energies in MeV. The state is only changed through
/// [`Particle::move_by`], [`Particle::deposit_energy`] and
/// [`Particle::set_direction`], which keep the following true at all times:
/// * `direction` has unit length
/// * `energy >= 0`, and a particle at zero energy is dead
/// * `energy + deposited_energy == initial_energy`
#[derive(Debug, Clone)]
pub struct Particle {
    position: [f64; 3],
    direction: [f64; 3],
    energy: f64,
    initial_energy: f64,
    mass: f64,
    charge: f64,
    alive: bool,
    track: Vec<[f64; 3]>,
    deposited_energy: f64,
}

impl Particle {
    /// Create a proton at `position` heading along `direction` (normalized here).
    pub fn new(position: [f64; 3], direction: [f64; 3], energy: f64) -> TransportResult<Self> {
        Self::with_kind(position, direction, energy, ParticleKind::Proton)
    }

    pub fn with_kind(
        position: [f64; 3],
        direction: [f64; 3],
        energy: f64,
        kind: ParticleKind,
    ) -> TransportResult<Self> {
        let direction = normalize(direction)?;
        if position.iter().any(|c| !c.is_finite()) {
            return Err(TransportError::invalid(format!(
                "particle position must be finite, got {:?}",
                position
            )));
        }
        if !energy.is_finite() || energy < 0.0 {
            return Err(TransportError::invalid(format!(
                "particle energy must be finite and non-negative, got {}",
                energy
            )));
        }
        let (mass, charge) = (kind.mass(), kind.charge());
        if !mass.is_finite() || mass <= 0.0 || !charge.is_finite() || charge == 0.0 {
            return Err(TransportError::invalid(format!(
                "particle needs a positive mass and non-zero charge, got m={} z={}",
                mass, charge
            )));
        }
        Ok(Particle {
            position,
            direction,
            energy,
            initial_energy: energy,
            mass,
            charge,
            alive: energy > 0.0,
            track: vec![position],
            deposited_energy: 0.0,
        })
    }

    /// Advance the position by `step_length` mm along the current direction
    /// and record the new position in the track.
    pub fn move_by(&mut self, step_length: f64) -> TransportResult<()> {
        if !step_length.is_finite() || step_length < 0.0 {
            return Err(TransportError::invalid(format!(
                "step length must be finite and non-negative, got {}",
                step_length
            )));
        }
        for axis in 0..3 {
            self.position[axis] += self.direction[axis] * step_length;
        }
        self.track.push(self.position);
        Ok(())
    }

    /// Deposit up to `amount` MeV into the medium.
    ///
    /// Never deposits more than the remaining kinetic energy. A particle
    /// left with no energy is killed.
    ///
    /// # Returns
    /// The energy actually deposited
    pub fn deposit_energy(&mut self, amount: f64) -> TransportResult<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(TransportError::invalid(format!(
                "deposited energy must be finite and non-negative, got {}",
                amount
            )));
        }
        let applied = amount.min(self.energy);
        self.energy -= applied;
        self.deposited_energy += applied;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            self.alive = false;
        }
        Ok(applied)
    }

    /// Replace the direction, normalizing it to unit length.
    pub fn set_direction(&mut self, direction: [f64; 3]) -> TransportResult<()> {
        self.direction = normalize(direction)?;
        Ok(())
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn direction(&self) -> [f64; 3] {
        self.direction
    }

    /// Remaining kinetic energy in MeV
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn initial_energy(&self) -> f64 {
        self.initial_energy
    }

    /// Rest mass in MeV
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Every recorded position, starting with the initial one
    pub fn track(&self) -> &[[f64; 3]] {
        &self.track
    }

    /// Cumulative energy left in the medium, MeV
    pub fn deposited_energy(&self) -> f64 {
        self.deposited_energy
    }

    /// Total path length along the recorded track, mm
    pub fn track_length(&self) -> f64 {
        self.track
            .windows(2)
            .map(|w| {
                let d = [w[1][0] - w[0][0], w[1][1] - w[0][1], w[1][2] - w[0][2]];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .sum()
    }
}

fn normalize(v: [f64; 3]) -> TransportResult<[f64; 3]> {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(TransportError::invalid(format!(
            "direction vector must be finite and non-zero, got {:?}",
            v
        )));
    }
    Ok([v[0] / norm, v[1] / norm, v[2] / norm])
}
