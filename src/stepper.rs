// Condensed-history stepper: one call moves a particle through one step of
// continuous energy loss followed by a multiple scattering deflection.

use crate::error::{TransportError, TransportResult};
use crate::material::Material;
use crate::particle::Particle;
use crate::physics::{
    highland_theta0, perturb_direction, relativistic_momentum, sample_deflection, stopping_power,
};
use nalgebra::Vector3;
use rand::Rng;

/// Advances particles one fixed-length step at a time.
///
/// The stepper holds no state between calls. Everything it needs arrives
/// as arguments: the particle (mutably borrowed), the material at the
/// particle's position, the step length and the random source. Giving
/// every history its own random source makes runs reproducible and lets
/// independent particles be stepped on different threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stepper;

impl Stepper {
    pub fn new() -> Self {
        Stepper
    }

    /// Transport `particle` through `step_length` mm of `material`.
    ///
    /// In order:
    /// 1. continuous energy loss `S * step_length` from [`stopping_power`],
    ///    handed to [`Particle::deposit_energy`] which clamps it to the
    ///    remaining energy. Where the Bethe formula has no valid value the
    ///    remaining energy is deposited instead and the particle stops.
    /// 2. a Highland multiple scattering deflection evaluated with the
    ///    post-loss energy (skipped for a particle that just stopped).
    /// 3. a straight move of `step_length` along the new direction.
    ///
    /// # Returns
    /// Whether the particle is still alive. Calling this on a dead particle
    /// does nothing and returns `Ok(false)`. The step length is checked
    /// first, so an invalid step is an error even for a dead particle.
    ///
    /// # Errors
    /// * `InvalidArgument` if `step_length` is not finite and positive
    /// * `NumericSingularity` if the particle state is not finite after the
    ///   step; the history cannot be continued
    pub fn advance<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        material: &Material,
        step_length: f64,
        rng: &mut R,
    ) -> TransportResult<bool> {
        if !step_length.is_finite() || step_length <= 0.0 {
            return Err(TransportError::invalid(format!(
                "step length must be finite and positive, got {}",
                step_length
            )));
        }
        if !particle.is_alive() {
            return Ok(false);
        }

        match stopping_power(material, particle.energy(), particle.mass(), particle.charge()) {
            Some(s) => {
                let loss = s * step_length;
                // an overflowing loss stops the particle like any loss above its energy
                let loss = if loss.is_finite() { loss } else { particle.energy() };
                particle.deposit_energy(loss)?;
            }
            None => {
                log::trace!(
                    "stopping power undefined at {} MeV in {}, depositing remaining energy",
                    particle.energy(),
                    material.name()
                );
                particle.deposit_energy(particle.energy())?;
            }
        }

        if particle.is_alive() {
            self.scatter(particle, material, step_length, rng)?;
        }

        particle.move_by(step_length)?;
        check_finite(particle)?;
        Ok(particle.is_alive())
    }

    fn scatter<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        material: &Material,
        step_length: f64,
        rng: &mut R,
    ) -> TransportResult<()> {
        let momentum = relativistic_momentum(particle.energy(), particle.mass());
        let theta0 = match highland_theta0(momentum, step_length, material.radiation_length()) {
            Some(theta0) => theta0,
            None => {
                log::trace!(
                    "scattering angle undefined for p={} MeV/c in {}, stopping particle",
                    momentum,
                    material.name()
                );
                particle.deposit_energy(particle.energy())?;
                return Ok(());
            }
        };

        let (theta, phi) = sample_deflection(theta0, rng);
        let direction = Vector3::from(particle.direction());
        // a degenerate perturbation leaves the direction unchanged
        if let Some(new_direction) = perturb_direction(&direction, theta, phi) {
            particle.set_direction([new_direction.x, new_direction.y, new_direction.z])?;
        }
        Ok(())
    }
}

fn check_finite(particle: &Particle) -> TransportResult<()> {
    let position = particle.position();
    let direction = particle.direction();
    let checks = [
        ("energy", particle.energy()),
        ("deposited energy", particle.deposited_energy()),
        ("position x", position[0]),
        ("position y", position[1]),
        ("position z", position[2]),
        ("direction x", direction[0]),
        ("direction y", direction[1]),
        ("direction z", direction[2]),
    ];
    for (quantity, value) in checks {
        if !value.is_finite() {
            return Err(TransportError::NumericSingularity { quantity, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn water() -> Material {
        Material::standard("water").unwrap()
    }

    fn norm(v: [f64; 3]) -> f64 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_single_step_loses_energy_and_moves() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 100.0).unwrap();
        let alive = Stepper::new().advance(&mut p, &water(), 0.1, &mut rng).unwrap();
        assert!(alive);
        assert!(p.energy() < 100.0);
        let expected_loss = stopping_power(&water(), 100.0, p.mass(), 1.0).unwrap() * 0.1;
        assert!((p.deposited_energy() - expected_loss).abs() < 1e-12);
        assert_eq!(p.track().len(), 2);
        assert!(p.position()[2] > 0.099 && p.position()[2] <= 0.1);
        assert!((norm(p.direction()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_step_length() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 100.0).unwrap();
        let stepper = Stepper::new();
        for step in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                stepper.advance(&mut p, &water(), step, &mut rng),
                Err(TransportError::InvalidArgument(_))
            ));
        }
        assert_eq!(p.energy(), 100.0);
        assert_eq!(p.track().len(), 1);
    }

    #[test]
    fn test_dead_particle_is_noop() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 100.0).unwrap();
        p.deposit_energy(100.0).unwrap();
        let alive = Stepper::new().advance(&mut p, &water(), 0.1, &mut rng).unwrap();
        assert!(!alive);
        assert_eq!(p.track().len(), 1);
        assert_eq!(p.deposited_energy(), 100.0);
    }

    #[test]
    fn test_low_energy_guard_deposits_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 0.5).unwrap();
        let alive = Stepper::new().advance(&mut p, &water(), 0.1, &mut rng).unwrap();
        assert!(!alive);
        assert_eq!(p.energy(), 0.0);
        assert_eq!(p.deposited_energy(), 0.5);
        // the final step is still recorded
        assert_eq!(p.track().len(), 2);
    }

    #[test]
    fn test_huge_step_clamps_deposit() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 100.0).unwrap();
        let alive = Stepper::new().advance(&mut p, &water(), 1000.0, &mut rng).unwrap();
        assert!(!alive);
        assert_eq!(p.energy(), 0.0);
        assert_eq!(p.deposited_energy(), 100.0);
        // no scattering once stopped: the move is straight along +z
        assert_eq!(p.position(), [0.0, 0.0, 1000.0]);
    }

    #[test]
    fn test_steps_until_stopped_in_water() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 50.0).unwrap();
        let stepper = Stepper::new();
        let material = water();
        let mut steps = 0;
        let mut previous_energy = p.energy();
        while stepper.advance(&mut p, &material, 0.1, &mut rng).unwrap() {
            steps += 1;
            assert!(p.energy() <= previous_energy);
            assert!((p.energy() + p.deposited_energy() - 50.0).abs() < 1e-9);
            assert!((norm(p.direction()) - 1.0).abs() < 1e-12);
            previous_energy = p.energy();
            assert!(steps < 10_000, "particle never stopped");
        }
        assert!((p.deposited_energy() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_dead_particle_with_invalid_step_is_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 0.0).unwrap();
        assert!(!p.is_alive());
        assert!(matches!(
            Stepper::new().advance(&mut p, &water(), -1.0, &mut rng),
            Err(TransportError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_overflowing_position_is_numeric_singularity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Particle::new([1e308, 0.0, 0.0], [1.0, 0.0, 0.0], 100.0).unwrap();
        let result = Stepper::new().advance(&mut p, &water(), 1e308, &mut rng);
        assert!(
            matches!(
                result,
                Err(TransportError::NumericSingularity {
                    quantity: "position x",
                    ..
                })
            ),
            "{:?}",
            result
        );
        // the loss overflowed too, and was clamped to the remaining energy
        assert_eq!(p.deposited_energy(), 100.0);
    }

    #[test]
    fn test_scattering_deflects_direction() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 150.0).unwrap();
        Stepper::new().advance(&mut p, &water(), 1.0, &mut rng).unwrap();
        let d = p.direction();
        assert!(d[0] != 0.0 || d[1] != 0.0);
        assert!(d[2] > 0.99);
    }

    #[test]
    fn test_alpha_loses_more_than_proton() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut proton = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 200.0).unwrap();
        let mut alpha =
            Particle::with_kind([0.0; 3], [0.0, 0.0, 1.0], 200.0, ParticleKind::Alpha).unwrap();
        let stepper = Stepper::new();
        stepper.advance(&mut proton, &water(), 0.1, &mut rng).unwrap();
        stepper.advance(&mut alpha, &water(), 0.1, &mut rng).unwrap();
        assert!(alpha.deposited_energy() > proton.deposited_energy());
    }
}
