// Continuous-slowing-down and multiple scattering physics for charged particle transport

use crate::data::{BETHE_K, HIGHLAND_LOG_COEFFICIENT, HIGHLAND_SCALE_MEV, MM_PER_CM};
use crate::material::Material;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::StandardNormal;

/// Below this β² the particle is considered stopped.
pub const MIN_BETA_SQUARED: f64 = 1e-12;

/// Smallest value of the Bethe bracket `ln(2 m β² E / I) − β²` that is still
/// transported. The bracket vanishes at a finite energy, and the energy
/// would approach that root geometrically without ever reaching it, so the
/// particle is stopped once the bracket falls under this floor.
pub const MIN_BETHE_LOG_TERM: f64 = 1e-4;

/// Relativistic β² from kinetic energy and rest mass (both MeV).
#[inline]
pub fn beta_squared(kinetic_energy: f64, mass: f64) -> f64 {
    let gamma = 1.0 + kinetic_energy / mass;
    1.0 - 1.0 / (gamma * gamma)
}

/// Relativistic momentum p = sqrt(E (E + 2m)) in MeV/c.
#[inline]
pub fn relativistic_momentum(kinetic_energy: f64, mass: f64) -> f64 {
    (kinetic_energy * (kinetic_energy + 2.0 * mass)).sqrt()
}

/// Mean stopping power in MeV/mm from a simplified Bethe–Bloch formula
///
/// S = K (Z/A) (z²/β²) [ln(2 m β² E / I) − β²] ρ
///
/// with `m` the particle rest mass, `E` its kinetic energy (MeV), `z` its
/// charge number and `I` the material's mean excitation energy in eV.
///
/// # Returns
/// * `Some(S)` with `S > 0` and finite
/// * `None` when the formula is outside its domain (β² ≈ 0, a non-positive
///   log argument, a bracket under [`MIN_BETHE_LOG_TERM`]); the caller
///   stops the particle in place
pub fn stopping_power(material: &Material, kinetic_energy: f64, mass: f64, charge: f64) -> Option<f64> {
    let beta2 = beta_squared(kinetic_energy, mass);
    if !beta2.is_finite() || beta2 <= MIN_BETA_SQUARED {
        return None;
    }

    let log_argument = 2.0 * mass * beta2 * kinetic_energy / material.mean_excitation_energy();
    if !log_argument.is_finite() || log_argument <= 0.0 {
        return None;
    }

    let bracket = log_argument.ln() - beta2;
    if !(bracket >= MIN_BETHE_LOG_TERM) {
        return None;
    }

    let s = BETHE_K * material.z_over_a() * (charge * charge / beta2) * bracket * material.density();
    if s.is_finite() && s > 0.0 {
        Some(s)
    } else {
        None
    }
}

/// Highland estimate of the RMS plane scattering angle (radians).
///
/// θ0 = (13.6 / p) sqrt(t) (1 + 0.038 ln t), with `t` the step length in
/// radiation lengths. For very thin steps the logarithmic correction
/// turns negative; it is floored at zero so θ0 is never negative.
///
/// # Arguments
/// * `momentum` - MeV/c
/// * `step_length` - mm
/// * `radiation_length` - X0 in cm
///
/// # Returns
/// `None` if the momentum or path length in radiation lengths is not
/// finite and positive
pub fn highland_theta0(momentum: f64, step_length: f64, radiation_length: f64) -> Option<f64> {
    if !momentum.is_finite() || momentum <= 0.0 {
        return None;
    }
    let t = (step_length / MM_PER_CM) / radiation_length;
    if !t.is_finite() || t <= 0.0 {
        return None;
    }
    let correction = (1.0 + HIGHLAND_LOG_COEFFICIENT * t.ln()).max(0.0);
    let theta0 = HIGHLAND_SCALE_MEV / momentum * t.sqrt() * correction;
    theta0.is_finite().then_some(theta0)
}

/// Sample a polar deflection θ ~ N(0, θ0) and an azimuth φ ~ U[0, 2π).
pub fn sample_deflection<R: Rng + ?Sized>(theta0: f64, rng: &mut R) -> (f64, f64) {
    let z: f64 = rng.sample(StandardNormal);
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    (theta0 * z, phi)
}

/// Deflect `direction` by (θ, φ) with a first-order transverse perturbation.
///
/// The transverse kick `sinθ (cosφ, sinφ)` is added to the x/y components
/// and z is scaled by `cosθ` before renormalizing. This is not an exact
/// rotation about an axis perpendicular to `direction`: it is only accurate
/// for small angles and for directions close to +z, and is kept so that
/// trajectories match the reference formulas.
///
/// # Returns
/// `None` if the perturbed vector degenerates to zero length
pub fn perturb_direction(direction: &Vector3<f64>, theta: f64, phi: f64) -> Option<Vector3<f64>> {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let perturbed = Vector3::new(
        direction.x + sin_theta * phi.cos(),
        direction.y + sin_theta * phi.sin(),
        direction.z * cos_theta,
    );
    let norm = perturbed.norm();
    if norm > f64::EPSILON && norm.is_finite() {
        Some(perturbed / norm)
    } else {
        None
    }
}

// =====================
//        TESTS
// =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PROTON_MASS_MEV;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn water() -> Material {
        Material::new("Water", 1.0, 0.555, 75.0, 36.1).unwrap()
    }

    #[test]
    fn test_beta_squared_limits() {
        assert_eq!(beta_squared(0.0, PROTON_MASS_MEV), 0.0);
        let b2 = beta_squared(100.0, PROTON_MASS_MEV);
        assert!((b2 - 0.18335).abs() < 1e-4, "beta2 = {}", b2);
        assert!(beta_squared(1e9, PROTON_MASS_MEV) < 1.0);
    }

    #[test]
    fn test_momentum() {
        assert_eq!(relativistic_momentum(0.0, PROTON_MASS_MEV), 0.0);
        let p = relativistic_momentum(100.0, PROTON_MASS_MEV);
        assert!((p - 444.58).abs() < 0.01, "p = {}", p);
    }

    #[test]
    fn test_stopping_power_at_100_mev_in_water() {
        let s = stopping_power(&water(), 100.0, PROTON_MASS_MEV, 1.0).unwrap();
        // K * 0.555 / b2 * (ln(2 * 938.272 * b2 * 100 / 75) - b2) with b2 = 0.18335
        assert!((s - 5.53).abs() < 0.01, "S = {}", s);
    }

    #[test]
    fn test_stopping_power_scales_with_density_and_charge() {
        let w = water();
        let dense = w.with_density(2.0).unwrap();
        let s1 = stopping_power(&w, 50.0, PROTON_MASS_MEV, 1.0).unwrap();
        let s2 = stopping_power(&dense, 50.0, PROTON_MASS_MEV, 1.0).unwrap();
        let s3 = stopping_power(&w, 50.0, PROTON_MASS_MEV, 2.0).unwrap();
        assert!((s2 / s1 - 2.0).abs() < 1e-12);
        assert!((s3 / s1 - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_stopping_power_rises_as_particle_slows() {
        let w = water();
        let high = stopping_power(&w, 150.0, PROTON_MASS_MEV, 1.0).unwrap();
        let mid = stopping_power(&w, 50.0, PROTON_MASS_MEV, 1.0).unwrap();
        let low = stopping_power(&w, 20.0, PROTON_MASS_MEV, 1.0).unwrap();
        assert!(high < mid && mid < low);
    }

    #[test]
    fn test_stopping_power_guards() {
        let w = water();
        assert!(stopping_power(&w, 0.0, PROTON_MASS_MEV, 1.0).is_none());
        assert!(stopping_power(&w, 1e-9, PROTON_MASS_MEV, 1.0).is_none());
        // ln argument below one: the bracket is negative
        assert!(stopping_power(&w, 1.0, PROTON_MASS_MEV, 1.0).is_none());
    }

    #[test]
    fn test_highland_theta0() {
        let p = relativistic_momentum(100.0, PROTON_MASS_MEV);
        let theta0 = highland_theta0(p, 0.1, 36.1).unwrap();
        assert!(theta0 > 3.0e-4 && theta0 < 4.0e-4, "theta0 = {}", theta0);
        // thicker steps scatter more
        assert!(highland_theta0(p, 1.0, 36.1).unwrap() > theta0);
    }

    #[test]
    fn test_highland_guards() {
        assert!(highland_theta0(0.0, 0.1, 36.1).is_none());
        assert!(highland_theta0(100.0, 0.0, 36.1).is_none());
        assert!(highland_theta0(100.0, 0.1, f64::INFINITY).is_none());
        // vanishing step: correction floored, no negative angle
        assert_eq!(highland_theta0(100.0, 1e-12, 30420.0), Some(0.0));
    }

    #[test]
    fn test_perturb_direction_is_unit() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut d = Vector3::new(0.0, 0.0, 1.0);
        for _ in 0..1000 {
            let (theta, phi) = sample_deflection(0.05, &mut rng);
            d = perturb_direction(&d, theta, phi).unwrap();
            assert!((d.norm() - 1.0).abs() < 1e-12, "norm = {}", d.norm());
        }
    }

    #[test]
    fn test_perturb_direction_zero_angle_is_identity() {
        let d = Vector3::new(0.6, 0.0, 0.8);
        let out = perturb_direction(&d, 0.0, 1.3).unwrap();
        assert!((out - d).norm() < 1e-12);
    }

    #[test]
    fn test_perturb_direction_degenerate() {
        // x kick cancels the x component exactly and cos(π/2) zeroes z
        let d = Vector3::new(-1.0, 0.0, 0.0);
        assert!(perturb_direction(&d, std::f64::consts::FRAC_PI_2, 0.0).is_none());
    }

    #[test]
    fn test_sample_deflection_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let mut sum_sq = 0.0;
        for _ in 0..n {
            let (theta, phi) = sample_deflection(0.01, &mut rng);
            assert!((0.0..2.0 * std::f64::consts::PI).contains(&phi));
            sum_sq += theta * theta;
        }
        let rms = (sum_sq / n as f64).sqrt();
        assert!((rms - 0.01).abs() < 5e-4, "rms = {}", rms);
    }
}
