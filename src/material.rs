use crate::data::{DEFAULT_RADIATION_LENGTH_CM, STANDARD_MATERIALS};
use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical constants of a homogeneous medium.
///
/// A `Material` is a value object: once constructed its constants never
/// change. Overriding a property (for example a lower lung density) produces
/// a new `Material` through [`Material::with_density`] and leaves the
/// original untouched, so geometries sharing a catalog entry are never
/// affected by each other's overrides.
///
/// Units follow the usual dosimetry conventions:
/// * `density` – g/cm³
/// * `z_over_a` – effective charge-to-mass ratio (dimensionless)
/// * `mean_excitation_energy` – mean ionization potential I, in eV
/// * `radiation_length` – X0, in cm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaterialRecord")]
pub struct Material {
    name: String,
    density: f64,
    z_over_a: f64,
    mean_excitation_energy: f64,
    radiation_length: f64,
}

/// Serialized form of a [`Material`], checked by [`Material::new`] on load.
#[derive(Deserialize)]
struct MaterialRecord {
    name: String,
    density: f64,
    z_over_a: f64,
    mean_excitation_energy: f64,
    #[serde(default = "default_radiation_length")]
    radiation_length: f64,
}

impl TryFrom<MaterialRecord> for Material {
    type Error = TransportError;

    fn try_from(record: MaterialRecord) -> TransportResult<Self> {
        Material::new(
            record.name,
            record.density,
            record.z_over_a,
            record.mean_excitation_energy,
            record.radiation_length,
        )
    }
}

fn default_radiation_length() -> f64 {
    DEFAULT_RADIATION_LENGTH_CM
}

impl Material {
    /// Create a material, validating that every constant is finite and positive.
    pub fn new(
        name: impl Into<String>,
        density: f64,
        z_over_a: f64,
        mean_excitation_energy: f64,
        radiation_length: f64,
    ) -> TransportResult<Self> {
        let material = Material {
            name: name.into(),
            density,
            z_over_a,
            mean_excitation_energy,
            radiation_length,
        };
        material.validate()?;
        Ok(material)
    }

    /// Build a material without validation, for exercising downstream guards.
    #[cfg(test)]
    pub(crate) fn unchecked(name: &str, density: f64, z_over_a: f64, i_ev: f64, x0: f64) -> Self {
        Material {
            name: name.to_string(),
            density,
            z_over_a,
            mean_excitation_energy: i_ev,
            radiation_length: x0,
        }
    }

    /// Create a material with the default (water) radiation length.
    pub fn without_radiation_length(
        name: impl Into<String>,
        density: f64,
        z_over_a: f64,
        mean_excitation_energy: f64,
    ) -> TransportResult<Self> {
        Self::new(
            name,
            density,
            z_over_a,
            mean_excitation_energy,
            DEFAULT_RADIATION_LENGTH_CM,
        )
    }

    /// Look up one of the built-in materials by catalog key (e.g. `"water"`).
    pub fn standard(key: &str) -> TransportResult<Self> {
        let (name, density, z_over_a, i_ev, x0) = STANDARD_MATERIALS
            .get(key)
            .ok_or_else(|| TransportError::invalid(format!("unknown standard material '{}'", key)))?;
        Self::new(*name, *density, *z_over_a, *i_ev, *x0)
    }

    /// Check the physical constraints on every constant.
    ///
    /// Constructors and deserialization call this already.
    pub fn validate(&self) -> TransportResult<()> {
        let fields = [
            ("density", self.density),
            ("Z/A", self.z_over_a),
            ("mean excitation energy", self.mean_excitation_energy),
            ("radiation length", self.radiation_length),
        ];
        for (label, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(TransportError::invalid(format!(
                    "material '{}': {} must be finite and positive, got {}",
                    self.name, label, value
                )));
            }
        }
        Ok(())
    }

    /// Copy of this material with a different density.
    pub fn with_density(&self, density: f64) -> TransportResult<Self> {
        Self::new(
            self.name.clone(),
            density,
            self.z_over_a,
            self.mean_excitation_energy,
            self.radiation_length,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Density in g/cm³
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn z_over_a(&self) -> f64 {
        self.z_over_a
    }

    /// Mean ionization potential I in eV
    pub fn mean_excitation_energy(&self) -> f64 {
        self.mean_excitation_energy
    }

    /// Radiation length X0 in cm
    pub fn radiation_length(&self) -> f64 {
        self.radiation_length
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (ρ={} g/cm³, Z/A={}, I={} eV, X0={} cm)",
            self.name, self.density, self.z_over_a, self.mean_excitation_energy, self.radiation_length
        )
    }
}
