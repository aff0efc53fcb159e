// src/data.rs
// Physical constants and the static reference tables for the standard
// tissue-equivalent materials. Doc comments summarize the intent of each
// table while the literals provide the canonical numeric values.
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Bethe–Bloch coefficient K = 4π N_A r_e² m_e c², in MeV·cm²/g.
pub const BETHE_K: f64 = 0.307075;

/// Proton rest mass in MeV.
pub const PROTON_MASS_MEV: f64 = 938.272;

/// Deuteron rest mass in MeV.
pub const DEUTERON_MASS_MEV: f64 = 1875.613;

/// Alpha particle rest mass in MeV.
pub const ALPHA_MASS_MEV: f64 = 3727.379;

/// Highland formula scale, MeV/c.
pub const HIGHLAND_SCALE_MEV: f64 = 13.6;

/// Highland logarithmic correction coefficient.
pub const HIGHLAND_LOG_COEFFICIENT: f64 = 0.038;

/// Millimetres per centimetre; track lengths are in mm, X0 in cm.
pub const MM_PER_CM: f64 = 10.0;

/// Radiation length used when a material does not supply one (water, cm).
pub const DEFAULT_RADIATION_LENGTH_CM: f64 = 36.1;

/// Catalog key of the material returned for positions outside the grid.
pub const DEFAULT_MATERIAL_KEY: &str = "air";

/// Raw constants of a catalog material:
/// (display name, density g/cm³, Z/A, mean excitation energy eV, X0 cm).
pub type MaterialConstants = (&'static str, f64, f64, f64, f64);

/// Standard tissue and phantom materials keyed by catalog name.
pub static STANDARD_MATERIALS: Lazy<HashMap<&'static str, MaterialConstants>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("water", ("Water", 1.0, 0.555, 75.0, 36.1));
    m.insert("bone", ("Bone", 1.85, 0.5, 91.9, 9.8));
    m.insert("lung", ("Lung", 0.26, 0.555, 75.0, 38.6));
    m.insert("air", ("Air", 0.0012, 0.499, 85.7, 30420.0));
    m.insert("muscle", ("Muscle", 1.05, 0.55, 75.3, 34.8));
    m.insert("fat", ("Fat", 0.92, 0.558, 73.1, 37.8));
    m.insert("brain", ("Brain", 1.04, 0.553, 73.4, 35.1));
    m
});

/// Voxel identifiers assigned to the standard materials in a new geometry.
///
/// Identifier 3 (air) is the fill value of every voxel at construction.
pub static STANDARD_MATERIAL_IDS: Lazy<Vec<(u16, &'static str)>> = Lazy::new(|| {
    vec![
        (0, "water"),
        (1, "bone"),
        (2, "lung"),
        (3, "air"),
        (4, "muscle"),
        (5, "fat"),
        (6, "brain"),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_materials_are_physical() {
        assert_eq!(STANDARD_MATERIALS.len(), 7);
        for (key, (name, density, z_over_a, i_ev, x0)) in STANDARD_MATERIALS.iter() {
            assert!(!name.is_empty(), "{} has no display name", key);
            assert!(*density > 0.0);
            assert!(*z_over_a > 0.0 && *z_over_a < 1.0);
            assert!(*i_ev > 0.0);
            assert!(*x0 > 0.0);
        }
    }

    #[test]
    fn test_every_standard_id_names_a_catalog_material() {
        for (_, key) in STANDARD_MATERIAL_IDS.iter() {
            assert!(STANDARD_MATERIALS.contains_key(key), "missing {}", key);
        }
        assert!(STANDARD_MATERIAL_IDS
            .iter()
            .any(|(_, key)| *key == DEFAULT_MATERIAL_KEY));
    }
}
