use crate::data::STANDARD_MATERIALS;
use crate::error::{TransportError, TransportResult};
use crate::material::Material;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named registry of [`Material`] values.
///
/// `Materials` is built once at start-up (usually through
/// [`Materials::standard`]) and handed by reference to whatever needs to
/// resolve a material by name, most notably
/// [`crate::geometry::Geometry::new`]. It is a plain value: there is no
/// process-wide instance, and two registries never observe each other's
/// insertions. Entries are kept in alphabetical order so iteration and
/// serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Materials {
    materials: BTreeMap<String, Material>,
}

impl Materials {
    /// Create an empty registry
    pub fn new() -> Self {
        Materials {
            materials: BTreeMap::new(),
        }
    }

    /// Registry holding the standard catalog: water, bone, lung, air,
    /// muscle, fat and brain.
    pub fn standard() -> Self {
        let mut catalog = Materials::new();
        for (key, (name, density, z_over_a, i_ev, x0)) in STANDARD_MATERIALS.iter() {
            let material = Material::new(*name, *density, *z_over_a, *i_ev, *x0)
                .expect("standard material table is valid");
            catalog.insert(*key, material);
        }
        catalog
    }

    /// Insert (or replace) a material under `key`.
    ///
    /// # Returns
    /// * The material previously registered under `key`, if any
    pub fn insert(&mut self, key: impl Into<String>, material: Material) -> Option<Material> {
        self.materials.insert(key.into(), material)
    }

    pub fn get(&self, key: &str) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Like [`Materials::get`] but reports a missing key as an error.
    pub fn require(&self, key: &str) -> TransportResult<&Material> {
        self.get(key)
            .ok_or_else(|| TransportError::invalid(format!("material '{}' is not in the catalog", key)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.materials.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Iterate over `(key, material)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Material)> {
        self.materials.iter().map(|(k, m)| (k.as_str(), m))
    }

    /// Parse a catalog from a JSON object mapping key -> material.
    ///
    /// Every entry is validated while parsing; the first invalid material
    /// aborts the load with a `Json` error naming the bad constant.
    pub fn from_json(json: &str) -> TransportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> TransportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
