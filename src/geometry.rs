use crate::data::{DEFAULT_MATERIAL_KEY, STANDARD_MATERIAL_IDS};
use crate::error::{TransportError, TransportResult};
use crate::material::Material;
use crate::materials::Materials;
use std::collections::BTreeMap;
use std::ops::Range;

/// Identifier stored in each voxel, resolved through the geometry's material table
pub type MaterialId = u16;

/// Identifier every voxel is filled with at construction (air).
pub const AIR_ID: MaterialId = 3;

/// Voxelised geometry for transport.
///
/// The grid is a dense, index-addressed array of [`MaterialId`]s with
/// `nx * ny * nz` entries (x-major, z fastest) plus a small table mapping
/// identifiers to [`Material`] values. Every voxel has the same cubic edge
/// length, given in mm, and voxel `(i, j, k)` covers
/// `[i*size, (i+1)*size) x [j*size, (j+1)*size) x [k*size, (k+1)*size)`.
///
/// Positions outside the grid are not errors: they resolve to a fixed
/// default material (air) that cannot be replaced after construction.
///
/// Invariant: every identifier written to the voxel array has an entry in
/// the material table. [`Geometry::set_region`] refuses unknown
/// identifiers to keep it that way.
#[derive(Debug, Clone)]
pub struct Geometry {
    dimensions: [usize; 3],
    voxel_size: f64,
    voxels: Vec<MaterialId>,
    table: BTreeMap<MaterialId, Material>,
    default_material: Material,
}

impl Geometry {
    /// Create a geometry of `dimensions` voxels with edge `voxel_size` (mm).
    ///
    /// The material table is populated from `catalog` with the standard
    /// identifiers: 0 water, 1 bone, 2 lung, 3 air, 4 muscle, 5 fat,
    /// 6 brain. Every voxel starts as air.
    ///
    /// # Errors
    /// * `InvalidArgument` if a dimension is zero, the voxel size is not
    ///   finite and positive, or `catalog` lacks one of the standard materials
    pub fn new(dimensions: [usize; 3], voxel_size: f64, catalog: &Materials) -> TransportResult<Self> {
        if dimensions.iter().any(|&n| n == 0) {
            return Err(TransportError::invalid(format!(
                "geometry dimensions must be positive, got {:?}",
                dimensions
            )));
        }
        if !voxel_size.is_finite() || voxel_size <= 0.0 {
            return Err(TransportError::invalid(format!(
                "voxel size must be finite and positive, got {}",
                voxel_size
            )));
        }

        let mut table = BTreeMap::new();
        for (id, key) in STANDARD_MATERIAL_IDS.iter() {
            table.insert(*id, catalog.require(key)?.clone());
        }
        let default_material = catalog.require(DEFAULT_MATERIAL_KEY)?.clone();

        let n_voxels = dimensions[0]
            .checked_mul(dimensions[1])
            .and_then(|n| n.checked_mul(dimensions[2]))
            .ok_or_else(|| TransportError::invalid(format!("grid {:?} is too large", dimensions)))?;

        Ok(Geometry {
            dimensions,
            voxel_size,
            voxels: vec![AIR_ID; n_voxels],
            table,
            default_material,
        })
    }

    /// Bind `material` to identifier `id`, replacing any previous binding.
    ///
    /// Voxels already painted with `id` resolve to the new material.
    ///
    /// # Returns
    /// The material previously bound to `id`, if any
    ///
    /// # Errors
    /// * `InvalidArgument` if `material` fails [`Material::validate`]
    pub fn register_material(&mut self, id: MaterialId, material: Material) -> TransportResult<Option<Material>> {
        material.validate()?;
        Ok(self.table.insert(id, material))
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.table.get(&id)
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Voxel edge length in mm
    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Size of the whole grid in mm along each axis
    pub fn extent_mm(&self) -> [f64; 3] {
        [
            self.dimensions[0] as f64 * self.voxel_size,
            self.dimensions[1] as f64 * self.voxel_size,
            self.dimensions[2] as f64 * self.voxel_size,
        ]
    }

    /// Material returned for positions outside the grid
    pub fn default_material(&self) -> &Material {
        &self.default_material
    }

    /// Voxel indices containing `position`, or `None` outside the grid.
    pub fn voxel_index(&self, position: [f64; 3]) -> Option<[usize; 3]> {
        let mut index = [0usize; 3];
        for axis in 0..3 {
            let cell = (position[axis] / self.voxel_size).floor();
            // NaN fails both comparisons and falls through to None
            if !(cell >= 0.0 && cell < self.dimensions[axis] as f64) {
                return None;
            }
            index[axis] = cell as usize;
        }
        Some(index)
    }

    pub fn contains(&self, position: [f64; 3]) -> bool {
        self.voxel_index(position).is_some()
    }

    /// Identifier of the voxel at `position`, `None` outside the grid
    pub fn material_id_at(&self, position: [f64; 3]) -> Option<MaterialId> {
        self.voxel_index(position)
            .map(|[i, j, k]| self.voxels[self.flat_index(i, j, k)])
    }

    /// Resolve the material at `position`. Never fails: outside the grid
    /// the default material is returned.
    pub fn material_at(&self, position: [f64; 3]) -> &Material {
        match self.material_id_at(position) {
            // the table invariant guarantees the lookup succeeds
            Some(id) => self.table.get(&id).unwrap_or(&self.default_material),
            None => &self.default_material,
        }
    }

    /// Paint a box of voxels with `material_id`.
    ///
    /// The half-open index ranges are clipped to `[0, dimension)` per axis
    /// first, so a request that lies completely outside the grid writes
    /// nothing and is not an error.
    ///
    /// # Returns
    /// The number of voxels written
    ///
    /// # Errors
    /// * `InvalidArgument` if `material_id` has no entry in the material table
    pub fn set_region(
        &mut self,
        material_id: MaterialId,
        i_range: Range<i64>,
        j_range: Range<i64>,
        k_range: Range<i64>,
    ) -> TransportResult<usize> {
        if !self.table.contains_key(&material_id) {
            return Err(TransportError::invalid(format!(
                "material id {} is not registered in the geometry",
                material_id
            )));
        }

        let [i_range, j_range, k_range] = [
            clip_range(i_range, self.dimensions[0]),
            clip_range(j_range, self.dimensions[1]),
            clip_range(k_range, self.dimensions[2]),
        ];

        let mut written = 0;
        for i in i_range {
            for j in j_range.clone() {
                let start = self.flat_index(i, j, k_range.start);
                let end = start + k_range.len();
                self.voxels[start..end].fill(material_id);
                written += k_range.len();
            }
        }
        log::trace!("painted {} voxels with material id {}", written, material_id);
        Ok(written)
    }

    /// Paint the voxels covering a box given in millimetres.
    ///
    /// Each bound is floor-divided by the voxel size, so `[0, 10)` mm with
    /// 1 mm voxels covers indices `0..10`.
    pub fn set_region_mm(
        &mut self,
        material_id: MaterialId,
        x_mm: (f64, f64),
        y_mm: (f64, f64),
        z_mm: (f64, f64),
    ) -> TransportResult<usize> {
        for (lo, hi) in [x_mm, y_mm, z_mm] {
            if lo.is_nan() || hi.is_nan() {
                return Err(TransportError::invalid("region bounds must not be NaN"));
            }
        }
        let [i_range, j_range, k_range] =
            [x_mm, y_mm, z_mm].map(|(lo, hi)| self.mm_to_index(lo)..self.mm_to_index(hi));
        self.set_region(material_id, i_range, j_range, k_range)
    }

    fn mm_to_index(&self, mm: f64) -> i64 {
        // saturating float-to-int cast keeps infinite bounds usable
        (mm / self.voxel_size).floor() as i64
    }

    #[inline]
    fn flat_index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.dimensions[1] + j) * self.dimensions[2] + k
    }
}

fn clip_range(range: Range<i64>, dimension: usize) -> Range<usize> {
    let upper = dimension as i64;
    let start = range.start.clamp(0, upper);
    let end = range.end.clamp(0, upper);
    if end <= start {
        0..0
    } else {
        start as usize..end as usize
    }
}
