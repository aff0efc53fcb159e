mod data;
// Import the modules and re-export the types for Rust usage
pub mod error;
pub mod geometry;
pub mod material;
pub mod materials;
pub mod model;
pub mod particle;
pub mod physics;
pub mod settings;
pub mod source;
pub mod stats;
pub mod stepper;
pub mod tally;

pub use error::{TransportError, TransportResult};
pub use geometry::{Geometry, MaterialId, AIR_ID};
pub use material::Material;
pub use materials::Materials;
pub use model::{HistoryFate, HistorySummary, Model, RunResults};
pub use particle::{Particle, ParticleKind};
pub use settings::Settings;
pub use source::IndependentSource;
pub use stats::AngularDistribution;
pub use stepper::Stepper;
pub use tally::{Axis, DepthDoseTally};

// Physical constants are part of the public surface for callers that need
// to reproduce the stepper's arithmetic.
pub use data::{
    ALPHA_MASS_MEV, BETHE_K, DEUTERON_MASS_MEV, HIGHLAND_LOG_COEFFICIENT, HIGHLAND_SCALE_MEV,
    MM_PER_CM, PROTON_MASS_MEV,
};
