//! Scenefile Export Pipeline
//!
//! Converts a host scene document into a scenefile export directory:
//! - `scenefile.txt` (meshes, materials, entities, lights, sky)
//! - `Materials/<name>/` textures
//! - `Sky/sky.exr`
//! - `GlobalIBL/{Diffuse,Specular}/` baked lighting

pub mod exporter;
pub mod format;
pub mod ibl;
pub mod light;
pub mod logging;
pub mod material;
pub mod mesh;
pub mod options;
pub mod sky;
pub mod workdir;

pub use exporter::{ExportPlan, ExportReport, ExportSummary, ScenefileExporter};
pub use format::{
    DirectionalLightRecord, MaterialRecord, MeshEntityRecord, MeshRecord, PointLightRecord, Scenefile, SkyRecord,
    SpotLightRecord, SCENEFILE_NAME,
};
pub use ibl::{IblBaker, IblKind};
pub use light::LightRecord;
pub use material::{ResolvedMaterial, TextureSlot};
pub use options::{ExportOptions, IblOptions, OverwritePolicy};
pub use sky::ResolvedSky;
pub use workdir::WorkingDirGuard;
