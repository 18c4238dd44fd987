//! Scenefile export driver
//!
//! Export runs in two phases. [`ScenefileExporter::plan`] walks the scene,
//! validates every material and the sky and builds all records without
//! touching the filesystem. [`ScenefileExporter::export`] then creates the
//! output tree, copies assets, runs the IBL tools and writes `scenefile.txt`
//! last.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use scenefile_core::{Error, Result, ResultExt};
use scenefile_scene::{Document, Object, ObjectKind};
use serde::Serialize;
use tracing::{debug, debug_span, info, warn};

use crate::format::{MeshEntityRecord, Scenefile, SCENEFILE_NAME};
use crate::ibl::IblBaker;
use crate::light::LightRecord;
use crate::material::{export_material, resolve_material, ResolvedMaterial};
use crate::mesh::mesh_record;
use crate::options::{ExportOptions, OverwritePolicy};
use crate::sky::{export_sky, resolve_sky, ResolvedSky};
use crate::workdir::WorkingDirGuard;

/// Record counts of an export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub meshes: usize,
    pub triangles: usize,
    pub materials: usize,
    pub mesh_entities: usize,
    pub directional_lights: usize,
    pub point_lights: usize,
    pub spot_lights: usize,
    pub skipped_lights: usize,
    pub sky: bool,
}

impl ExportSummary {
    pub fn from_scenefile(scenefile: &Scenefile) -> Self {
        Self {
            meshes: scenefile.meshes.len(),
            triangles: scenefile.meshes.iter().map(|m| m.triangle_count()).sum(),
            materials: scenefile.materials.len(),
            mesh_entities: scenefile.mesh_entities.len(),
            directional_lights: scenefile.directional_lights.len(),
            point_lights: scenefile.point_lights.len(),
            spot_lights: scenefile.spot_lights.len(),
            skipped_lights: 0,
            sky: scenefile.sky.is_some(),
        }
    }
}

/// Everything an export writes, validated up front
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub scenefile: Scenefile,
    /// Materials to copy, in first-use order
    pub materials: Vec<ResolvedMaterial>,
    pub sky: ResolvedSky,
    /// Light objects without a scenefile record
    pub skipped_lights: Vec<String>,
}

impl ExportPlan {
    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            skipped_lights: self.skipped_lights.len(),
            ..ExportSummary::from_scenefile(&self.scenefile)
        }
    }

    /// Make every source path absolute against the current directory
    fn absolutize_sources(&mut self) -> Result<()> {
        for texture in self.materials.iter_mut().flat_map(|m| m.textures.iter_mut()) {
            texture.source = absolute(&texture.source)?;
        }
        self.sky.source = absolute(&self.sky.source)?;
        Ok(())
    }
}

/// Result of a successful export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output_dir: PathBuf,
    pub scenefile: PathBuf,
    pub summary: ExportSummary,
    pub copied_files: Vec<PathBuf>,
    pub ibl_dirs: Vec<PathBuf>,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(Error::from)
        .with_context(|| format!("resolving {}", path.display()))
}

fn data_name<'a>(object: &'a Object) -> Result<&'a str> {
    object
        .data
        .as_deref()
        .ok_or_else(|| Error::invalid_document(format!("object {} has no data", object.name)))
}

/// Scenefile exporter
pub struct ScenefileExporter {
    options: ExportOptions,
}

impl Default for ScenefileExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenefileExporter {
    /// Create new exporter with default options
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    /// Create exporter with custom options
    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Build every record of the export without writing anything
    pub fn plan(&self, doc: &Document) -> Result<ExportPlan> {
        let collection = doc.collection(&self.options.collection)?;
        let objects = doc.all_objects(collection)?;

        let mut scenefile = Scenefile::default();
        let mut materials = Vec::new();
        let mut seen_meshes = HashSet::new();
        let mut seen_materials = HashSet::new();

        for object in objects.iter().filter(|o| o.kind == ObjectKind::Mesh) {
            let _span = debug_span!("mesh_object", object = %object.name).entered();

            let mesh = doc.mesh(data_name(object)?)?;
            let material_name = object.active_material().ok_or_else(|| Error::MissingMaterial {
                object: object.name.clone(),
            })?;
            let material = doc.material(material_name)?;

            if seen_meshes.insert(mesh.name.as_str()) {
                scenefile.meshes.push(mesh_record(mesh)?);
            }
            if seen_materials.insert(material.name.as_str()) {
                let resolved = resolve_material(doc, material)?;
                scenefile.materials.push(resolved.record());
                materials.push(resolved);
            }

            let transform = doc
                .world_transform(object)
                .with_context(|| format!("placing {}", object.name))?;
            scenefile.mesh_entities.push(MeshEntityRecord {
                name: object.name.clone(),
                mesh: mesh.name.clone(),
                material: material.name.clone(),
                position: transform.translation,
                rotation: transform.euler_yxz(),
                scale: transform.scale,
            });
        }
        info!(
            meshes = scenefile.meshes.len(),
            materials = scenefile.materials.len(),
            entities = scenefile.mesh_entities.len(),
            "Resolved mesh objects"
        );

        let mut skipped_lights = Vec::new();
        for object in objects.iter().filter(|o| o.kind == ObjectKind::Light) {
            let light = doc.light(data_name(object)?)?;
            let transform = doc
                .world_transform(object)
                .with_context(|| format!("placing {}", object.name))?;

            match LightRecord::build(&object.name, light, &transform) {
                Some(LightRecord::Directional(record)) => scenefile.directional_lights.push(record),
                Some(LightRecord::Point(record)) => scenefile.point_lights.push(record),
                Some(LightRecord::Spot(record)) => scenefile.spot_lights.push(record),
                None => {
                    warn!(object = %object.name, kind = ?light.kind, "Skipping unsupported light");
                    skipped_lights.push(object.name.clone());
                }
            }
        }
        if scenefile.directional_lights.len() > 1 {
            warn!(
                count = scenefile.directional_lights.len(),
                "Scene has more than one sun, writing one DirectionalLight record each"
            );
        }
        info!(
            directional = scenefile.directional_lights.len(),
            point = scenefile.point_lights.len(),
            spot = scenefile.spot_lights.len(),
            "Resolved lights"
        );

        let sky = resolve_sky(doc, &self.options.world)?;
        scenefile.sky = Some(sky.record());
        debug!(world = %sky.world, source = %sky.source.display(), "Resolved sky");

        Ok(ExportPlan {
            scenefile,
            materials,
            sky,
            skipped_lights,
        })
    }

    /// Validate a document without touching the filesystem
    pub fn check(&self, doc: &Document) -> Result<ExportSummary> {
        self.plan(doc).map(|plan| plan.summary())
    }

    /// Export the configured collection into `output_dir`
    pub fn export(&self, doc: &Document, output_dir: impl AsRef<Path>) -> Result<ExportReport> {
        let output_dir = absolute(output_dir.as_ref())?;

        if !doc.has_collection(&self.options.collection) {
            return Err(Error::CollectionNotFound {
                name: self.options.collection.clone(),
            });
        }
        let exists = output_dir.try_exists()?;
        if exists && self.options.overwrite == OverwritePolicy::Fail {
            return Err(Error::OutputExists(output_dir));
        }

        let mut plan = self.plan(doc)?;
        plan.absolutize_sources()?;

        if exists {
            info!(path = %output_dir.display(), "Replacing existing output");
            std::fs::remove_dir_all(&output_dir)
                .map_err(Error::from)
                .with_context(|| format!("removing {}", output_dir.display()))?;
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(Error::from)
            .with_context(|| format!("creating {}", output_dir.display()))?;

        let mut ibl = self.options.ibl.clone();
        if let Some(dir) = &ibl.tool_dir {
            ibl.tool_dir = Some(absolute(dir)?);
        }
        let _guard = match &ibl.tool_dir {
            Some(dir) => Some(WorkingDirGuard::enter(dir)?),
            None => None,
        };

        let mut copied_files = Vec::new();
        for material in &plan.materials {
            copied_files.extend(export_material(material, &output_dir)?);
        }
        info!(count = plan.materials.len(), "Copied material textures");

        let sky_path = export_sky(&plan.sky, &output_dir)?;
        copied_files.push(sky_path.clone());

        let baker = IblBaker::new(ibl);
        let ibl_dirs = baker.bake_all(&sky_path, plan.sky.intensity(), &output_dir)?;

        let scenefile_path = output_dir.join(SCENEFILE_NAME);
        plan.scenefile.write_to(&scenefile_path)?;
        info!(path = %scenefile_path.display(), "Wrote scenefile");

        Ok(ExportReport {
            summary: plan.summary(),
            output_dir,
            scenefile: scenefile_path,
            copied_files,
            ibl_dirs,
        })
    }
}
