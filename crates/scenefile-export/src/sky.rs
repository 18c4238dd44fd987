//! Sky resolution and export
//!
//! The sky comes from the world's `Environment Texture` node. Its strength is
//! the `Strength` input of the `Background` node.

use std::path::{Path, PathBuf};

use scenefile_core::{watts_to_lumens, Error, Result, ResultExt};
use scenefile_scene::Document;

use crate::format::SkyRecord;
use crate::material::copy_asset;

pub const SKY_DIR: &str = "Sky";
pub const SKY_FILE: &str = "sky.exr";

const ENVIRONMENT_NODE: &str = "Environment Texture";
const BACKGROUND_NODE: &str = "Background";
const SKY_EXTENSION: &str = ".exr";

/// Validated sky, ready to copy
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSky {
    pub world: String,
    /// Absolute source file
    pub source: PathBuf,
    /// Background strength, in W/m²
    pub strength: f32,
}

impl ResolvedSky {
    pub fn intensity(&self) -> f64 {
        watts_to_lumens(self.strength)
    }

    /// Sky image path relative to the export root
    pub fn relative_path() -> String {
        format!("{SKY_DIR}/{SKY_FILE}")
    }

    pub fn record(&self) -> SkyRecord {
        SkyRecord {
            image_path: Self::relative_path(),
            intensity: self.intensity(),
        }
    }
}

/// Find the environment image and background strength of a world
pub fn resolve_sky(doc: &Document, world_name: &str) -> Result<ResolvedSky> {
    let world = doc.world(world_name)?;
    let missing_node = |node: &str| Error::MissingNode {
        owner: world.name.clone(),
        node: node.to_string(),
    };
    let tree = world
        .node_tree
        .as_ref()
        .ok_or_else(|| missing_node(ENVIRONMENT_NODE))?;

    let environment = tree
        .node(ENVIRONMENT_NODE)
        .ok_or_else(|| missing_node(ENVIRONMENT_NODE))?;
    let image_name = environment.image.as_deref().ok_or_else(|| Error::MissingImage {
        owner: world.name.clone(),
        slot: ENVIRONMENT_NODE.to_string(),
    })?;
    let image = doc
        .image(image_name)
        .with_context(|| format!("{} - {ENVIRONMENT_NODE}", world.name))?;
    let source = doc.resolve_image_path(image);
    if image.extension() != SKY_EXTENSION {
        return Err(Error::UnsupportedSkyFormat { path: source });
    }

    let background = tree
        .node(BACKGROUND_NODE)
        .ok_or_else(|| missing_node(BACKGROUND_NODE))?;
    let strength = background
        .input("Strength")
        .or_else(|| background.inputs.get(1))
        .and_then(|socket| socket.default_value.as_ref())
        .and_then(|value| value.as_scalar())
        .ok_or_else(|| Error::MissingLink {
            owner: world.name.clone(),
            slot: format!("{BACKGROUND_NODE} Strength"),
        })?;

    Ok(ResolvedSky {
        world: world.name.clone(),
        source,
        strength,
    })
}

/// Copy the sky image to `Sky/sky.exr`; returns the copied file
pub fn export_sky(sky: &ResolvedSky, output_dir: &Path) -> Result<PathBuf> {
    let dir = output_dir.join(SKY_DIR);
    std::fs::create_dir_all(&dir)
        .map_err(Error::from)
        .with_context(|| format!("creating {}", dir.display()))?;
    let target = dir.join(SKY_FILE);
    copy_asset(&sky.source, &target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(filepath: &str, strength: serde_json::Value) -> Document {
        let doc = json!({
            "worlds": [{
                "name": "World",
                "node_tree": {
                    "nodes": [
                        {"name": "Environment Texture", "type": "TEX_ENVIRONMENT", "image": "hdri"},
                        {"name": "Background", "type": "BACKGROUND",
                         "inputs": [{"name": "Color"}, {"name": "Strength", "default_value": strength}]},
                        {"name": "World Output", "type": "OUTPUT_WORLD", "inputs": [{"name": "Surface"}]}
                    ],
                    "links": []
                }
            }],
            "images": [{"name": "hdri", "filepath": filepath}]
        });
        Document::from_json_str(&doc.to_string(), "/scenes").unwrap()
    }

    #[test]
    fn test_resolve_sky() {
        let doc = document("//hdri/studio.exr", json!(1.5));
        let sky = resolve_sky(&doc, "World").unwrap();
        assert_eq!(sky.source, PathBuf::from("/scenes/hdri/studio.exr"));
        assert_eq!(sky.intensity(), 1.5 * 683.002);
        assert_eq!(sky.record().image_path, "Sky/sky.exr");
    }

    #[test]
    fn test_png_rejected() {
        let doc = document("//hdri/studio.png", json!(1.0));
        let err = resolve_sky(&doc, "World").unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().starts_with("Environment Texture must be .exr format"));
    }

    #[test]
    fn test_extension_is_case_sensitive() {
        let doc = document("//hdri/studio.EXR", json!(1.0));
        assert!(resolve_sky(&doc, "World").is_err());
    }

    #[test]
    fn test_missing_world() {
        let doc = document("//hdri/studio.exr", json!(1.0));
        let err = resolve_sky(&doc, "Night").unwrap_err();
        assert!(matches!(err, Error::WorldNotFound { .. }));
    }

    #[test]
    fn test_missing_strength() {
        let doc = document("//hdri/studio.exr", serde_json::Value::Null);
        let err = resolve_sky(&doc, "World").unwrap_err();
        assert_eq!(err.to_string(), "World - Background Strength Node is missing");
    }

    #[test]
    fn test_export_sky() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("studio.exr"), b"EXR").unwrap();

        let mut doc = document("studio.exr", json!(1.0));
        doc.base_dir = src.path().to_path_buf();
        let sky = resolve_sky(&doc, "World").unwrap();
        let target = export_sky(&sky, out.path()).unwrap();

        assert_eq!(target, out.path().join("Sky").join("sky.exr"));
        assert_eq!(std::fs::read(target).unwrap(), b"EXR");
    }
}
