//! Scene document root and data-block lookup

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glam::Mat4;
use scenefile_core::{DataBlockKind, Error, Result, ResultExt, Transform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::light::LightData;
use crate::mesh::MeshData;
use crate::node::NodeTree;
use crate::object::Object;

/// Host-relative path prefix, resolved against the document directory
const HOST_RELATIVE_PREFIX: &str = "//";

/// Named grouping of objects, possibly nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Image data-block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub filepath: String,
}

impl Image {
    /// Extension of the stored file path, including the dot, or empty
    pub fn extension(&self) -> String {
        Path::new(&self.filepath)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}

/// Material data-block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub node_tree: Option<NodeTree>,
}

/// World (environment) data-block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub name: String,
    #[serde(default)]
    pub node_tree: Option<NodeTree>,
}

/// Scene document as dumped by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub objects: Vec<Object>,
    #[serde(default)]
    pub meshes: Vec<MeshData>,
    #[serde(default)]
    pub lights: Vec<LightData>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub worlds: Vec<World>,
    #[serde(default)]
    pub images: Vec<Image>,
    /// Directory relative image paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn check_unique<'a>(kind: DataBlockKind, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::invalid_document(format!("duplicate {kind} name: {name}")));
        }
    }
    Ok(())
}

impl Document {
    /// Parse a document; relative image paths resolve against `base_dir`
    pub fn from_json_str(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut document: Document =
            serde_json::from_str(json).map_err(|e| Error::invalid_document(e.to_string()))?;
        document.base_dir = base_dir.into();
        document.check_names()?;
        Ok(document)
    }

    /// Load a document file; its directory becomes the base directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(Error::from)
            .with_context(|| format!("reading scene document {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let base_dir = std::path::absolute(&base_dir).map_err(Error::from)?;
        let document = Self::from_json_str(&json, base_dir)?;

        debug!(
            path = %path.display(),
            objects = document.objects.len(),
            meshes = document.meshes.len(),
            materials = document.materials.len(),
            "Loaded scene document"
        );
        Ok(document)
    }

    fn check_names(&self) -> Result<()> {
        check_unique(DataBlockKind::Collection, self.collections.iter().map(|c| c.name.as_str()))?;
        check_unique(DataBlockKind::Object, self.objects.iter().map(|o| o.name.as_str()))?;
        check_unique(DataBlockKind::Mesh, self.meshes.iter().map(|m| m.name.as_str()))?;
        check_unique(DataBlockKind::Light, self.lights.iter().map(|l| l.name.as_str()))?;
        check_unique(DataBlockKind::Material, self.materials.iter().map(|m| m.name.as_str()))?;
        check_unique(DataBlockKind::World, self.worlds.iter().map(|w| w.name.as_str()))?;
        check_unique(DataBlockKind::Image, self.images.iter().map(|i| i.name.as_str()))
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c.name == name)
    }

    pub fn collection(&self, name: &str) -> Result<&Collection> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::CollectionNotFound { name: name.to_string() })
    }

    pub fn object(&self, name: &str) -> Result<&Object> {
        self.objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| Error::not_found(DataBlockKind::Object, name))
    }

    pub fn mesh(&self, name: &str) -> Result<&MeshData> {
        self.meshes
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::not_found(DataBlockKind::Mesh, name))
    }

    pub fn light(&self, name: &str) -> Result<&LightData> {
        self.lights
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| Error::not_found(DataBlockKind::Light, name))
    }

    pub fn material(&self, name: &str) -> Result<&Material> {
        self.materials
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::not_found(DataBlockKind::Material, name))
    }

    pub fn image(&self, name: &str) -> Result<&Image> {
        self.images
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::not_found(DataBlockKind::Image, name))
    }

    pub fn world(&self, name: &str) -> Result<&World> {
        self.worlds
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| Error::WorldNotFound { name: name.to_string() })
    }

    /// Objects of a collection and all nested collections, each once.
    ///
    /// The collection's own objects come first, then each child collection
    /// depth-first, in listed order.
    pub fn all_objects<'a>(&'a self, collection: &'a Collection) -> Result<Vec<&'a Object>> {
        let mut objects = Vec::new();
        let mut seen_objects = HashSet::new();
        let mut visited = HashSet::new();
        self.collect_objects(collection, &mut objects, &mut seen_objects, &mut visited)?;
        Ok(objects)
    }

    fn collect_objects<'a>(
        &'a self,
        collection: &'a Collection,
        objects: &mut Vec<&'a Object>,
        seen_objects: &mut HashSet<&'a str>,
        visited: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if !visited.insert(collection.name.as_str()) {
            return Ok(());
        }
        for name in &collection.objects {
            let object = self
                .object(name)
                .with_context(|| format!("collection {}", collection.name))?;
            if seen_objects.insert(object.name.as_str()) {
                objects.push(object);
            }
        }
        for child in &collection.children {
            let child = self.collection(child)?;
            self.collect_objects(child, objects, seen_objects, visited)?;
        }
        Ok(())
    }

    /// World matrix of an object, following its parent chain
    pub fn world_matrix(&self, object: &Object) -> Result<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = object;
        let mut chain = HashSet::new();
        loop {
            if !chain.insert(current.name.as_str()) {
                return Err(Error::invalid_document(format!(
                    "parent cycle through object {}",
                    current.name
                )));
            }
            if let Some(evaluated) = current.evaluated_matrix_world() {
                return Ok(evaluated * matrix);
            }
            matrix = current.local_matrix() * matrix;
            match &current.parent {
                Some(parent) => current = self.object(parent)?,
                None => return Ok(matrix),
            }
        }
    }

    /// World transform decomposed into translation, rotation and scale
    pub fn world_transform(&self, object: &Object) -> Result<Transform> {
        Ok(Transform::from_matrix(&self.world_matrix(object)?))
    }

    /// Absolute location of an image file
    pub fn resolve_image_path(&self, image: &Image) -> PathBuf {
        match image.filepath.strip_prefix(HOST_RELATIVE_PREFIX) {
            Some(relative) => self.base_dir.join(relative),
            None => self.base_dir.join(&image.filepath),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const DOC: &str = r#"{
        "collections": [
            {"name": "Scene", "objects": ["Cube", "Lamp"], "children": ["Props"]},
            {"name": "Props", "objects": ["Chair", "Cube"], "children": ["Scene"]}
        ],
        "objects": [
            {"name": "Cube", "type": "MESH", "data": "CubeMesh", "location": [1, 0, 0]},
            {"name": "Chair", "type": "MESH", "data": "CubeMesh", "parent": "Cube", "location": [0, 2, 0]},
            {"name": "Lamp", "type": "LIGHT", "data": "Point"}
        ],
        "lights": [{"name": "Point", "type": "POINT"}],
        "images": [
            {"name": "wood", "filepath": "//textures/wood.png"},
            {"name": "abs", "filepath": "/srv/sky.exr"}
        ]
    }"#;

    fn document() -> Document {
        Document::from_json_str(DOC, "/projects/room").unwrap()
    }

    #[test]
    fn test_all_objects_order_and_dedup() {
        let doc = document();
        let scene = doc.collection("Scene").unwrap();
        let names: Vec<&str> = doc
            .all_objects(scene)
            .unwrap()
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["Cube", "Lamp", "Chair"]);
    }

    fn exported_objects<'d>(doc: &'d Document, collection: &str) -> Vec<&'d Object> {
        let collection = doc.collection(collection).unwrap();
        doc.all_objects(collection).unwrap()
    }

    #[test]
    fn test_all_objects_borrow_the_document() {
        let doc = document();
        let objects = exported_objects(&doc, "Props");
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Chair", "Cube", "Lamp"]);
    }

    #[test]
    fn test_missing_collection() {
        let doc = document();
        assert!(doc.has_collection("Scene"));
        let err = doc.collection("Export").unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_parent_chain() {
        let doc = document();
        let chair = doc.object("Chair").unwrap();
        let transform = doc.world_transform(chair).unwrap();
        assert!((transform.translation - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let json = r#"{
            "objects": [
                {"name": "A", "type": "EMPTY", "parent": "B"},
                {"name": "B", "type": "EMPTY", "parent": "A"}
            ]
        }"#;
        let doc = Document::from_json_str(json, "").unwrap();
        let err = doc.world_matrix(doc.object("A").unwrap()).unwrap_err();
        assert!(err.to_string().contains("parent cycle"));
    }

    #[test]
    fn test_image_paths() {
        let doc = document();
        let wood = doc.image("wood").unwrap();
        assert_eq!(doc.resolve_image_path(wood), PathBuf::from("/projects/room/textures/wood.png"));
        assert_eq!(wood.extension(), ".png");

        let sky = doc.image("abs").unwrap();
        assert_eq!(doc.resolve_image_path(sky), PathBuf::from("/srv/sky.exr"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{"meshes": [{"name": "M"}, {"name": "M"}]}"#;
        let err = Document::from_json_str(json, "").unwrap_err();
        assert!(err.to_string().contains("duplicate Mesh name: M"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, DOC).unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.base_dir, dir.path());
        assert_eq!(doc.objects.len(), 3);
    }

    #[test]
    fn test_invalid_json() {
        let err = Document::from_json_str("{not json", "").unwrap_err();
        assert!(err.is_format_error());
    }
}
