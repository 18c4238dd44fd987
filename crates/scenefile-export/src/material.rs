//! Material node graph validation and texture export
//!
//! A material is exportable when its output node is fed by a BSDF whose
//! inputs are wired as follows:
//!
//! - `Base Color`, `Metallic`, `Roughness`: image texture
//! - `Emission` / `Emission Color`: multiply node (math, vector math or mix)
//!   with an image texture on one input and the strength on the other
//! - `Normal`: normal map node with an image texture on its `Color` input
//!
//! Resolution checks the whole graph and every image before anything is
//! written, so a malformed material never leaves a partial directory behind.

use std::path::{Component, Path, PathBuf};

use scenefile_core::{watts_to_lumens, Error, Result, ResultExt};
use scenefile_scene::{Document, Material, Node, NodeKind, NodeTree, Socket};
use tracing::debug;

use crate::format::MaterialRecord;

/// Directory materials are exported under
pub const MATERIALS_DIR: &str = "Materials";

const OUTPUT_NODE: &str = "Material Output";

/// Texture exported for every material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    BaseColor,
    Metallic,
    Roughness,
    Emission,
    NormalMap,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::BaseColor,
        TextureSlot::Metallic,
        TextureSlot::Roughness,
        TextureSlot::Emission,
        TextureSlot::NormalMap,
    ];

    /// File name (without extension) inside the material directory
    pub fn file_stem(&self) -> &'static str {
        match self {
            TextureSlot::BaseColor => "baseColor",
            TextureSlot::Metallic => "metallic",
            TextureSlot::Roughness => "roughness",
            TextureSlot::Emission => "emission",
            TextureSlot::NormalMap => "normalMap",
        }
    }

    /// Name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            TextureSlot::BaseColor => "BaseColor",
            TextureSlot::Metallic => "Metallic",
            TextureSlot::Roughness => "Roughness",
            TextureSlot::Emission => "Emission",
            TextureSlot::NormalMap => "NormalMap",
        }
    }
}

/// Image resolved for one texture slot
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTexture {
    pub slot: TextureSlot,
    pub image: String,
    /// Absolute source file
    pub source: PathBuf,
    /// Source extension including the dot, e.g. `.png`
    pub extension: String,
}

impl ResolvedTexture {
    /// File name inside the material directory
    pub fn file_name(&self) -> String {
        format!("{}{}", self.slot.file_stem(), self.extension)
    }
}

/// Fully validated material, ready to copy
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub name: String,
    /// One entry per slot, in `TextureSlot::ALL` order
    pub textures: Vec<ResolvedTexture>,
    /// Emission strength multiplier, in watts
    pub emission_factor: f32,
}

impl ResolvedMaterial {
    pub fn emission_intensity(&self) -> f64 {
        watts_to_lumens(self.emission_factor)
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&ResolvedTexture> {
        self.textures.iter().find(|t| t.slot == slot)
    }

    /// Material directory relative to the export root
    pub fn relative_dir(&self) -> String {
        format!("{MATERIALS_DIR}/{}", self.name)
    }

    fn relative_path(&self, slot: TextureSlot) -> String {
        match self.texture(slot) {
            Some(texture) => format!("{}/{}", self.relative_dir(), texture.file_name()),
            None => format!("{}/{}", self.relative_dir(), slot.file_stem()),
        }
    }

    pub fn record(&self) -> MaterialRecord {
        MaterialRecord {
            name: self.name.clone(),
            base_color: self.relative_path(TextureSlot::BaseColor),
            metallic: self.relative_path(TextureSlot::Metallic),
            roughness: self.relative_path(TextureSlot::Roughness),
            emission: self.relative_path(TextureSlot::Emission),
            normal_map: self.relative_path(TextureSlot::NormalMap),
            emission_intensity: self.emission_intensity(),
        }
    }
}

/// Node tree walker that reports failures against its owning material
struct Graph<'a> {
    owner: &'a str,
    tree: &'a NodeTree,
}

impl<'a> Graph<'a> {
    fn missing_link(&self, slot: &str) -> Error {
        Error::MissingLink {
            owner: self.owner.to_string(),
            slot: slot.to_string(),
        }
    }

    /// Node linked into the first matching input of `node`
    fn linked_from(&self, node: &'a Node, inputs: &[&str], slot: &str) -> Result<&'a Node> {
        let socket = node.input_any(inputs).ok_or_else(|| self.missing_link(slot))?;
        self.upstream(node, socket, slot)
    }

    fn upstream(&self, node: &'a Node, socket: &'a Socket, slot: &str) -> Result<&'a Node> {
        self.tree
            .upstream(node, socket)
            .map(|(from, _)| from)
            .ok_or_else(|| self.missing_link(slot))
    }

    /// Image texture node linked into an input
    fn texture(&self, node: &'a Node, inputs: &[&str], slot: &str) -> Result<&'a Node> {
        let from = self.linked_from(node, inputs, slot)?;
        if from.kind != NodeKind::TexImage {
            return Err(self.missing_link(slot));
        }
        Ok(from)
    }

    fn bsdf(&self) -> Result<&'a Node> {
        let output = self
            .tree
            .active_output(NodeKind::OutputMaterial)
            .ok_or_else(|| Error::MissingNode {
                owner: self.owner.to_string(),
                node: OUTPUT_NODE.to_string(),
            })?;
        let bsdf = self.linked_from(output, &["Surface"], "Surface")?;
        if !bsdf.kind.is_bsdf() {
            return Err(Error::MissingNode {
                owner: self.owner.to_string(),
                node: "BSDF".to_string(),
            });
        }
        Ok(bsdf)
    }

    /// Emission texture node and strength behind the multiply node
    fn emission(&self, bsdf: &'a Node) -> Result<(&'a Node, f32)> {
        let multiply = self.linked_from(bsdf, &["Emission", "Emission Color"], "Emission")?;
        if !multiply.kind.is_multiply() {
            return Err(self.missing_link("Emission"));
        }

        let mut texture = None;
        let mut factor_socket = None;
        for socket in multiply.inputs.iter().filter(|s| s.name != "Fac") {
            match self.tree.upstream(multiply, socket) {
                Some((from, _)) if from.kind == NodeKind::TexImage && texture.is_none() => {
                    texture = Some(from);
                }
                _ if factor_socket.is_none() => factor_socket = Some(socket),
                _ => {}
            }
        }

        let texture = texture.ok_or_else(|| self.missing_link("Emission Texture"))?;
        let socket = factor_socket.ok_or_else(|| self.missing_link("Emission Strength"))?;
        let factor = match self.tree.upstream(multiply, socket) {
            Some((from, _)) if from.kind == NodeKind::Value => from
                .outputs
                .first()
                .and_then(|o| o.default_value.as_ref())
                .and_then(|v| v.as_scalar()),
            Some(_) => None,
            None => socket.default_value.as_ref().and_then(|v| v.as_scalar()),
        };
        let factor = factor.ok_or_else(|| self.missing_link("Emission Strength"))?;
        Ok((texture, factor))
    }

    fn normal_map(&self, bsdf: &'a Node) -> Result<&'a Node> {
        let normal = self.linked_from(bsdf, &["Normal"], "Normal")?;
        if normal.kind != NodeKind::NormalMap {
            return Err(self.missing_link("Normal"));
        }
        self.texture(normal, &["Color"], "Normal Texture")
    }
}

/// Material names become a directory under `Materials/`
fn check_dir_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.contains(['/', '\\']) {
        return Err(Error::invalid_document(format!(
            "material name {name:?} is not a valid directory name"
        )));
    }
    Ok(())
}

/// Validate a material's node graph and resolve its five images
pub fn resolve_material(doc: &Document, material: &Material) -> Result<ResolvedMaterial> {
    let owner = material.name.as_str();
    check_dir_name(owner)?;
    let tree = material.node_tree.as_ref().ok_or_else(|| Error::MissingNode {
        owner: owner.to_string(),
        node: OUTPUT_NODE.to_string(),
    })?;
    let graph = Graph { owner, tree };

    let bsdf = graph.bsdf()?;
    let base_color = graph.texture(bsdf, &["Base Color"], "BaseColor Texture")?;
    let metallic = graph.texture(bsdf, &["Metallic"], "Metallic Texture")?;
    let roughness = graph.texture(bsdf, &["Roughness"], "Roughness Texture")?;
    let (emission, emission_factor) = graph.emission(bsdf)?;
    let normal_map = graph.normal_map(bsdf)?;

    let nodes = [base_color, metallic, roughness, emission, normal_map];
    let mut textures = Vec::with_capacity(nodes.len());
    for (slot, node) in TextureSlot::ALL.into_iter().zip(nodes) {
        let name = node.image.as_deref().ok_or_else(|| Error::MissingImage {
            owner: owner.to_string(),
            slot: slot.label().to_string(),
        })?;
        let image = doc
            .image(name)
            .with_context(|| format!("{owner} - {} Texture", slot.label()))?;
        textures.push(ResolvedTexture {
            slot,
            image: image.name.clone(),
            source: doc.resolve_image_path(image),
            extension: image.extension(),
        });
    }

    Ok(ResolvedMaterial {
        name: material.name.clone(),
        textures,
        emission_factor,
    })
}

/// Copy a file into the export tree
pub(crate) fn copy_asset(from: &Path, to: &Path) -> Result<()> {
    std::fs::copy(from, to).map_err(|source| Error::CopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    debug!(from = %from.display(), to = %to.display(), "Copied asset");
    Ok(())
}

/// Create `Materials/<name>/` and copy the textures; returns the copied files
pub fn export_material(material: &ResolvedMaterial, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = output_dir.join(MATERIALS_DIR).join(&material.name);
    std::fs::create_dir_all(&dir)
        .map_err(Error::from)
        .with_context(|| format!("creating {}", dir.display()))?;

    let mut copied = Vec::with_capacity(material.textures.len());
    for texture in &material.textures {
        let target = dir.join(texture.file_name());
        copy_asset(&texture.source, &target)?;
        copied.push(target);
    }
    Ok(copied)
}
