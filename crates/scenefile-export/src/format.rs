//! Scenefile text format
//!
//! A scenefile is a newline-delimited list of records. Each record opens with
//! `<Type>: <name>` (just `Sky:` for the sky) and closes with `<Type>End`.
//! Fields are `Key: v1 v2 ...` lines; meshes carry `v`/`vn`/`vt` stream lines
//! instead. Sections always appear in the order meshes, materials, mesh
//! entities, directional lights, point lights, spot lights, sky.
//!
//! Numbers use the shortest decimal that round-trips to the stored value,
//! with negative zero written as `0`.

use std::fmt::{self, Display};
use std::path::Path;

use glam::{Vec2, Vec3};
use scenefile_core::{Error, Euler, EulerOrder, Result, ResultExt};
use serde::Serialize;

/// First line of every scenefile
pub const HEADER: &str = "# Scene file";

/// File name of the scenefile inside an export directory
pub const SCENEFILE_NAME: &str = "scenefile.txt";

/// Number as written in a scenefile
pub struct Num<T>(pub T);

impl Display for Num<f32> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            f.write_str("0")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Display for Num<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            f.write_str("0")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

struct Triple(Vec3);

impl Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", Num(self.0.x), Num(self.0.y), Num(self.0.z))
    }
}

struct Rgb([f32; 3]);

impl Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", Num(self.0[0]), Num(self.0[1]), Num(self.0[2]))
    }
}

/// `Mesh:` record: flat per-corner stream, three corners per triangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshRecord {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl MeshRecord {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

impl Display for MeshRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh: {}", self.name)?;
        for p in &self.positions {
            writeln!(f, "v {}", Triple(*p))?;
        }
        for n in &self.normals {
            writeln!(f, "vn {}", Triple(*n))?;
        }
        for uv in &self.uvs {
            writeln!(f, "vt {} {}", Num(uv.x), Num(uv.y))?;
        }
        writeln!(f, "MeshEnd")
    }
}

/// `Material:` record; texture paths are relative to the export directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRecord {
    pub name: String,
    pub base_color: String,
    pub metallic: String,
    pub roughness: String,
    pub emission: String,
    pub normal_map: String,
    pub emission_intensity: f64,
}

impl Display for MaterialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Material: {}", self.name)?;
        writeln!(f, "baseColor: {}", self.base_color)?;
        writeln!(f, "metallic: {}", self.metallic)?;
        writeln!(f, "roughness: {}", self.roughness)?;
        writeln!(f, "emission: {}", self.emission)?;
        writeln!(f, "normalMap: {}", self.normal_map)?;
        writeln!(f, "emissionIntensity: {}", Num(self.emission_intensity))?;
        writeln!(f, "MaterialEnd")
    }
}

/// `MeshEntity:` record placing a mesh with a material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshEntityRecord {
    pub name: String,
    pub mesh: String,
    pub material: String,
    pub position: Vec3,
    pub rotation: Euler,
    pub scale: Vec3,
}

impl Display for MeshEntityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MeshEntity: {}", self.name)?;
        writeln!(f, "Mesh: {}", self.mesh)?;
        writeln!(f, "Material: {}", self.material)?;
        writeln!(f, "Position: {}", Triple(self.position))?;
        writeln!(
            f,
            "Rotation: {} {}",
            Triple(self.rotation.angles),
            self.rotation.order.as_str()
        )?;
        writeln!(f, "Scale: {}", Triple(self.scale))?;
        writeln!(f, "MeshEntityEnd")
    }
}

/// `DirectionalLight:` record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalLightRecord {
    pub name: String,
    pub position: Vec3,
    pub intensity: f64,
    pub color: [f32; 3],
    pub direction: Vec3,
}

impl Display for DirectionalLightRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DirectionalLight: {}", self.name)?;
        writeln!(f, "Position: {}", Triple(self.position))?;
        writeln!(f, "Intensity: {}", Num(self.intensity))?;
        writeln!(f, "Color: {}", Rgb(self.color))?;
        writeln!(f, "Direction: {}", Triple(self.direction))?;
        writeln!(f, "DirectionalLightEnd")
    }
}

/// `PointLight:` record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLightRecord {
    pub name: String,
    pub position: Vec3,
    pub intensity: f64,
    pub color: [f32; 3],
    pub range: f32,
    pub clip_start: f32,
    pub shadow_bias: f32,
    pub use_shadow: bool,
}

impl Display for PointLightRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PointLight: {}", self.name)?;
        writeln!(f, "Position: {}", Triple(self.position))?;
        writeln!(f, "Intensity: {}", Num(self.intensity))?;
        writeln!(f, "Color: {}", Rgb(self.color))?;
        writeln!(f, "Range: {}", Num(self.range))?;
        writeln!(f, "ClipStart: {}", Num(self.clip_start))?;
        writeln!(f, "ShadowBias: {}", Num(self.shadow_bias))?;
        writeln!(f, "UseShadow: {}", u8::from(self.use_shadow))?;
        writeln!(f, "PointLightEnd")
    }
}

/// `SpotLight:` record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotLightRecord {
    pub name: String,
    pub position: Vec3,
    pub intensity: f64,
    pub color: [f32; 3],
    pub direction: Vec3,
    pub range: f32,
    pub clip_start: f32,
    /// Full cone angle, radians
    pub angle: f32,
    pub blend: f32,
}

impl Display for SpotLightRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SpotLight: {}", self.name)?;
        writeln!(f, "Position: {}", Triple(self.position))?;
        writeln!(f, "Intensity: {}", Num(self.intensity))?;
        writeln!(f, "Color: {}", Rgb(self.color))?;
        writeln!(f, "Direction: {}", Triple(self.direction))?;
        writeln!(f, "Range: {}", Num(self.range))?;
        writeln!(f, "ClipStart: {}", Num(self.clip_start))?;
        writeln!(f, "Angle: {}", Num(self.angle))?;
        writeln!(f, "Blend: {}", Num(self.blend))?;
        writeln!(f, "SpotLightEnd")
    }
}

/// `Sky:` record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkyRecord {
    pub image_path: String,
    pub intensity: f64,
}

impl Display for SkyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sky:")?;
        writeln!(f, "SkyImagePath: {}", self.image_path)?;
        writeln!(f, "skyIntensity: {}", Num(self.intensity))?;
        writeln!(f, "SkyEnd")
    }
}

/// Complete scenefile contents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scenefile {
    pub meshes: Vec<MeshRecord>,
    pub materials: Vec<MaterialRecord>,
    pub mesh_entities: Vec<MeshEntityRecord>,
    pub directional_lights: Vec<DirectionalLightRecord>,
    pub point_lights: Vec<PointLightRecord>,
    pub spot_lights: Vec<SpotLightRecord>,
    pub sky: Option<SkyRecord>,
}

impl Display for Scenefile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        for mesh in &self.meshes {
            write!(f, "{mesh}")?;
        }
        for material in &self.materials {
            write!(f, "{material}")?;
        }
        for entity in &self.mesh_entities {
            write!(f, "{entity}")?;
        }
        for light in &self.directional_lights {
            write!(f, "{light}")?;
        }
        for light in &self.point_lights {
            write!(f, "{light}")?;
        }
        for light in &self.spot_lights {
            write!(f, "{light}")?;
        }
        if let Some(sky) = &self.sky {
            write!(f, "{sky}")?;
        }
        Ok(())
    }
}

impl Scenefile {
    /// Render the whole file
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Write the scenefile to disk
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text())
            .map_err(Error::from)
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Read a scenefile from disk
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(Error::from)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text)
    }

    /// Parse scenefile text. Blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut scenefile = Scenefile::default();
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        while let Some((line_no, line)) = lines.next() {
            let (kind, name) = split_field(line)
                .ok_or_else(|| Error::parse(line_no, format!("expected a record, found `{line}`")))?;
            let end = format!("{kind}End");

            let mut block = Block {
                start: line_no,
                kind: kind.to_string(),
                name: name.to_string(),
                fields: Vec::new(),
            };
            loop {
                let (no, body) = lines
                    .next()
                    .ok_or_else(|| Error::parse(line_no, format!("{kind} record is not closed by {end}")))?;
                if body == end {
                    break;
                }
                block.fields.push((no, body));
            }

            match kind {
                "Mesh" => scenefile.meshes.push(block.mesh()?),
                "Material" => scenefile.materials.push(block.material()?),
                "MeshEntity" => scenefile.mesh_entities.push(block.mesh_entity()?),
                "DirectionalLight" => scenefile.directional_lights.push(block.directional_light()?),
                "PointLight" => scenefile.point_lights.push(block.point_light()?),
                "SpotLight" => scenefile.spot_lights.push(block.spot_light()?),
                "Sky" => {
                    if scenefile.sky.is_some() {
                        return Err(Error::parse(line_no, "more than one Sky record"));
                    }
                    scenefile.sky = Some(block.sky()?);
                }
                other => return Err(Error::parse(line_no, format!("unknown record type {other}"))),
            }
        }

        Ok(scenefile)
    }
}

/// `Key: value` split; the value may be empty
fn split_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}

struct Block<'a> {
    start: usize,
    kind: String,
    name: String,
    fields: Vec<(usize, &'a str)>,
}

impl<'a> Block<'a> {
    fn field(&self, key: &str) -> Result<(usize, &'a str)> {
        self.fields
            .iter()
            .find_map(|&(no, line)| match split_field(line) {
                Some((k, value)) if k == key => Some((no, value)),
                _ => None,
            })
            .ok_or_else(|| {
                Error::parse(
                    self.start,
                    format!("{} {} is missing the {key} field", self.kind, self.name),
                )
            })
    }

    fn text(&self, key: &str) -> Result<String> {
        Ok(self.field(key)?.1.to_string())
    }

    fn numbers<T: std::str::FromStr>(&self, key: &str, count: usize) -> Result<Vec<T>> {
        let (no, value) = self.field(key)?;
        parse_numbers(no, value, count)
    }

    fn f32(&self, key: &str) -> Result<f32> {
        Ok(self.numbers::<f32>(key, 1)?[0])
    }

    fn f64(&self, key: &str) -> Result<f64> {
        Ok(self.numbers::<f64>(key, 1)?[0])
    }

    fn vec3(&self, key: &str) -> Result<Vec3> {
        Ok(Vec3::from_slice(&self.numbers::<f32>(key, 3)?))
    }

    fn rgb(&self, key: &str) -> Result<[f32; 3]> {
        let v = self.numbers::<f32>(key, 3)?;
        Ok([v[0], v[1], v[2]])
    }

    fn mesh(&self) -> Result<MeshRecord> {
        let mut record = MeshRecord {
            name: self.name.clone(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
        };
        for &(no, line) in &self.fields {
            let (tag, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            match tag {
                "v" => record.positions.push(Vec3::from_slice(&parse_numbers(no, rest, 3)?)),
                "vn" => record.normals.push(Vec3::from_slice(&parse_numbers(no, rest, 3)?)),
                "vt" => record.uvs.push(Vec2::from_slice(&parse_numbers(no, rest, 2)?)),
                other => return Err(Error::parse(no, format!("unexpected mesh line `{other}`"))),
            }
        }
        if record.normals.len() != record.positions.len() || record.uvs.len() != record.positions.len() {
            return Err(Error::parse(
                self.start,
                format!(
                    "mesh {} has {} v, {} vn and {} vt lines",
                    self.name,
                    record.positions.len(),
                    record.normals.len(),
                    record.uvs.len()
                ),
            ));
        }
        Ok(record)
    }

    fn material(&self) -> Result<MaterialRecord> {
        Ok(MaterialRecord {
            name: self.name.clone(),
            base_color: self.text("baseColor")?,
            metallic: self.text("metallic")?,
            roughness: self.text("roughness")?,
            emission: self.text("emission")?,
            normal_map: self.text("normalMap")?,
            emission_intensity: self.f64("emissionIntensity")?,
        })
    }

    fn mesh_entity(&self) -> Result<MeshEntityRecord> {
        let (no, rotation) = self.field("Rotation")?;
        let parts: Vec<&str> = rotation.split_whitespace().collect();
        let [x, y, z, order] = parts.as_slice() else {
            return Err(Error::parse(no, format!("expected `x y z ORDER`, found `{rotation}`")));
        };
        let order = EulerOrder::from_name(order)
            .ok_or_else(|| Error::parse(no, format!("unknown rotation order {order}")))?;
        let angles = parse_numbers::<f32>(no, &format!("{x} {y} {z}"), 3)?;

        Ok(MeshEntityRecord {
            name: self.name.clone(),
            mesh: self.text("Mesh")?,
            material: self.text("Material")?,
            position: self.vec3("Position")?,
            rotation: Euler::new(Vec3::from_slice(&angles), order),
            scale: self.vec3("Scale")?,
        })
    }

    fn directional_light(&self) -> Result<DirectionalLightRecord> {
        Ok(DirectionalLightRecord {
            name: self.name.clone(),
            position: self.vec3("Position")?,
            intensity: self.f64("Intensity")?,
            color: self.rgb("Color")?,
            direction: self.vec3("Direction")?,
        })
    }

    fn point_light(&self) -> Result<PointLightRecord> {
        let (no, use_shadow) = self.field("UseShadow")?;
        let use_shadow = match use_shadow {
            "0" => false,
            "1" => true,
            other => return Err(Error::parse(no, format!("UseShadow must be 0 or 1, found {other}"))),
        };
        Ok(PointLightRecord {
            name: self.name.clone(),
            position: self.vec3("Position")?,
            intensity: self.f64("Intensity")?,
            color: self.rgb("Color")?,
            range: self.f32("Range")?,
            clip_start: self.f32("ClipStart")?,
            shadow_bias: self.f32("ShadowBias")?,
            use_shadow,
        })
    }

    fn spot_light(&self) -> Result<SpotLightRecord> {
        Ok(SpotLightRecord {
            name: self.name.clone(),
            position: self.vec3("Position")?,
            intensity: self.f64("Intensity")?,
            color: self.rgb("Color")?,
            direction: self.vec3("Direction")?,
            range: self.f32("Range")?,
            clip_start: self.f32("ClipStart")?,
            angle: self.f32("Angle")?,
            blend: self.f32("Blend")?,
        })
    }

    fn sky(&self) -> Result<SkyRecord> {
        Ok(SkyRecord {
            image_path: self.text("SkyImagePath")?,
            intensity: self.f64("skyIntensity")?,
        })
    }
}

fn parse_numbers<T: std::str::FromStr>(line: usize, value: &str, count: usize) -> Result<Vec<T>> {
    let numbers = value
        .split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| Error::parse(line, format!("`{token}` is not a number")))
        })
        .collect::<Result<Vec<T>>>()?;
    if numbers.len() != count {
        return Err(Error::parse(
            line,
            format!("expected {count} numbers, found {}", numbers.len()),
        ));
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scenefile {
        Scenefile {
            meshes: vec![MeshRecord {
                name: "Tri".into(),
                positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                normals: vec![Vec3::Z; 3],
                uvs: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            }],
            materials: vec![MaterialRecord {
                name: "Brick".into(),
                base_color: "Materials/Brick/baseColor.png".into(),
                metallic: "Materials/Brick/metallic.png".into(),
                roughness: "Materials/Brick/roughness.png".into(),
                emission: "Materials/Brick/emission.png".into(),
                normal_map: "Materials/Brick/normalMap.png".into(),
                emission_intensity: 683.002,
            }],
            mesh_entities: vec![MeshEntityRecord {
                name: "Wall".into(),
                mesh: "Tri".into(),
                material: "Brick".into(),
                position: Vec3::new(1.5, 0.0, -2.0),
                rotation: Euler::new(Vec3::new(0.0, 0.5, 0.0), EulerOrder::Yxz),
                scale: Vec3::ONE,
            }],
            directional_lights: vec![DirectionalLightRecord {
                name: "Sun".into(),
                position: Vec3::new(0.0, 0.0, 5.0),
                intensity: 2049.006,
                color: [1.0, 0.9, 0.8],
                direction: Vec3::NEG_Z,
            }],
            point_lights: vec![PointLightRecord {
                name: "Bulb".into(),
                position: Vec3::ONE,
                intensity: 6830.02,
                color: [1.0, 1.0, 1.0],
                range: 40.0,
                clip_start: 0.05,
                shadow_bias: 1.0,
                use_shadow: true,
            }],
            spot_lights: vec![SpotLightRecord {
                name: "Torch".into(),
                position: Vec3::ZERO,
                intensity: 100.0,
                color: [1.0, 1.0, 1.0],
                direction: Vec3::NEG_Y,
                range: 25.0,
                clip_start: 0.1,
                angle: 0.785,
                blend: 0.15,
            }],
            sky: Some(SkyRecord {
                image_path: "Sky/sky.exr".into(),
                intensity: 683.002,
            }),
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(Num(5.0f32).to_string(), "5");
        assert_eq!(Num(0.1f32).to_string(), "0.1");
        assert_eq!(Num(-0.0f32).to_string(), "0");
        assert_eq!(Num(-1.0f32).to_string(), "-1");
        assert_eq!(Num(683.002f64).to_string(), "683.002");
    }

    #[test]
    fn test_section_order_and_markers() {
        let text = sample().to_text();
        let starts: Vec<&str> = text
            .lines()
            .filter(|l| {
                ["Mesh: ", "Material: ", "MeshEntity: ", "DirectionalLight: ", "PointLight: ", "SpotLight: ", "Sky:"]
                    .iter()
                    .any(|p| l.starts_with(p))
            })
            .collect();
        assert_eq!(
            starts,
            vec![
                "Mesh: Tri",
                "Material: Brick",
                "MeshEntity: Wall",
                // entity field, not a record
                "Mesh: Tri",
                "Material: Brick",
                "DirectionalLight: Sun",
                "PointLight: Bulb",
                "SpotLight: Torch",
                "Sky:",
            ]
        );
        assert!(text.starts_with("# Scene file\nMesh: Tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\n"));
        assert!(text.ends_with("Sky:\nSkyImagePath: Sky/sky.exr\nskyIntensity: 683.002\nSkyEnd\n"));
    }

    #[test]
    fn test_entity_and_light_lines() {
        let text = sample().to_text();
        assert!(text.contains("Rotation: 0 0.5 0 YXZ\n"));
        assert!(text.contains("Direction: 0 0 -1\n"));
        assert!(text.contains("UseShadow: 1\n"));
        assert!(text.contains("normalMap: Materials/Brick/normalMap.png\n"));
    }

    #[test]
    fn test_parse_reads_back_written_file() {
        let original = sample();
        let parsed = Scenefile::parse(&original.to_text()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_unclosed_record() {
        let err = Scenefile::parse("# Scene file\nSky:\nSkyImagePath: Sky/sky.exr\n").unwrap_err();
        assert!(err.to_string().contains("not closed by SkyEnd"));
    }

    #[test]
    fn test_parse_missing_field() {
        let text = "DirectionalLight: Sun\nPosition: 0 0 0\nIntensity: 1\nColor: 1 1 1\nDirectionalLightEnd\n";
        let err = Scenefile::parse(text).unwrap_err();
        assert!(err.to_string().contains("missing the Direction field"));
    }

    #[test]
    fn test_parse_bad_number() {
        let text = "Sky:\nSkyImagePath: Sky/sky.exr\nskyIntensity: bright\nSkyEnd\n";
        let err = Scenefile::parse(text).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_parse_unknown_record() {
        let err = Scenefile::parse("Camera: Main\nCameraEnd\n").unwrap_err();
        assert!(err.to_string().contains("unknown record type Camera"));
    }
}
