//! Mesh records

use scenefile_core::{Result, ResultExt};
use scenefile_scene::MeshData;

use crate::format::MeshRecord;

/// Triangulate a mesh data-block into its flat per-corner record
pub fn mesh_record(mesh: &MeshData) -> Result<MeshRecord> {
    let triangulated = mesh
        .triangulate()
        .with_context(|| format!("exporting mesh {}", mesh.name))?;

    let corners = &triangulated.corners;
    Ok(MeshRecord {
        name: triangulated.name.clone(),
        positions: corners.iter().map(|c| c.position).collect(),
        normals: corners.iter().map(|c| c.normal).collect(),
        uvs: corners.iter().map(|c| c.uv).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use scenefile_scene::{Polygon, UvLayer};

    #[test]
    fn test_triangle_record() {
        let mesh = MeshData {
            name: "Tri".into(),
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            polygons: vec![Polygon { vertices: vec![0, 1, 2], use_smooth: false }],
            uv_layers: vec![UvLayer {
                name: "UVMap".into(),
                data: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
                active: true,
            }],
            custom_normals: None,
        };
        let record = mesh_record(&mesh).unwrap();
        assert_eq!(record.triangle_count(), 1);
        assert_eq!(record.positions, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(record.normals, vec![Vec3::Z; 3]);
        assert_eq!(record.uvs[2], Vec2::Y);

        let text = record.to_string();
        assert!(text.starts_with("Mesh: Tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\n"));
        assert!(text.ends_with("vt 0 1\nMeshEnd\n"));
    }

    #[test]
    fn test_error_names_mesh() {
        let mesh = MeshData {
            name: "Broken".into(),
            vertices: vec![Vec3::ZERO, Vec3::X],
            polygons: vec![Polygon { vertices: vec![0, 1], use_smooth: false }],
            uv_layers: vec![],
            custom_normals: None,
        };
        let err = mesh_record(&mesh).unwrap_err();
        assert!(err.to_string().contains("exporting mesh Broken"));
        assert!(err.is_format_error());
    }
}
