//! Mesh data-blocks and the mesh-editing operations the exporter needs
//!
//! Loops are implicit: the corners of each polygon, in polygon order, so the
//! loop index of a corner is the running corner count. UV layers and custom
//! normals store one entry per loop.

use glam::{Vec2, Vec3};
use scenefile_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Face of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertex indices, one per corner
    pub vertices: Vec<u32>,
    #[serde(default)]
    pub use_smooth: bool,
}

/// Per-loop texture coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<Vec2>,
    #[serde(default)]
    pub active: bool,
}

/// Mesh data-block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub name: String,
    #[serde(default)]
    pub vertices: Vec<Vec3>,
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    /// Per-loop custom split normals
    #[serde(default)]
    pub custom_normals: Option<Vec<Vec3>>,
}

/// Corner of a triangle after triangulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// Triangulated working copy of a mesh, three corners per triangle
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulatedMesh {
    pub name: String,
    pub corners: Vec<Corner>,
}

impl TriangulatedMesh {
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }
}

impl MeshData {
    pub fn loop_count(&self) -> usize {
        self.polygons.iter().map(|p| p.vertices.len()).sum()
    }

    /// Active UV layer, or the first one when none is flagged
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layers
            .iter()
            .find(|layer| layer.active)
            .or_else(|| self.uv_layers.first())
    }

    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidMesh {
            mesh: self.name.clone(),
            message: message.into(),
        }
    }

    /// Check topology and per-loop layer sizes
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        for (index, polygon) in self.polygons.iter().enumerate() {
            if polygon.vertices.len() < 3 {
                return Err(self.invalid(format!(
                    "polygon {index} has {} corners",
                    polygon.vertices.len()
                )));
            }
            if let Some(&v) = polygon.vertices.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(self.invalid(format!(
                    "polygon {index} references vertex {v} of {vertex_count}"
                )));
            }
        }

        let loops = self.loop_count();
        if loops > 0 {
            let layer = self.active_uv_layer().ok_or_else(|| Error::MissingUvLayer {
                mesh: self.name.clone(),
            })?;
            if layer.data.len() != loops {
                return Err(self.invalid(format!(
                    "UV layer {} has {} entries for {loops} loops",
                    layer.name,
                    layer.data.len()
                )));
            }
        }
        if let Some(normals) = &self.custom_normals {
            if normals.len() != loops {
                return Err(self.invalid(format!(
                    "{} custom normals for {loops} loops",
                    normals.len()
                )));
            }
        }
        Ok(())
    }

    /// Triangulate a copy of the mesh and compute split normals.
    ///
    /// Polygons are fan-triangulated from their first corner. Each output
    /// corner keeps the UV and custom normal of the loop it came from.
    /// Without custom normals, flat faces take the triangle normal and smooth
    /// faces take the angle-weighted vertex normal.
    pub fn triangulate(&self) -> Result<TriangulatedMesh> {
        self.validate()?;

        // (loop index, vertex index) per triangle corner
        let mut triangles: Vec<[(usize, usize); 3]> = Vec::new();
        let mut smooth: Vec<bool> = Vec::new();
        let mut loop_start = 0;
        for polygon in &self.polygons {
            let corner = |k: usize| (loop_start + k, polygon.vertices[k] as usize);
            for k in 1..polygon.vertices.len() - 1 {
                triangles.push([corner(0), corner(k), corner(k + 1)]);
                smooth.push(polygon.use_smooth);
            }
            loop_start += polygon.vertices.len();
        }

        let face_normals: Vec<Vec3> = triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.map(|(_, v)| self.vertices[v]);
                (b - a).cross(c - a)
            })
            .collect();

        // Weighted by corner angle, so a face's share does not depend on
        // how it was split into triangles
        let mut vertex_normals = vec![Vec3::ZERO; self.vertices.len()];
        for (tri, normal) in triangles.iter().zip(&face_normals) {
            let normal = normal.normalize_or_zero();
            for k in 0..3 {
                let v = tri[k].1;
                let position = self.vertices[v];
                let next = self.vertices[tri[(k + 1) % 3].1] - position;
                let prev = self.vertices[tri[(k + 2) % 3].1] - position;
                vertex_normals[v] += normal * corner_angle(next, prev);
            }
        }
        for normal in &mut vertex_normals {
            *normal = normal.normalize_or_zero();
        }

        let uvs = self.active_uv_layer().map(|layer| layer.data.as_slice());
        let mut corners = Vec::with_capacity(triangles.len() * 3);
        for ((tri, face_normal), is_smooth) in triangles.iter().zip(&face_normals).zip(&smooth) {
            for &(l, v) in tri {
                let normal = match &self.custom_normals {
                    Some(custom) => custom[l],
                    None if *is_smooth => vertex_normals[v],
                    None => face_normal.normalize_or_zero(),
                };
                corners.push(Corner {
                    position: self.vertices[v],
                    normal,
                    uv: uvs.map_or(Vec2::ZERO, |data| data[l]),
                });
            }
        }

        Ok(TriangulatedMesh {
            name: self.name.clone(),
            corners,
        })
    }
}

/// Angle between two edges leaving a corner, zero for a degenerate edge
fn corner_angle(a: Vec3, b: Vec3) -> f32 {
    let (a, b) = (a.normalize_or_zero(), b.normalize_or_zero());
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(smooth: bool) -> MeshData {
        MeshData {
            name: "Plane".into(),
            vertices: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            polygons: vec![Polygon {
                vertices: vec![0, 1, 2, 3],
                use_smooth: smooth,
            }],
            uv_layers: vec![UvLayer {
                name: "UVMap".into(),
                data: vec![
                    Vec2::new(0.0, 0.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(0.0, 1.0),
                ],
                active: true,
            }],
            custom_normals: None,
        }
    }

    #[test]
    fn test_quad_becomes_two_triangles() {
        let tri = quad(false).triangulate().unwrap();
        assert_eq!(tri.triangle_count(), 2);
        assert_eq!(tri.corners.len(), 6);

        // Fan from the first corner: (0,1,2) (0,2,3)
        assert_eq!(tri.corners[3].position, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(tri.corners[4].uv, Vec2::new(1.0, 1.0));
        assert_eq!(tri.corners[5].uv, Vec2::new(0.0, 1.0));
        for corner in &tri.corners {
            assert_eq!(corner.normal, Vec3::Z);
        }
    }

    #[test]
    fn test_smooth_normals_average_faces() {
        // Two triangles folded along the x axis
        let mesh = MeshData {
            name: "Fold".into(),
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
            ],
            polygons: vec![
                Polygon { vertices: vec![0, 1, 2], use_smooth: true },
                Polygon { vertices: vec![0, 1, 3], use_smooth: true },
            ],
            uv_layers: vec![UvLayer {
                name: "UVMap".into(),
                data: vec![Vec2::ZERO; 6],
                active: false,
            }],
            custom_normals: None,
        };
        let tri = mesh.triangulate().unwrap();
        let shared = tri.corners[0].normal;
        let expected = Vec3::new(0.0, 1.0, 1.0).normalize();
        assert!((shared - expected).length() < 1e-6);
        assert!((tri.corners[2].normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_smooth_normals_ignore_fan_diagonal() {
        // Two unit quads at a right angle sharing the edge v0-v1
        let mesh = MeshData {
            name: "Hinge".into(),
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            polygons: vec![
                Polygon { vertices: vec![0, 1, 2, 3], use_smooth: true },
                Polygon { vertices: vec![1, 0, 5, 4], use_smooth: true },
            ],
            uv_layers: vec![UvLayer {
                name: "UVMap".into(),
                data: vec![Vec2::ZERO; 8],
                active: true,
            }],
            custom_normals: None,
        };
        let tri = mesh.triangulate().unwrap();
        let expected = Vec3::new(0.0, 1.0, 1.0).normalize();
        for corner in tri.corners.iter().filter(|c| c.position.y == 0.0 && c.position.z == 0.0) {
            assert!(
                (corner.normal - expected).length() < 1e-6,
                "normal at {} was {}",
                corner.position,
                corner.normal
            );
        }
        let far = tri.corners.iter().find(|c| c.position == Vec3::new(1.0, 1.0, 0.0)).unwrap();
        assert!((far.normal - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_custom_normals_follow_loops() {
        let mut mesh = quad(false);
        mesh.custom_normals = Some(vec![Vec3::X, Vec3::Y, Vec3::NEG_X, Vec3::NEG_Y]);
        let tri = mesh.triangulate().unwrap();
        let normals: Vec<Vec3> = tri.corners.iter().map(|c| c.normal).collect();
        assert_eq!(
            normals,
            vec![Vec3::X, Vec3::Y, Vec3::NEG_X, Vec3::X, Vec3::NEG_X, Vec3::NEG_Y]
        );
    }

    #[test]
    fn test_missing_uv_layer() {
        let mut mesh = quad(false);
        mesh.uv_layers.clear();
        let err = mesh.triangulate().unwrap_err();
        assert!(matches!(err, Error::MissingUvLayer { .. }));
    }

    #[test]
    fn test_out_of_range_vertex() {
        let mut mesh = quad(false);
        mesh.polygons[0].vertices[2] = 9;
        let err = mesh.triangulate().unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("vertex 9"));
    }

    #[test]
    fn test_empty_mesh_needs_no_uvs() {
        let mesh = MeshData {
            name: "Empty".into(),
            vertices: vec![],
            polygons: vec![],
            uv_layers: vec![],
            custom_normals: None,
        };
        assert_eq!(mesh.triangulate().unwrap().triangle_count(), 0);
    }
}
