//! Common types used across the scenefile crates
//!
//! This module provides shared math types and constants used by the
//! scene model and the exporter.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Luminous efficacy at 555 nm, in lumens per watt.
///
/// Host light energies (watts, or watts per square metre for suns and the
/// world background) are multiplied by this to obtain photometric intensity.
pub const LUMINOUS_EFFICACY: f64 = 683.002;

/// Convert a radiometric host value to the photometric value written out.
pub fn watts_to_lumens(watts: f32) -> f64 {
    f64::from(watts) * LUMINOUS_EFFICACY
}

/// Kind of data-block stored in a scene document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataBlockKind {
    Collection,
    Object,
    Mesh,
    Light,
    Material,
    Image,
    World,
}

impl std::fmt::Display for DataBlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataBlockKind::Collection => "Collection",
            DataBlockKind::Object => "Object",
            DataBlockKind::Mesh => "Mesh",
            DataBlockKind::Light => "Light",
            DataBlockKind::Material => "Material",
            DataBlockKind::Image => "Image",
            DataBlockKind::World => "World",
        };
        f.write_str(name)
    }
}

/// Euler rotation order, named by the order the axes are applied in.
///
/// `Xyz` rotates about X first, then Y, then Z, so its matrix is
/// `Rz * Ry * Rx`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EulerOrder {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl EulerOrder {
    pub const ALL: [EulerOrder; 6] = [
        EulerOrder::Xyz,
        EulerOrder::Xzy,
        EulerOrder::Yxz,
        EulerOrder::Yzx,
        EulerOrder::Zxy,
        EulerOrder::Zyx,
    ];

    /// Parse an order name such as `YXZ`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.as_str() == name)
    }

    /// Order name as written in scenefiles, e.g. `YXZ`
    pub fn as_str(&self) -> &'static str {
        match self {
            EulerOrder::Xyz => "XYZ",
            EulerOrder::Xzy => "XZY",
            EulerOrder::Yxz => "YXZ",
            EulerOrder::Yzx => "YZX",
            EulerOrder::Zxy => "ZXY",
            EulerOrder::Zyx => "ZYX",
        }
    }

    /// Build a rotation from per-axis angles (radians, `x y z`)
    pub fn to_quat(self, angles: Vec3) -> Quat {
        // glam composes intrinsic rotations left to right, so the axis
        // applied last comes first.
        match self {
            EulerOrder::Xyz => Quat::from_euler(EulerRot::ZYX, angles.z, angles.y, angles.x),
            EulerOrder::Xzy => Quat::from_euler(EulerRot::YZX, angles.y, angles.z, angles.x),
            EulerOrder::Yxz => Quat::from_euler(EulerRot::ZXY, angles.z, angles.x, angles.y),
            EulerOrder::Yzx => Quat::from_euler(EulerRot::XZY, angles.x, angles.z, angles.y),
            EulerOrder::Zxy => Quat::from_euler(EulerRot::YXZ, angles.y, angles.x, angles.z),
            EulerOrder::Zyx => Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z),
        }
    }

    /// Decompose a rotation into per-axis angles (radians, `x y z`)
    pub fn from_quat(self, rotation: Quat) -> Vec3 {
        match self {
            EulerOrder::Xyz => {
                let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
                Vec3::new(x, y, z)
            }
            EulerOrder::Xzy => {
                let (y, z, x) = rotation.to_euler(EulerRot::YZX);
                Vec3::new(x, y, z)
            }
            EulerOrder::Yxz => {
                let (z, x, y) = rotation.to_euler(EulerRot::ZXY);
                Vec3::new(x, y, z)
            }
            EulerOrder::Yzx => {
                let (x, z, y) = rotation.to_euler(EulerRot::XZY);
                Vec3::new(x, y, z)
            }
            EulerOrder::Zxy => {
                let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
                Vec3::new(x, y, z)
            }
            EulerOrder::Zyx => {
                let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
                Vec3::new(x, y, z)
            }
        }
    }
}

/// Euler angles tagged with their rotation order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub angles: Vec3,
    pub order: EulerOrder,
}

impl Euler {
    pub fn new(angles: Vec3, order: EulerOrder) -> Self {
        Self { angles, order }
    }

    /// Decompose a rotation using the given order
    pub fn from_quat(rotation: Quat, order: EulerOrder) -> Self {
        Self {
            angles: order.from_quat(rotation),
            order,
        }
    }

    pub fn to_quat(&self) -> Quat {
        self.order.to_quat(self.angles)
    }

    /// Rotate a vector by this rotation
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        self.to_quat() * v
    }
}

/// Decomposed world transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Split an affine matrix into translation, rotation and scale
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    pub fn compute_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Rotation as YXZ Euler angles, the order scenefiles use
    pub fn euler_yxz(&self) -> Euler {
        Euler::from_quat(self.rotation, EulerOrder::Yxz)
    }

    /// Local -Z axis rotated by the YXZ Euler rotation
    pub fn forward(&self) -> Vec3 {
        self.euler_yxz().rotate(Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_watts_to_lumens() {
        assert_eq!(watts_to_lumens(1.0), 683.002);
        assert_eq!(watts_to_lumens(3.0), 3.0 * 683.002);
        assert_eq!(watts_to_lumens(0.0), 0.0);
    }

    #[test]
    fn test_order_names() {
        assert_eq!(EulerOrder::from_name("YXZ"), Some(EulerOrder::Yxz));
        assert_eq!(EulerOrder::from_name("yxz"), None);
        for order in EulerOrder::ALL {
            assert_eq!(EulerOrder::from_name(order.as_str()), Some(order));
        }
    }

    #[test]
    fn test_yxz_round_trip() {
        let angles = Vec3::new(0.3, -0.7, 1.1);
        let q = EulerOrder::Yxz.to_quat(angles);
        let back = EulerOrder::Yxz.from_quat(q);
        assert!(approx(angles, back));
    }

    #[test]
    fn test_xyz_matches_axis_composition() {
        let angles = Vec3::new(0.2, 0.4, 0.6);
        let expected = Quat::from_rotation_z(0.6) * Quat::from_rotation_y(0.4) * Quat::from_rotation_x(0.2);
        let q = EulerOrder::Xyz.to_quat(angles);
        assert!(q.dot(expected).abs() > 0.99999);
    }

    #[test]
    fn test_forward_identity() {
        let transform = Transform::from_matrix(&Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        assert!(approx(transform.translation, Vec3::new(0.0, 0.0, 5.0)));
        assert!(approx(transform.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn test_forward_pitched_up() {
        let transform = Transform {
            rotation: Quat::from_rotation_x(FRAC_PI_2),
            ..Default::default()
        };
        assert!(approx(transform.forward(), Vec3::Y));
    }

    #[test]
    fn test_matrix_decomposition() {
        let original = Transform {
            translation: Vec3::new(1.0, -2.0, 3.0),
            rotation: EulerOrder::Yxz.to_quat(Vec3::new(0.1, 0.2, 0.3)),
            scale: Vec3::new(2.0, 2.0, 0.5),
        };
        let decomposed = Transform::from_matrix(&original.compute_matrix());
        assert!(approx(decomposed.translation, original.translation));
        assert!(approx(decomposed.scale, original.scale));
        assert!(approx(decomposed.euler_yxz().angles, Vec3::new(0.1, 0.2, 0.3)));
    }
}
