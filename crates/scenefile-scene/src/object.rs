//! Scene objects
//!
//! An object places a data-block (mesh, light, ...) in the scene with a
//! local transform and an optional parent.

use glam::{Mat4, Quat, Vec3};
use scenefile_core::EulerOrder;
use serde::{Deserialize, Serialize};

/// Object type as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Mesh,
    Light,
    Empty,
    Camera,
    #[serde(other)]
    Other,
}

/// How the local rotation is stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotationMode {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
    Quaternion,
}

impl RotationMode {
    /// Euler order for the Euler modes
    pub fn euler_order(&self) -> Option<EulerOrder> {
        match self {
            RotationMode::Xyz => Some(EulerOrder::Xyz),
            RotationMode::Xzy => Some(EulerOrder::Xzy),
            RotationMode::Yxz => Some(EulerOrder::Yxz),
            RotationMode::Yzx => Some(EulerOrder::Yzx),
            RotationMode::Zxy => Some(EulerOrder::Zxy),
            RotationMode::Zyx => Some(EulerOrder::Zyx),
            RotationMode::Quaternion => None,
        }
    }
}

/// Scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Name of the mesh or light data-block
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub material_slots: Vec<Option<String>>,
    #[serde(default)]
    pub location: Vec3,
    /// Radians
    #[serde(default)]
    pub rotation_euler: Vec3,
    #[serde(default)]
    pub rotation_mode: RotationMode,
    /// `w x y z`, used when `rotation_mode` is `QUATERNION`
    #[serde(default = "identity_quaternion")]
    pub rotation_quaternion: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub parent: Option<String>,
    /// World matrix rows as evaluated by the host; overrides the local
    /// transform and parent chain when present
    #[serde(default)]
    pub matrix_world: Option<[[f32; 4]; 4]>,
}

fn identity_quaternion() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Object {
    pub fn local_rotation(&self) -> Quat {
        match self.rotation_mode.euler_order() {
            Some(order) => order.to_quat(self.rotation_euler),
            None => {
                let [w, x, y, z] = self.rotation_quaternion;
                Quat::from_xyzw(x, y, z, w).normalize()
            }
        }
    }

    /// Local transform relative to the parent
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.local_rotation(), self.location)
    }

    /// Host-evaluated world matrix, if the document carries one
    pub fn evaluated_matrix_world(&self) -> Option<Mat4> {
        self.matrix_world
            .map(|rows| Mat4::from_cols_array_2d(&rows).transpose())
    }

    /// Material in the first slot
    pub fn active_material(&self) -> Option<&str> {
        self.material_slots.first().and_then(|slot| slot.as_deref())
    }
}
