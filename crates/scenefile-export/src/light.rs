//! Light records

use scenefile_core::{watts_to_lumens, Transform};
use scenefile_scene::{LightData, LightKind};

use crate::format::{DirectionalLightRecord, PointLightRecord, SpotLightRecord};

/// Serialized light, one variant per scenefile light section
#[derive(Debug, Clone, PartialEq)]
pub enum LightRecord {
    Directional(DirectionalLightRecord),
    Point(PointLightRecord),
    Spot(SpotLightRecord),
}

impl LightRecord {
    /// Build the record for a light object; area lights have no record.
    ///
    /// `name` is the object name, `transform` its world transform.
    pub fn build(name: &str, light: &LightData, transform: &Transform) -> Option<Self> {
        let position = transform.translation;
        let intensity = watts_to_lumens(light.energy);

        let record = match light.kind {
            LightKind::Sun => LightRecord::Directional(DirectionalLightRecord {
                name: name.to_string(),
                position,
                intensity,
                color: light.color,
                direction: transform.forward(),
            }),
            LightKind::Point => LightRecord::Point(PointLightRecord {
                name: name.to_string(),
                position,
                intensity,
                color: light.color,
                range: light.cutoff_distance,
                clip_start: light.shadow_buffer_clip_start,
                shadow_bias: light.shadow_buffer_bias,
                use_shadow: light.use_shadow,
            }),
            LightKind::Spot => LightRecord::Spot(SpotLightRecord {
                name: name.to_string(),
                position,
                intensity,
                color: light.color,
                direction: transform.forward(),
                range: light.cutoff_distance,
                clip_start: light.shadow_buffer_clip_start,
                angle: light.spot_size,
                blend: light.spot_blend,
            }),
            LightKind::Area => return None,
        };
        Some(record)
    }

    pub fn name(&self) -> &str {
        match self {
            LightRecord::Directional(r) => &r.name,
            LightRecord::Point(r) => &r.name,
            LightRecord::Spot(r) => &r.name,
        }
    }
}
