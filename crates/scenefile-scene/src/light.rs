//! Light data-blocks

use serde::{Deserialize, Serialize};

/// Light type as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area,
}

/// Light data shared by all objects that instance it.
///
/// Defaults mirror a freshly created host light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LightKind,
    /// Radiant power in watts (W/m² for suns)
    #[serde(default = "default_energy")]
    pub energy: f32,
    /// Linear RGB
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_cutoff_distance")]
    pub cutoff_distance: f32,
    #[serde(default = "default_clip_start")]
    pub shadow_buffer_clip_start: f32,
    #[serde(default = "default_shadow_bias")]
    pub shadow_buffer_bias: f32,
    #[serde(default = "default_use_shadow")]
    pub use_shadow: bool,
    /// Full cone angle in radians
    #[serde(default = "default_spot_size")]
    pub spot_size: f32,
    #[serde(default = "default_spot_blend")]
    pub spot_blend: f32,
}

fn default_energy() -> f32 {
    10.0
}

fn default_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_cutoff_distance() -> f32 {
    40.0
}

fn default_clip_start() -> f32 {
    0.05
}

fn default_shadow_bias() -> f32 {
    1.0
}

fn default_use_shadow() -> bool {
    true
}

fn default_spot_size() -> f32 {
    std::f32::consts::FRAC_PI_4
}

fn default_spot_blend() -> f32 {
    0.15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let light: LightData = serde_json::from_str(r#"{"name": "Lamp", "type": "SPOT"}"#).unwrap();
        assert_eq!(light.kind, LightKind::Spot);
        assert_eq!(light.energy, 10.0);
        assert_eq!(light.color, [1.0, 1.0, 1.0]);
        assert_eq!(light.cutoff_distance, 40.0);
        assert!(light.use_shadow);
        assert_eq!(light.spot_size, std::f32::consts::FRAC_PI_4);
    }

    #[test]
    fn test_sun_energy() {
        let light: LightData =
            serde_json::from_str(r#"{"name": "Sun", "type": "SUN", "energy": 3.5, "use_shadow": false}"#)
                .unwrap();
        assert_eq!(light.kind, LightKind::Sun);
        assert_eq!(light.energy, 3.5);
        assert!(!light.use_shadow);
    }
}
