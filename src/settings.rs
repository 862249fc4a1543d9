use anyhow::{anyhow, Result};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::compositor::ShadowSpec;
use crate::framing::ViewpointSpec;
use crate::lighting::LightingSpec;
use crate::render::MAX_TEXTURE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Point,
    Bilinear,
    Trilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Uncompressed,
    LowQuality,
    NormalQuality,
    #[default]
    HighQuality,
}

/// Output texture description. Only `size` affects rendering; the rest is
/// import metadata for hosts that consume the PNGs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureSettings {
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub filter_mode: FilterMode,
    #[serde(default)]
    pub aniso_level: u32,
    #[serde(default)]
    pub compression: Compression,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            size: default_size(),
            filter_mode: FilterMode::default(),
            aniso_level: 0,
            compression: Compression::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Euler angles in degrees.
    #[serde(default = "default_rotation")]
    pub rotation: Vec3,
    #[serde(default = "default_padding")]
    pub padding: f32,
    /// Whether scene lights cast shadows; hosts with a shadowing renderer honor it.
    #[serde(default)]
    pub render_shadows: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            rotation: default_rotation(),
            padding: default_padding(),
            render_shadows: false,
        }
    }
}

impl CameraSettings {
    pub fn viewpoint(&self) -> ViewpointSpec {
        ViewpointSpec {
            rotation: self.rotation,
            padding: self.padding,
        }
    }
}

/// Everything needed to bake a batch of icons; stored as a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub texture: TextureSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub light: LightingSpec,
    #[serde(default)]
    pub shadow: ShadowSpec,
    /// Output directory for generated icons.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Fill used for targets that fail to render.
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: Vec4,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            texture: TextureSettings::default(),
            camera: CameraSettings::default(),
            light: LightingSpec::default(),
            shadow: ShadowSpec::default(),
            directory: default_directory(),
            placeholder_color: default_placeholder_color(),
        }
    }
}

impl IconSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rejects values that cannot produce an icon.
    pub fn validate(&self) -> Result<()> {
        if self.texture.size == 0 || self.texture.size > MAX_TEXTURE_SIZE {
            return Err(anyhow!(
                "texture size must be within 1..={MAX_TEXTURE_SIZE}, got {}",
                self.texture.size
            ));
        }
        if !self.camera.rotation.is_finite() {
            return Err(anyhow!("camera rotation must be finite"));
        }
        if !self.camera.padding.is_finite() || !(0.0..1.0).contains(&self.camera.padding) {
            return Err(anyhow!(
                "padding must be within [0, 1), got {}",
                self.camera.padding
            ));
        }
        if self.shadow.enabled && !(self.shadow.scale.is_finite() && self.shadow.scale > 0.0) {
            return Err(anyhow!(
                "shadow scale must be positive, got {}",
                self.shadow.scale
            ));
        }
        if self.shadow.enabled && !self.shadow.offset.is_finite() {
            return Err(anyhow!("shadow offset must be finite"));
        }
        Ok(())
    }
}

fn default_size() -> u32 {
    512
}

fn default_rotation() -> Vec3 {
    Vec3::new(45.0, -45.0, 0.0)
}

fn default_padding() -> f32 {
    0.1
}

fn default_directory() -> String {
    "Icons".to_string()
}

fn default_placeholder_color() -> Vec4 {
    Vec4::new(0.5, 0.5, 0.5, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_authoring_tool() {
        let settings = IconSettings::default();
        assert_eq!(settings.texture.size, 512);
        assert_eq!(settings.texture.filter_mode, FilterMode::Point);
        assert_eq!(settings.camera.rotation, Vec3::new(45.0, -45.0, 0.0));
        assert!((settings.camera.padding - 0.1).abs() < f32::EPSILON);
        assert!(!settings.shadow.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_json_loads_defaults() {
        let settings: IconSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, IconSettings::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut settings = IconSettings::default();
        settings.texture.size = 0;
        assert!(settings.validate().is_err());

        let mut settings = IconSettings::default();
        settings.camera.padding = 1.0;
        assert!(settings.validate().is_err());

        let mut settings = IconSettings::default();
        settings.shadow.enabled = true;
        settings.shadow.scale = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = IconSettings::default();
        settings.shadow.enabled = true;
        settings.shadow.offset.x = f32::INFINITY;
        assert!(settings.validate().is_err());
    }
}
