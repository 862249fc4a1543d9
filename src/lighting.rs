use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::framing::rotation_from_euler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    #[default]
    Directional,
    Point,
}

/// Point light positioned relative to the framed target's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    #[serde(default = "default_point_position")]
    pub position: Vec3,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: default_point_position(),
            color: default_color(),
            intensity: default_intensity(),
        }
    }
}

/// Light rig used for a single render, described as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingSpec {
    #[serde(default)]
    pub kind: LightKind,
    /// Euler angles in degrees of the directional light.
    #[serde(default = "default_directional_rotation")]
    pub directional_rotation: Vec3,
    #[serde(default = "default_color")]
    pub directional_color: Vec3,
    #[serde(default = "default_intensity")]
    pub directional_intensity: f32,
    #[serde(default = "default_point_lights")]
    pub point_lights: Vec<PointLight>,
    #[serde(default = "default_ambient")]
    pub ambient: Vec3,
}

impl Default for LightingSpec {
    fn default() -> Self {
        Self {
            kind: LightKind::default(),
            directional_rotation: default_directional_rotation(),
            directional_color: default_color(),
            directional_intensity: default_intensity(),
            point_lights: default_point_lights(),
            ambient: default_ambient(),
        }
    }
}

impl LightingSpec {
    /// Direction the directional light travels in.
    pub fn directional_direction(&self) -> Vec3 {
        rotation_from_euler(self.directional_rotation) * Vec3::NEG_Z
    }

    /// Light reaching a surface at `point` with normal `normal`.
    ///
    /// `origin` is the world position point lights are relative to.
    pub fn shade(&self, point: Vec3, normal: Vec3, origin: Vec3) -> Vec3 {
        let mut light = self.ambient;
        match self.kind {
            LightKind::Directional => {
                let to_light = -self.directional_direction();
                light += self.directional_color
                    * self.directional_intensity
                    * normal.dot(to_light).max(0.0);
            }
            LightKind::Point => {
                for point_light in &self.point_lights {
                    let to_light = (origin + point_light.position - point).normalize_or_zero();
                    light +=
                        point_light.color * point_light.intensity * normal.dot(to_light).max(0.0);
                }
            }
        }
        light
    }
}

fn default_directional_rotation() -> Vec3 {
    Vec3::new(50.0, -30.0, 0.0)
}

fn default_point_position() -> Vec3 {
    Vec3::new(1.0, 0.5, -0.5)
}

fn default_point_lights() -> Vec<PointLight> {
    vec![PointLight::default(), PointLight::default()]
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_intensity() -> f32 {
    1.0
}

fn default_ambient() -> Vec3 {
    Vec3::splat(0.73)
}
