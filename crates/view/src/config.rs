use glam::Vec3;
use serde::{Deserialize, Serialize};
use starscape_assets::FontSource;
use starscape_common::Color;
use starscape_render::{RendererOptions, TextGeometryOptions};
use std::path::Path;

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Star Pool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    pub count: usize,
    /// Half-width of the cube stars are scattered through.
    pub extent: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Dot size in pixels.
    pub size: f32,
    pub color: Color,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            extent: 1000.0,
            min_speed: 5.0,
            max_speed: 15.0,
            size: 2.0,
            color: Color::WHITE,
        }
    }
}

/// Label Builder parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub font: FontSource,
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: u32,
    /// Depth a new or recycled label starts at.
    pub start_z: f32,
    /// Depth past which the label is recycled.
    pub recycle_z: f32,
    /// Distance moved towards the camera each frame.
    pub step: f32,
    /// Upper bound (exclusive) of the per-frame rotation increment.
    pub max_rotation_step: f32,
    /// Half-width of the rectangle a recycled label reappears in.
    pub spread_x: f32,
    /// Half-height of the rectangle a recycled label reappears in.
    pub spread_y: f32,
    pub color: Color,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font: FontSource::default(),
            size: 50.0,
            depth: 2.0,
            curve_segments: 12,
            bevel_thickness: 1.0,
            bevel_size: 0.5,
            bevel_segments: 3,
            start_z: -2500.0,
            recycle_z: 500.0,
            step: 2.0,
            max_rotation_step: 0.01,
            spread_x: 500.0,
            spread_y: 300.0,
            color: Color::from_hex(0x66ccff),
        }
    }
}

impl LabelConfig {
    pub fn geometry_options(&self) -> TextGeometryOptions {
        TextGeometryOptions {
            size: self.size,
            depth: self.depth,
            curve_segments: self.curve_segments,
            bevel_enabled: self.bevel_segments > 0,
            bevel_thickness: self.bevel_thickness,
            bevel_size: self.bevel_size,
            bevel_segments: self.bevel_segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub z: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 10_000.0,
            z: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub directional_color: Color,
    pub directional_intensity: f32,
    /// Direction the directional light shines in.
    pub directional_direction: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: Color::from_hex(0x404040),
            ambient_intensity: 1.0,
            directional_color: Color::WHITE,
            directional_intensity: 1.0,
            directional_direction: Vec3::new(0.0, -1.0, -1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub antialias: bool,
    pub alpha: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RendererOptions::default();
        Self {
            antialias: options.antialias,
            alpha: options.alpha,
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RendererOptions {
        RendererOptions {
            antialias: self.antialias,
            alpha: self.alpha,
        }
    }
}

/// Everything a mounted view needs to know up front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub stars: StarConfig,
    pub label: LabelConfig,
    pub camera: CameraConfig,
    pub lights: LightConfig,
    pub renderer: RenderConfig,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl StarfieldConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&data)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject ranges the random draws cannot sample from and motion that
    /// would never bring the label back into its depth band.
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("stars.extent", self.stars.extent)?;
        finite("stars.min_speed", self.stars.min_speed)?;
        finite("stars.max_speed", self.stars.max_speed)?;
        finite("label.start_z", self.label.start_z)?;
        finite("label.recycle_z", self.label.recycle_z)?;
        finite("label.step", self.label.step)?;
        finite("label.max_rotation_step", self.label.max_rotation_step)?;
        finite("label.spread_x", self.label.spread_x)?;
        finite("label.spread_y", self.label.spread_y)?;
        finite("camera.fov_degrees", self.camera.fov_degrees)?;
        finite("camera.near", self.camera.near)?;
        finite("camera.far", self.camera.far)?;

        if self.stars.min_speed >= self.stars.max_speed {
            return Err(ConfigError::Invalid(format!(
                "stars.min_speed ({}) must be below stars.max_speed ({})",
                self.stars.min_speed, self.stars.max_speed
            )));
        }
        if self.stars.extent <= 0.0 {
            return Err(ConfigError::Invalid("stars.extent must be positive".into()));
        }
        if self.label.start_z >= self.label.recycle_z {
            return Err(ConfigError::Invalid("label.start_z must be below label.recycle_z".into()));
        }
        if self.label.step <= 0.0 {
            return Err(ConfigError::Invalid("label.step must be positive".into()));
        }
        if self.label.spread_x <= 0.0 || self.label.spread_y <= 0.0 {
            return Err(ConfigError::Invalid("label spread must be positive".into()));
        }
        if self.label.max_rotation_step <= 0.0 {
            return Err(ConfigError::Invalid("label.max_rotation_step must be positive".into()));
        }
        if self.camera.fov_degrees <= 0.0 || self.camera.fov_degrees >= 180.0 {
            return Err(ConfigError::Invalid("camera.fov_degrees must lie in (0, 180)".into()));
        }
        if self.camera.near <= 0.0 || self.camera.near >= self.camera.far {
            return Err(ConfigError::Invalid(
                "camera.near must be positive and below camera.far".into(),
            ));
        }
        Ok(())
    }
}

fn finite(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be finite, got {value}")))
    }
}
