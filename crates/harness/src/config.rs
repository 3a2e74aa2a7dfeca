use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default frame-counter wrap bound.
pub const DEFAULT_WRAP_BOUND: u32 = 0x0FFF_FFFF;

/// Errors from loading or validating a [`HarnessConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Shader-visible names the harness binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingNames {
    pub mvp_uniform: String,
    pub position_attribute: String,
    pub texcoord_attribute: String,
    pub texture_uniform: String,
}

impl Default for BindingNames {
    fn default() -> Self {
        Self {
            mvp_uniform: "modelviewprojectionMatrix".into(),
            position_attribute: "in_position".into(),
            texcoord_attribute: "in_coord".into(),
            texture_uniform: "in_texture".into(),
        }
    }
}

/// Tunables for the render loop. Defaults reproduce the stock harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Distance the cube is pushed away from the camera along -Z.
    pub camera_distance: f32,
    /// Base rotation angle in degrees per frame-counter step.
    pub angle_step: f32,
    /// Per-axis multipliers of the base angle: X, Y, Z.
    pub axis_rates: [f32; 3],
    pub near: f32,
    pub far: f32,
    /// Surface clear colour as `0xAARRGGBB`.
    pub clear_color: u32,
    /// Requested surface size; 0 means the backend's native size.
    pub surface_width: u32,
    pub surface_height: u32,
    /// The frame counter returns to zero on reaching this value.
    pub wrap_bound: u32,
    /// Emit a progress line every this many frames; 0 disables it.
    pub log_interval: u64,
    /// Frame durations kept for the rolling average.
    pub timer_capacity: usize,
    pub names: BindingNames,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            camera_distance: 4.0,
            angle_step: 0.5,
            axis_rates: [0.97, 1.13, 0.73],
            near: 1.0,
            far: 10.0,
            clear_color: 0xFF50_5050,
            surface_width: 0,
            surface_height: 0,
            wrap_bound: DEFAULT_WRAP_BOUND,
            log_interval: 1000,
            timer_capacity: 120,
            names: BindingNames::default(),
        }
    }
}

impl HarnessConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.near > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "near plane must be positive, got {}",
                self.near
            )));
        }
        if !(self.far > self.near) {
            return Err(ConfigError::Invalid(format!(
                "far plane ({}) must lie beyond near plane ({})",
                self.far, self.near
            )));
        }
        if self.wrap_bound == 0 {
            return Err(ConfigError::Invalid("wrap bound must be non-zero".into()));
        }
        if self.timer_capacity == 0 {
            return Err(ConfigError::Invalid("timer capacity must be non-zero".into()));
        }
        let finite = [self.camera_distance, self.angle_step]
            .iter()
            .chain(&self.axis_rates)
            .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::Invalid(
                "distance, angle step and axis rates must be finite".into(),
            ));
        }
        let names = &self.names;
        for (what, name) in [
            ("mvp uniform", &names.mvp_uniform),
            ("position attribute", &names.position_attribute),
            ("texcoord attribute", &names.texcoord_attribute),
            ("texture uniform", &names.texture_uniform),
        ] {
            if name.is_empty() {
                return Err(ConfigError::Invalid(format!("{what} name is empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = HarnessConfig::default();
        config.validate().unwrap();
        assert_eq!(config.angle_step, 0.5);
        assert_eq!(config.axis_rates, [0.97, 1.13, 0.73]);
        assert_eq!(config.wrap_bound, 0x0FFF_FFFF);
        assert_eq!(config.names.mvp_uniform, "modelviewprojectionMatrix");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "camera_distance": 6.0, "names": {{ "texture_uniform": "tex" }} }}"#)
            .unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.camera_distance, 6.0);
        assert_eq!(config.far, 10.0);
        assert_eq!(config.names.texture_uniform, "tex");
        assert_eq!(config.names.position_attribute, "in_position");
    }

    #[test]
    fn bad_planes_are_rejected() {
        let config = HarnessConfig {
            near: 5.0,
            far: 2.0,
            ..HarnessConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = HarnessConfig {
            near: f32::NAN,
            ..HarnessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_wrap_bound_is_rejected() {
        let config = HarnessConfig {
            wrap_bound: 0,
            ..HarnessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = HarnessConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("parsing"));
    }
}
