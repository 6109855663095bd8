//! Viewer configuration, stored as RON.
//!
//! Lookup order: an explicit path, then `<config dir>/pinch-viewer/config.ron`,
//! then the default embedded in the binary.

use crate::animation::SpringConfig;
use crate::gesture::PinchHandler;
use crate::scene::Camera;
use crate::{ImageDimensions, ViewState};
use eframe::egui::vec2;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "default_config.ron";
const CONFIG_DIR_NAME: &str = "pinch-viewer";
const CONFIG_FILE_NAME: &str = "config.ron";

/// Files embedded from the assets/ directory.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Errors that can occur when loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("default_config.ron not found in embedded assets")]
    DefaultNotEmbedded,
    #[error("invalid UTF-8 in default_config.ron: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::de::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything that can be tuned about the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// HTTP(S) URL or local path of the image to show.
    pub image_url: String,
    /// Size of the image quad in scene units. Not derived from the bitmap.
    pub image_dimensions: ImageDimensions,
    pub camera: Camera,
    pub spring: SpringConfig,
    /// Pinch sensitivity: pixels of movement per unit of scale.
    pub scale_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub initial_scale: f32,
    pub initial_position: (f32, f32),
    pub background_color: (u8, u8, u8),
    /// Show the pointer coordinate readout in the bottom-right corner.
    pub debug_overlay: bool,
    pub window_size: (f32, f32),
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            image_url: "https://images.unsplash.com/photo-1517462964-21fdcec3f25b?ixlib=rb-1.2.1&ixid=eyJhcHBfaWQiOjEyMDd9&auto=format&fit=crop&w=934&q=80".to_owned(),
            image_dimensions: ImageDimensions::default(),
            camera: Camera::default(),
            spring: SpringConfig::default(),
            scale_factor: 100.0,
            min_scale: 0.05,
            max_scale: 50.0,
            initial_scale: 1.0,
            initial_position: (0.0, 0.0),
            background_color: (0x48, 0xBF, 0x6C),
            debug_overlay: true,
            window_size: (1280.0, 720.0),
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a RON document.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration embedded in the binary.
    pub fn embedded_default() -> Result<Self, ConfigError> {
        let file = Assets::get(DEFAULT_CONFIG_FILE).ok_or(ConfigError::DefaultNotEmbedded)?;
        let source = std::str::from_utf8(&file.data)?;
        Self::from_ron_str(source)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    /// `<config dir>/pinch-viewer/config.ron`, if the platform has a config dir.
    pub fn user_config_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    /// Loads `explicit` if given, else the user config file if it exists,
    /// else the embedded default.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::info!("Loading config from {}", path.display());
            return Self::load_file(path);
        }

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            log::info!("Loading config from {}", path.display());
            return Self::load_file(&path);
        }

        Self::embedded_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let ImageDimensions { width, height } = self.image_dimensions;
        if !(width > 0.0 && height > 0.0) {
            return invalid(format!("image dimensions must be positive, got {width}x{height}"));
        }
        if !(self.scale_factor > 0.0) {
            return invalid(format!("scale_factor must be positive, got {}", self.scale_factor));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return invalid(format!(
                "scale bounds must satisfy 0 < min_scale <= max_scale, got {}..={}",
                self.min_scale, self.max_scale
            ));
        }
        if !(self.min_scale..=self.max_scale).contains(&self.initial_scale) {
            return invalid(format!(
                "initial_scale {} is outside {}..={}",
                self.initial_scale, self.min_scale, self.max_scale
            ));
        }
        if !(self.initial_position.0.is_finite() && self.initial_position.1.is_finite()) {
            return invalid("initial_position must be finite".to_owned());
        }
        let spring = self.spring;
        if !(spring.tension > 0.0
            && spring.friction > 0.0
            && spring.friction.is_finite()
            && spring.tension.is_finite()
            && spring.mass > 0.0
            && spring.mass.is_finite()
            && spring.precision > 0.0)
        {
            return invalid(format!(
                "spring constants must be positive and finite, got {spring:?}"
            ));
        }
        if !(self.camera.distance > 0.0
            && self.camera.fov_y_degrees > 0.0
            && self.camera.fov_y_degrees < 180.0)
        {
            return invalid(format!(
                "camera needs a positive distance and a field of view in (0, 180), got {:?}",
                self.camera
            ));
        }

        Ok(())
    }

    pub fn initial_view(&self) -> ViewState {
        ViewState::new(
            self.initial_scale,
            vec2(self.initial_position.0, self.initial_position.1),
        )
    }

    pub fn pinch_handler(&self) -> PinchHandler {
        PinchHandler {
            dimensions: self.image_dimensions,
            scale_factor: self.scale_factor,
            min_scale: self.min_scale,
            max_scale: self.max_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_matches_code_default() {
        let config = ViewerConfig::embedded_default().expect("embedded config parses");
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config =
            ViewerConfig::from_ron_str(r#"(image_url: "photo.png", debug_overlay: false)"#)
                .expect("partial config parses");
        assert_eq!(config.image_url, "photo.png");
        assert!(!config.debug_overlay);
        assert_eq!(config.scale_factor, 100.0);
        assert_eq!(config.image_dimensions, ImageDimensions::default());
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let err = ViewerConfig::from_ron_str("(image_dimensions: (width: 0.0, height: 7.0))")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn rejects_inverted_scale_bounds() {
        let config = ViewerConfig {
            min_scale: 2.0,
            max_scale: 1.0,
            ..ViewerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_scale_factor() {
        let config = ViewerConfig {
            scale_factor: 0.0,
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_friction() {
        let config = ViewerConfig::from_ron_str("(spring: (friction: -60.0))");
        assert!(matches!(config, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_springs_that_never_settle() {
        for spring in [
            SpringConfig {
                tension: 0.0,
                ..SpringConfig::default()
            },
            SpringConfig {
                tension: f32::INFINITY,
                ..SpringConfig::default()
            },
            SpringConfig {
                friction: 0.0,
                ..SpringConfig::default()
            },
            SpringConfig {
                friction: f32::NAN,
                ..SpringConfig::default()
            },
        ] {
            let config = ViewerConfig {
                spring,
                ..ViewerConfig::default()
            };
            assert!(config.validate().is_err(), "{spring:?} passed validation");
        }
    }

    #[test]
    fn rejects_initial_scale_out_of_bounds() {
        let config = ViewerConfig {
            initial_scale: 100.0,
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = ViewerConfig::from_ron_str("(image_url: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ViewerConfig::load_file(Path::new("/definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "{err}");
    }

    #[test]
    fn initial_view_and_pinch_handler_follow_config() {
        let config = ViewerConfig {
            initial_scale: 2.0,
            initial_position: (1.0, -1.0),
            scale_factor: 50.0,
            ..ViewerConfig::default()
        };
        assert_eq!(config.initial_view(), ViewState::new(2.0, vec2(1.0, -1.0)));
        assert_eq!(config.pinch_handler().scale_factor, 50.0);
    }
}
