//! Configuration file handling for glyphcam.
//!
//! Loads configuration from `~/.config/glyphcam/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure for glyphcam.
/// Loaded from ~/.config/glyphcam/config.toml (or a custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub glyph: GlyphSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize)]
pub struct CameraSection {
    /// Camera device index
    #[serde(default)]
    pub device: u32,
    /// Resolution preset: "480p", "720p", or "1080p"
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Mirror horizontally (selfie mode)
    #[serde(default = "default_true")]
    pub mirror: bool,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            device: 0,
            resolution: None,
            fps: default_fps(),
            mirror: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GlyphSection {
    /// Ramp name: "dense" or "light"
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub color: bool,
    #[serde(default)]
    pub invert: bool,
    /// Path to a monospace TTF; system default when unset
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl Default for GlyphSection {
    fn default() -> Self {
        Self {
            charset: None,
            color: false,
            invert: false,
            font: None,
            font_size: default_font_size(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputSection {
    /// Directory for final videos (defaults to the user Videos dir)
    #[serde(default)]
    pub videos: Option<PathBuf>,
    /// Directory for snapshots (defaults to the user Pictures dir)
    #[serde(default)]
    pub pictures: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_fps() -> u32 {
    30
}

fn default_font_size() -> f32 {
    18.0
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("glyphcam/config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/glyphcam/config.toml")
        })
}

/// A commented template written by `glyphcam config init`.
pub const CONFIG_TEMPLATE: &str = r#"# glyphcam configuration

[camera]
# Camera device index (see `glyphcam list-cameras`)
device = 0
# Resolution preset: "480p", "720p", or "1080p"
resolution = "720p"
fps = 30
# Mirror horizontally (selfie mode)
mirror = true

[glyph]
# Ramp: "dense" or "light"
charset = "dense"
color = false
invert = false
# font = "/path/to/monospace.ttf"
font_size = 18.0

[output]
# videos = "/path/for/recordings"
# pictures = "/path/for/snapshots"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.camera.device, 0);
        assert_eq!(config.camera.fps, 30);
        assert!(config.camera.mirror);
        assert!(!config.glyph.color);
        assert_eq!(config.glyph.font_size, 18.0);
        assert!(config.output.videos.is_none());
    }

    #[test]
    fn test_load_missing_file_yields_default() {
        let config = Config::load(Some(Path::new("/nonexistent/glyphcam.toml"))).unwrap();
        assert_eq!(config.camera.device, 0);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[glyph]\ncharset = \"light\"\ncolor = true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.glyph.charset.as_deref(), Some("light"));
        assert!(config.glyph.color);
        // Untouched sections keep their defaults
        assert_eq!(config.camera.fps, 30);
        assert!(config.camera.mirror);
    }

    #[test]
    fn test_load_invalid_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_template_parses() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.camera.resolution.as_deref(), Some("720p"));
        assert_eq!(config.glyph.charset.as_deref(), Some("dense"));
    }
}
