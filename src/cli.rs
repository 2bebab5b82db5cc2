//! CLI argument parsing with clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::camera::Resolution;
use crate::render::GlyphRamp;

/// CLI tool that previews and records the webcam as glyph-art video
#[derive(Parser, Debug)]
#[command(name = "glyphcam")]
#[command(version, about = "Webcam to glyph-art renderer and recorder", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Camera device index (from list-cameras; default 0)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Capture resolution preset (default 720p)
    #[arg(long, short)]
    pub resolution: Option<ResolutionPreset>,

    /// Glyph ramp (default dense)
    #[arg(long)]
    pub charset: Option<Charset>,

    /// Tint glyphs with the source color instead of black
    #[arg(long)]
    pub color: bool,

    /// Disable horizontal mirroring (selfie mode is on by default)
    #[arg(long)]
    pub no_mirror: bool,

    /// Invert brightness before the ramp lookup
    #[arg(long)]
    pub invert: bool,

    /// Monospace TTF to render glyphs with (system default when omitted)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Glyph size in pixels (default 18)
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Record video + audio from the start
    #[arg(long)]
    pub record: bool,

    /// Stop automatically after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Capture a single still image and exit
    #[arg(long)]
    pub snapshot: bool,

    /// Audio input device name (default microphone when omitted)
    #[arg(long)]
    pub audio_device: Option<String>,

    /// Directory for final videos / snapshots
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// List available audio input devices
    ListAudioDevices,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Capture resolution presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionPreset {
    #[value(name = "480p")]
    P480,
    #[value(name = "720p")]
    P720,
    #[value(name = "1080p")]
    P1080,
}

impl ResolutionPreset {
    pub fn to_resolution(self) -> Resolution {
        match self {
            ResolutionPreset::P480 => Resolution::P480,
            ResolutionPreset::P720 => Resolution::P720,
            ResolutionPreset::P1080 => Resolution::P1080,
        }
    }

    /// Parse a preset name as used in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "480p" => Some(ResolutionPreset::P480),
            "720p" => Some(ResolutionPreset::P720),
            "1080p" => Some(ResolutionPreset::P1080),
            _ => None,
        }
    }
}

/// Built-in glyph ramp selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Charset {
    #[default]
    Dense,
    Light,
}

impl Charset {
    pub fn to_ramp(self) -> GlyphRamp {
        match self {
            Charset::Dense => GlyphRamp::dense(),
            Charset::Light => GlyphRamp::light(),
        }
    }

    /// Parse a ramp name as used in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dense" => Some(Charset::Dense),
            "light" => Some(Charset::Light),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["glyphcam"]);
        assert!(args.command.is_none());
        assert!(args.camera.is_none());
        assert!(args.resolution.is_none());
        assert!(args.charset.is_none());
        assert!(!args.color);
        assert!(!args.no_mirror);
        assert!(!args.invert);
        assert!(!args.record);
        assert!(!args.snapshot);
        assert!(args.duration.is_none());
        assert!(args.font.is_none());
        assert!(args.font_size.is_none());
    }

    #[test]
    fn test_resolution_preset_names() {
        let args = Args::parse_from(["glyphcam", "--resolution", "1080p"]);
        assert_eq!(args.resolution, Some(ResolutionPreset::P1080));
        assert_eq!(args.resolution.unwrap().to_resolution().width, 1920);
    }

    #[test]
    fn test_record_with_duration() {
        let args = Args::parse_from(["glyphcam", "--record", "--duration", "15"]);
        assert!(args.record);
        assert_eq!(args.duration, Some(15));
    }

    #[test]
    fn test_charset_light() {
        let args = Args::parse_from(["glyphcam", "--charset", "light"]);
        assert_eq!(args.charset, Some(Charset::Light));
        assert_eq!(args.charset.unwrap().to_ramp(), GlyphRamp::light());
    }

    #[test]
    fn test_list_cameras_subcommand() {
        let args = Args::parse_from(["glyphcam", "list-cameras"]);
        assert!(matches!(args.command, Some(Command::ListCameras)));
    }

    #[test]
    fn test_config_names_round_trip() {
        assert_eq!(ResolutionPreset::from_name("480p"), Some(ResolutionPreset::P480));
        assert_eq!(ResolutionPreset::from_name("4k"), None);
        assert_eq!(Charset::from_name("light"), Some(Charset::Light));
        assert_eq!(Charset::from_name("blocky"), None);
    }
}
