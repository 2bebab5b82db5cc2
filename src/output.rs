//! Durable output locations and timestamped artifact naming.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::render::GlyphImage;

/// Errors while persisting artifacts.
#[derive(Debug)]
pub enum OutputError {
    CreateDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    SaveFailed {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "Failed to create output directory '{}': {}",
                    path.display(),
                    source
                )
            }
            OutputError::SaveFailed { path, message } => {
                write!(f, "Failed to save '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Default directory for final videos: the user's Videos dir, falling back
/// to `~/Videos`, then the current directory.
pub fn default_video_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default directory for snapshots: the user's Pictures dir, falling back
/// to `~/Pictures`, then the current directory.
pub fn default_picture_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Build a `glyph_<timestamp>.<ext>` filename.
pub fn timestamped_name(ext: &str) -> String {
    format!("glyph_{}.{}", Local::now().format("%Y%m%d_%H%M%S"), ext)
}

/// Resolve (and create if needed) the path for a new final video in `dir`.
pub fn video_output_path(dir: &Path) -> Result<PathBuf, OutputError> {
    ensure_dir(dir)?;
    Ok(dir.join(timestamped_name("mp4")))
}

/// Save a rendered glyph image as a timestamped PNG in `dir`.
pub fn save_snapshot(image: &GlyphImage, dir: &Path) -> Result<PathBuf, OutputError> {
    ensure_dir(dir)?;
    let path = dir.join(timestamped_name("png"));
    image.save(&path).map_err(|e| OutputError::SaveFailed {
        path: path.clone(),
        message: e.to_string(),
    })?;
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| OutputError::CreateDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
