//! Glyph rasterization capability backed by a fixed-width TTF font.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::RgbImage;

/// Glyph-draw capability injected into the renderer.
///
/// Implementors supply a fixed cell size and rasterize single glyphs onto an
/// RGB canvas. The renderer treats this purely as configuration; swapping the
/// implementation never changes the grid geometry rules.
pub trait GlyphFont {
    /// Fixed (width, height) of one glyph cell in pixels. Both are >= 1.
    fn cell_size(&self) -> (u32, u32);

    /// Draw `ch` with its cell origin at (x, y), in the given RGB color.
    ///
    /// Pixels outside the canvas are clipped, not an error.
    fn draw_glyph(&mut self, canvas: &mut RgbImage, x: u32, y: u32, ch: char, color: [u8; 3]);
}

/// Errors raised while loading a font.
#[derive(Debug)]
pub enum FontError {
    /// No usable monospace font was found on this system
    NoDefaultFont,
    /// The font file could not be read
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The font file could not be parsed
    ParseFailed { path: PathBuf, message: String },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::NoDefaultFont => {
                write!(
                    f,
                    "No monospace font found. Install DejaVu Sans Mono (e.g. 'apt install fonts-dejavu-core') or pass --font <path-to-ttf>"
                )
            }
            FontError::ReadFailed { path, source } => {
                write!(f, "Failed to read font '{}': {}", path.display(), source)
            }
            FontError::ParseFailed { path, message } => {
                write!(f, "Failed to parse font '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::ReadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Candidate system locations for a default monospace font.
#[cfg(target_os = "windows")]
const DEFAULT_FONT_CANDIDATES: &[&str] = &["C:/Windows/Fonts/consola.ttf"];

#[cfg(target_os = "macos")]
const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Andale Mono.ttf",
];

#[cfg(all(unix, not(target_os = "macos")))]
const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
];

/// Locate a default monospace font on this system.
pub fn default_font_path() -> Result<PathBuf, FontError> {
    DEFAULT_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or(FontError::NoDefaultFont)
}

struct RasterizedGlyph {
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
}

/// A loaded fixed-width font with a per-glyph rasterization cache.
///
/// Cell width is the advance of 'M'; cell height spans ascent to descent.
/// Glyphs are rasterized once per character and blended onto the canvas by
/// coverage, so repeated ramps cost one rasterization each per session.
pub struct FontAtlas {
    font: Font,
    px: f32,
    cell_w: u32,
    cell_h: u32,
    /// Baseline offset from the cell top, in pixels
    baseline: i32,
    cache: HashMap<char, RasterizedGlyph>,
}

impl FontAtlas {
    /// Load a font from `path` (or the system default) at `size` pixels.
    pub fn load(path: Option<&Path>, size: f32) -> Result<Self, FontError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_font_path()?,
        };
        let bytes = std::fs::read(&path).map_err(|e| FontError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;
        let font =
            Font::from_bytes(bytes, FontSettings::default()).map_err(|e| FontError::ParseFailed {
                path,
                message: e.to_string(),
            })?;

        let px = size.max(1.0);
        let reference = font.metrics('M', px);
        let cell_w = (reference.advance_width.ceil() as u32).max(1);
        let (ascent, descent) = match font.horizontal_line_metrics(px) {
            Some(lm) => (lm.ascent, lm.descent),
            None => (px, 0.0),
        };
        let cell_h = ((ascent - descent).ceil() as u32).max(1);
        let baseline = ascent.round() as i32;

        Ok(Self {
            font,
            px,
            cell_w,
            cell_h,
            baseline,
            cache: HashMap::new(),
        })
    }

    fn rasterized(&mut self, ch: char) -> &RasterizedGlyph {
        let (font, px) = (&self.font, self.px);
        self.cache.entry(ch).or_insert_with(|| {
            let (metrics, coverage) = font.rasterize(ch, px);
            RasterizedGlyph { metrics, coverage }
        })
    }
}

impl GlyphFont for FontAtlas {
    fn cell_size(&self) -> (u32, u32) {
        (self.cell_w, self.cell_h)
    }

    fn draw_glyph(&mut self, canvas: &mut RgbImage, x: u32, y: u32, ch: char, color: [u8; 3]) {
        let baseline = self.baseline;
        let glyph = self.rasterized(ch);
        let metrics = glyph.metrics;
        if metrics.width == 0 || metrics.height == 0 {
            return;
        }

        // Glyph bitmap origin relative to the cell: shift right by the left
        // side bearing, and down so the bitmap sits on the cell's baseline.
        let origin_x = x as i64 + metrics.xmin as i64;
        let origin_y = y as i64 + baseline as i64 - metrics.height as i64 - metrics.ymin as i64;

        let (canvas_w, canvas_h) = canvas.dimensions();
        for row in 0..metrics.height {
            let py = origin_y + row as i64;
            if py < 0 || py >= canvas_h as i64 {
                continue;
            }
            for col in 0..metrics.width {
                let px = origin_x + col as i64;
                if px < 0 || px >= canvas_w as i64 {
                    continue;
                }
                let mask = glyph.coverage[row * metrics.width + col];
                if mask == 0 {
                    continue;
                }
                blend_pixel(canvas, px as u32, py as u32, color, mask);
            }
        }
    }
}

/// Blend `color` onto the canvas pixel by the glyph coverage `mask`.
fn blend_pixel(canvas: &mut RgbImage, x: u32, y: u32, color: [u8; 3], mask: u8) {
    let dst = canvas.get_pixel_mut(x, y);
    let alpha = u16::from(mask);
    let inv_alpha = 255 - alpha;
    for channel in 0..3 {
        let src = u16::from(color[channel]);
        let bg = u16::from(dst.0[channel]);
        dst.0[channel] = ((src * alpha + bg * inv_alpha + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_pixel_full_coverage_replaces() {
        let mut canvas = RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
        blend_pixel(&mut canvas, 0, 0, [10, 20, 30], 255);
        assert_eq!(canvas.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_blend_pixel_zero_coverage_keeps_background() {
        let mut canvas = RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
        blend_pixel(&mut canvas, 0, 0, [0, 0, 0], 0);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_blend_pixel_half_coverage_mixes() {
        let mut canvas = RgbImage::from_pixel(1, 1, image::Rgb([255, 255, 255]));
        blend_pixel(&mut canvas, 0, 0, [0, 0, 0], 128);
        let px = canvas.get_pixel(0, 0).0;
        // Roughly midway between black and white
        assert!(px[0] > 100 && px[0] < 155, "got {:?}", px);
    }

    #[test]
    fn test_font_atlas_from_system_font() {
        // Only runs where a default monospace font exists
        let Ok(path) = default_font_path() else {
            return;
        };
        let atlas = FontAtlas::load(Some(&path), 16.0).unwrap();
        let (w, h) = atlas.cell_size();
        assert!(w >= 1);
        assert!(h >= 1);
        // Monospace cells are taller than wide
        assert!(h >= w);
    }

    #[test]
    fn test_missing_font_file_is_read_error() {
        let result = FontAtlas::load(Some(Path::new("/nonexistent/font.ttf")), 16.0);
        assert!(matches!(result, Err(FontError::ReadFailed { .. })));
    }
}
