//! The frame-to-glyph-image transform.

use image::RgbImage;

use crate::camera::Frame;

use super::font::GlyphFont;
use super::ramp::GlyphRamp;
use super::sample::{downsample_colors, downsample_luma, grayscale};

/// A rendered glyph-grid canvas of exactly the configured pixel size.
pub type GlyphImage = RgbImage;

/// Canvas background: bright, fully opaque.
const BACKGROUND: [u8; 3] = [255, 255, 255];
/// Grayscale-mode foreground.
const FOREGROUND: [u8; 3] = [0, 0, 0];

/// Rendering parameters.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output canvas width in pixels
    pub width: u32,
    /// Output canvas height in pixels
    pub height: u32,
    /// Brightness-to-glyph lookup ramp
    pub ramp: GlyphRamp,
    /// Tint each glyph with its cell's sampled source color
    pub color_mode: bool,
    /// Flip luminance before the ramp lookup (for light ramps on dark scenes)
    pub invert: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            ramp: GlyphRamp::dense(),
            color_mode: false,
            invert: false,
        }
    }
}

/// Converts camera frames into glyph-grid images.
///
/// Pure with respect to its inputs: the same frame and configuration always
/// produce a pixel-identical canvas. The glyph-draw capability is injected
/// and treated as part of the configuration.
pub struct GlyphRenderer<F: GlyphFont> {
    font: F,
    config: RenderConfig,
}

impl<F: GlyphFont> GlyphRenderer<F> {
    pub fn new(font: F, config: RenderConfig) -> Self {
        Self { font, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Grid dimensions (cols, rows) implied by the canvas size and the
    /// font's cell metrics, truncated toward zero.
    pub fn grid(&self) -> (u32, u32) {
        let (cell_w, cell_h) = self.font.cell_size();
        (self.config.width / cell_w, self.config.height / cell_h)
    }

    /// Render one frame to a canvas of exactly (width, height) pixels.
    ///
    /// A cell grid that doesn't fit (cell larger than the canvas in either
    /// axis) yields a blank canvas of the requested size rather than an
    /// error.
    pub fn render(&mut self, frame: &Frame) -> GlyphImage {
        let (cols, rows) = self.grid();
        let mut canvas = RgbImage::from_pixel(
            self.config.width,
            self.config.height,
            image::Rgb(BACKGROUND),
        );
        if cols == 0 || rows == 0 {
            return canvas;
        }

        let gray = grayscale(frame);
        let luma = downsample_luma(&gray, frame.width, frame.height, cols, rows);
        if luma.len() != (cols * rows) as usize {
            // Degenerate source frame; keep the canvas blank
            return canvas;
        }
        let colors = if self.config.color_mode {
            Some(downsample_colors(frame, cols, rows))
        } else {
            None
        };

        let (cell_w, cell_h) = self.font.cell_size();
        for row in 0..rows {
            for col in 0..cols {
                let idx = (row * cols + col) as usize;
                let glyph = self.config.ramp.glyph_for(luma[idx], self.config.invert);
                let color = match &colors {
                    Some(cells) => {
                        let c = cells[idx];
                        [c.r, c.g, c.b]
                    }
                    None => FOREGROUND,
                };
                self.font
                    .draw_glyph(&mut canvas, col * cell_w, row * cell_h, glyph, color);
            }
        }

        canvas
    }
}
