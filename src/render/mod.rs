//! Glyph rendering module for converting camera frames to glyph-grid images.
//!
//! The pipeline is: grayscale -> area-average downsample to the cell grid ->
//! ramp lookup per cell -> rasterize each glyph onto an RGB canvas through
//! the [`GlyphFont`] capability.

mod font;
mod ramp;
mod renderer;
mod sample;

pub use font::{default_font_path, FontAtlas, FontError, GlyphFont};
pub use ramp::{GlyphRamp, DENSE_RAMP, LIGHT_RAMP};
pub use renderer::{GlyphImage, GlyphRenderer, RenderConfig};
pub use sample::{downsample_colors, downsample_luma, grayscale, CellColor};
