//! Unit tests for the glyph rendering pipeline through the public API.

use std::time::Instant;

use glyphcam::camera::{Frame, FrameFormat};
use glyphcam::render::{GlyphFont, GlyphImage, GlyphRamp, GlyphRenderer, RenderConfig};

/// Fixed-metric test font: marks the top-left pixel of each cell with the
/// foreground color for any glyph except space.
struct DotFont;

const CELL_W: u32 = 4;
const CELL_H: u32 = 8;

impl GlyphFont for DotFont {
    fn cell_size(&self) -> (u32, u32) {
        (CELL_W, CELL_H)
    }

    fn draw_glyph(&mut self, canvas: &mut GlyphImage, x: u32, y: u32, ch: char, color: [u8; 3]) {
        if ch == ' ' {
            return;
        }
        let (w, h) = canvas.dimensions();
        if x < w && y < h {
            canvas.put_pixel(x, y, image::Rgb(color));
        }
    }
}

fn frame_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = f(x, y);
            data.extend_from_slice(&[v, v, v]);
        }
    }
    Frame {
        data,
        width,
        height,
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    }
}

fn renderer_with(config: RenderConfig) -> GlyphRenderer<DotFont> {
    GlyphRenderer::new(DotFont, config)
}

#[test]
fn render_returns_exact_canvas_size() {
    for (w, h) in [(64, 48), (65, 49), (100, 10), (1, 1)] {
        let mut r = renderer_with(RenderConfig {
            width: w,
            height: h,
            ..RenderConfig::default()
        });
        let img = r.render(&frame_from_fn(16, 12, |_, _| 128));
        assert_eq!(img.dimensions(), (w, h), "canvas {}x{}", w, h);
    }
}

#[test]
fn oversized_cell_yields_blank_canvas() {
    // Cell is 4x8; a 3x3 canvas fits zero cells in both axes
    let mut r = renderer_with(RenderConfig {
        width: 3,
        height: 3,
        ..RenderConfig::default()
    });
    let img = r.render(&frame_from_fn(16, 12, |_, _| 0));
    assert_eq!(img.dimensions(), (3, 3));
    assert!(img.pixels().all(|p| p.0 == [255, 255, 255]));
}

#[test]
fn dark_cells_get_glyphs_bright_cells_stay_blank() {
    // Left half black, right half white, one row of cells
    let mut r = renderer_with(RenderConfig {
        width: 8 * CELL_W,
        height: CELL_H,
        ..RenderConfig::default()
    });
    let img = r.render(&frame_from_fn(32, 8, |x, _| if x < 16 { 0 } else { 255 }));

    // Dense ramp: luminance 0 selects '@' (drawn), 255 the trailing space
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0], "dark cell must be marked");
    assert_eq!(
        img.get_pixel(7 * CELL_W, 0).0,
        [255, 255, 255],
        "bright cell must stay blank"
    );
}

#[test]
fn two_identical_renders_are_pixel_identical() {
    let frame = frame_from_fn(24, 16, |x, y| ((x * 13 + y * 31) % 256) as u8);
    let config = RenderConfig {
        width: 48,
        height: 32,
        color_mode: true,
        ..RenderConfig::default()
    };
    let a = renderer_with(config.clone()).render(&frame);
    let b = renderer_with(config).render(&frame);
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn single_glyph_ramp_is_accepted() {
    let mut r = renderer_with(RenderConfig {
        width: 2 * CELL_W,
        height: CELL_H,
        ramp: GlyphRamp::new(vec!['#']),
        ..RenderConfig::default()
    });
    // Every cell gets the one glyph regardless of brightness
    let img = r.render(&frame_from_fn(8, 8, |x, _| if x < 4 { 0 } else { 255 }));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(img.get_pixel(CELL_W, 0).0, [0, 0, 0]);
}

#[test]
fn color_mode_tints_glyphs_with_cell_color() {
    let mut frame = frame_from_fn(8, 8, |_, _| 0);
    // Make the source dark red: dark enough for a glyph, colored enough to see
    for px in frame.data.chunks_exact_mut(3) {
        px[0] = 90;
        px[1] = 10;
        px[2] = 10;
    }
    let mut r = renderer_with(RenderConfig {
        width: CELL_W,
        height: CELL_H,
        color_mode: true,
        ..RenderConfig::default()
    });
    let img = r.render(&frame);
    assert_eq!(img.get_pixel(0, 0).0, [90, 10, 10]);
}
