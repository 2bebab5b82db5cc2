//! Grayscale conversion and area-average downsampling.

use crate::camera::Frame;

/// Average RGB color of a downsampled cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Convert an RGB frame to grayscale using the ITU-R BT.601 luminance formula.
///
/// Y = 0.299*R + 0.587*G + 0.114*B, computed with integer math (coefficients
/// scaled by 1000) to keep floating point out of the per-frame hot path.
pub fn grayscale(frame: &Frame) -> Vec<u8> {
    let pixel_count = (frame.width * frame.height) as usize;
    let mut gray = Vec::with_capacity(pixel_count);

    for rgb in frame.data.chunks_exact(3) {
        let r = rgb[0] as u32;
        let g = rgb[1] as u32;
        let b = rgb[2] as u32;
        let luminance = (299 * r + 587 * g + 114 * b) / 1000;
        gray.push(luminance as u8);
    }

    gray
}

/// Downsample a grayscale image to a cell grid by area averaging.
///
/// Every cell's value is the mean brightness of all source pixels falling
/// inside it. Area averaging (rather than point sampling) is what keeps the
/// glyph selection stable frame-to-frame; a point sample would flicker as
/// scene detail crosses sample positions.
///
/// Returns `cols * rows` brightness values in row-major order, or an empty
/// vector if any dimension is zero.
pub fn downsample_luma(gray: &[u8], img_width: u32, img_height: u32, cols: u32, rows: u32) -> Vec<u8> {
    if cols == 0 || rows == 0 || img_width == 0 || img_height == 0 || gray.is_empty() {
        return Vec::new();
    }

    let cell_w = img_width as f32 / cols as f32;
    let cell_h = img_height as f32 / rows as f32;

    let mut result = Vec::with_capacity((cols * rows) as usize);

    for cy in 0..rows {
        for cx in 0..cols {
            let start_x = (cx as f32 * cell_w) as u32;
            let end_x = ((cx + 1) as f32 * cell_w) as u32;
            let start_y = (cy as f32 * cell_h) as u32;
            let end_y = ((cy + 1) as f32 * cell_h) as u32;

            let mut sum = 0u32;
            let mut count = 0u32;

            for py in start_y..end_y {
                for px in start_x..end_x {
                    let idx = (py * img_width + px) as usize;
                    if idx < gray.len() {
                        sum += gray[idx] as u32;
                        count += 1;
                    }
                }
            }

            result.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }

    result
}

/// Downsample an RGB frame to per-cell average colors.
///
/// Same cell geometry as [`downsample_luma`], averaging each channel
/// independently. Used in color mode to tint each glyph with its source
/// region's color.
pub fn downsample_colors(frame: &Frame, cols: u32, rows: u32) -> Vec<CellColor> {
    let img_width = frame.width;
    let img_height = frame.height;

    if cols == 0 || rows == 0 || img_width == 0 || img_height == 0 || frame.data.is_empty() {
        return Vec::new();
    }

    let cell_w = img_width as f32 / cols as f32;
    let cell_h = img_height as f32 / rows as f32;

    let mut result = Vec::with_capacity((cols * rows) as usize);

    for cy in 0..rows {
        for cx in 0..cols {
            let start_x = (cx as f32 * cell_w) as u32;
            let end_x = ((cx + 1) as f32 * cell_w) as u32;
            let start_y = (cy as f32 * cell_h) as u32;
            let end_y = ((cy + 1) as f32 * cell_h) as u32;

            let mut sum_r = 0u32;
            let mut sum_g = 0u32;
            let mut sum_b = 0u32;
            let mut count = 0u32;

            for py in start_y..end_y {
                for px in start_x..end_x {
                    let idx = ((py * img_width + px) * 3) as usize;
                    if idx + 2 < frame.data.len() {
                        sum_r += frame.data[idx] as u32;
                        sum_g += frame.data[idx + 1] as u32;
                        sum_b += frame.data[idx + 2] as u32;
                        count += 1;
                    }
                }
            }

            result.push(if count > 0 {
                CellColor {
                    r: (sum_r / count) as u8,
                    g: (sum_g / count) as u8,
                    b: (sum_b / count) as u8,
                }
            } else {
                CellColor::default()
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FrameFormat;
    use std::time::Instant;

    fn rgb_frame(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_grayscale_extremes() {
        let frame = rgb_frame(vec![0, 0, 0, 255, 255, 255], 2, 1);
        let gray = grayscale(&frame);
        assert_eq!(gray[0], 0);
        assert_eq!(gray[1], 255);
    }

    #[test]
    fn test_grayscale_green_dominates() {
        // BT.601 weights green highest
        let frame = rgb_frame(vec![255, 0, 0, 0, 255, 0, 0, 0, 255], 3, 1);
        let gray = grayscale(&frame);
        assert!(gray[1] > gray[0]);
        assert!(gray[0] > gray[2]);
    }

    #[test]
    fn test_downsample_luma_averages_cells() {
        // 4x2 image downsampled to 2x1: each cell averages a 2x2 block
        let gray = vec![
            0, 0, 200, 200, //
            100, 100, 200, 200,
        ];
        let out = downsample_luma(&gray, 4, 2, 2, 1);
        assert_eq!(out, vec![50, 200]);
    }

    #[test]
    fn test_downsample_luma_identity_grid() {
        let gray = vec![10, 20, 30, 40];
        let out = downsample_luma(&gray, 2, 2, 2, 2);
        assert_eq!(out, gray);
    }

    #[test]
    fn test_downsample_luma_zero_grid() {
        let gray = vec![10, 20];
        assert!(downsample_luma(&gray, 2, 1, 0, 1).is_empty());
        assert!(downsample_luma(&gray, 2, 1, 1, 0).is_empty());
    }

    #[test]
    fn test_downsample_colors_averages_channels() {
        // Two pixels red + blue average to purple in a single cell
        let frame = rgb_frame(vec![255, 0, 0, 0, 0, 255], 2, 1);
        let out = downsample_colors(&frame, 1, 1);
        assert_eq!(
            out,
            vec![CellColor {
                r: 127,
                g: 0,
                b: 127
            }]
        );
    }

    #[test]
    fn test_downsample_colors_per_cell() {
        let frame = rgb_frame(vec![255, 0, 0, 0, 255, 0], 2, 1);
        let out = downsample_colors(&frame, 2, 1);
        assert_eq!(out[0], CellColor { r: 255, g: 0, b: 0 });
        assert_eq!(out[1], CellColor { r: 0, g: 255, b: 0 });
    }
}
