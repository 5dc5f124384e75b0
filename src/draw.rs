//! Small raster helpers for the track visualizer: grayscale expansion
//! and a built-in 5x7 glyph face for canvas labels, so label drawing
//! needs no font asset.

use image::{GrayImage, Rgb, RgbImage};

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;

/// Row bitmaps, most significant of the low 5 bits is the left column.
fn glyph(c: char) -> Option<[u8; 7]> {
    match c {
        '0' => Some([0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => Some([0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => Some([0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => Some([0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
        '4' => Some([0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => Some([0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => Some([0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => Some([0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => Some([0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => Some([0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        'A' => Some([0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'C' => Some([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'M' => Some([0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        ':' => Some([0b00000, 0b00100, 0b00100, 0b00000, 0b00100, 0b00100, 0b00000]),
        _ => None,
    }
}

fn fill_block(canvas: &mut RgbImage, x0: i32, y0: i32, scale: i32, color: Rgb<u8>) {
    for dy in 0..scale {
        for dx in 0..scale {
            let (px, py) = (x0 + dx, y0 + dy);
            if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Draw `text` with its top-left corner at (x, y), scaled by an integer
/// factor. Characters without a glyph advance the cursor but draw
/// nothing; pixels outside the canvas are clipped.
pub fn draw_label(canvas: &mut RgbImage, x: i32, y: i32, scale: u32, color: Rgb<u8>, text: &str) {
    let scale = scale.max(1) as i32;
    let mut cursor = x;
    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (0b10000 >> col) != 0 {
                        fill_block(
                            canvas,
                            cursor + col as i32 * scale,
                            y + row as i32 * scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
        cursor += (GLYPH_WIDTH as i32 + 1) * scale;
    }
}

/// Rendered width of `text` in pixels at `scale`.
pub fn label_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        (n * (GLYPH_WIDTH + 1) - 1) * scale
    }
}

/// Expand a grayscale snapshot to an RGB tile.
pub fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_par_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Rgb([p, p, p])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_coverage_for_labels() {
        for c in "CAM:0123456789".chars() {
            assert!(glyph(c).is_some(), "missing glyph for {c:?}");
        }
        assert!(glyph('x').is_none());
    }

    #[test]
    fn test_draw_label_lights_expected_pixels() {
        let mut canvas = RgbImage::new(64, 16);
        let color = Rgb([0, 255, 0]);
        draw_label(&mut canvas, 2, 2, 1, color, "0");
        // '0' top row is .###. so column 0 stays dark and column 1 lights.
        assert_eq!(*canvas.get_pixel(2, 2), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(3, 2), color);
    }

    #[test]
    fn test_draw_label_clips_at_borders() {
        let mut canvas = RgbImage::new(8, 8);
        draw_label(&mut canvas, -7, -3, 4, Rgb([255, 0, 0]), "M:8");
        draw_label(&mut canvas, 6, 6, 4, Rgb([255, 0, 0]), "9");
    }

    #[test]
    fn test_label_width() {
        assert_eq!(label_width("", 3), 0);
        assert_eq!(label_width("CAM:0", 3), 87);
        assert_eq!(label_width("7", 2), 10);
    }

    #[test]
    fn test_gray_to_rgb_expands_channels() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(0, 0, image::Luma([5]));
        gray.put_pixel(1, 0, image::Luma([200]));
        let rgb = gray_to_rgb(&gray);
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([5, 5, 5]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([200, 200, 200]));
    }
}
