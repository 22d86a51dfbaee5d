//! Image preprocessing for OCR and vision input.
//!
//! Pipeline: decode → grayscale → 3×3 median denoise → adaptive mean
//! threshold → skew estimation → rotation (only past [`SKEW_TOLERANCE_DEG`])
//! → PNG. Filters come from `imageproc`; the skew estimate is a projection
//! profile over the binarised page.
//!
//! [`enhance`] never fails: anything that goes wrong returns the input
//! bytes untouched, which is always an acceptable (if unimproved) input for
//! the next stage.

use crate::pipeline::encode::encode_png;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::median_filter;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::debug;

/// Skew below this angle (degrees) is left alone.
pub const SKEW_TOLERANCE_DEG: f32 = 0.5;

/// Search window for the skew estimate, in degrees either side of level.
const SKEW_SEARCH_DEG: f32 = 5.0;
const SKEW_STEP_DEG: f32 = 0.25;

/// Foreground points sampled for the skew estimate.
const MAX_SKEW_SAMPLES: usize = 40_000;

/// Adaptive threshold block radius (31×31 window).
const THRESHOLD_RADIUS: u32 = 15;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// Improve an encoded image for text extraction, or return it unchanged.
pub fn enhance(bytes: &[u8]) -> Vec<u8> {
    match try_enhance(bytes) {
        Ok(out) => out,
        Err(e) => {
            debug!("Preprocessing skipped: {}", e);
            bytes.to_vec()
        }
    }
}

fn try_enhance(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let gray = img.to_luma8();
    let denoised = median_filter(&gray, 1, 1);
    let binary = adaptive_threshold(&denoised, THRESHOLD_RADIUS);

    let angle = estimate_skew(&binary);
    let corrected = if angle.abs() > SKEW_TOLERANCE_DEG {
        debug!("Deskewing by {:.2}°", angle);
        deskew(&binary, angle)
    } else {
        binary
    };

    encode_png(&DynamicImage::ImageLuma8(corrected))
}

/// Estimate text skew in degrees from the foreground pixel coordinates.
///
/// Each candidate angle projects the black pixels onto the axis
/// perpendicular to it; text lines that run along the angle pile up into a
/// few sharp bins, so the angle with the largest sum of squared bin counts
/// wins. Positive angles mean lines descend to the right. Returns 0.0 when
/// there is no foreground.
pub fn estimate_skew(binary: &GrayImage) -> f32 {
    let (w, h) = binary.dimensions();
    let foreground: Vec<(f32, f32)> = binary
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] == BLACK)
        .map(|(x, y, _)| (x as f32, y as f32))
        .collect();
    if foreground.is_empty() {
        return 0.0;
    }

    let step = foreground.len().div_ceil(MAX_SKEW_SAMPLES).max(1);
    let samples: Vec<(f32, f32)> = foreground.into_iter().step_by(step).collect();

    let offset = w as f32 + 1.0;
    let bins = (w + h) as usize + 2;
    let mut histogram = vec![0u32; bins];

    let mut best_angle = 0.0f32;
    let mut best_score = 0u64;
    let steps = (SKEW_SEARCH_DEG / SKEW_STEP_DEG).round() as i32;

    for i in -steps..=steps {
        let angle = i as f32 * SKEW_STEP_DEG;
        let (sin, cos) = angle.to_radians().sin_cos();
        histogram.iter_mut().for_each(|b| *b = 0);

        for &(x, y) in &samples {
            let projected = y * cos - x * sin + offset;
            let bin = (projected.round().max(0.0) as usize).min(bins - 1);
            histogram[bin] += 1;
        }

        let score: u64 = histogram.iter().map(|&c| u64::from(c) * u64::from(c)).sum();
        // Ties resolve toward level.
        if score > best_score || (score == best_score && angle.abs() < best_angle.abs()) {
            best_score = score;
            best_angle = angle;
        }
    }
    best_angle
}

/// Rotate about the image centre so lines at `angle_deg` become level.
/// Uncovered corners are filled white.
pub fn deskew(img: &GrayImage, angle_deg: f32) -> GrayImage {
    rotate_about_center(
        img,
        -angle_deg.to_radians(),
        Interpolation::Nearest,
        Luma([WHITE]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with thick black lines tilted by `angle_deg`.
    fn lined_page(angle_deg: f32) -> GrayImage {
        let (w, h) = (400u32, 300u32);
        let tan = angle_deg.to_radians().tan();
        GrayImage::from_fn(w, h, |x, y| {
            let on_line = (0..8).any(|k| {
                let c = 40.0 + k as f32 * 30.0;
                let line_y = x as f32 * tan + c;
                (y as f32 - line_y).abs() < 1.5
            });
            if on_line && x > 20 && x < w - 20 {
                Luma([BLACK])
            } else {
                Luma([WHITE])
            }
        })
    }

    #[test]
    fn level_text_has_no_skew() {
        assert!(estimate_skew(&lined_page(0.0)).abs() < SKEW_TOLERANCE_DEG);
    }

    #[test]
    fn detects_positive_and_negative_skew() {
        let est = estimate_skew(&lined_page(3.0));
        assert!((est - 3.0).abs() <= 0.5, "estimated {est}");
        let est = estimate_skew(&lined_page(-2.0));
        assert!((est + 2.0).abs() <= 0.5, "estimated {est}");
    }

    #[test]
    fn rotation_levels_skewed_lines() {
        let skewed = lined_page(3.0);
        let corrected = deskew(&skewed, 3.0);
        assert!(estimate_skew(&corrected).abs() <= 0.5);
    }

    #[test]
    fn blank_page_has_no_skew() {
        let blank = GrayImage::from_pixel(50, 50, Luma([WHITE]));
        assert_eq!(estimate_skew(&blank), 0.0);
    }

    #[test]
    fn binarisation_keeps_strokes_and_drops_speckles() {
        let mut img = GrayImage::from_pixel(60, 40, Luma([200]));
        for y in 10..30 {
            for x in 10..13 {
                img.put_pixel(x, y, Luma([40]));
            }
        }
        img.put_pixel(45, 20, Luma([0]));

        let binary = adaptive_threshold(&median_filter(&img, 1, 1), THRESHOLD_RADIUS);
        assert_eq!(binary.get_pixel(11, 20)[0], BLACK, "stroke survives");
        assert_eq!(binary.get_pixel(45, 20)[0], WHITE, "speckle removed");
        assert_eq!(binary.get_pixel(50, 5)[0], WHITE, "background stays white");
    }

    #[test]
    fn undecodable_input_is_returned_unchanged() {
        let junk = b"%PDF-1.7 this is not an image".to_vec();
        assert_eq!(enhance(&junk), junk);
    }

    #[test]
    fn decodable_input_becomes_png() {
        let page = DynamicImage::ImageLuma8(lined_page(0.0));
        let png = encode_png(&page).unwrap();
        let out = enhance(&png);
        let decoded = image::load_from_memory(&out).expect("output decodes");
        assert_eq!(decoded.width(), 400);
        assert_eq!(decoded.height(), 300);
    }
}
