//! Synthetic drop shadows.
//!
//! The shadow is the source silhouette shrunk toward the image center by
//! `scale` and shifted by `offset` (a fraction of the full image size). Both
//! are evaluated with +Y pointing up, the convention shadow presets are
//! authored in, so rows are flipped when the bitmap is read or written.

use glam::{Vec2, Vec4};
use image::Rgba;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::bitmap::{lerp, Bitmap, TRANSPARENT};
use crate::error::CompositingError;

/// Alpha at or below this counts as empty.
pub const ALPHA_THRESHOLD: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSpec {
    #[serde(default)]
    pub enabled: bool,
    /// Linear RGBA.
    #[serde(default = "default_color")]
    pub color: Vec4,
    #[serde(default = "default_offset")]
    pub offset: Vec2,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for ShadowSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            color: default_color(),
            offset: default_offset(),
            scale: default_scale(),
        }
    }
}

fn default_color() -> Vec4 {
    Vec4::new(0.0, 0.0, 0.0, 0.5)
}

fn default_offset() -> Vec2 {
    Vec2::new(0.05, -0.05)
}

fn default_scale() -> f32 {
    0.95
}

/// Composites a drop shadow beneath the content of `source`.
///
/// The source is consumed; the result always has the same dimensions.
pub fn apply_shadow(source: Bitmap, spec: &ShadowSpec) -> Result<Bitmap, CompositingError> {
    validate_source(&source, spec)?;
    Ok(composite(&source, spec))
}

/// Like [`apply_shadow`], but hands `source` back untouched when it cannot
/// carry a shadow.
pub fn apply_shadow_or_passthrough(source: Bitmap, spec: &ShadowSpec) -> Bitmap {
    match validate_source(&source, spec) {
        Ok(()) => composite(&source, spec),
        Err(err) => {
            warn!("keeping unshadowed image: {err}");
            source
        }
    }
}

/// Checks that `source` and `spec` can be composited.
pub fn validate_source(source: &Bitmap, spec: &ShadowSpec) -> Result<(), CompositingError> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositingError::EmptyBitmap { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if source.as_raw().len() != expected {
        return Err(CompositingError::BufferMismatch {
            expected,
            actual: source.as_raw().len(),
        });
    }
    if !spec.scale.is_finite() || spec.scale <= 0.0 {
        return Err(CompositingError::InvalidScale(spec.scale));
    }
    if !spec.offset.is_finite() {
        return Err(CompositingError::InvalidOffset {
            x: spec.offset.x,
            y: spec.offset.y,
        });
    }
    Ok(())
}

fn composite(source: &Bitmap, spec: &ShadowSpec) -> Bitmap {
    let (width, height) = source.dimensions();
    let w = i64::from(width);
    let h = i64::from(height);
    // Anything a full image away lands outside the frame.
    let offset_x = ((spec.offset.x * width as f32) as i64).clamp(-w, w);
    let offset_y = ((spec.offset.y * height as f32) as i64).clamp(-h, h);
    let shadow_w = (width as f32 * spec.scale) as i64;
    let shadow_h = (height as f32 * spec.scale) as i64;
    let center_x = (w - shadow_w) / 2;
    let center_y = (h - shadow_h) / 2;

    let read = |x: i64, y: i64| *source.get_pixel(x as u32, (h - 1 - y) as u32);

    let mut mask = vec![false; (w * h) as usize];
    for y in 0..h {
        let sy = y - center_y - offset_y;
        if !(0..shadow_h).contains(&sy) {
            continue;
        }
        let src_y = ((sy as f32 / shadow_h as f32 * h as f32) as i64).clamp(0, h - 1);
        for x in 0..w {
            let sx = x - center_x - offset_x;
            if !(0..shadow_w).contains(&sx) {
                continue;
            }
            let src_x = ((sx as f32 / shadow_w as f32 * w as f32) as i64).clamp(0, w - 1);
            if read(src_x, src_y)[3] > ALPHA_THRESHOLD {
                mask[(y * w + x) as usize] = true;
            }
        }
    }

    let shadow = Rgba(spec.color.to_array());
    let mut output = Bitmap::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let original = read(x, y);
            let shadowed = mask[(y * w + x) as usize];
            let layer = if shadowed { shadow } else { TRANSPARENT };
            let pixel = if original[3] > ALPHA_THRESHOLD {
                lerp(layer, original, original[3])
            } else if shadowed && spec.color.w > ALPHA_THRESHOLD {
                shadow
            } else {
                TRANSPARENT
            };
            output.put_pixel(x as u32, (h - 1 - y) as u32, pixel);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::is_transparent;

    const RED: Rgba<f32> = Rgba([1.0, 0.0, 0.0, 1.0]);

    fn black_shadow(offset: Vec2, scale: f32) -> ShadowSpec {
        ShadowSpec {
            enabled: true,
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            offset,
            scale,
        }
    }

    #[test]
    fn single_opaque_pixel_wins_over_its_own_shadow() {
        let mut source = Bitmap::new(2, 2);
        source.put_pixel(0, 0, RED);
        let output = apply_shadow(source, &black_shadow(Vec2::ZERO, 1.0)).unwrap();
        assert_eq!(output.get_pixel(0, 0).0, RED.0);
        for (x, y) in [(1, 0), (0, 1), (1, 1)] {
            assert_eq!(output.get_pixel(x, y).0, TRANSPARENT.0, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn output_keeps_source_dimensions() {
        for (w, h) in [(1, 1), (3, 7), (16, 9)] {
            let source = Bitmap::from_pixel(w, h, RED);
            let output = apply_shadow(source, &ShadowSpec::default()).unwrap();
            assert_eq!(output.dimensions(), (w, h));
        }
    }

    #[test]
    fn transparent_source_casts_no_shadow() {
        let source = Bitmap::new(8, 8);
        let output = apply_shadow(source, &black_shadow(Vec2::new(0.2, -0.2), 0.8)).unwrap();
        assert!(is_transparent(&output));
    }

    #[test]
    fn negative_y_offset_moves_shadow_down() {
        let mut source = Bitmap::new(4, 4);
        source.put_pixel(1, 1, RED);
        let spec = black_shadow(Vec2::new(0.25, -0.25), 1.0);
        let output = apply_shadow(source, &spec).unwrap();
        // Right by one column, down by one row.
        assert_eq!(output.get_pixel(2, 2).0, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(output.get_pixel(1, 1).0, RED.0);
        let covered = output.pixels().filter(|p| p[3] > 0.0).count();
        assert_eq!(covered, 2);
    }

    #[test]
    fn scale_shrinks_toward_image_center() {
        let mut source = Bitmap::new(4, 4);
        for y in 0..4 {
            source.put_pixel(0, y, RED);
        }
        let output = apply_shadow(source, &black_shadow(Vec2::ZERO, 0.5)).unwrap();
        for y in 0..4 {
            assert_eq!(output.get_pixel(0, y).0, RED.0);
        }
        assert_eq!(output.get_pixel(1, 1).0, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(output.get_pixel(1, 2).0, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(output.get_pixel(1, 0).0, TRANSPARENT.0);
        assert_eq!(output.get_pixel(1, 3).0, TRANSPARENT.0);
        assert_eq!(output.get_pixel(2, 1).0, TRANSPARENT.0);
    }

    #[test]
    fn translucent_content_blends_over_shadow() {
        let mut source = Bitmap::new(2, 2);
        source.put_pixel(0, 0, Rgba([1.0, 0.0, 0.0, 0.5]));
        let output = apply_shadow(source, &black_shadow(Vec2::ZERO, 1.0)).unwrap();
        assert_eq!(output.get_pixel(0, 0).0, [0.5, 0.0, 0.0, 0.75]);
    }

    #[test]
    fn near_zero_alpha_is_ignored() {
        let mut source = Bitmap::new(2, 2);
        source.put_pixel(0, 0, Rgba([1.0, 1.0, 1.0, 0.005]));
        let output = apply_shadow(source, &black_shadow(Vec2::ZERO, 1.0)).unwrap();
        assert!(is_transparent(&output));
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let err = apply_shadow(Bitmap::new(0, 4), &ShadowSpec::default()).unwrap_err();
        assert_eq!(
            err,
            CompositingError::EmptyBitmap {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn passthrough_keeps_source_on_invalid_scale() {
        let mut source = Bitmap::new(2, 2);
        source.put_pixel(1, 1, RED);
        let spec = black_shadow(Vec2::ZERO, f32::NAN);
        let output = apply_shadow_or_passthrough(source.clone(), &spec);
        assert_eq!(output, source);
    }

    #[test]
    fn offset_beyond_the_image_drops_the_shadow() {
        let mut source = Bitmap::new(4, 4);
        source.put_pixel(1, 1, RED);
        for offset in [Vec2::new(-1e19, 0.0), Vec2::new(0.0, 3.0e9), Vec2::new(1.0, -1.0)] {
            let output = apply_shadow(source.clone(), &black_shadow(offset, 1.0)).unwrap();
            assert_eq!(output, source, "offset {offset:?}");
        }
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let spec = black_shadow(Vec2::new(f32::INFINITY, 0.0), 1.0);
        let err = apply_shadow(Bitmap::new(2, 2), &spec).unwrap_err();
        assert_eq!(
            err,
            CompositingError::InvalidOffset {
                x: f32::INFINITY,
                y: 0.0
            }
        );
    }

    #[test]
    fn invisible_shadow_color_leaves_background_clear() {
        let mut source = Bitmap::new(4, 4);
        source.put_pixel(1, 1, RED);
        let spec = ShadowSpec {
            enabled: true,
            color: Vec4::new(0.2, 0.3, 0.4, 0.0),
            offset: Vec2::new(0.25, -0.25),
            scale: 1.0,
        };
        let output = apply_shadow(source, &spec).unwrap();
        assert_eq!(output.get_pixel(2, 2).0, TRANSPARENT.0);
        assert_eq!(output.get_pixel(1, 1).0, RED.0);
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let source = Bitmap::new(2, 2);
        let err = apply_shadow(source, &black_shadow(Vec2::ZERO, 0.0)).unwrap_err();
        assert_eq!(err, CompositingError::InvalidScale(0.0));
    }
}
