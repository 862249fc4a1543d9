use glam::Vec4;
use image::{Rgba, Rgba32FImage, RgbaImage};

/// Linear RGBA image with `f32` channels in `[0, 1]`; row 0 is the top.
pub type Bitmap = Rgba32FImage;

pub const TRANSPARENT: Rgba<f32> = Rgba([0.0, 0.0, 0.0, 0.0]);

/// Flat fill used when a target could not be rendered.
pub fn placeholder(size: u32, color: Vec4) -> Bitmap {
    Bitmap::from_pixel(size, size, Rgba(color.to_array()))
}

/// Whether every pixel has zero alpha.
pub fn is_transparent(bitmap: &Bitmap) -> bool {
    bitmap.pixels().all(|pixel| pixel[3] <= 0.0)
}

/// Per-channel linear interpolation, alpha included.
pub fn lerp(from: Rgba<f32>, to: Rgba<f32>, t: f32) -> Rgba<f32> {
    let from = Vec4::from_array(from.0);
    let to = Vec4::from_array(to.0);
    Rgba(from.lerp(to, t).to_array())
}

/// Quantizes to 8 bits per channel for encoding.
pub fn to_rgba8(bitmap: &Bitmap) -> RgbaImage {
    RgbaImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        let pixel = bitmap.get_pixel(x, y);
        Rgba(pixel.0.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_flat_and_square() {
        let bitmap = placeholder(8, Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(bitmap.dimensions(), (8, 8));
        assert!(bitmap.pixels().all(|p| p.0 == [0.5, 0.5, 0.5, 1.0]));
        assert!(!is_transparent(&bitmap));
    }

    #[test]
    fn lerp_blends_alpha_too() {
        let from = Rgba([0.0, 0.0, 0.0, 1.0]);
        let to = Rgba([1.0, 0.0, 0.0, 0.5]);
        assert_eq!(lerp(from, to, 0.5).0, [0.5, 0.0, 0.0, 0.75]);
    }

    #[test]
    fn to_rgba8_clamps_and_rounds() {
        let bitmap = Bitmap::from_pixel(1, 1, Rgba([1.5, 0.5, -1.0, 1.0]));
        assert_eq!(to_rgba8(&bitmap).get_pixel(0, 0).0, [255, 128, 0, 255]);
    }
}
