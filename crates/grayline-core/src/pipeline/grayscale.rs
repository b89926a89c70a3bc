//! Grayscale conversion.
//!
//! Every pixel is mapped through the same integer BT.601 luminance formula.
//! The weights sum to 2^16, so a pixel with equal channels maps to itself and
//! converting an already-gray image is a no-op.

use image::{DynamicImage, GrayImage, Luma};

const R_WEIGHT: u32 = 19595;
const G_WEIGHT: u32 = 38470;
const B_WEIGHT: u32 = 7471;

/// Luminance of one 8-bit RGB pixel, rounded to nearest.
pub const fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((R_WEIGHT * r as u32 + G_WEIGHT * g as u32 + B_WEIGHT * b as u32 + (1 << 15)) >> 16) as u8
}

/// Convert an image to single-channel 8-bit grayscale.
///
/// Alpha is discarded. Images that are already `Luma8` are returned as-is.
pub fn to_grayscale(image: DynamicImage) -> DynamicImage {
    if let DynamicImage::ImageLuma8(_) = image {
        return image;
    }

    let rgb = image.to_rgb8();
    let gray = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    });
    DynamicImage::ImageLuma8(gray)
}
