//! Binary mask operations and canvas compositing
//!
//! Masks are `GrayImage`s holding 0 (unset) or 255 (set), the same
//! convention `imageproc` uses for contours and morphology. Compositing is
//! always restricted to a mask: pixels outside it are never touched.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::{euclidean_squared_distance_transform, Norm};
use imageproc::morphology::{dilate, erode};

use crate::config::Color;

pub const SET: Luma<u8> = Luma([255]);
pub const UNSET: Luma<u8> = Luma([0]);

// =============================================================================
// MASK CONSTRUCTION
// =============================================================================

pub fn empty_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

#[inline]
pub fn is_set(mask: &GrayImage, x: u32, y: u32) -> bool {
    mask.get_pixel(x, y)[0] != 0
}

/// Number of set pixels.
pub fn count(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

pub fn is_empty(mask: &GrayImage) -> bool {
    mask.as_raw().iter().all(|&v| v == 0)
}

/// Pixels whose value is at least `level`.
pub fn threshold_at_least(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] >= level { SET } else { UNSET }
    })
}

/// Pixels whose color exactly equals one of `colors`.
pub fn color_match(layer: &RgbImage, colors: &[Color]) -> GrayImage {
    GrayImage::from_fn(layer.width(), layer.height(), |x, y| {
        let px = layer.get_pixel(x, y).0;
        if colors.iter().any(|c| c.0 == px) { SET } else { UNSET }
    })
}

// =============================================================================
// SET OPERATIONS
// =============================================================================

fn zip_in_place(dst: &mut GrayImage, src: &GrayImage, op: impl Fn(bool, bool) -> bool) {
    debug_assert_eq!(dst.dimensions(), src.dimensions());
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d = if op(*d != 0, *s != 0) { 255 } else { 0 };
    }
}

pub fn union_in_place(dst: &mut GrayImage, src: &GrayImage) {
    zip_in_place(dst, src, |a, b| a || b);
}

pub fn intersect_in_place(dst: &mut GrayImage, src: &GrayImage) {
    zip_in_place(dst, src, |a, b| a && b);
}

pub fn subtract_in_place(dst: &mut GrayImage, src: &GrayImage) {
    zip_in_place(dst, src, |a, b| a && !b);
}

pub fn intersect(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = a.clone();
    intersect_in_place(&mut out, b);
    out
}

// =============================================================================
// MORPHOLOGY
// =============================================================================

/// Erosion then dilation with a 3x3 square; removes isolated speckles.
pub fn open_square(mask: &GrayImage) -> GrayImage {
    dilate(&erode(mask, Norm::LInf, 1), Norm::LInf, 1)
}

/// Dilation then erosion with a 3x3 square; closes pinholes and thin gaps.
pub fn close_square(mask: &GrayImage) -> GrayImage {
    erode(&dilate(mask, Norm::LInf, 1), Norm::LInf, 1)
}

/// Dilate `iterations` times with a disk of the given radius.
pub fn dilate_disk(mask: &GrayImage, radius: f64, iterations: usize) -> GrayImage {
    let limit = radius * radius;
    let mut out = mask.clone();
    for _ in 0..iterations {
        if is_empty(&out) {
            break;
        }
        let dist = euclidean_squared_distance_transform(&out);
        out = GrayImage::from_fn(out.width(), out.height(), |x, y| {
            if dist.get_pixel(x, y)[0] <= limit { SET } else { UNSET }
        });
    }
    out
}

/// Erode `iterations` times with a disk of the given radius.
/// Pixels outside the image do not count as background.
pub fn erode_disk(mask: &GrayImage, radius: f64, iterations: usize) -> GrayImage {
    let limit = radius * radius;
    let mut out = mask.clone();
    for _ in 0..iterations {
        let background = invert(&out);
        if is_empty(&background) {
            break;
        }
        let dist = euclidean_squared_distance_transform(&background);
        out = GrayImage::from_fn(out.width(), out.height(), |x, y| {
            if dist.get_pixel(x, y)[0] > limit { SET } else { UNSET }
        });
    }
    out
}

pub fn invert(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if is_set(mask, x, y) { UNSET } else { SET }
    })
}

/// One-pixel inner outline: set pixels with an unset 8-neighbour.
pub fn inner_boundary(mask: &GrayImage) -> GrayImage {
    let mut edges = mask.clone();
    subtract_in_place(&mut edges, &erode(mask, Norm::LInf, 1));
    edges
}

// =============================================================================
// COMPOSITING
// =============================================================================

/// Replace canvas pixels under the mask with a flat color.
pub fn overwrite(canvas: &mut RgbImage, mask: &GrayImage, color: Color) {
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if is_set(mask, x, y) {
            px.0 = color.0;
        }
    }
}

#[inline]
fn weighted(under: u8, over: u8, alpha: f32) -> u8 {
    ((1.0 - alpha) * under as f32 + alpha * over as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// `(1 - alpha) * canvas + alpha * overlay(x, y)` under the mask.
pub fn blend_with(
    canvas: &mut RgbImage,
    mask: &GrayImage,
    alpha: f32,
    overlay: impl Fn(u32, u32) -> [u8; 3],
) {
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if !is_set(mask, x, y) {
            continue;
        }
        let over = overlay(x, y);
        for c in 0..3 {
            px.0[c] = weighted(px.0[c], over[c], alpha);
        }
    }
}

/// Alpha-composite a flat color under the mask.
pub fn blend_flat(canvas: &mut RgbImage, mask: &GrayImage, color: Color, alpha: f32) {
    blend_with(canvas, mask, alpha, |_, _| color.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn square_mask(size: u32, from: u32, to: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (from..=to).contains(&x) && (from..=to).contains(&y) { SET } else { UNSET }
        })
    }

    #[test]
    fn test_open_removes_speckle_keeps_block() {
        let mut mask = square_mask(20, 5, 12);
        mask.put_pixel(17, 17, SET);
        let opened = open_square(&mask);
        assert!(!is_set(&opened, 17, 17));
        assert_eq!(count(&opened), 64);
    }

    #[test]
    fn test_erode_keeps_full_image() {
        let full = GrayImage::from_pixel(8, 8, SET);
        assert_eq!(count(&erode_disk(&full, 7.0, 3)), 64);
        assert_eq!(count(&open_square(&full)), 64);
    }

    #[test]
    fn test_dilate_disk_grows_by_radius() {
        let mut mask = empty_mask(41, 41);
        mask.put_pixel(20, 20, SET);
        let grown = dilate_disk(&mask, 7.0, 1);
        assert!(is_set(&grown, 27, 20));
        assert!(!is_set(&grown, 28, 20));
        assert!(is_set(&grown, 24, 24));
        assert!(!is_set(&grown, 26, 26));
        let twice = dilate_disk(&mask, 7.0, 2);
        assert!(is_set(&twice, 34, 20));
    }

    #[test]
    fn test_inner_boundary_of_square() {
        let mask = square_mask(10, 2, 6);
        let edges = inner_boundary(&mask);
        assert_eq!(count(&edges), 16);
        assert!(is_set(&edges, 2, 4));
        assert!(!is_set(&edges, 4, 4));
    }

    #[test]
    fn test_set_operations() {
        let a = square_mask(10, 0, 4);
        let b = square_mask(10, 3, 7);
        let mut u = a.clone();
        union_in_place(&mut u, &b);
        assert_eq!(count(&u), 25 + 25 - 4);
        assert_eq!(count(&intersect(&a, &b)), 4);
        let mut d = a.clone();
        subtract_in_place(&mut d, &b);
        assert_eq!(count(&d), 21);
    }

    #[test]
    fn test_blend_only_under_mask() {
        let mut canvas = RgbImage::from_pixel(2, 1, Rgb([100, 100, 100]));
        let mut mask = empty_mask(2, 1);
        mask.put_pixel(0, 0, SET);
        blend_flat(&mut canvas, &mask, Color::new(200, 0, 100), 0.3);
        assert_eq!(canvas.get_pixel(0, 0).0, [130, 70, 100]);
        assert_eq!(canvas.get_pixel(1, 0).0, [100, 100, 100]);
    }

    #[test]
    fn test_color_match_exact() {
        let mut layer = RgbImage::new(3, 1);
        layer.put_pixel(0, 0, Rgb([0, 96, 255]));
        layer.put_pixel(1, 0, Rgb([0, 97, 255]));
        let mask = color_match(&layer, &[Color::new(0, 96, 255)]);
        assert!(is_set(&mask, 0, 0));
        assert!(!is_set(&mask, 1, 0));
        assert!(!is_set(&mask, 2, 0));
    }
}
