//! Thematic overlays: vegetation, desert and glacier biomes, water
//!
//! Applied in that order on top of the banded elevation. Vegetation and
//! biomes are alpha-composited under their masks; water is opaque.

use image::{GrayImage, Luma, RgbImage};

use crate::config::{Color, RenderConfig, VegetationKind, VegetationStyle};
use crate::raster;

/// A color-coded feature on a classification raster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerFeature {
    pub name: &'static str,
    /// Exact color of the feature on the source raster
    pub key: Color,
    /// Color painted onto the map
    pub paint: Color,
}

impl LayerFeature {
    const fn new(name: &'static str, key: Color, paint: Color) -> Self {
        Self { name, key, paint }
    }
}

pub const DESERTS: [LayerFeature; 3] = [
    LayerFeature::new("badland desert", Color::new(255, 96, 32), Color::new(94, 107, 108)),
    LayerFeature::new("sand desert", Color::new(255, 255, 0), Color::new(206, 142, 82)),
    LayerFeature::new("rock desert", Color::new(255, 128, 64), Color::new(94, 107, 108)),
];

pub const GLACIERS: [LayerFeature; 3] = [
    LayerFeature::new("glacier", Color::new(0, 255, 255), Color::WHITE),
    LayerFeature::new("glacier", Color::new(64, 255, 255), Color::WHITE),
    LayerFeature::new("glacier", Color::new(128, 255, 255), Color::WHITE),
];

/// Water categories on the hydrology raster, largest first
pub const WATERS: [(&str, Color); 6] = [
    ("lake", Color::new(0, 96, 255)),
    ("ocean river", Color::new(0, 112, 255)),
    ("major river", Color::new(0, 128, 255)),
    ("river", Color::new(0, 160, 255)),
    ("minor river", Color::new(0, 192, 255)),
    ("stream", Color::new(0, 224, 255)),
];

pub const BROOK: Color = Color::new(0, 255, 255);

// =============================================================================
// VEGETATION
// =============================================================================

/// Dark-green ramp: denser vegetation gets darker.
pub fn stylized_green(v: u8) -> [u8; 3] {
    let v = v as f32;
    let channel = |slope: f32, offset: f32| (slope * v + offset).clamp(0.0, 255.0) as u8;
    [
        channel(-0.4549, 116.0),
        channel(-0.3804, 172.0),
        channel(-0.6118, 156.0),
    ]
}

/// Intensity-scaled blend toward pure green.
pub fn linear_green(v: u8, greenness: f32) -> [u8; 3] {
    let v = v as f32;
    let green = (v * greenness).clamp(0.0, 255.0) as u8;
    let rest = (v * (1.0 - greenness)).clamp(0.0, 255.0) as u8;
    [rest, green, rest]
}

pub fn draw_vegetation(canvas: &mut RgbImage, vegetation: &GrayImage, style: &VegetationStyle) {
    tracing::info!("Drawing vegetation...");
    let mask = GrayImage::from_fn(vegetation.width(), vegetation.height(), |x, y| {
        if vegetation.get_pixel(x, y)[0] > 0 { raster::SET } else { raster::UNSET }
    });
    let overlay = |x: u32, y: u32| {
        let v = vegetation.get_pixel(x, y)[0];
        match style.kind {
            VegetationKind::Stylized => stylized_green(v),
            VegetationKind::Linear => linear_green(v, style.greenness),
        }
    };
    raster::blend_with(canvas, &mask, style.alpha, overlay);
}

// =============================================================================
// BIOMES
// =============================================================================

/// Composite features of one category; each pixel takes its feature's paint.
fn draw_features(canvas: &mut RgbImage, biome: &RgbImage, features: &[LayerFeature], alpha: f32) {
    let (width, height) = biome.dimensions();
    let mut paint = vec![None; (width * height) as usize];
    let mut mask = raster::empty_mask(width, height);
    for (x, y, px) in biome.enumerate_pixels() {
        if let Some(feature) = features.iter().find(|f| f.key.0 == px.0) {
            paint[(y * width + x) as usize] = Some(feature.paint);
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    if raster::is_empty(&mask) {
        return;
    }
    raster::blend_with(canvas, &mask, alpha, |x, y| {
        paint[(y * width + x) as usize].unwrap_or(Color::BLACK).0
    });
}

pub fn draw_biomes(canvas: &mut RgbImage, biome: &RgbImage, config: &RenderConfig) {
    tracing::info!("Drawing deserts...");
    draw_features(canvas, biome, &DESERTS, config.desert_alpha);
    tracing::info!("Drawing glaciers...");
    draw_features(canvas, biome, &GLACIERS, config.glacier_alpha);
}

// =============================================================================
// WATER
// =============================================================================

pub fn water_mask(hydrology: &RgbImage, include_brook: bool) -> GrayImage {
    let mut keys: Vec<Color> = WATERS.iter().map(|&(_, c)| c).collect();
    if include_brook {
        keys.push(BROOK);
    }
    raster::color_match(hydrology, &keys)
}

/// Paint rivers and lakes opaquely in the water color.
pub fn draw_water(canvas: &mut RgbImage, hydrology: &RgbImage, config: &RenderConfig, color: Color) {
    tracing::info!("Drawing water...");
    let mask = water_mask(hydrology, config.brook);
    raster::overwrite(canvas, &mask, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const GREY: Rgb<u8> = Rgb([100, 100, 100]);

    #[test]
    fn test_stylized_green_ramp() {
        assert_eq!(stylized_green(0), [116, 172, 156]);
        assert_eq!(stylized_green(100), [70, 133, 94]);
        assert_eq!(stylized_green(255), [0, 74, 0]);
    }

    #[test]
    fn test_vegetation_only_touches_vegetated_pixels() {
        let mut canvas = RgbImage::from_pixel(2, 1, GREY);
        let mut vegetation = GrayImage::new(2, 1);
        vegetation.put_pixel(0, 0, Luma([100]));
        draw_vegetation(&mut canvas, &vegetation, &VegetationStyle::default());
        assert_eq!(canvas.get_pixel(0, 0).0, [70, 133, 94]);
        assert_eq!(canvas.get_pixel(1, 0), &GREY);
    }

    #[test]
    fn test_linear_vegetation_half_alpha() {
        let mut canvas = RgbImage::from_pixel(1, 1, GREY);
        let vegetation = GrayImage::from_pixel(1, 1, Luma([200]));
        let style = VegetationStyle {
            kind: VegetationKind::Linear,
            greenness: 0.75,
            alpha: 0.5,
        };
        draw_vegetation(&mut canvas, &vegetation, &style);
        assert_eq!(canvas.get_pixel(0, 0).0, [75, 125, 75]);
    }

    #[test]
    fn test_glacier_over_desert_and_alpha() {
        let mut canvas = RgbImage::from_pixel(3, 1, GREY);
        let mut biome = RgbImage::new(3, 1);
        biome.put_pixel(0, 0, Rgb(DESERTS[1].key.0));
        biome.put_pixel(1, 0, Rgb(GLACIERS[2].key.0));
        let config = RenderConfig { glacier_alpha: 0.5, ..RenderConfig::default() };
        draw_biomes(&mut canvas, &biome, &config);
        assert_eq!(canvas.get_pixel(0, 0).0, DESERTS[1].paint.0);
        // 0.5 * 100 + 0.5 * 255 = 177.5
        assert_eq!(canvas.get_pixel(1, 0).0, [178, 178, 178]);
        assert_eq!(canvas.get_pixel(2, 0), &GREY);
    }

    #[test]
    fn test_water_is_opaque_and_brook_gated() {
        let mut hydrology = RgbImage::new(3, 1);
        hydrology.put_pixel(0, 0, Rgb(WATERS[0].1 .0));
        hydrology.put_pixel(1, 0, Rgb(BROOK.0));
        let water = Color::new(10, 20, 30);

        let mut canvas = RgbImage::from_pixel(3, 1, GREY);
        draw_water(&mut canvas, &hydrology, &RenderConfig::default(), water);
        assert_eq!(canvas.get_pixel(0, 0).0, water.0);
        assert_eq!(canvas.get_pixel(1, 0), &GREY);

        let config = RenderConfig { brook: true, ..RenderConfig::default() };
        let mut canvas = RgbImage::from_pixel(3, 1, GREY);
        draw_water(&mut canvas, &hydrology, &config, water);
        assert_eq!(canvas.get_pixel(1, 0).0, water.0);
        assert_eq!(canvas.get_pixel(2, 0), &GREY);
    }
}
