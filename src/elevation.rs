//! Elevation banding
//!
//! Thresholds the elevation raster at every palette key, cleans each band
//! with a 3x3 opening, and paints the bands from lowest to highest so that
//! nested elevation rings layer naturally. Contour lines trace the sea level
//! band and every band above it. The sea level band doubles as the land mask
//! used by later stages.

use image::{GrayImage, RgbImage};
use imageproc::contours::find_contours;

use crate::config::{Color, ColorBandTable, RenderConfig};
use crate::raster;

/// Result of the elevation stage
pub struct BandOutput {
    /// Freshly initialized canvas with bands and contours painted
    pub canvas: RgbImage,
    /// Pixels at or above sea level
    pub land: GrayImage,
}

/// Band mask at one intensity: threshold then opening.
pub fn band_mask(elevation: &GrayImage, level: u8) -> GrayImage {
    raster::open_square(&raster::threshold_at_least(elevation, level))
}

/// Only levels that paint a band or carry the sea level contour are visited;
/// other thresholds cannot change the canvas.
fn visited_levels(bands: &ColorBandTable, sea_level: u8) -> Vec<u8> {
    let mut levels: Vec<u8> = bands.iter().map(|(k, _)| k).collect();
    if !levels.contains(&sea_level) {
        levels.push(sea_level);
        levels.sort_unstable();
    }
    levels
}

/// Paint the banded elevation base layer and extract the land mask.
pub fn draw_elevation(
    elevation: &GrayImage,
    bands: &ColorBandTable,
    config: &RenderConfig,
) -> BandOutput {
    tracing::info!("Drawing elevation ({} bands)...", bands.len());
    let (width, height) = elevation.dimensions();
    let mut canvas = RgbImage::from_pixel(width, height, bands.base_color().pixel());
    let mut land = raster::empty_mask(width, height);
    let topology = config.topology_color.scaled(config.contour_brightness);

    for level in visited_levels(bands, config.sea_level) {
        let mask = band_mask(elevation, level);
        let band_color = bands.get(level);

        if let Some(color) = band_color {
            raster::overwrite(&mut canvas, &mask, color);
        }

        if level == config.sea_level {
            draw_outline(&mut canvas, &mask, config.sea_level_color);
            land = mask;
        } else if band_color.is_some() && level > config.sea_level {
            draw_outline(&mut canvas, &mask, topology);
        }
    }

    tracing::debug!("Land covers {} pixels", raster::count(&land));
    BandOutput { canvas, land }
}

/// Trace every outer and hole border of the mask as a 1px line.
fn draw_outline(canvas: &mut RgbImage, mask: &GrayImage, color: Color) {
    if raster::is_empty(mask) {
        return;
    }
    for contour in find_contours::<i32>(mask) {
        for p in &contour.points {
            canvas.put_pixel(p.x as u32, p.y as u32, color.pixel());
        }
    }
}
