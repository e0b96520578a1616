//! Farmland tint

use image::RgbImage;

use crate::config::AgricultureStyle;
use crate::raster;

use super::{structure_mask, StructureKind};

/// Blend the agriculture color over crops, pastures, meadows, woodlands
/// and orchards.
pub fn draw_agriculture(canvas: &mut RgbImage, structures: &RgbImage, style: &AgricultureStyle) {
    let farmland = structure_mask(structures, |k: StructureKind| k.is_farmland());
    if raster::is_empty(&farmland) {
        tracing::debug!("No farmland on the structures layer");
        return;
    }
    tracing::info!("Drawing agriculture...");
    raster::blend_flat(canvas, &farmland, style.color, style.alpha);
}
