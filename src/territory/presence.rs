//! Presence masks: the area an entity's settlements visibly influence
//!
//! Every settlement stamps a filled disk; a strong disk dilation followed
//! by a weaker erosion merges nearby settlements into one smooth blob.

use image::GrayImage;
use imageproc::drawing::draw_filled_circle_mut;

use crate::raster;

/// Radius of the disk stamped at each settlement
pub const SETTLEMENT_RADIUS: i32 = 8;
/// Radius of the disk used for each dilation and erosion pass
pub const SPREAD_RADIUS: f64 = 7.0;
pub const DILATE_PASSES: usize = 10;
pub const ERODE_PASSES: usize = 6;

/// Build the presence mask for one entity from its settlement centers.
pub fn presence_mask(centers: &[(i32, i32)], width: u32, height: u32) -> GrayImage {
    let mut mask = raster::empty_mask(width, height);
    for &center in centers {
        draw_filled_circle_mut(&mut mask, center, SETTLEMENT_RADIUS, raster::SET);
    }
    let grown = raster::dilate_disk(&mask, SPREAD_RADIUS, DILATE_PASSES);
    raster::erode_disk(&grown, SPREAD_RADIUS, ERODE_PASSES)
}
