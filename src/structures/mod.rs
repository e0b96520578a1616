//! Man-made features on the structures raster
//!
//! The structures raster color-codes every built tile. Paths (roads,
//! bridges, tunnels) are simplified and drawn as one road network;
//! farmland is tinted as a light agricultural overlay.

pub mod agriculture;
pub mod roads;

use image::{GrayImage, RgbImage};

use crate::config::Color;
use crate::raster;

pub use agriculture::draw_agriculture;
pub use roads::{draw_roads, merge_paths, MergeStats};

/// Kind of built tile on the structures raster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Tunnel,
    StoneBridge,
    StoneRoad,
    OtherBridge,
    OtherRoad,
    Crops,
    Pasture,
    Meadow,
    Woodland,
    Orchard,
}

impl StructureKind {
    /// True for tiles that belong to the road network.
    pub fn is_path(&self) -> bool {
        matches!(
            self,
            StructureKind::Tunnel
                | StructureKind::StoneBridge
                | StructureKind::StoneRoad
                | StructureKind::OtherBridge
                | StructureKind::OtherRoad
        )
    }

    pub fn is_farmland(&self) -> bool {
        !self.is_path()
    }
}

/// Exact structure raster colors. Crops come in three shades.
pub const STRUCTURE_COLORS: [(StructureKind, Color); 12] = [
    (StructureKind::Tunnel, Color::new(20, 20, 20)),
    (StructureKind::StoneBridge, Color::new(224, 224, 224)),
    (StructureKind::StoneRoad, Color::new(192, 192, 192)),
    (StructureKind::OtherBridge, Color::new(180, 167, 20)),
    (StructureKind::OtherRoad, Color::new(150, 127, 20)),
    (StructureKind::Crops, Color::new(255, 128, 0)),
    (StructureKind::Crops, Color::new(255, 160, 0)),
    (StructureKind::Crops, Color::new(255, 192, 0)),
    (StructureKind::Pasture, Color::new(0, 255, 0)),
    (StructureKind::Meadow, Color::new(64, 255, 0)),
    (StructureKind::Woodland, Color::new(0, 128, 0)),
    (StructureKind::Orchard, Color::new(0, 160, 0)),
];

/// Mask of every structure tile whose kind passes `filter`.
pub fn structure_mask(structures: &RgbImage, filter: impl Fn(StructureKind) -> bool) -> GrayImage {
    let colors: Vec<Color> = STRUCTURE_COLORS
        .iter()
        .filter(|(kind, _)| filter(*kind))
        .map(|&(_, color)| color)
        .collect();
    raster::color_match(structures, &colors)
}

/// Union of roads, bridges and tunnels.
pub fn path_mask(structures: &RgbImage) -> GrayImage {
    structure_mask(structures, |k| k.is_path())
}
