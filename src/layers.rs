//! Thematic raster layers consumed by the renderer
//!
//! Layers arrive already decoded. Elevation and vegetation are grayscale
//! intensities; biome, hydrology and structures are color-coded rasters
//! whose meaning is carried by exact RGB values.

use image::{GrayImage, Luma, RgbImage};

use crate::error::{MapError, Result};

/// The five input rasters of one world, all of identical dimensions.
#[derive(Clone, Debug)]
pub struct LayerSet {
    pub elevation: GrayImage,
    pub vegetation: GrayImage,
    pub biome: RgbImage,
    pub hydrology: RgbImage,
    /// Only needed when roads or agriculture are drawn
    pub structures: Option<RgbImage>,
}

impl LayerSet {
    pub fn width(&self) -> u32 {
        self.elevation.width()
    }

    pub fn height(&self) -> u32 {
        self.elevation.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.elevation.dimensions()
    }

    /// Check that every layer matches the elevation raster's size.
    pub fn validate(&self) -> Result<()> {
        let expected = self.dimensions();
        if expected.0 == 0 || expected.1 == 0 {
            return Err(MapError::DimensionMismatch {
                layer: "elevation",
                expected: (1, 1),
                found: expected,
            });
        }
        let mut layers = vec![
            ("vegetation", self.vegetation.dimensions()),
            ("biome", self.biome.dimensions()),
            ("hydrology", self.hydrology.dimensions()),
        ];
        if let Some(structures) = &self.structures {
            layers.push(("structures", structures.dimensions()));
        }
        for (layer, found) in layers {
            if found != expected {
                return Err(MapError::DimensionMismatch { layer, expected, found });
            }
        }
        Ok(())
    }

    pub fn structures(&self) -> Result<&RgbImage> {
        self.structures
            .as_ref()
            .ok_or(MapError::MissingLayer("structures"))
    }
}

/// Convert a color elevation export to grayscale intensity.
///
/// Pixels with no red component encode water depth in the blue channel and
/// are first flattened to a grey of `0.73 * blue`. Everything is then reduced
/// with the usual luma weights.
pub fn elevation_from_rgb(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let (r, g, b) = if r == 0 {
            let grey = (b as f32 * 0.73) as u8;
            (grey, grey, grey)
        } else {
            (r, g, b)
        };
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
