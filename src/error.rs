//! Error types for map rendering
//!
//! Only fatal conditions live here. Recoverable conditions (no qualifying
//! sites, empty road masks, unknown war references) are logged by the stage
//! that meets them and never surface as errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Missing raster layer: {0}")]
    MissingLayer(&'static str),

    #[error("Layer {layer} is {found:?}, expected {expected:?}")]
    DimensionMismatch {
        layer: &'static str,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Color band table has no entries")]
    EmptyColorTable,

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid band key: {0}")]
    InvalidBandKey(String),

    #[error("Territory requested but no land mask is available")]
    NoLandMask,

    #[error("Unknown palette: {0}")]
    UnknownPalette(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
