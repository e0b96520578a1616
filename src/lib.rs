//! Stylized world map renderer
//!
//! Composites pre-rasterized thematic layers (elevation, vegetation, biome,
//! hydrology, structures) and a world history model (sites, entities, wars)
//! into a single colored map.

pub mod config;
pub mod elevation;
pub mod error;
pub mod export;
pub mod layers;
pub mod overlay;
pub mod raster;
pub mod render;
pub mod structures;
pub mod territory;
pub mod thematic;
pub mod tilemap;
pub mod world;

pub use config::{Color, ColorBandTable, Palette, RenderConfig};
pub use error::{MapError, Result};
pub use layers::LayerSet;
pub use render::{render, MapRenderer};
pub use world::WorldModel;
