//! Loading world exports from disk and saving rendered maps
//!
//! A world export folder holds the thematic bitmaps under their short
//! legends-viewer names plus a `world.json` describing sites, entities and
//! wars:
//!
//! | file       | layer      |
//! |------------|------------|
//! | `el.bmp`   | elevation  |
//! | `veg.bmp`  | vegetation |
//! | `bm.bmp`   | biome      |
//! | `hyd.bmp`  | hydrology  |
//! | `str.bmp`  | structures (optional) |

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, RgbImage};

use crate::error::{MapError, Result};
use crate::layers::{elevation_from_rgb, LayerSet};
use crate::world::WorldModel;

pub const ELEVATION_FILE: &str = "el.bmp";
pub const VEGETATION_FILE: &str = "veg.bmp";
pub const BIOME_FILE: &str = "bm.bmp";
pub const HYDROLOGY_FILE: &str = "hyd.bmp";
pub const STRUCTURES_FILE: &str = "str.bmp";
pub const WORLD_FILE: &str = "world.json";

fn load_rgb(dir: &Path, file: &str, layer: &'static str) -> Result<RgbImage> {
    let path = dir.join(file);
    if !path.is_file() {
        return Err(MapError::MissingLayer(layer));
    }
    tracing::debug!("Loading {} from {}", layer, path.display());
    Ok(image::open(&path)?.to_rgb8())
}

fn load_gray(dir: &Path, file: &str, layer: &'static str) -> Result<GrayImage> {
    let path = dir.join(file);
    if !path.is_file() {
        return Err(MapError::MissingLayer(layer));
    }
    tracing::debug!("Loading {} from {}", layer, path.display());
    Ok(image::open(&path)?.to_luma8())
}

/// Load every layer of a world export and check their sizes.
pub fn load_layers(dir: &Path) -> Result<LayerSet> {
    tracing::info!("Loading layers from {}...", dir.display());
    let elevation = elevation_from_rgb(&load_rgb(dir, ELEVATION_FILE, "elevation")?);
    let structures = if dir.join(STRUCTURES_FILE).is_file() {
        Some(load_rgb(dir, STRUCTURES_FILE, "structures")?)
    } else {
        tracing::debug!("No structures layer in {}", dir.display());
        None
    };
    let layers = LayerSet {
        elevation,
        vegetation: load_gray(dir, VEGETATION_FILE, "vegetation")?,
        biome: load_rgb(dir, BIOME_FILE, "biome")?,
        hydrology: load_rgb(dir, HYDROLOGY_FILE, "hydrology")?,
        structures,
    };
    layers.validate()?;
    let (width, height) = layers.dimensions();
    tracing::info!("Loaded {}x{} layers", width, height);
    Ok(layers)
}

/// Load `world.json`. A missing file yields an empty world.
pub fn load_world(dir: &Path) -> Result<WorldModel> {
    let path = dir.join(WORLD_FILE);
    if !path.is_file() {
        tracing::warn!("No {} in {}, drawing without history", WORLD_FILE, dir.display());
        return Ok(WorldModel::default());
    }
    let world: WorldModel = serde_json::from_str(&fs::read_to_string(&path)?)?;
    tracing::info!(
        "Loaded {} sites, {} entities, {} wars",
        world.sites.len(),
        world.entities.len(),
        world.wars.len()
    );
    Ok(world)
}

/// `<dir>/<world name> - <palette>.png`
pub fn output_path(dir: &Path, world_name: &str, palette: &str) -> PathBuf {
    dir.join(format!("{} - {}.png", world_name, palette))
}

pub fn save_png(canvas: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    canvas.save_with_format(path, ImageFormat::Png)?;
    tracing::info!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("armap-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_layers(dir: &Path, size: (u32, u32)) {
        let (w, h) = size;
        for file in [ELEVATION_FILE, VEGETATION_FILE, BIOME_FILE, HYDROLOGY_FILE] {
            RgbImage::from_pixel(w, h, Rgb([200, 200, 200]))
                .save_with_format(dir.join(file), ImageFormat::Bmp)
                .unwrap();
        }
    }

    #[test]
    fn test_load_layers_without_structures() {
        let dir = scratch_dir("layers");
        write_layers(&dir, (6, 4));
        let layers = load_layers(&dir).unwrap();
        assert_eq!(layers.dimensions(), (6, 4));
        assert_eq!(layers.elevation.get_pixel(0, 0)[0], 200);
        assert!(layers.structures.is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_layer_is_reported() {
        let dir = scratch_dir("missing");
        write_layers(&dir, (4, 4));
        fs::remove_file(dir.join(HYDROLOGY_FILE)).unwrap();
        assert!(matches!(load_layers(&dir), Err(MapError::MissingLayer("hydrology"))));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_world_defaults_when_absent() {
        let dir = scratch_dir("world");
        assert!(load_world(&dir).unwrap().sites.is_empty());
        fs::write(dir.join(WORLD_FILE), r#"{"name": "Oddworld", "sites": []}"#).unwrap();
        assert_eq!(load_world(&dir).unwrap().name.as_deref(), Some("Oddworld"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_png_round_trips() {
        let dir = scratch_dir("save");
        let path = output_path(&dir.join("out"), "Oddworld", "classic");
        assert!(path.ends_with("Oddworld - classic.png"));
        let canvas = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        save_png(&canvas, &path).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), canvas);
        fs::remove_dir_all(&dir).unwrap();
    }
}
