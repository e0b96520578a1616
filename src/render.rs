//! Map rendering pipeline
//!
//! Stages run in a fixed order, each on the canvas left by the previous one:
//!
//! 1. Elevation bands and contours (creates the canvas and the land mask)
//! 2. Vegetation
//! 3. Deserts, then glaciers
//! 4. Water
//! 5. Territories (optional)
//! 6. Agriculture (optional)
//! 7. Roads (optional)
//! 8. Settlement markers (optional)
//! 9. Reference grid (optional)
//!
//! A render is a pure function of its inputs. Palettes share nothing but
//! read-only inputs, so they render in parallel.

use image::RgbImage;
use rayon::prelude::*;

use crate::config::{ColorBandTable, Palette, RenderConfig};
use crate::elevation::{draw_elevation, BandOutput};
use crate::error::Result;
use crate::layers::LayerSet;
use crate::overlay::{draw_grid, draw_markers};
use crate::structures::{draw_agriculture, draw_roads};
use crate::territory::draw_territories;
use crate::thematic::{draw_biomes, draw_vegetation, draw_water};
use crate::world::WorldModel;

/// Validated inputs shared by every render of one world
pub struct MapRenderer<'a> {
    layers: &'a LayerSet,
    world: WorldModel,
    config: &'a RenderConfig,
}

impl<'a> MapRenderer<'a> {
    /// Validate the layers and apply the minimum-settlement entity filter.
    pub fn new(layers: &'a LayerSet, world: &WorldModel, config: &'a RenderConfig) -> Result<Self> {
        layers.validate()?;
        if config.roads || config.agriculture.enabled {
            layers.structures()?;
        }
        let mut world = world.clone();
        if config.min_settlements > 0 {
            world.retain_major_entities(config.min_settlements);
        }
        Ok(Self { layers, world, config })
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    /// Render one map with the given elevation bands.
    pub fn render(&self, bands: &ColorBandTable) -> Result<RgbImage> {
        let config = self.config;
        let layers = self.layers;

        let BandOutput { mut canvas, land } = draw_elevation(&layers.elevation, bands, config);
        draw_vegetation(&mut canvas, &layers.vegetation, &config.vegetation);
        draw_biomes(&mut canvas, &layers.biome, config);
        draw_water(&mut canvas, &layers.hydrology, config, config.water_color_for(bands));

        if config.territory {
            draw_territories(&mut canvas, &self.world, Some(&land), config)?;
        }
        if config.agriculture.enabled {
            draw_agriculture(&mut canvas, layers.structures()?, &config.agriculture);
        }
        if config.roads {
            draw_roads(&mut canvas, layers.structures()?, config);
        }
        if config.markers.enabled {
            draw_markers(&mut canvas, &self.world, &config.markers);
        }
        if config.grid.enabled {
            draw_grid(&mut canvas, &config.grid);
        }

        Ok(canvas)
    }

    /// Render one map per palette, in parallel. Results keep palette order.
    pub fn render_palettes(&self, palettes: &[&Palette]) -> Result<Vec<(String, RgbImage)>> {
        palettes
            .par_iter()
            .map(|palette| -> Result<(String, RgbImage)> {
                tracing::info!("Rendering palette {}...", palette.name);
                let canvas = self.render(&palette.bands)?;
                Ok((palette.name.clone(), canvas))
            })
            .collect()
    }
}

/// One-shot render of a single palette.
pub fn render(
    layers: &LayerSet,
    world: &WorldModel,
    bands: &ColorBandTable,
    config: &RenderConfig,
) -> Result<RgbImage> {
    MapRenderer::new(layers, world, config)?.render(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;
    use crate::error::MapError;
    use crate::thematic::WATERS;
    use crate::world::{Entity, EntityId, Rect, Site, SiteId};
    use image::{GrayImage, Luma, Rgb};

    const BLUE: Color = Color::new(0, 0, 200);
    const GREEN: Color = Color::new(0, 180, 0);

    fn bands() -> ColorBandTable {
        ColorBandTable::new(vec![(0, BLUE), (73, GREEN)]).unwrap()
    }

    /// Square island with a small lake and some vegetation.
    fn island() -> LayerSet {
        let (w, h) = (64, 48);
        let inside = |x: u32, y: u32| (8..56).contains(&x) && (8..40).contains(&y);
        let lake = |x: u32, y: u32| (30..34).contains(&x) && (20..24).contains(&y);
        LayerSet {
            elevation: GrayImage::from_fn(w, h, |x, y| {
                if inside(x, y) { Luma([120]) } else { Luma([30]) }
            }),
            vegetation: GrayImage::from_fn(w, h, |x, _| if x < 32 { Luma([90]) } else { Luma([0]) }),
            biome: RgbImage::new(w, h),
            hydrology: RgbImage::from_fn(w, h, |x, y| {
                if lake(x, y) { Rgb(WATERS[0].1 .0) } else { Rgb([0, 0, 0]) }
            }),
            structures: Some(RgbImage::new(w, h)),
        }
    }

    fn realm() -> WorldModel {
        let site = |id: u32, x: i32, y: i32| Site {
            id: SiteId(id),
            site_type: "castle".to_string(),
            name: format!("keep {}", id),
            translated_name: None,
            rect: Rect::new(x, y, x, y),
            ruler: Some(EntityId(1)),
            population: None,
        };
        WorldModel {
            name: Some("Testworld".to_string()),
            sites: vec![site(1, 20, 20), site(2, 44, 28)],
            entities: vec![Entity { id: EntityId(1), name: "the realm".to_string() }],
            wars: Vec::new(),
        }
    }

    fn full_config() -> RenderConfig {
        let mut config = RenderConfig {
            territory: true,
            roads: true,
            ..RenderConfig::default()
        };
        config.agriculture.enabled = true;
        config.markers.enabled = true;
        config.grid.enabled = true;
        config
    }

    #[test]
    fn test_water_drawn_over_vegetation() {
        let canvas = render(&island(), &realm(), &bands(), &RenderConfig::default()).unwrap();
        // Lake uses the band below sea level even where vegetation is dense.
        assert_eq!(canvas.get_pixel(31, 21).0, BLUE.0);
        assert_eq!(canvas.get_pixel(60, 2).0, BLUE.0);
        assert_ne!(canvas.get_pixel(20, 30).0, GREEN.0);
        assert_eq!(canvas.get_pixel(45, 30).0, GREEN.0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let layers = island();
        let config = full_config();
        let first = render(&layers, &realm(), &bands(), &config).unwrap();
        let second = render(&layers, &realm(), &bands(), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_roads_without_structures_layer_abort() {
        let mut layers = island();
        layers.structures = None;
        let config = RenderConfig { roads: true, ..RenderConfig::default() };
        assert!(matches!(
            render(&layers, &realm(), &bands(), &config),
            Err(MapError::MissingLayer("structures"))
        ));
        // Without roads or agriculture the layer is not needed.
        assert!(render(&layers, &realm(), &bands(), &RenderConfig::default()).is_ok());
    }

    #[test]
    fn test_mismatched_layer_aborts() {
        let mut layers = island();
        layers.vegetation = GrayImage::new(10, 10);
        assert!(matches!(
            render(&layers, &realm(), &bands(), &RenderConfig::default()),
            Err(MapError::DimensionMismatch { layer: "vegetation", .. })
        ));
    }

    #[test]
    fn test_territory_stops_at_the_coast() {
        let config = RenderConfig { territory: true, ..RenderConfig::default() };
        let plain = render(&island(), &realm(), &bands(), &RenderConfig::default()).unwrap();
        let ruled = render(&island(), &realm(), &bands(), &config).unwrap();
        assert_ne!(plain.get_pixel(44, 20), ruled.get_pixel(44, 20));
        assert_eq!(plain.get_pixel(2, 2), ruled.get_pixel(2, 2));
        assert_eq!(plain.get_pixel(60, 44), ruled.get_pixel(60, 44));
    }

    #[test]
    fn test_min_settlements_filters_small_entities() {
        let config = RenderConfig {
            territory: true,
            min_settlements: 2,
            ..RenderConfig::default()
        };
        let layers = island();
        let renderer = MapRenderer::new(&layers, &realm(), &config).unwrap();
        assert!(renderer.world().entities.is_empty());
        let plain = render(&layers, &realm(), &bands(), &RenderConfig::default()).unwrap();
        assert_eq!(renderer.render(&bands()).unwrap(), plain);
    }

    #[test]
    fn test_render_palettes_keeps_order() {
        let layers = island();
        let config = RenderConfig::default();
        let renderer = MapRenderer::new(&layers, &realm(), &config).unwrap();
        let dark = Palette { name: "dark".to_string(), bands: bands() };
        let light = Palette {
            name: "light".to_string(),
            bands: ColorBandTable::new(vec![(0, Color::WHITE), (73, GREEN)]).unwrap(),
        };
        let maps = renderer.render_palettes(&[&light, &dark]).unwrap();
        assert_eq!(maps[0].0, "light");
        assert_eq!(maps[1].0, "dark");
        assert_eq!(maps[0].1.get_pixel(60, 2).0, Color::WHITE.0);
        assert_eq!(maps[1].1, renderer.render(&bands()).unwrap());
    }
}
