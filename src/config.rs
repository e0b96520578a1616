//! Render configuration and color palettes
//!
//! All tunable constants of a render live in [`RenderConfig`], which is
//! passed by reference into every stage. Palettes map elevation band keys to
//! colors and are loaded from small TOML files:
//!
//! ```toml
//! name = "classic"
//!
//! [colors]
//! 0 = "#17314a"
//! 73 = "#6b8f4e"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use image::Rgb;
use serde::Deserialize;

use crate::error::{MapError, Result};

/// Default sea level intensity on the elevation raster
pub const SEA_LEVEL: u8 = 73;

// =============================================================================
// COLORS
// =============================================================================

/// An RGB color. Deserializes from `"#rrggbb"` or `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Color(pub [u8; 3]);

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Channels([u8; 3]),
}

impl TryFrom<ColorRepr> for Color {
    type Error = MapError;

    fn try_from(repr: ColorRepr) -> Result<Self> {
        match repr {
            ColorRepr::Hex(s) => Color::from_hex(&s),
            ColorRepr::Channels(c) => Ok(Color(c)),
        }
    }
}

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b])
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(MapError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| MapError::InvalidColor(hex.to_string()))
        };
        Ok(Color([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Scale brightness, truncating each channel.
    pub fn scaled(self, factor: f32) -> Self {
        let [r, g, b] = self.0;
        let s = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Color([s(r), s(g), s(b)])
    }

    pub fn pixel(self) -> Rgb<u8> {
        Rgb(self.0)
    }
}

/// Faction colors used for territory fills, hatching and borders.
pub const DEFAULT_ENTITY_COLORS: [Color; 20] = [
    Color::new(255, 179, 0),
    Color::new(128, 62, 117),
    Color::new(255, 104, 0),
    Color::new(166, 189, 215),
    Color::new(193, 0, 32),
    Color::new(206, 162, 98),
    Color::new(129, 112, 102),
    Color::new(0, 125, 52),
    Color::new(246, 118, 142),
    Color::new(0, 83, 138),
    Color::new(255, 122, 92),
    Color::new(83, 55, 122),
    Color::new(255, 142, 0),
    Color::new(179, 40, 81),
    Color::new(244, 200, 0),
    Color::new(127, 24, 13),
    Color::new(147, 170, 0),
    Color::new(89, 51, 21),
    Color::new(241, 58, 19),
    Color::new(35, 44, 22),
];

// =============================================================================
// COLOR BAND TABLE
// =============================================================================

/// Sparse mapping from elevation intensity to band color, ordered by key.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBandTable {
    bands: BTreeMap<u8, Color>,
}

impl ColorBandTable {
    pub fn new(entries: impl IntoIterator<Item = (u8, Color)>) -> Result<Self> {
        let mut bands = BTreeMap::new();
        for (key, color) in entries {
            if bands.insert(key, color).is_some() {
                return Err(MapError::InvalidBandKey(format!("duplicate key {}", key)));
            }
        }
        if bands.is_empty() {
            return Err(MapError::EmptyColorTable);
        }
        Ok(Self { bands })
    }

    pub fn get(&self, key: u8) -> Option<Color> {
        self.bands.get(&key).copied()
    }

    /// Bands in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Color)> + '_ {
        self.bands.iter().map(|(&k, &c)| (k, c))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Color of the lowest band; the canvas starts out in this color.
    pub fn base_color(&self) -> Color {
        self.bands.values().next().copied().unwrap_or(Color::BLACK)
    }

    /// Color of the highest band strictly below `level`, falling back to the
    /// lowest band.
    pub fn color_below(&self, level: u8) -> Color {
        self.bands
            .range(..level)
            .next_back()
            .map(|(_, &c)| c)
            .unwrap_or_else(|| self.base_color())
    }
}

/// A named color band table, one per output map.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: String,
    pub bands: ColorBandTable,
}

#[derive(Deserialize)]
struct RawPalette {
    name: String,
    colors: BTreeMap<String, String>,
}

impl Palette {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawPalette = toml::from_str(text)?;
        let mut entries = Vec::with_capacity(raw.colors.len());
        for (key, hex) in &raw.colors {
            let band: u8 = key
                .trim()
                .parse()
                .map_err(|_| MapError::InvalidBandKey(key.clone()))?;
            entries.push((band, Color::from_hex(hex)?));
        }
        Ok(Self {
            name: raw.name,
            bands: ColorBandTable::new(entries)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Load every `*.toml` palette in a folder, sorted by name.
    /// Files that fail to parse are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>> {
        let mut palettes = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match Self::load(&path) {
                Ok(palette) => palettes.push(palette),
                Err(e) => tracing::warn!("Skipping palette {}: {}", path.display(), e),
            }
        }
        palettes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(palettes)
    }

    /// Pick palettes by name, in the requested order. No names means all.
    pub fn select<'a>(palettes: &'a [Palette], names: &[String]) -> Result<Vec<&'a Palette>> {
        if names.is_empty() {
            return Ok(palettes.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                palettes
                    .iter()
                    .find(|p| &p.name == name)
                    .ok_or_else(|| MapError::UnknownPalette(name.clone()))
            })
            .collect()
    }
}

// =============================================================================
// RENDER CONFIGURATION
// =============================================================================

/// How vegetation intensity is turned into an overlay color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VegetationKind {
    /// Fixed per-channel linear ramp toward dark green
    #[default]
    Stylized,
    /// Intensity-scaled blend toward pure green
    Linear,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VegetationStyle {
    pub kind: VegetationKind,
    /// Share of green in the linear ramp (0.0-1.0)
    pub greenness: f32,
    pub alpha: f32,
}

impl Default for VegetationStyle {
    fn default() -> Self {
        Self {
            kind: VegetationKind::Stylized,
            greenness: 0.8,
            alpha: 1.0,
        }
    }
}

/// Farmland overlay drawn from the structures layer
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgricultureStyle {
    pub enabled: bool,
    pub color: Color,
    pub alpha: f32,
}

impl Default for AgricultureStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::new(64, 85, 64),
            alpha: 0.1,
        }
    }
}

/// Settlement dots sized by site type
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub enabled: bool,
    pub big_radius: i32,
    pub medium_radius: i32,
    pub small_radius: i32,
    /// Fortified sites (towers, castles, fortresses)
    pub primary_color: Color,
    pub secondary_color: Color,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            big_radius: 3,
            medium_radius: 2,
            small_radius: 1,
            primary_color: Color::BLACK,
            secondary_color: Color::new(64, 64, 64),
        }
    }
}

/// Regular reference grid drawn over the finished map
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridStyle {
    pub enabled: bool,
    pub spacing: u32,
    pub width: u32,
    pub offset: u32,
    pub color: Color,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            spacing: 43,
            width: 1,
            offset: 5,
            color: Color::new(200, 200, 200),
        }
    }
}

/// Immutable configuration for one render
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    // =========================================================================
    // Elevation
    // =========================================================================
    /// Elevation intensity at which land begins
    pub sea_level: u8,
    /// Contour color of the sea level band
    pub sea_level_color: Color,
    /// Contour color of bands above sea level, before brightness scaling
    pub topology_color: Color,
    pub contour_brightness: f32,

    // =========================================================================
    // Thematic layers
    // =========================================================================
    pub vegetation: VegetationStyle,
    pub desert_alpha: f32,
    pub glacier_alpha: f32,
    /// Include brooks in the water mask
    pub brook: bool,
    /// Flat water color; defaults to the band just below sea level
    pub water_color: Option<Color>,

    // =========================================================================
    // Territory
    // =========================================================================
    pub territory: bool,
    pub territory_alpha: f32,
    pub entity_colors: Vec<Color>,
    /// Entities must rule more than this many sites to be drawn (0 = no filter)
    pub min_settlements: usize,

    // =========================================================================
    // Structures
    // =========================================================================
    pub roads: bool,
    /// Bridge nearby road fragments; when false the raw road mask is drawn
    pub merge_roads: bool,
    /// Fragments closer than this (pixels) get bridged
    pub road_bridge_distance: f64,
    pub road_color: Color,
    pub agriculture: AgricultureStyle,

    // =========================================================================
    // Overlays
    // =========================================================================
    pub markers: MarkerStyle,
    pub grid: GridStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sea_level: SEA_LEVEL,
            sea_level_color: Color::new(44, 64, 75),
            topology_color: Color::new(57, 62, 71),
            contour_brightness: 0.8,
            vegetation: VegetationStyle::default(),
            desert_alpha: 1.0,
            glacier_alpha: 0.7,
            brook: false,
            water_color: None,
            territory: false,
            territory_alpha: 0.3,
            entity_colors: DEFAULT_ENTITY_COLORS.to_vec(),
            min_settlements: 0,
            roads: false,
            merge_roads: true,
            road_bridge_distance: 32.0,
            road_color: Color::new(64, 64, 64),
            agriculture: AgricultureStyle::default(),
            markers: MarkerStyle::default(),
            grid: GridStyle::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Resolved water color for a palette.
    pub fn water_color_for(&self, bands: &ColorBandTable) -> Color {
        self.water_color
            .unwrap_or_else(|| bands.color_below(self.sea_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("0a0B0c").unwrap(), Color::new(10, 11, 12));
        assert!(Color::from_hex("#ff80").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_scaled_truncates() {
        assert_eq!(Color::new(100, 51, 255).scaled(0.8), Color::new(80, 40, 204));
    }

    #[test]
    fn test_band_table_rejects_empty() {
        assert!(matches!(
            ColorBandTable::new(Vec::new()),
            Err(MapError::EmptyColorTable)
        ));
    }

    #[test]
    fn test_color_below_sea_level() {
        let table = ColorBandTable::new(vec![
            (0, Color::new(0, 0, 100)),
            (72, Color::new(0, 0, 200)),
            (73, Color::new(0, 200, 0)),
        ])
        .unwrap();
        assert_eq!(table.color_below(73), Color::new(0, 0, 200));
        assert_eq!(table.color_below(0), Color::new(0, 0, 100));
        assert_eq!(table.base_color(), Color::new(0, 0, 100));
    }

    #[test]
    fn test_palette_from_toml() {
        let palette = Palette::from_toml_str(
            r##"
            name = "classic"

            [colors]
            0 = "#000080"
            73 = "#00ff00"
            200 = "#ffffff"
            "##,
        )
        .unwrap();
        assert_eq!(palette.name, "classic");
        assert_eq!(palette.bands.len(), 3);
        assert_eq!(palette.bands.get(73), Some(Color::new(0, 255, 0)));
    }

    #[test]
    fn test_palette_rejects_out_of_range_key() {
        let result = Palette::from_toml_str(
            r##"
            name = "bad"
            [colors]
            300 = "#ffffff"
            "##,
        );
        assert!(matches!(result, Err(MapError::InvalidBandKey(_))));
    }

    #[test]
    fn test_select_palettes_by_name() {
        let palette = |name: &str| Palette {
            name: name.to_string(),
            bands: ColorBandTable::new(vec![(0, Color::BLACK)]).unwrap(),
        };
        let all = vec![palette("classic"), palette("dusk")];
        assert_eq!(Palette::select(&all, &[]).unwrap().len(), 2);
        let picked = Palette::select(&all, &["dusk".to_string()]).unwrap();
        assert_eq!(picked[0].name, "dusk");
        assert!(matches!(
            Palette::select(&all, &["neon".to_string()]),
            Err(MapError::UnknownPalette(_))
        ));
    }

    #[test]
    fn test_render_config_partial_toml() {
        let config = RenderConfig::from_toml_str(
            r##"
            sea_level = 80
            territory = true
            water_color = "#102030"

            [vegetation]
            kind = "linear"

            [grid]
            enabled = true
            color = [1, 2, 3]
            "##,
        )
        .unwrap();
        assert_eq!(config.sea_level, 80);
        assert!(config.territory);
        assert_eq!(config.water_color, Some(Color::new(16, 32, 48)));
        assert_eq!(config.vegetation.kind, VegetationKind::Linear);
        assert_eq!(config.vegetation.greenness, 0.8);
        assert!(config.grid.enabled);
        assert_eq!(config.grid.spacing, 43);
        assert_eq!(config.grid.color, Color::new(1, 2, 3));
        assert_eq!(config.entity_colors.len(), 20);
    }
}
