//! Political territories
//!
//! Ruled settlements seed a Voronoi partition of the map. Each ruling
//! entity's territory is its smoothed settlement presence clipped to the
//! partition cells it won, minus the presence of every entity it is at war
//! with, minus water. Territories get a translucent fill and a solid
//! outline; zones contested by warring entities are hatched in between.

pub mod presence;
pub mod voronoi;

use std::collections::HashMap;
use std::fmt;

use image::{GrayImage, RgbImage};

use crate::config::{Color, RenderConfig, DEFAULT_ENTITY_COLORS};
use crate::error::{MapError, Result};
use crate::raster;
use crate::tilemap::Tilemap;
use crate::world::{EntityId, WarTable, WorldModel};

pub use presence::presence_mask;
pub use voronoi::{rasterize, voronoi_cells, VoronoiCell};

/// Dense index of a ruling entity, in first-seen order over the sites
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RulerIndex(pub u16);

impl RulerIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Index for position `i`; `None` past `u16::MAX`.
    pub fn from_position(i: usize) -> Option<Self> {
        u16::try_from(i).ok().map(RulerIndex)
    }
}

impl fmt::Display for RulerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ruler#{}", self.0)
    }
}

/// Per-ruler data derived from the world model
#[derive(Clone, Debug)]
pub struct Ruler {
    pub entity: EntityId,
    /// Settlement centers in model order
    pub settlements: Vec<(i32, i32)>,
    /// Raw presence before any clipping
    pub presence: GrayImage,
    /// Presence within the ruler's own cells, before war and land clipping.
    /// Borders are traced on this mask.
    pub claim: Option<GrayImage>,
    /// Finalized territory; `None` if the ruler was skipped
    pub territory: Option<GrayImage>,
}

/// Everything the territory stage computes before painting
#[derive(Clone, Debug)]
pub struct TerritoryPlan {
    pub rulers: Vec<Ruler>,
    pub partition: Tilemap<Option<RulerIndex>>,
    pub wars: WarTable,
}

impl TerritoryPlan {
    /// Derive partition, presence and territory masks.
    ///
    /// Returns `None` when there is nothing to draw.
    pub fn build(world: &WorldModel, land: &GrayImage) -> Option<Self> {
        let (width, height) = land.dimensions();
        let sites = world.ruled_sites();
        if sites.is_empty() || world.entities.is_empty() {
            tracing::info!("No ruled settlements, skipping territories");
            return None;
        }

        let mut rulers: Vec<Ruler> = Vec::new();
        let mut lookup: HashMap<EntityId, RulerIndex> = HashMap::new();
        let mut seeds = Vec::with_capacity(sites.len());
        let mut owners = Vec::with_capacity(sites.len());
        for site in &sites {
            let Some(entity) = site.ruler() else { continue };
            let index = match lookup.get(&entity) {
                Some(&index) => index,
                None => {
                    let Some(index) = RulerIndex::from_position(rulers.len()) else {
                        tracing::warn!("Out of ruler indices, ignoring {}", site.name);
                        continue;
                    };
                    rulers.push(Ruler {
                        entity,
                        settlements: Vec::new(),
                        presence: GrayImage::new(0, 0),
                        claim: None,
                        territory: None,
                    });
                    lookup.insert(entity, index);
                    index
                }
            };
            rulers[index.index()].settlements.push(site.center());
            seeds.push(site.center());
            owners.push(index);
        }
        tracing::info!(
            "Partitioning {} settlements among {} rulers...",
            seeds.len(),
            rulers.len()
        );

        let cells = voronoi_cells(&seeds, width, height);
        let partition = rasterize(&cells, &owners, width, height);

        for ruler in rulers.iter_mut() {
            ruler.presence = presence_mask(&ruler.settlements, width, height);
        }

        let wars = world.war_table();
        let known = world.entity_lookup();
        for (a, b) in wars.pairs() {
            if !known.contains_key(&a) || !known.contains_key(&b) {
                tracing::warn!("Ignoring war between {} and {}: unknown entity", a, b);
            }
        }
        let territories: Vec<Option<(GrayImage, GrayImage)>> = (0..rulers.len())
            .map(|i| Self::territory_of(RulerIndex(i as u16), &rulers, &partition, &wars, land))
            .collect();
        for (ruler, masks) in rulers.iter_mut().zip(territories) {
            if let Some((claim, territory)) = masks {
                ruler.claim = Some(claim);
                ruler.territory = Some(territory);
            }
        }

        Some(Self { rulers, partition, wars })
    }

    fn territory_of(
        index: RulerIndex,
        rulers: &[Ruler],
        partition: &Tilemap<Option<RulerIndex>>,
        wars: &WarTable,
        land: &GrayImage,
    ) -> Option<(GrayImage, GrayImage)> {
        let ruler = &rulers[index.index()];
        // A ruler needs at least one settlement inside its own cell. Coincident
        // settlements of a later ruler can take every cell over.
        let holds_cell = ruler.settlements.iter().any(|&(x, y)| {
            partition.in_bounds(x as i64, y as i64)
                && *partition.get(x as usize, y as usize) == Some(index)
        });
        if !holds_cell {
            tracing::warn!("{} holds no cell of its own, skipping", ruler.entity);
            return None;
        }
        tracing::debug!(
            "{} ({}) holds {} partition pixels",
            ruler.entity,
            index,
            partition.count(&Some(index))
        );

        let mut claim = GrayImage::from_fn(land.width(), land.height(), |x, y| {
            if *partition.get(x as usize, y as usize) == Some(index) {
                raster::SET
            } else {
                raster::UNSET
            }
        });
        raster::intersect_in_place(&mut claim, &ruler.presence);

        let mut territory = claim.clone();
        for enemy in rulers.iter().filter(|r| wars.at_war(ruler.entity, r.entity)) {
            raster::subtract_in_place(&mut territory, &enemy.presence);
        }
        raster::intersect_in_place(&mut territory, land);
        Some((claim, territory))
    }

    pub fn len(&self) -> usize {
        self.rulers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rulers.is_empty()
    }

    fn at_war(&self, a: usize, b: usize) -> bool {
        self.wars.at_war(self.rulers[a].entity, self.rulers[b].entity)
    }

    /// Ruler indices `i` is at war with.
    fn enemies(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rulers.len()).filter(move |&j| self.at_war(i, j))
    }
}

/// Color of the ruler at `index`, cycling through the palette.
pub fn ruler_color(colors: &[Color], index: usize) -> Color {
    let colors = if colors.is_empty() { &DEFAULT_ENTITY_COLORS[..] } else { colors };
    colors[index % colors.len()]
}

/// Paint fills, contested hatching and borders from a finished plan.
pub fn paint(canvas: &mut RgbImage, plan: &TerritoryPlan, land: &GrayImage, config: &RenderConfig) {
    let palette_len = if config.entity_colors.is_empty() {
        DEFAULT_ENTITY_COLORS.len()
    } else {
        config.entity_colors.len()
    };
    if plan.len() > palette_len {
        tracing::warn!(
            "{} rulers but only {} entity colors, reusing colors",
            plan.len(),
            palette_len
        );
    }
    let color = |i: usize| ruler_color(&config.entity_colors, i);

    tracing::info!("Drawing territories...");
    for (i, ruler) in plan.rulers.iter().enumerate() {
        if let Some(territory) = &ruler.territory {
            raster::blend_flat(canvas, territory, color(i), config.territory_alpha);
        }
    }

    draw_hatching(canvas, plan, land, &color);

    tracing::info!("Drawing borders...");
    for (i, ruler) in plan.rulers.iter().enumerate() {
        let Some(claim) = &ruler.claim else { continue };
        // Traced before war and land clipping: contested gaps and coasts
        // stay unoutlined.
        let mut border = raster::close_square(&raster::inner_boundary(claim));
        for j in plan.enemies(i) {
            raster::subtract_in_place(&mut border, &plan.rulers[j].presence);
        }
        raster::intersect_in_place(&mut border, land);
        raster::overwrite(canvas, &border, color(i));
    }
}

/// Hatch the overlap of warring presences with 1px diagonal stripes.
///
/// Stripe `k` covers pixels where `(x + y) mod period == k mod period`.
/// A pixel keeps the first stripe painted on it.
fn draw_hatching(
    canvas: &mut RgbImage,
    plan: &TerritoryPlan,
    land: &GrayImage,
    color: &impl Fn(usize) -> Color,
) {
    let period = plan.len().max(2) as u32;
    let (width, height) = land.dimensions();
    let mut painted = raster::empty_mask(width, height);

    for i in 0..plan.len() {
        for j in plan.enemies(i) {
            let mut contested = raster::intersect(&plan.rulers[i].presence, &plan.rulers[j].presence);
            raster::intersect_in_place(&mut contested, land);
            if raster::is_empty(&contested) {
                continue;
            }
            tracing::debug!(
                "Hatching contested zone between {} and {}",
                plan.rulers[i].entity,
                plan.rulers[j].entity
            );
            let (stripe_i, stripe_j) = (i as u32 % period, j as u32 % period);
            for (x, y, px) in canvas.enumerate_pixels_mut() {
                if !raster::is_set(&contested, x, y) || raster::is_set(&painted, x, y) {
                    continue;
                }
                let stripe = (x + y) % period;
                let owner = if stripe == stripe_i {
                    i
                } else if stripe == stripe_j {
                    j
                } else {
                    continue;
                };
                px.0 = color(owner).0;
                painted.put_pixel(x, y, raster::SET);
            }
        }
    }
}

/// Run the territory stage.
///
/// Skips with a log line when the world has no ruled settlements. A missing
/// land mask is fatal.
pub fn draw_territories(
    canvas: &mut RgbImage,
    world: &WorldModel,
    land: Option<&GrayImage>,
    config: &RenderConfig,
) -> Result<Option<TerritoryPlan>> {
    let land = land.ok_or(MapError::NoLandMask)?;
    if land.dimensions() != canvas.dimensions() {
        return Err(MapError::DimensionMismatch {
            layer: "land mask",
            expected: canvas.dimensions(),
            found: land.dimensions(),
        });
    }
    let Some(plan) = TerritoryPlan::build(world, land) else {
        return Ok(None);
    };
    paint(canvas, &plan, land, config);
    Ok(Some(plan))
}
