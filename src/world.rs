//! World model consumed by the renderer
//!
//! Sites, ruling entities and wars as produced by an upstream legends parser.
//! Everything here is read-only during a render.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a political entity. Negative values mean "no ruler".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity#{}", self.0)
    }
}

/// Identifier of a site
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Site#{}", self.0)
    }
}

/// Pixel-space bounding rectangle of a site
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

/// A settlement or other named place
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    #[serde(rename = "type")]
    pub site_type: String,
    pub name: String,
    #[serde(default)]
    pub translated_name: Option<String>,
    pub rect: Rect,
    #[serde(default)]
    pub ruler: Option<EntityId>,
    #[serde(default)]
    pub population: Option<u32>,
}

impl Site {
    /// The ruling entity, if the site is owned.
    pub fn ruler(&self) -> Option<EntityId> {
        self.ruler.filter(|id| id.0 >= 0)
    }

    pub fn center(&self) -> (i32, i32) {
        self.rect.center()
    }
}

/// A political faction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
}

/// A war between two entities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct War {
    pub aggressor: EntityId,
    pub defender: EntityId,
    pub active: bool,
}

/// Symmetric lookup of active wars
#[derive(Clone, Debug, Default)]
pub struct WarTable {
    pairs: HashSet<(EntityId, EntityId)>,
}

impl WarTable {
    pub fn from_wars(wars: &[War]) -> Self {
        let pairs = wars
            .iter()
            .filter(|w| w.active && w.aggressor != w.defender)
            .map(|w| Self::key(w.aggressor, w.defender))
            .collect();
        Self { pairs }
    }

    fn key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// True if either ordering of the pair is at active war.
    pub fn at_war(&self, a: EntityId, b: EntityId) -> bool {
        a != b && self.pairs.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in deterministic order.
    pub fn pairs(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs: Vec<_> = self.pairs.iter().copied().collect();
        pairs.sort();
        pairs
    }
}

/// Everything the renderer needs to know about world history
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldModel {
    /// World name, used only for output naming
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub wars: Vec<War>,
}

impl WorldModel {
    /// Owned lookup table from id to entity.
    pub fn entity_lookup(&self) -> HashMap<EntityId, &Entity> {
        self.entities.iter().map(|e| (e.id, e)).collect()
    }

    pub fn war_table(&self) -> WarTable {
        WarTable::from_wars(&self.wars)
    }

    /// Sites whose ruler is a known entity, in model order.
    pub fn ruled_sites(&self) -> Vec<&Site> {
        let entities = self.entity_lookup();
        self.sites
            .iter()
            .filter(|s| s.ruler().is_some_and(|r| entities.contains_key(&r)))
            .collect()
    }

    /// Number of sites ruled by each entity.
    pub fn settlement_counts(&self) -> HashMap<EntityId, usize> {
        let mut counts = HashMap::new();
        for ruler in self.sites.iter().filter_map(Site::ruler) {
            *counts.entry(ruler).or_insert(0) += 1;
        }
        counts
    }

    /// Keep only entities ruling more than `min` sites.
    pub fn retain_major_entities(&mut self, min: usize) {
        let counts = self.settlement_counts();
        let before = self.entities.len();
        self.entities
            .retain(|e| counts.get(&e.id).copied().unwrap_or(0) > min);
        tracing::debug!(
            "Kept {} of {} entities with more than {} settlements",
            self.entities.len(),
            before,
            min
        );
    }
}
