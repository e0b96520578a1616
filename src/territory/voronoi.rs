//! Voronoi partition of the image plane around settlement seeds
//!
//! Each seed's cell is the image rectangle clipped by one half-plane per
//! other seed. Cells are convex, so rasterizing them is a point-in-polygon
//! test over the cell's bounding box.

use crate::tilemap::Tilemap;

use super::RulerIndex;

const EPSILON: f64 = 1e-9;

/// A convex Voronoi cell clipped to the image rectangle
#[derive(Clone, Debug, PartialEq)]
pub struct VoronoiCell {
    pub seed: (f64, f64),
    /// Vertices wound like the image frame: top-left, top-right, bottom-right
    pub polygon: Vec<(f64, f64)>,
}

impl VoronoiCell {
    fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.polygon.first()?;
        let init = (first.0, first.1, first.0, first.1);
        Some(self.polygon.iter().fold(init, |(x0, y0, x1, y1), &(x, y)| {
            (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
        }))
    }

    /// True if the point lies inside or on the border of the cell.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.polygon.len();
        if n < 3 {
            return false;
        }
        (0..n).all(|i| {
            let (ax, ay) = self.polygon[i];
            let (bx, by) = self.polygon[(i + 1) % n];
            (bx - ax) * (y - ay) - (by - ay) * (x - ax) >= -EPSILON
        })
    }
}

/// Keep the part of `polygon` closer to `own` than to `other`.
fn clip_half_plane(polygon: &[(f64, f64)], own: (f64, f64), other: (f64, f64)) -> Vec<(f64, f64)> {
    let normal = (other.0 - own.0, other.1 - own.1);
    let mid = ((own.0 + other.0) / 2.0, (own.1 + other.1) / 2.0);
    let side = |p: (f64, f64)| (p.0 - mid.0) * normal.0 + (p.1 - mid.1) * normal.1;

    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, &current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let (sc, sn) = (side(current), side(next));
        if sc <= 0.0 {
            out.push(current);
        }
        if (sc < 0.0 && sn > 0.0) || (sc > 0.0 && sn < 0.0) {
            let t = sc / (sc - sn);
            out.push((
                current.0 + t * (next.0 - current.0),
                current.1 + t * (next.1 - current.1),
            ));
        }
    }
    out
}

/// Compute one clipped cell per seed, in seed order.
///
/// Coincident seeds get identical cells. Cost is quadratic in the number
/// of seeds.
pub fn voronoi_cells(seeds: &[(i32, i32)], width: u32, height: u32) -> Vec<VoronoiCell> {
    let (w, h) = (width as f64, height as f64);
    let frame = vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    seeds
        .iter()
        .map(|&(sx, sy)| {
            let own = (sx as f64, sy as f64);
            let mut polygon = frame.clone();
            for &(ox, oy) in seeds {
                if (ox, oy) == (sx, sy) {
                    continue;
                }
                polygon = clip_half_plane(&polygon, own, (ox as f64, oy as f64));
                if polygon.is_empty() {
                    break;
                }
            }
            VoronoiCell { seed: own, polygon }
        })
        .collect()
}

/// Rasterize cells into a per-pixel owner map.
///
/// Later cells overwrite earlier ones on shared borders. Pixels no cell
/// covers stay `None`.
pub fn rasterize(
    cells: &[VoronoiCell],
    owners: &[RulerIndex],
    width: u32,
    height: u32,
) -> Tilemap<Option<RulerIndex>> {
    debug_assert_eq!(cells.len(), owners.len());
    let mut partition = Tilemap::new_with(width as usize, height as usize, None);

    for (cell, &owner) in cells.iter().zip(owners) {
        let Some((x0, y0, x1, y1)) = cell.bounds() else {
            continue;
        };
        let xs = (x0.floor().max(0.0) as usize)..=(x1.ceil().min(width as f64 - 1.0) as usize);
        let ys = (y0.floor().max(0.0) as usize)..=(y1.ceil().min(height as f64 - 1.0) as usize);
        for y in ys {
            for x in xs.clone() {
                if cell.contains(x as f64, y as f64) {
                    partition.set(x, y, Some(owner));
                }
            }
        }
    }

    partition
}
