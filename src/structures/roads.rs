//! Road network simplification
//!
//! The raw path mask is fragmented: roads break at every tile the export
//! did not mark. Fragments are joined by repeatedly bridging every pair of
//! contours whose closest points are near, until the contour count stops
//! changing or the round limit `ceil(sqrt(initial contours))` is hit.
//!
//! Each round compares every contour point against every point of every
//! other contour, so the worst case is
//! `O(rounds * contours^2 * points_i * points_j)`. In practice a handful of
//! rounds over few contours converge; large or noisy structure layers
//! should disable merging.
//!
//! Convergence is judged by contour count alone. A round that rewires the
//! topology without changing the count is treated as converged.

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, Contour};
use imageproc::drawing::draw_line_segment_mut;

use crate::config::RenderConfig;
use crate::raster;

use super::path_mask;

/// Outcome of the merge loop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub initial_contours: usize,
    pub final_contours: usize,
    /// Rounds that scanned for bridges
    pub rounds: usize,
    pub bridges: usize,
}

type Bridge = ((i32, i32), (i32, i32));

/// Closest pair of points between two contours, with squared distance.
fn closest_points(a: &Contour<i32>, b: &Contour<i32>) -> Option<(i64, Bridge)> {
    let mut best: Option<(i64, Bridge)> = None;
    for p in &a.points {
        for q in &b.points {
            let (dx, dy) = ((p.x - q.x) as i64, (p.y - q.y) as i64);
            let d = dx * dx + dy * dy;
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, ((p.x, p.y), (q.x, q.y))));
            }
        }
    }
    best
}

fn find_bridges(contours: &[Contour<i32>], max_distance: f64) -> Vec<Bridge> {
    let mut bridges = Vec::new();
    for (i, a) in contours.iter().enumerate() {
        for b in &contours[i + 1..] {
            if let Some((d, bridge)) = closest_points(a, b) {
                if (d as f64).sqrt() < max_distance {
                    bridges.push(bridge);
                }
            }
        }
    }
    bridges
}

/// Join nearby path fragments. With `merge` off the mask is returned as is.
pub fn merge_paths(path: &GrayImage, merge: bool, max_distance: f64) -> (GrayImage, MergeStats) {
    let mut mask = path.clone();
    let initial = find_contours::<i32>(&mask).len();
    let max_rounds = (initial as f64).sqrt().ceil() as usize;
    let mut stats = MergeStats { initial_contours: initial, ..Default::default() };

    let mut previous = if merge { None } else { Some(initial) };
    for round in 0..max_rounds {
        let contours = find_contours::<i32>(&mask);
        if previous == Some(contours.len()) {
            tracing::debug!("Roads done after {} rounds", round);
            break;
        }
        previous = Some(contours.len());

        let bridges = find_bridges(&contours, max_distance);
        tracing::debug!(
            "Round {}: {} contours, {} bridges",
            round,
            contours.len(),
            bridges.len()
        );
        for &((x1, y1), (x2, y2)) in &bridges {
            draw_line_segment_mut(
                &mut mask,
                (x1 as f32, y1 as f32),
                (x2 as f32, y2 as f32),
                raster::SET,
            );
        }
        stats.rounds += 1;
        stats.bridges += bridges.len();
    }

    stats.final_contours = find_contours::<i32>(&mask).len();
    (mask, stats)
}

/// Draw the simplified road network opaquely in the road color.
pub fn draw_roads(canvas: &mut RgbImage, structures: &RgbImage, config: &RenderConfig) -> MergeStats {
    let path = path_mask(structures);
    if raster::is_empty(&path) {
        tracing::info!("No roads on the structures layer");
        return MergeStats::default();
    }
    tracing::info!("Merging roads...");
    let (merged, stats) = merge_paths(&path, config.merge_roads, config.road_bridge_distance);
    tracing::info!(
        "Roads reduced from {} to {} contours",
        stats.initial_contours,
        stats.final_contours
    );
    raster::overwrite(canvas, &merged, config.road_color);
    stats
}
