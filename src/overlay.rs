//! Final overlays: settlement markers and the reference grid

use image::{GrayImage, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::config::{GridStyle, MarkerStyle};
use crate::raster;
use crate::world::{Site, WorldModel};

/// Marker size class of a site type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerSize {
    Big,
    Medium,
    Small,
}

const BIG_SITES: [&str; 3] = ["tower", "dark fortress", "castle"];
const MEDIUM_SITES: [&str; 7] = [
    "town",
    "fort",
    "monastery",
    "tomb",
    "fortress",
    "labyrinth",
    "mountain halls",
];
const SMALL_SITES: [&str; 4] = ["dark pits", "hillocks", "hamlet", "forest retreat"];
/// Drawn in the primary color
const FORTIFIED_SITES: [&str; 4] = ["tower", "dark fortress", "fortress", "castle"];

impl MarkerSize {
    /// Size class of a site type; `None` for unmarked types (camps, caves, lairs...).
    pub fn of(site_type: &str) -> Option<Self> {
        let site_type = site_type.to_lowercase();
        let site_type = site_type.as_str();
        if BIG_SITES.contains(&site_type) {
            Some(MarkerSize::Big)
        } else if MEDIUM_SITES.contains(&site_type) {
            Some(MarkerSize::Medium)
        } else if SMALL_SITES.contains(&site_type) {
            Some(MarkerSize::Small)
        } else {
            None
        }
    }

    pub fn radius(&self, style: &MarkerStyle) -> i32 {
        match self {
            MarkerSize::Big => style.big_radius,
            MarkerSize::Medium => style.medium_radius,
            MarkerSize::Small => style.small_radius,
        }
    }
}

fn is_fortified(site: &Site) -> bool {
    FORTIFIED_SITES.contains(&site.site_type.to_lowercase().as_str())
}

/// Stamp a filled dot at every marked settlement.
pub fn draw_markers(canvas: &mut RgbImage, world: &WorldModel, style: &MarkerStyle) {
    tracing::info!("Drawing settlement markers...");
    let mut drawn = 0;
    for site in &world.sites {
        let Some(size) = MarkerSize::of(&site.site_type) else {
            tracing::trace!("No marker for {} ({})", site.name, site.site_type);
            continue;
        };
        let color = if is_fortified(site) { style.primary_color } else { style.secondary_color };
        draw_filled_circle_mut(canvas, site.center(), size.radius(style), color.pixel());
        drawn += 1;
    }
    tracing::debug!("Drew {} of {} settlement markers", drawn, world.sites.len());
}

/// Grid lines `width` px thick every `spacing` px, starting at `offset`.
/// Empty when `spacing` is zero.
pub fn grid_mask(width: u32, height: u32, style: &GridStyle) -> GrayImage {
    if style.spacing == 0 {
        return raster::empty_mask(width, height);
    }
    let on_line = |v: u32| v >= style.offset && (v - style.offset) % style.spacing < style.width;
    GrayImage::from_fn(width, height, |x, y| {
        if on_line(x) || on_line(y) { raster::SET } else { raster::UNSET }
    })
}

pub fn draw_grid(canvas: &mut RgbImage, style: &GridStyle) {
    if style.spacing == 0 {
        tracing::warn!("Grid spacing is zero, skipping grid");
        return;
    }
    tracing::info!("Drawing grid...");
    let mask = grid_mask(canvas.width(), canvas.height(), style);
    raster::overwrite(canvas, &mask, style.color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;
    use crate::world::{Rect, SiteId};
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn site(site_type: &str, x: i32, y: i32) -> Site {
        Site {
            id: SiteId(0),
            site_type: site_type.to_string(),
            name: "somewhere".to_string(),
            translated_name: None,
            rect: Rect::new(x, y, x, y),
            ruler: None,
            population: None,
        }
    }

    #[test]
    fn test_marker_size_classes() {
        assert_eq!(MarkerSize::of("castle"), Some(MarkerSize::Big));
        assert_eq!(MarkerSize::of("Mountain Halls"), Some(MarkerSize::Medium));
        assert_eq!(MarkerSize::of("hamlet"), Some(MarkerSize::Small));
        assert_eq!(MarkerSize::of("cave"), None);
    }

    #[test]
    fn test_markers_use_size_and_color() {
        let world = WorldModel {
            sites: vec![site("castle", 10, 10), site("town", 30, 10), site("camp", 50, 10)],
            ..Default::default()
        };
        let style = MarkerStyle::default();
        let mut canvas = RgbImage::from_pixel(60, 20, WHITE);
        draw_markers(&mut canvas, &world, &style);

        assert_eq!(canvas.get_pixel(10, 10).0, style.primary_color.0);
        assert_eq!(canvas.get_pixel(13, 10).0, style.primary_color.0);
        assert_eq!(canvas.get_pixel(30, 10).0, style.secondary_color.0);
        assert_eq!(*canvas.get_pixel(33, 10), WHITE);
        assert_eq!(*canvas.get_pixel(50, 10), WHITE);
    }

    #[test]
    fn test_grid_lines() {
        let style = GridStyle {
            enabled: true,
            spacing: 10,
            width: 2,
            offset: 3,
            color: Color::new(9, 9, 9),
        };
        let mut canvas = RgbImage::from_pixel(30, 30, WHITE);
        draw_grid(&mut canvas, &style);
        assert_eq!(canvas.get_pixel(3, 20).0, [9, 9, 9]);
        assert_eq!(canvas.get_pixel(14, 20).0, [9, 9, 9]);
        assert_eq!(canvas.get_pixel(20, 23).0, [9, 9, 9]);
        assert_eq!(*canvas.get_pixel(2, 20), WHITE);
        assert_eq!(*canvas.get_pixel(15, 20), WHITE);
    }

    #[test]
    fn test_zero_spacing_grid_is_empty() {
        let style = GridStyle { spacing: 0, ..GridStyle::default() };
        assert!(raster::is_empty(&grid_mask(20, 20, &style)));

        let mut canvas = RgbImage::from_pixel(20, 20, WHITE);
        draw_grid(&mut canvas, &style);
        assert!(canvas.pixels().all(|p| *p == WHITE));
    }
}
