use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// A target output size; also names the bucket folder (`{width}x{height}`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// True when an image of the given size can produce this bucket without upscaling
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        width >= self.width && height >= self.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Aspect-ratio families of the bucket catalog.
///
/// Declaration order is the matching order: on equal distance the earlier family wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AspectFamily {
    /// 1:1
    #[strum(serialize = "1:1")]
    Square,
    /// 2:3
    #[strum(serialize = "2:3")]
    Portrait,
    /// 3:2
    #[strum(serialize = "3:2")]
    Landscape,
}

impl AspectFamily {
    pub fn ratio(&self) -> f64 {
        match self {
            AspectFamily::Square => 1.0,
            AspectFamily::Portrait => 2.0 / 3.0,
            AspectFamily::Landscape => 3.0 / 2.0,
        }
    }

    /// Size tiers, largest first
    pub fn tiers(&self) -> [Resolution; 3] {
        match self {
            AspectFamily::Square => [
                Resolution::new(1024, 1024),
                Resolution::new(768, 768),
                Resolution::new(512, 512),
            ],
            AspectFamily::Landscape => [
                Resolution::new(1216, 832),
                Resolution::new(912, 624),
                Resolution::new(608, 416),
            ],
            AspectFamily::Portrait => [
                Resolution::new(832, 1216),
                Resolution::new(624, 912),
                Resolution::new(416, 608),
            ],
        }
    }

    /// Family whose canonical ratio is nearest to `aspect_ratio`
    pub fn nearest(aspect_ratio: f64) -> AspectFamily {
        let mut families = AspectFamily::iter();
        let mut best = families.next().unwrap_or(AspectFamily::Square);
        let mut best_distance = (best.ratio() - aspect_ratio).abs();

        for family in families {
            let distance = (family.ratio() - aspect_ratio).abs();
            if distance < best_distance {
                best = family;
                best_distance = distance;
            }
        }

        best
    }
}

/// Every bucket in the catalog
pub fn catalog() -> Vec<Resolution> {
    AspectFamily::iter()
        .flat_map(|family| family.tiers())
        .collect()
}

/// Pick the bucket for a source image.
///
/// The aspect family is the nearest canonical ratio; within it the largest tier
/// the source covers in both dimensions wins, and the smallest tier is used when
/// the source is smaller than every tier.
pub fn select_best_resolution(width: u32, height: u32) -> Resolution {
    let family = AspectFamily::nearest(width as f64 / height as f64);
    let tiers = family.tiers();

    tiers
        .iter()
        .copied()
        .find(|tier| tier.fits_within(width, height))
        .unwrap_or(tiers[tiers.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_prefers_largest_tier_without_upscaling() {
        assert_eq!(select_best_resolution(1000, 1000), Resolution::new(768, 768));
        assert_eq!(select_best_resolution(2000, 2000), Resolution::new(1024, 1024));
        assert_eq!(select_best_resolution(1024, 1024), Resolution::new(1024, 1024));
        assert_eq!(select_best_resolution(600, 600), Resolution::new(512, 512));
    }

    #[test]
    fn test_small_source_falls_back_to_smallest_tier() {
        assert_eq!(select_best_resolution(100, 100), Resolution::new(512, 512));
        assert_eq!(select_best_resolution(300, 200), Resolution::new(608, 416));
        assert_eq!(select_best_resolution(200, 300), Resolution::new(416, 608));
    }

    #[test]
    fn test_landscape_and_portrait_families() {
        assert_eq!(select_best_resolution(3000, 2000), Resolution::new(1216, 832));
        assert_eq!(select_best_resolution(1000, 650), Resolution::new(912, 624));
        assert_eq!(select_best_resolution(2000, 3000), Resolution::new(832, 1216));
        assert_eq!(select_best_resolution(700, 1000), Resolution::new(624, 912));
    }

    #[test]
    fn test_selection_never_upscales_when_a_tier_fits() {
        for (w, h) in [(640, 480), (1920, 1080), (1080, 1920), (4000, 3000), (913, 625)] {
            let selected = select_best_resolution(w, h);
            let family = AspectFamily::nearest(w as f64 / h as f64);
            if family.tiers().iter().any(|t| t.fits_within(w, h)) {
                assert!(selected.width <= w && selected.height <= h, "{}x{} -> {}", w, h, selected);
            }
        }
    }

    #[test]
    fn test_nearest_family_ties_prefer_square() {
        // halfway between 2:3 and 1:1
        assert_eq!(AspectFamily::nearest(5.0 / 6.0), AspectFamily::Square);
        // halfway between 1:1 and 3:2
        assert_eq!(AspectFamily::nearest(1.25), AspectFamily::Square);
        assert_eq!(AspectFamily::nearest(16.0 / 9.0), AspectFamily::Landscape);
        assert_eq!(AspectFamily::nearest(9.0 / 16.0), AspectFamily::Portrait);
    }

    #[test]
    fn test_catalog_has_nine_buckets() {
        let buckets = catalog();
        assert_eq!(buckets.len(), 9);
        assert_eq!(AspectFamily::iter().count(), 3);
        assert_eq!(buckets[0], Resolution::new(1024, 1024));
        assert_eq!(buckets[3], Resolution::new(832, 1216));
        assert_eq!(buckets[8], Resolution::new(608, 416));
        assert_eq!(Resolution::new(1216, 832).to_string(), "1216x832");
        assert_eq!(AspectFamily::Landscape.to_string(), "3:2");
    }
}
