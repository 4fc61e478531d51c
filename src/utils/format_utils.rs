//! Output formatting utilities
//!
//! File name suggestions, human-readable region tables and response
//! summaries.

use crate::detection::DetectedRegion;
use crate::raster::codec::ensure_png_extension;

use super::string_utils::sanitize_file_stem;

/// Pick the file name for an extracted region
///
/// A producer-supplied name wins when it survives sanitizing; otherwise the
/// name is `<source>_<NN>_<shape>.png` with a one-based index.
pub fn suggest_filename(region: &DetectedRegion, index: usize) -> String {
    if let Some(stem) = region.suggested_filename.as_deref().and_then(sanitize_file_stem) {
        return ensure_png_extension(&stem);
    }

    let shape = sanitize_file_stem(&region.shape).unwrap_or_else(|| "region".to_string());
    format!("{}_{:02}_{}.png", region.source, index + 1, shape)
}

/// Render regions as an aligned text table
pub fn format_region_table(regions: &[DetectedRegion]) -> String {
    let mut table = format!("{:<4} {:<11} {:<15} {:>6} {:>6} {:>6} {:>6} {:>6}\n",
                            "#", "source", "shape", "x", "y", "width", "height", "conf");
    for (i, region) in regions.iter().enumerate() {
        let b = &region.bbox;
        table.push_str(&format!("{:<4} {:<11} {:<15} {:>6} {:>6} {:>6} {:>6} {:>6.2}\n",
                                i + 1, region.source.as_str(), region.shape,
                                b.x, b.y, b.width, b.height, region.normalized_confidence()));
    }
    table
}

/// Summary line for an extraction response
pub fn summarize(mode_name: &str, detected: usize, extracted: usize) -> String {
    if detected == 0 {
        return format!("No regions found using {}", mode_name);
    }
    if extracted < detected {
        return format!("Extracted {} of {} region(s) using {} ({} could not be cropped)",
                       extracted, detected, mode_name, detected - extracted);
    }
    format!("Extracted {} region(s) using {}", extracted, mode_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::BoundingBox;
    use crate::detection::RegionSource;

    #[test]
    fn test_suggest_filename() {
        let region = DetectedRegion::new(BoundingBox::new(0, 0, 10, 10), RegionSource::Card, 0.5)
            .with_shape("square-card");
        assert_eq!(suggest_filename(&region, 0), "card_01_square-card.png");

        let named = region.clone().with_suggested_filename("Pricing Table.jpg");
        assert_eq!(suggest_filename(&named, 3), "Pricing_Table.png");

        let unnamed = DetectedRegion::new(BoundingBox::new(0, 0, 10, 10), RegionSource::Grid, 1.0);
        assert_eq!(suggest_filename(&unnamed, 11), "grid_12_region.png");
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize("contour", 0, 0), "No regions found using contour");
        assert_eq!(summarize("grid", 4, 4), "Extracted 4 region(s) using grid");
        assert!(summarize("hybrid", 3, 2).contains("1 could not be cropped"));
    }
}
