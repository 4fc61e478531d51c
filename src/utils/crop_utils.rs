//! Region cropping and export
//!
//! Turns a detected region into an `ExtractedImage`: resolve the box,
//! pad and clamp it, copy the pixels onto a fresh canvas and encode PNG.

use log::{debug, warn};

use crate::coordinate::{BoundingBox, MIN_REGION_SIZE};
use crate::detection::{DetectedRegion, ExtractedImage};
use crate::errors::{RegionError, RegionResult};
use crate::raster::PixelBuffer;
use crate::raster::codec::{crop_canvas, encode_png};

use super::format_utils::suggest_filename;

/// Padding added around every crop unless a detector asks for more
pub const DEFAULT_CROP_PADDING: u32 = 2;

/// Resolve the pixel box a crop should use
///
/// Normalized coordinates win when they are populated, since they are
/// resolution independent; otherwise the pixel coordinates are used.
pub fn resolve_pixel_box(bbox: &BoundingBox, image_width: u32, image_height: u32) -> BoundingBox {
    if bbox.has_normalized() {
        BoundingBox::from_normalized(bbox.nx, bbox.ny, bbox.nw, bbox.nh, image_width, image_height)
    } else {
        *bbox
    }
}

/// Crop one region out of the buffer
///
/// # Arguments
/// * `buffer` - The decoded source image
/// * `region` - Region to crop
/// * `padding` - Pixels added on every side before clamping
/// * `index` - Position of the region in the result list (for naming)
///
/// # Returns
/// The extracted image, or `RegionTooSmall` when the clamped crop is under 4px
pub fn crop_region(buffer: &PixelBuffer, region: &DetectedRegion,
                   padding: u32, index: usize) -> RegionResult<ExtractedImage> {
    let img_w = buffer.width();
    let img_h = buffer.height();

    let pixel_box = resolve_pixel_box(&region.bbox, img_w, img_h);
    let crop_box = pixel_box.pad(padding, img_w, img_h);

    if crop_box.width < MIN_REGION_SIZE || crop_box.height < MIN_REGION_SIZE {
        return Err(RegionError::RegionTooSmall { width: crop_box.width, height: crop_box.height });
    }

    let canvas = crop_canvas(buffer, &crop_box);
    let png_data = encode_png(&canvas)?;

    let mut exported = region.clone();
    exported.bbox = pixel_box.clamp_to(img_w, img_h).with_image_size(img_w, img_h);

    debug!("Cropped {} region {} at ({}, {}) as {}x{} ({} bytes)",
           region.source, index + 1, crop_box.x, crop_box.y,
           crop_box.width, crop_box.height, png_data.len());

    Ok(ExtractedImage {
        filename: suggest_filename(&exported, index),
        region: exported,
        png_data,
        width: crop_box.width,
        height: crop_box.height,
        mime_type: "image/png".to_string(),
    })
}

/// Crop a batch of regions, skipping the ones that fail
///
/// Each region uses `padding_for(region)` as its padding. Failures are
/// logged and dropped so one bad region never aborts the batch.
pub fn crop_regions<F>(buffer: &PixelBuffer, regions: &[DetectedRegion], padding_for: F) -> Vec<ExtractedImage>
where
    F: Fn(&DetectedRegion) -> u32,
{
    let mut images = Vec::with_capacity(regions.len());
    for region in regions {
        match crop_region(buffer, region, padding_for(region), images.len()) {
            Ok(image) => images.push(image),
            Err(e) => warn!("Skipping {} region at ({}, {}): {}",
                            region.source, region.bbox.x, region.bbox.y, e),
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::RegionSource;
    use image::{Rgba, RgbaImage};

    fn buffer() -> PixelBuffer {
        PixelBuffer::from_rgba(RgbaImage::from_pixel(100, 80, Rgba([1, 2, 3, 255])))
    }

    #[test]
    fn test_crop_adds_padding_and_clamps() {
        let region = DetectedRegion::new(BoundingBox::new(0, 10, 20, 20), RegionSource::Contour, 0.7);
        let image = crop_region(&buffer(), &region, 2, 0).unwrap();
        assert_eq!((image.width, image.height), (22, 24));
        assert_eq!(image.filename, "contour_01_region.png");
        assert!((image.region.bbox.nw - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_crop_prefers_normalized_coordinates() {
        let bbox = BoundingBox::from_normalized(0.5, 0.5, 0.25, 0.25, 100, 80);
        let region = DetectedRegion::new(BoundingBox { x: 0, y: 0, width: 1, height: 1, ..bbox }, RegionSource::Ai, 0.9);
        let image = crop_region(&buffer(), &region, 0, 0).unwrap();
        assert_eq!((image.width, image.height), (25, 20));
        assert_eq!((image.region.bbox.x, image.region.bbox.y), (50, 40));
    }

    #[test]
    fn test_crop_too_small() {
        let region = DetectedRegion::new(BoundingBox::new(99, 79, 1, 1), RegionSource::Edge, 0.5);
        let result = crop_region(&buffer(), &region, 2, 0);
        assert!(matches!(result, Err(RegionError::RegionTooSmall { .. })));
    }

    #[test]
    fn test_batch_skips_failures() {
        let regions = vec![
            DetectedRegion::new(BoundingBox::new(99, 79, 1, 1), RegionSource::Edge, 0.5),
            DetectedRegion::new(BoundingBox::new(10, 10, 30, 30), RegionSource::Edge, 0.5),
        ];
        let images = crop_regions(&buffer(), &regions, |_| DEFAULT_CROP_PADDING);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "edge_01_region.png");
    }
}
