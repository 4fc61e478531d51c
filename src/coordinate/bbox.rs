//! Bounding box structure and rectangle algebra
//!
//! A box is stored in pixel units and, once the image size is known, in
//! image-relative units as well. Whenever both representations are
//! populated, `nx = x / W`, `ny = y / H`, `nw = width / W` and
//! `nh = height / H`.

use serde::Serialize;

use super::mask::PixelMask;

/// Smallest width or height a box may have before it is discarded
pub const MIN_REGION_SIZE: u32 = 4;

/// Normalized extents at or below this value are treated as unset
const NORMALIZED_EPSILON: f64 = 0.001;

/// An axis-aligned rectangle in pixel and normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoundingBox {
    /// X-coordinate of the top-left corner (pixels from left)
    pub x: u32,
    /// Y-coordinate of the top-left corner (pixels from top)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Normalized X (0..1)
    pub nx: f64,
    /// Normalized Y (0..1)
    pub ny: f64,
    /// Normalized width (0..1)
    pub nw: f64,
    /// Normalized height (0..1)
    pub nh: f64,
}

impl BoundingBox {
    /// Create a box in pixel coordinates only
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
            ..Default::default()
        }
    }

    /// Create a box from inclusive pixel extremes
    pub fn from_extremes(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    /// Create a box from normalized coordinates for an image of the given size
    ///
    /// Pixel values are rounded to the nearest integer.
    pub fn from_normalized(nx: f64, ny: f64, nw: f64, nh: f64,
                           image_width: u32, image_height: u32) -> Self {
        let w = image_width as f64;
        let h = image_height as f64;
        BoundingBox {
            x: (nx * w).round().max(0.0) as u32,
            y: (ny * h).round().max(0.0) as u32,
            width: (nw * w).round().max(0.0) as u32,
            height: (nh * h).round().max(0.0) as u32,
            nx,
            ny,
            nw,
            nh,
        }
    }

    /// Return a copy with normalized coordinates derived from the pixel ones
    pub fn with_image_size(mut self, image_width: u32, image_height: u32) -> Self {
        if image_width == 0 || image_height == 0 {
            return self;
        }
        let w = image_width as f64;
        let h = image_height as f64;
        self.nx = self.x as f64 / w;
        self.ny = self.y as f64 / h;
        self.nw = self.width as f64 / w;
        self.nh = self.height as f64 / h;
        self
    }

    /// Whether the normalized representation is usable
    pub fn has_normalized(&self) -> bool {
        self.nw > NORMALIZED_EPSILON && self.nh > NORMALIZED_EPSILON
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width divided by height (0 for a zero-height box)
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Boxes narrower or shorter than 4px are unusable
    pub fn is_valid(&self) -> bool {
        self.width >= MIN_REGION_SIZE && self.height >= MIN_REGION_SIZE
    }

    /// Check the box fits inside an image, allowing `slack` pixels of overshoot
    pub fn fits_within(&self, image_width: u32, image_height: u32, slack: u32) -> bool {
        self.right() as u64 <= image_width as u64 + slack as u64
            && self.bottom() as u64 <= image_height as u64 + slack as u64
    }

    /// Clamp the box to `[0, W) x [0, H)`
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Self {
        let x = self.x.min(image_width);
        let y = self.y.min(image_height);
        let right = self.right().min(image_width);
        let bottom = self.bottom().min(image_height);
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Grow the box by `padding` on all sides, clamped to the image
    pub fn pad(&self, padding: u32, image_width: u32, image_height: u32) -> Self {
        let x = self.x.saturating_sub(padding);
        let y = self.y.saturating_sub(padding);
        let right = self.right().saturating_add(padding).min(image_width);
        let bottom = self.bottom().saturating_add(padding).min(image_height);
        BoundingBox::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    /// Area of the intersection with another box, 0 if disjoint
    pub fn overlap_area(&self, other: &BoundingBox) -> u64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) as u64 * (bottom - top) as u64
    }

    /// Whether the intersection exceeds `threshold` of the smaller box's area
    pub fn significant_overlap(&self, other: &BoundingBox, threshold: f64) -> bool {
        let smaller = self.area().min(other.area()) as f64;
        self.overlap_area(other) as f64 > threshold * smaller
    }

    /// Whether the boxes share a projection on one axis and are at most
    /// `margin` pixels apart on the other
    pub fn is_adjacent(&self, other: &BoundingBox, margin: u32) -> bool {
        let x_overlap = self.x < other.right() && other.x < self.right();
        let y_overlap = self.y < other.bottom() && other.y < self.bottom();

        let gap_x = (self.x.max(other.x) as i64) - (self.right().min(other.right()) as i64);
        let gap_y = (self.y.max(other.y) as i64) - (self.bottom().min(other.bottom()) as i64);

        (x_overlap && gap_y <= margin as i64) || (y_overlap && gap_x <= margin as i64)
    }

    /// Smallest box containing both boxes
    pub fn merge(&self, other: &BoundingBox) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Shrink the box to the smallest rectangle holding a set mask cell
    ///
    /// Only cells inside the box are scanned. A box with no set cell is
    /// returned unchanged.
    pub fn tighten(&self, mask: &PixelMask) -> Self {
        let end_x = self.right().min(mask.width());
        let end_y = self.bottom().min(mask.height());

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in self.y..end_y {
            for x in self.x..end_x {
                if mask.get(x, y) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((min_x, min_y, max_x, max_y)) =>
                            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)),
                    });
                }
            }
        }

        match bounds {
            Some((min_x, min_y, max_x, max_y)) => BoundingBox::from_extremes(min_x, min_y, max_x, max_y),
            None => *self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_area() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 5, 10, 10);
        assert_eq!(a.overlap_area(&b), 25);
        assert_eq!(a.overlap_area(&BoundingBox::new(10, 0, 5, 5)), 0);
    }

    #[test]
    fn test_significant_overlap_uses_smaller_area() {
        let big = BoundingBox::new(0, 0, 100, 100);
        let small = BoundingBox::new(10, 10, 10, 10);
        assert!(big.significant_overlap(&small, 0.9));
        let half = BoundingBox::new(95, 0, 10, 10);
        assert!(!big.significant_overlap(&half, 0.5));
        assert!(big.significant_overlap(&half, 0.3));
    }

    #[test]
    fn test_fits_within_tolerates_slack() {
        let overhang = BoundingBox::new(95, 0, 15, 10);
        assert!(!overhang.fits_within(100, 100, 0));
        assert!(overhang.fits_within(100, 100, 10));
        assert!(!BoundingBox::new(95, 0, 16, 10).fits_within(100, 100, 10));
    }

    #[test]
    fn test_adjacency_with_gap() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert!(a.is_adjacent(&BoundingBox::new(15, 2, 10, 5), 5));
        assert!(!a.is_adjacent(&BoundingBox::new(16, 2, 10, 5), 5));
        assert!(a.is_adjacent(&BoundingBox::new(3, 14, 4, 4), 5));
        // Diagonal neighbours share no projection
        assert!(!a.is_adjacent(&BoundingBox::new(12, 12, 4, 4), 5));
    }

    #[test]
    fn test_merge_bounds() {
        let merged = BoundingBox::new(10, 20, 5, 5).merge(&BoundingBox::new(0, 30, 5, 10));
        assert_eq!(merged, BoundingBox::new(0, 20, 15, 20));
    }

    #[test]
    fn test_tighten_shrinks_to_mask() {
        let mut mask = PixelMask::new(20, 20);
        mask.fill_rect(5, 6, 3, 2);
        let tight = BoundingBox::new(0, 0, 20, 20).tighten(&mask);
        assert_eq!(tight, BoundingBox::new(5, 6, 3, 2));
    }

    #[test]
    fn test_tighten_without_mask_pixels_is_identity() {
        let mask = PixelMask::new(20, 20);
        let original = BoundingBox::new(2, 2, 8, 8);
        assert_eq!(original.tighten(&mask), original);
    }

    #[test]
    fn test_normalized_round_trip() {
        let b = BoundingBox::new(50, 30, 100, 60).with_image_size(400, 300);
        assert!((b.nx - 0.125).abs() < 1e-9);
        assert!((b.nh - 0.2).abs() < 1e-9);
        let back = BoundingBox::from_normalized(b.nx, b.ny, b.nw, b.nh, 400, 300);
        assert_eq!((back.x, back.y, back.width, back.height), (50, 30, 100, 60));
    }

    #[test]
    fn test_pad_clamps_to_image() {
        let padded = BoundingBox::new(1, 1, 10, 10).pad(2, 12, 12);
        assert_eq!(padded, BoundingBox::new(0, 0, 12, 12));
    }
}
