//! Grid splitter
//!
//! Cuts the image into `rows x columns` equal cells; the last row and column
//! absorb any remainder so the cells tile the image exactly.

use log::info;

use crate::coordinate::{BoundingBox, MIN_REGION_SIZE};
use crate::errors::{RegionError, RegionResult};
use crate::raster::PixelBuffer;

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Regular grid splitter
#[derive(Debug, Clone)]
pub struct GridStrategy {
    pub rows: u32,
    pub columns: u32,
}

/// Split a `width x height` area into grid cells in reading order
pub fn split_grid(width: u32, height: u32, rows: u32, columns: u32) -> Vec<BoundingBox> {
    if rows == 0 || columns == 0 {
        return Vec::new();
    }

    let cell_w = width / columns;
    let cell_h = height / rows;
    let mut cells = Vec::with_capacity(rows as usize * columns as usize);

    for row in 0..rows {
        let y = row * cell_h;
        let h = if row == rows - 1 { height - y } else { cell_h };
        for col in 0..columns {
            let x = col * cell_w;
            let w = if col == columns - 1 { width - x } else { cell_w };
            cells.push(BoundingBox::new(x, y, w, h));
        }
    }

    cells
}

impl GridStrategy {
    pub fn new(rows: u32, columns: u32) -> Self {
        GridStrategy { rows, columns }
    }

    /// Reject grids whose cells would be empty or under the minimum size
    fn validate(&self, width: u32, height: u32) -> RegionResult<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(RegionError::InvalidParameter(
                format!("grid needs at least one row and column, got {}x{}", self.rows, self.columns)));
        }
        if width / self.columns < MIN_REGION_SIZE || height / self.rows < MIN_REGION_SIZE {
            return Err(RegionError::InvalidParameter(
                format!("{}x{} grid is too fine for a {}x{} image", self.rows, self.columns, width, height)));
        }
        Ok(())
    }
}

impl DetectorStrategy for GridStrategy {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let width = buffer.width();
        let height = buffer.height();
        self.validate(width, height)?;

        let regions: Vec<DetectedRegion> = split_grid(width, height, self.rows, self.columns)
            .into_iter()
            .enumerate()
            .map(|(i, b)| {
                let row = i as u32 / self.columns + 1;
                let col = i as u32 % self.columns + 1;
                DetectedRegion::new(b.with_image_size(width, height), RegionSource::Grid, 1.0)
                    .with_description(format!("Grid cell row {} column {}", row, col))
                    .with_shape("cell")
                    .with_suggested_filename(format!("grid_r{}_c{}", row, col))
            })
            .collect();

        info!("Grid split produced {} cell(s)", regions.len());
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_grid_absorbs_remainder() {
        let cells = split_grid(10, 7, 2, 3);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], BoundingBox::new(0, 0, 3, 3));
        assert_eq!(cells[2], BoundingBox::new(6, 0, 4, 3));
        assert_eq!(cells[5], BoundingBox::new(6, 3, 4, 4));
    }

    #[test]
    fn test_split_grid_zero() {
        assert!(split_grid(10, 10, 0, 3).is_empty());
    }
}
