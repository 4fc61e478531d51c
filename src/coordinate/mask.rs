//! Dense boolean pixel grid
//!
//! Detectors allocate one of these per call for foreground masks and
//! visited sets, and drop it when the call returns.

/// Row-major boolean grid with one cell per pixel
#[derive(Debug, Clone)]
pub struct PixelMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl PixelMask {
    /// Create an all-false mask
    pub fn new(width: u32, height: u32) -> Self {
        PixelMask {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `predicate` at every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut predicate: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut mask = PixelMask::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if predicate(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Read a cell; out-of-range coordinates read as false
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[self.index(x, y)]
    }

    /// Write a cell; out-of-range coordinates are ignored
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = value;
        }
    }

    /// Set every cell of a rectangle (clamped to the mask)
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let end_x = x.saturating_add(width).min(self.width);
        let end_y = y.saturating_add(height).min(self.height);
        for yy in y..end_y {
            for xx in x..end_x {
                let idx = self.index(xx, yy);
                self.cells[idx] = true;
            }
        }
    }

    /// Number of set cells
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }
}
