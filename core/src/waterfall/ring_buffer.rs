//! Row-major pixel store that scrolls by moving a row pointer rather than moving pixels.
//!
//! Rows are written at [WaterfallRingBuffer::current_row], after which the pointer steps back one
//! row (wrapping at the top), so the newest row always sits just above the previous one. A
//! renderer draws the image in two blits described by [BlitSegments].
use super::color::ColorMapper;
use std::{ops::Range, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq)]
pub enum WaterfallError {
    #[error("Row has {actual} values but the waterfall is {expected} pixels wide")]
    RowLength { expected: usize, actual: usize },
}

/// The two contiguous row ranges that make up the image, newest rows first.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct BlitSegments {
    /// Rows `current_row + 1` to the bottom of the buffer.
    pub newer: Range<usize>,
    /// Rows from the top of the buffer.
    pub older: Range<usize>,
}

impl BlitSegments {
    /// Number of rows on display.
    pub fn len(&self) -> usize {
        self.newer.len() + self.older.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row indices in display order, from the newest row down.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.newer.clone().chain(self.older.clone())
    }
}

pub struct WaterfallRingBuffer {
    color_mapper: Arc<ColorMapper>,
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    current_row: usize,
    filled_rows: usize,
}

impl WaterfallRingBuffer {
    /// Creates an unallocated buffer, rows are ignored until it is resized.
    pub fn new(color_mapper: Arc<ColorMapper>) -> Self {
        Self {
            color_mapper,
            pixels: Vec::new(),
            width: 0,
            height: 0,
            current_row: 0,
            filled_rows: 0,
        }
    }

    /// Reallocates the pixels and discards every row written so far.
    ///
    /// Returns false and leaves the buffer untouched if either dimension is zero, or if the
    /// pixels cannot be allocated.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let Some(len) = width.checked_mul(height) else {
            warn!("Waterfall size {width}x{height} overflows");
            return false;
        };
        let mut pixels = Vec::new();
        if let Err(e) = pixels.try_reserve_exact(len) {
            warn!("Cannot allocate waterfall of {width}x{height}: {e}");
            return false;
        }
        pixels.resize(len, 0);

        debug!("Resizing waterfall to {width}x{height}");
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        self.current_row = 0;
        self.filled_rows = 0;
        true
    }

    /// Resizes to the pixel size of a logical size at the given display scaling.
    pub fn resize_logical(&mut self, width: f64, height: f64, scaling: f64) -> bool {
        match (
            physical_pixels(width, scaling),
            physical_pixels(height, scaling),
        ) {
            (Some(width), Some(height)) => self.resize(width, height),
            _ => false,
        }
    }

    pub fn is_allocated(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Colour maps a row of normalized values into the current row and scrolls.
    ///
    /// Does nothing if the buffer is unallocated.
    pub fn write_row(&mut self, normalized_row: &[f64]) -> Result<(), WaterfallError> {
        if !self.is_allocated() {
            return Ok(());
        }
        if normalized_row.len() != self.width {
            return Err(WaterfallError::RowLength {
                expected: self.width,
                actual: normalized_row.len(),
            });
        }

        let start = self.current_row * self.width;
        if let Some(row) = self.pixels.get_mut(start..start + self.width) {
            for (pixel, &value) in row.iter_mut().zip(normalized_row) {
                *pixel = self.color_mapper.get_color(value);
            }
        }

        self.current_row = (self.current_row + self.height - 1) % self.height;
        self.filled_rows = (self.filled_rows + 1).min(self.height);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The row the next write goes to.
    pub fn current_row(&self) -> usize {
        self.current_row
    }

    /// Number of rows written since the last resize, up to the height.
    pub fn filled_rows(&self) -> usize {
        self.filled_rows
    }

    pub fn color_mapper(&self) -> &ColorMapper {
        &self.color_mapper
    }

    /// The whole backing store, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn row(&self, index: usize) -> Option<&[u32]> {
        let start = index.checked_mul(self.width)?;
        self.pixels.get(start..start + self.width)
    }

    /// Splits the rows to display into the newer and older segments.
    ///
    /// Until the buffer is full both segments only cover the rows written so far. Once full the
    /// older segment stops short of the current row, which is the next to be overwritten.
    pub fn segments(&self) -> BlitSegments {
        if !self.is_allocated() {
            return BlitSegments::default();
        }
        let newest = self.current_row + 1;
        let newer_height = (self.height - newest).min(self.filled_rows);
        let older_height = if self.filled_rows >= self.height {
            self.current_row
        } else {
            self.filled_rows.saturating_sub(newer_height)
        };
        BlitSegments {
            newer: newest..newest + newer_height,
            older: 0..older_height,
        }
    }

    /// The displayed rows, newest first.
    pub fn rows_newest_first(&self) -> impl Iterator<Item = &[u32]> + '_ {
        let segments = self.segments();
        segments
            .newer
            .chain(segments.older)
            .filter_map(|index| self.row(index))
    }
}

fn physical_pixels(logical: f64, scaling: f64) -> Option<usize> {
    let pixels = (logical * scaling).floor();
    (pixels >= 1.0 && pixels < usize::MAX as f64).then_some(pixels as usize)
}
