use crate::coords::Geometry;
use crate::types::ByteRange;

/// Rows the vertical scroll range extends past the last data row.
pub const SCROLL_MARGIN_ROWS: u64 = 2;

/// Scroll ranges derived from the data length and viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollExtents {
    pub vertical_max: u64,
    pub vertical_enabled: bool,
    pub horizontal_max: u32,
    pub horizontal_enabled: bool,
}

/// The visible window onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    first_row: u64,
    first_column: u32,
    width: u32,
    height: u32,
    extents: ScrollExtents,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            first_row: 0,
            first_column: 0,
            width: 640,
            height: 480,
            extents: ScrollExtents::default(),
        }
    }
}

impl Viewport {
    pub fn first_row(&self) -> u64 {
        self.first_row
    }

    pub fn first_column(&self) -> u32 {
        self.first_column
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn extents(&self) -> ScrollExtents {
        self.extents
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Rows that fit in the viewport, counting a partially visible last row.
    pub fn visible_rows(&self, top_padding: i32, row_height: u32) -> u64 {
        let raw = (self.height as i64 - top_padding as i64).max(0) as u64;
        raw.div_ceil(u64::from(row_height.max(1)))
    }

    /// Byte range currently shown, clipped to the data.
    pub fn visible_byte_range(&self, geometry: &Geometry) -> ByteRange {
        ByteRange::new(geometry.first_visible_byte(), geometry.bytes_to_draw())
    }

    /// Make the row containing `nibble` the first visible row.
    pub fn scroll_to_nibble(&mut self, nibble: u64, bytes_per_row: u64) {
        self.set_first_row(nibble / (2 * bytes_per_row));
    }

    /// Scroll by whole rows so that `nibble` is on screen. Returns true if
    /// the first row changed.
    pub fn ensure_visible(&mut self, nibble: u64, bytes_per_row: u64, visible_rows: u64) -> bool {
        let row = nibble / (2 * bytes_per_row);
        let before = self.first_row;

        if row < self.first_row {
            self.set_first_row(row);
        } else if row >= self.first_row + visible_rows.max(1) {
            self.set_first_row(row + 1 - visible_rows.max(1));
        }

        if self.first_row != before {
            log::debug!("scrolled from row {} to row {} for nibble {}", before, self.first_row, nibble);
        }
        self.first_row != before
    }

    pub fn set_first_row(&mut self, row: u64) {
        self.first_row = row.min(self.extents.vertical_max);
    }

    pub fn set_first_column(&mut self, column: u32) {
        self.first_column = column.min(self.extents.horizontal_max);
    }

    pub fn scroll_rows(&mut self, delta: i64) {
        self.set_first_row(self.first_row.saturating_add_signed(delta));
    }

    /// Recompute the scroll ranges for the current data and viewport size,
    /// then clamp the scroll position into them.
    pub fn recompute_extents(&mut self, geometry: &Geometry) {
        let bytes_per_row = geometry.layout.row_bytes();
        let visible_rows =
            self.visible_rows(geometry.top_padding(), geometry.metrics.row_height);
        let total_rows = geometry.data_len.div_ceil(bytes_per_row);

        let mut extents = ScrollExtents::default();
        if total_rows > visible_rows {
            extents.vertical_max = total_rows - visible_rows + SCROLL_MARGIN_ROWS;
            extents.vertical_enabled = true;
        }

        let total_width = geometry.content_width().max(0) as u32;
        if self.width < total_width {
            let char_width = geometry.metrics.char_width.max(1);
            extents.horizontal_max = (total_width - self.width) / char_width + 1;
            extents.horizontal_enabled = true;
        }

        self.extents = extents;
        self.first_row = self.first_row.min(extents.vertical_max);
        self.first_column = self.first_column.min(extents.horizontal_max);
    }
}
