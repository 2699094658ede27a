//! Mapping between pixels, nibble indices and byte offsets.
//!
//! A nibble index is a *display* position: `2 * grid_byte + half`, where the
//! grid byte is the cell's position on screen. The data byte shown in a cell
//! is obtained through [`Geometry::flip`], which is its own inverse, so the
//! same transform is used for pixel -> offset and offset -> pixel.

use crate::layout::{Layout, Metrics};
use crate::types::{Pane, Rect};

/// Horizontal padding around the addresses of the offset pane.
pub const OFFSET_PANE_PADDING: i32 = 20;
/// Left padding of the offset labels.
pub const OFFSET_LABEL_LEFT: i32 = 10;
/// Left padding of the hex pane.
pub const HEX_PADDING_LEFT: i32 = 10;
/// Extra width added after the last hex column.
pub const HEX_PANE_EXTRA: i32 = 15;
/// Left padding of the text pane.
pub const TEXT_PADDING_LEFT: i32 = 10;
/// Minimum distance from the top edge to the first baseline.
pub const PADDING_TOP: i32 = 16;

/// Snapshot of everything that determines where bytes are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub layout: Layout,
    pub metrics: Metrics,
    pub data_len: u64,
    pub first_row: u64,
    /// Horizontal scroll position, in characters.
    pub first_column: u32,
    pub visible_rows: u64,
}

impl Geometry {
    fn cw(&self) -> i32 {
        self.metrics.char_width as i32
    }

    fn bpr(&self) -> u64 {
        self.layout.row_bytes()
    }

    fn bpc(&self) -> u64 {
        self.layout.column_bytes()
    }

    /// Distance from the top edge to the baseline of the first row.
    pub fn top_padding(&self) -> i32 {
        PADDING_TOP.max(self.metrics.char_height as i32 + 4)
    }

    pub fn scroll_x(&self) -> i32 {
        self.first_column as i32 * self.cw()
    }

    pub fn offset_pane_width(&self) -> i32 {
        OFFSET_PANE_PADDING + self.cw() * self.layout.address_mode.digits() as i32
    }

    /// Width of one hex column including the spacing after it.
    pub fn column_size(&self) -> i32 {
        2 * self.layout.bytes_per_column as i32 * self.cw() + self.layout.column_spacing as i32
    }

    pub fn hex_pane_left(&self) -> i32 {
        self.offset_pane_width() - self.scroll_x()
    }

    pub fn hex_pane_width(&self) -> i32 {
        HEX_PANE_EXTRA + self.column_size() * self.layout.columns_per_row() as i32
    }

    pub fn text_pane_left(&self) -> i32 {
        self.hex_pane_left() + self.hex_pane_width()
    }

    /// Unscrolled width of all three panes.
    pub fn content_width(&self) -> i32 {
        self.offset_pane_width()
            + self.hex_pane_width()
            + TEXT_PADDING_LEFT
            + self.cw() * self.layout.bytes_per_row as i32
    }

    /// Baseline of a visible row.
    pub fn baseline(&self, visible_row: u64) -> i32 {
        self.top_padding() + visible_row as i32 * self.metrics.row_height as i32
    }

    /// Top edge of the glyphs of a visible row.
    pub fn row_top(&self, visible_row: u64) -> i32 {
        self.baseline(visible_row) - self.metrics.char_height as i32
    }

    pub fn first_visible_byte(&self) -> u64 {
        self.first_row * self.bpr()
    }

    /// Bytes the grid can show, regardless of the data length.
    pub fn max_visible_bytes(&self) -> u64 {
        self.visible_rows * self.bpr()
    }

    /// Bytes actually drawn: the grid capacity clipped to the data.
    pub fn bytes_to_draw(&self) -> u64 {
        self.max_visible_bytes()
            .min(self.data_len.saturating_sub(self.first_visible_byte()))
    }

    pub fn is_nibble_visible(&self, nibble: u64) -> bool {
        let first = 2 * self.first_visible_byte();
        nibble >= first && nibble < first + 2 * self.max_visible_bytes()
    }

    /// x coordinate of the hex cell at `byte_in_row`.
    pub fn hex_cell_x(&self, byte_in_row: u64) -> i32 {
        let column = (byte_in_row / self.bpc()) as i32;
        let within = (byte_in_row % self.bpc()) as i32;
        self.hex_pane_left()
            + HEX_PADDING_LEFT
            + column * self.column_size()
            + within * 2 * self.cw()
    }

    /// x coordinate of the text cell at `byte_in_row`.
    pub fn text_cell_x(&self, byte_in_row: u64) -> i32 {
        self.text_pane_left() + TEXT_PADDING_LEFT + byte_in_row as i32 * self.cw()
    }

    /// Which pane lies under the point, if any.
    pub fn pane_at(&self, x: i32, y: i32) -> Option<Pane> {
        if y < self.row_top(0) {
            return None;
        }
        if x < self.hex_pane_left() {
            Some(Pane::Offsets)
        } else if x < self.text_pane_left() {
            Some(Pane::Hex)
        } else {
            Some(Pane::Text)
        }
    }

    /// Nibble under the point, or `None` outside any data cell.
    pub fn pixel_to_nibble(&self, x: i32, y: i32) -> Option<u64> {
        if x < self.hex_pane_left() + HEX_PADDING_LEFT || y < self.row_top(0) {
            return None;
        }

        let row = ((y - self.row_top(0)) / self.metrics.row_height as i32) as u64;
        if row >= self.visible_rows {
            return None;
        }
        let row_start = self.first_visible_byte() + row * self.bpr();

        let position = match self.pane_at(x, y)? {
            Pane::Offsets => return None,
            Pane::Hex => {
                let dx = x - (self.hex_pane_left() + HEX_PADDING_LEFT);
                let column = (dx / self.column_size()) as u64;
                let nibble_in_column = ((dx % self.column_size()) / self.cw()) as u64;

                // Spacing between columns or after the last one.
                if nibble_in_column >= 2 * self.bpc() {
                    return None;
                }
                let byte_in_row = column * self.bpc() + nibble_in_column / 2;
                if byte_in_row >= self.bpr() {
                    return None;
                }
                2 * (row_start + column * self.bpc()) + nibble_in_column
            }
            Pane::Text => {
                let dx = x - (self.text_pane_left() + TEXT_PADDING_LEFT);
                if dx < 0 {
                    return None;
                }
                let character = (dx / self.cw()) as u64;
                if character >= self.bpr() {
                    return None;
                }
                2 * (row_start + character)
            }
        };

        (position < 2 * self.data_len).then_some(position)
    }

    /// Hex-pane rectangle of one nibble, empty if the nibble is not visible.
    pub fn nibble_bounds(&self, nibble: u64) -> Rect {
        if !self.is_nibble_visible(nibble) {
            return Rect::EMPTY;
        }
        let relative = nibble - 2 * self.first_visible_byte();
        let row = relative / (2 * self.bpr());
        let in_row = relative % (2 * self.bpr());
        let column = (in_row / (2 * self.bpc())) as i32;
        let nibble_in_column = (in_row % (2 * self.bpc())) as i32;

        let x = self.hex_pane_left()
            + HEX_PADDING_LEFT
            + column * self.column_size()
            + nibble_in_column * self.cw();
        Rect::new(x, self.row_top(row), self.cw(), self.metrics.char_height as i32)
    }

    /// Text-pane rectangle of the byte containing `nibble`.
    pub fn text_bounds(&self, nibble: u64) -> Rect {
        if !self.is_nibble_visible(nibble) {
            return Rect::EMPTY;
        }
        let relative = (nibble - 2 * self.first_visible_byte()) / 2;
        let row = relative / self.bpr();
        let x = self.text_cell_x(relative % self.bpr());
        Rect::new(x, self.row_top(row), self.cw(), self.metrics.char_height as i32)
    }

    /// Thin caret bar in front of the nibble (hex) or byte (text).
    pub fn caret_bounds(&self, nibble: u64, pane: Pane) -> Rect {
        let cell = match pane {
            Pane::Text => self.text_bounds(nibble),
            _ => self.nibble_bounds(nibble),
        };
        if cell.is_empty() {
            return Rect::EMPTY;
        }
        Rect::new(cell.x - 1, cell.y - 1, 2, cell.height + 2)
    }

    /// Data offset displayed at grid byte `offset`.
    ///
    /// With `flip_bytes` the bytes of each column are shown in reverse. A
    /// column cut short by the end of the row or the end of the data is
    /// reflected within the bytes it actually has.
    pub fn flip(&self, offset: u64) -> u64 {
        if !self.layout.flip_bytes || offset >= self.data_len {
            return offset;
        }
        let row_start = offset - offset % self.bpr();
        let in_row = offset - row_start;
        let column_start = row_start + in_row - in_row % self.bpc();
        let column_bytes = self
            .bpc()
            .min(row_start + self.bpr() - column_start)
            .min(self.data_len - column_start);

        column_start + column_bytes - 1 - (offset - column_start)
    }

    /// Data offset of the byte shown at `nibble`.
    pub fn offset_for_nibble(&self, nibble: u64) -> u64 {
        self.flip(nibble / 2)
    }

    /// Display nibble (high half) where the data byte `offset` is shown.
    pub fn nibble_for_offset(&self, offset: u64) -> u64 {
        2 * self.flip(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(layout: Layout, data_len: u64) -> Geometry {
        Geometry {
            layout,
            metrics: Metrics::default(),
            data_len,
            first_row: 0,
            first_column: 0,
            visible_rows: 8,
        }
    }

    fn center(r: Rect) -> (i32, i32) {
        assert!(!r.is_empty());
        r.center()
    }

    #[test]
    fn default_pane_positions() {
        let g = geometry(Layout::default(), 256);
        // 20 + 8 digits * 8 px
        assert_eq!(g.offset_pane_width(), 84);
        // 2 * 2 * 8 + 4
        assert_eq!(g.column_size(), 36);
        assert_eq!(g.hex_pane_width(), 15 + 36 * 8);
        assert_eq!(g.text_pane_left(), 84 + 303);
    }

    #[test]
    fn round_trip_every_visible_nibble() {
        let layouts = [
            Layout::default(),
            Layout { bytes_per_row: 8, bytes_per_column: 4, column_spacing: 7, ..Layout::default() },
            Layout { bytes_per_row: 10, bytes_per_column: 4, ..Layout::default() },
            Layout { bytes_per_row: 16, bytes_per_column: 1, column_spacing: 1, ..Layout::default() },
        ];
        for layout in layouts {
            let mut g = geometry(layout, 1000);
            g.first_row = 3;
            g.first_column = 2;
            let first = 2 * g.first_visible_byte();
            for n in first..first + 2 * g.max_visible_bytes() {
                let (x, y) = center(g.nibble_bounds(n));
                assert_eq!(g.pixel_to_nibble(x, y), Some(n), "layout {:?} nibble {}", layout, n);
            }
        }
    }

    #[test]
    fn text_pane_maps_to_even_nibble() {
        let g = geometry(Layout::default(), 256);
        for n in 0..2 * g.max_visible_bytes() {
            let (x, y) = center(g.text_bounds(n));
            assert_eq!(g.pixel_to_nibble(x, y), Some(n & !1));
        }
    }

    #[test]
    fn gaps_and_margins_have_no_nibble() {
        let g = geometry(Layout::default(), 256);
        let y = g.baseline(0) - 2;
        // Offset pane.
        assert_eq!(g.pixel_to_nibble(5, y), None);
        // Left padding of the hex pane.
        assert_eq!(g.pixel_to_nibble(g.hex_pane_left() + 2, y), None);
        // Spacing after the first column (4 nibbles * 8 px).
        let gap = g.hex_pane_left() + HEX_PADDING_LEFT + 32 + 1;
        assert_eq!(g.pixel_to_nibble(gap, y), None);
        // Past the last text character.
        let past = g.text_cell_x(16) + 1;
        assert_eq!(g.pixel_to_nibble(past, y), None);
        // Above the first row.
        assert_eq!(g.pixel_to_nibble(g.hex_cell_x(0) + 1, 0), None);
    }

    #[test]
    fn nothing_past_data_end() {
        let g = geometry(Layout::default(), 20);
        let inside = center(g.nibble_bounds(39));
        assert_eq!(g.pixel_to_nibble(inside.0, inside.1), Some(39));
        let outside = center(g.nibble_bounds(40));
        assert_eq!(g.pixel_to_nibble(outside.0, outside.1), None);
    }

    #[test]
    fn bounds_outside_visible_range_are_empty() {
        let mut g = geometry(Layout::default(), 4096);
        g.first_row = 2;
        assert!(g.nibble_bounds(63).is_empty());
        assert!(!g.nibble_bounds(64).is_empty());
        let end = 2 * (g.first_visible_byte() + g.max_visible_bytes());
        assert!(!g.nibble_bounds(end - 1).is_empty());
        assert!(g.nibble_bounds(end).is_empty());
        assert!(g.text_bounds(end).is_empty());
        assert!(g.caret_bounds(0, Pane::Hex).is_empty());
    }

    #[test]
    fn flip_identity_when_disabled() {
        let g = geometry(Layout { bytes_per_column: 4, ..Layout::default() }, 256);
        for o in 0..256 {
            assert_eq!(g.offset_for_nibble(2 * o), o);
        }
    }

    #[test]
    fn flip_reverses_four_byte_columns() {
        let g = geometry(
            Layout { bytes_per_column: 4, flip_bytes: true, ..Layout::default() },
            256,
        );
        let shown: Vec<u64> = (0..8).map(|o| g.offset_for_nibble(2 * o)).collect();
        assert_eq!(shown, vec![3, 2, 1, 0, 7, 6, 5, 4]);
        assert_eq!(g.offset_for_nibble(2 * 13 + 1), 14);
    }

    #[test]
    fn flip_is_an_involution_with_partial_columns() {
        let layouts = [
            Layout { bytes_per_column: 4, flip_bytes: true, ..Layout::default() },
            Layout { bytes_per_row: 10, bytes_per_column: 4, flip_bytes: true, ..Layout::default() },
        ];
        for layout in layouts {
            for len in [1u64, 7, 30, 64] {
                let g = geometry(layout, len);
                for o in 0..len {
                    let f = g.flip(o);
                    assert!(f < len);
                    assert_eq!(g.flip(f), o);
                    assert_eq!(g.nibble_for_offset(g.offset_for_nibble(2 * o)), 2 * o);
                }
            }
        }
    }

    #[test]
    fn flip_trailing_partial_column() {
        let g = geometry(Layout { bytes_per_column: 4, flip_bytes: true, ..Layout::default() }, 6);
        let shown: Vec<u64> = (0..6).map(|o| g.flip(o)).collect();
        assert_eq!(shown, vec![3, 2, 1, 0, 5, 4]);
    }

    #[test]
    fn horizontal_scroll_shifts_everything() {
        let mut g = geometry(Layout::default(), 256);
        let before = g.nibble_bounds(5);
        g.first_column = 3;
        let after = g.nibble_bounds(5);
        assert_eq!(before.x - after.x, 24);
        assert_eq!(before.y, after.y);
    }

    #[test]
    fn bytes_to_draw_clips_to_data() {
        let mut g = geometry(Layout::default(), 100);
        assert_eq!(g.bytes_to_draw(), 100);
        g.first_row = 5;
        assert_eq!(g.bytes_to_draw(), 20);
        g.first_row = 9;
        assert_eq!(g.bytes_to_draw(), 0);
    }

    #[test]
    fn pane_detection() {
        let g = geometry(Layout::default(), 256);
        let y = g.baseline(1);
        assert_eq!(g.pane_at(3, y), Some(Pane::Offsets));
        assert_eq!(g.pane_at(g.hex_cell_x(3), y), Some(Pane::Hex));
        assert_eq!(g.pane_at(g.text_cell_x(3), y), Some(Pane::Text));
        assert_eq!(g.pane_at(g.text_cell_x(3), 0), None);
    }
}
