//! Frame composition and the lazy-data state machine.
//!
//! A render pass never blocks. When the visible bytes are not available the
//! driver switches to [`DefinitionStatus::Undefined`], draws placeholders and
//! arms a [`RetryPoll`] that the host advances through `tick`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::coords::{Geometry, OFFSET_LABEL_LEFT};
use crate::ranges::ColoredRangeManager;
use crate::selection::Selection;
use crate::source::DataSource;
use crate::types::{is_printable, ByteRange, Color, Pane, Rect};

/// Interval between two polls for missing data.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Whether the visible bytes can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefinitionStatus {
    #[default]
    Defined,
    Undefined,
}

/// Colors used by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub offset_background: Color,
    pub hex_background: Color,
    pub text_background: Color,
    pub offset_foreground: Color,
    /// Text of even hex columns.
    pub hex_foreground: Color,
    /// Text of odd hex columns.
    pub hex_foreground_alt: Color,
    pub text_foreground: Color,
    pub selection: Color,
    pub hover: Color,
    pub disabled: Color,
    pub separator: Color,
    pub caret: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            offset_background: Color::GRAY,
            hex_background: Color::WHITE,
            text_background: Color::WHITE,
            offset_foreground: Color::WHITE,
            hex_foreground: Color::BLUE,
            hex_foreground_alt: Color::from_hex(0x3399FF),
            text_foreground: Color::from_hex(0x339900),
            selection: Color::YELLOW,
            hover: Color::LIGHT_GRAY,
            disabled: Color::GRAY,
            separator: Color::BLACK,
            caret: Color::BLACK,
        }
    }
}

/// Value-based coloring consulted after selection and colored ranges.
pub trait Colormap {
    /// Colors for `data[index]` as `(foreground, background)`, or `None` to
    /// keep the defaults.
    fn colors(&self, data: &[u8], index: usize) -> Option<(Option<Color>, Option<Color>)>;
}

/// Colors bytes by class: zeros, printable ASCII and 0xFF.
#[derive(Debug, Clone, Copy)]
pub struct ByteClassColormap {
    pub zero: Color,
    pub printable: Color,
    pub full: Color,
}

impl Default for ByteClassColormap {
    fn default() -> Self {
        Self {
            zero: Color::rgb(160, 160, 160),
            printable: Color::rgb(0, 120, 0),
            full: Color::rgb(200, 40, 40),
        }
    }
}

impl Colormap for ByteClassColormap {
    fn colors(&self, data: &[u8], index: usize) -> Option<(Option<Color>, Option<Color>)> {
        match *data.get(index)? {
            0x00 => Some((Some(self.zero), None)),
            0xFF => Some((Some(self.full), None)),
            b if is_printable(b) => Some((Some(self.printable), None)),
            _ => None,
        }
    }
}

/// How one cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub foreground: Color,
    pub background: Option<Color>,
    pub selected: bool,
}

/// One byte in one pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub pane: Pane,
    /// Grid byte position (before the flip transform).
    pub position: u64,
    /// Data offset of the byte drawn in this cell.
    pub offset: u64,
    pub x: i32,
    pub baseline: i32,
    /// Area painted with the background color.
    pub bounds: Rect,
    /// `"3F"` in the hex pane, one character in the text pane, or
    /// placeholders while undefined.
    pub text: String,
    pub style: CellStyle,
}

/// Address drawn at the start of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetLabel {
    pub text: String,
    pub x: i32,
    pub baseline: i32,
}

/// Horizontal extent of each pane, after horizontal scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneBounds {
    pub offsets_left: i32,
    pub hex_left: i32,
    pub text_left: i32,
    pub content_right: i32,
}

/// Everything the host needs to paint one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub status: DefinitionStatus,
    pub panes: PaneBounds,
    pub offsets: Vec<OffsetLabel>,
    pub cells: Vec<Cell>,
    pub hover: Vec<Rect>,
    pub caret: Option<Rect>,
}

impl Frame {
    pub fn cells_in(&self, pane: Pane) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.pane == pane)
    }
}

/// Inputs of one render pass.
pub struct FrameInputs<'a> {
    pub geometry: Geometry,
    pub selection: &'a Selection,
    pub ranges: &'a ColoredRangeManager,
    pub colormap: Option<&'a dyn Colormap>,
    pub palette: &'a Palette,
    /// Bytes of the visible range, `None` while undefined.
    pub data: Option<&'a [u8]>,
    pub active_pane: Pane,
    pub hover: Option<(i32, i32)>,
    /// False draws every byte in the disabled color.
    pub enabled: bool,
    pub show_caret: bool,
}

/// Compute the styled cells, labels, hover and caret rectangles.
pub fn compose(inputs: &FrameInputs<'_>) -> Frame {
    let g = &inputs.geometry;
    let palette = inputs.palette;
    let defined = inputs.data.is_some();
    let status = if defined { DefinitionStatus::Defined } else { DefinitionStatus::Undefined };
    let bytes_per_row = g.layout.row_bytes();
    let first = g.first_visible_byte();
    let count = g.bytes_to_draw();
    let char_height = g.metrics.char_height as i32;
    let char_width = g.metrics.char_width as i32;

    let offsets = (0..g.visible_rows)
        .take_while(|row| first + row * bytes_per_row < g.data_len)
        .map(|row| OffsetLabel {
            text: g
                .layout
                .address_mode
                .format(g.layout.base_address.wrapping_add(first + row * bytes_per_row)),
            x: OFFSET_LABEL_LEFT - g.scroll_x(),
            baseline: g.baseline(row),
        })
        .collect();

    let mut cells = Vec::with_capacity(2 * count as usize);
    for i in 0..count {
        let position = first + i;
        let offset = g.flip(position);
        let row = i / bytes_per_row;
        let in_row = i % bytes_per_row;
        let baseline = g.baseline(row);
        let even_column = (in_row / g.layout.column_bytes()) % 2 == 0;

        let byte = inputs.data.and_then(|d| d.get((offset - first) as usize).copied());
        let styles = match (byte, inputs.data) {
            (Some(_), Some(data)) if inputs.enabled => style_for(inputs, data, position, offset, even_column),
            _ => [disabled(palette), disabled(palette)],
        };

        let hex_x = g.hex_cell_x(in_row);
        cells.push(Cell {
            pane: Pane::Hex,
            position,
            offset,
            x: hex_x,
            baseline,
            bounds: Rect::new(hex_x, baseline - char_height, 2 * char_width, char_height + 2),
            text: match byte {
                Some(b) => {
                    let digits = [HEX_DIGITS[(b >> 4) as usize], HEX_DIGITS[(b & 0x0F) as usize]];
                    String::from_utf8_lossy(&digits).into_owned()
                }
                None => "??".to_string(),
            },
            style: styles[0],
        });

        let text_x = g.text_cell_x(in_row);
        cells.push(Cell {
            pane: Pane::Text,
            position,
            offset,
            x: text_x,
            baseline,
            bounds: Rect::new(text_x, baseline - char_height, char_width, char_height + 2),
            text: match byte {
                Some(b) if is_printable(b) => char::from(b).to_string(),
                Some(_) => ".".to_string(),
                None => "?".to_string(),
            },
            style: styles[1],
        });
    }

    let hover = match (defined && inputs.enabled, inputs.hover) {
        (true, Some((x, y))) => hover_rects(g, x, y),
        _ => Vec::new(),
    };

    let caret = (defined && inputs.show_caret)
        .then(|| g.caret_bounds(inputs.selection.caret(), inputs.active_pane))
        .filter(|r| !r.is_empty());

    Frame {
        status,
        panes: PaneBounds {
            offsets_left: -g.scroll_x(),
            hex_left: g.hex_pane_left(),
            text_left: g.text_pane_left(),
            content_right: g.content_width() - g.scroll_x(),
        },
        offsets,
        cells,
        hover,
        caret,
    }
}

fn disabled(palette: &Palette) -> CellStyle {
    CellStyle { foreground: palette.disabled, background: None, selected: false }
}

/// Styles of the hex and text cell of one byte. Selection beats colored
/// ranges, which beat the colormap.
fn style_for(
    inputs: &FrameInputs<'_>,
    data: &[u8],
    position: u64,
    offset: u64,
    even_column: bool,
) -> [CellStyle; 2] {
    let palette = inputs.palette;
    let hex_default = if even_column { palette.hex_foreground } else { palette.hex_foreground_alt };
    let text_default = palette.text_foreground;

    if inputs.selection.is_selected(position) {
        return [hex_default, text_default].map(|foreground| CellStyle {
            foreground,
            background: Some(palette.selection),
            selected: true,
        });
    }

    if let Some(range) = inputs.ranges.find_range(offset) {
        return [hex_default, text_default].map(|fallback| CellStyle {
            foreground: range.foreground.unwrap_or(fallback),
            background: range.background,
            selected: false,
        });
    }

    let index = (offset - inputs.geometry.first_visible_byte()) as usize;
    if let Some((foreground, background)) = inputs.colormap.and_then(|c| c.colors(data, index)) {
        return [hex_default, text_default].map(|fallback| CellStyle {
            foreground: foreground.unwrap_or(fallback),
            background,
            selected: false,
        });
    }

    [hex_default, text_default].map(|foreground| CellStyle { foreground, background: None, selected: false })
}

/// Rectangles highlighted under the pointer: the nibble (or both nibbles of
/// the byte when pointing at the text pane) and the matching text cell.
fn hover_rects(g: &Geometry, x: i32, y: i32) -> Vec<Rect> {
    let Some(nibble) = g.pixel_to_nibble(x, y) else {
        return Vec::new();
    };
    let mut rects = match g.pane_at(x, y) {
        Some(Pane::Text) => vec![g.nibble_bounds(nibble), g.nibble_bounds(nibble + 1)],
        _ => vec![g.nibble_bounds(nibble)],
    };
    rects.push(g.text_bounds(nibble));
    rects.retain(|r| !r.is_empty());
    rects
}

/// The two questions the retry poll asks about missing bytes.
pub trait Probe {
    fn has_data(&mut self, offset: u64, len: u64) -> bool;
    fn keep_trying(&self) -> bool;
}

impl<T: DataSource + ?Sized> Probe for T {
    fn has_data(&mut self, offset: u64, len: u64) -> bool {
        DataSource::has_data(self, offset, len)
    }

    fn keep_trying(&self) -> bool {
        DataSource::keep_trying(self)
    }
}

/// Pending re-check of a byte range that was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPoll {
    pub region: ByteRange,
    pub due: Instant,
}

/// Owns the definition status and the retry poll.
#[derive(Debug, Clone)]
pub struct RenderDriver {
    status: DefinitionStatus,
    poll: Option<RetryPoll>,
    interval: Duration,
}

impl Default for RenderDriver {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL)
    }
}

impl RenderDriver {
    pub fn new(interval: Duration) -> Self {
        Self { status: DefinitionStatus::Defined, poll: None, interval }
    }

    pub fn status(&self) -> DefinitionStatus {
        self.status
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn pending_poll(&self) -> Option<RetryPoll> {
        self.poll
    }

    /// Back to `Defined` with no poll, as for a freshly installed source.
    pub fn reset(&mut self) {
        self.status = DefinitionStatus::Defined;
        self.poll = None;
    }

    /// Returns true if `region` can be drawn. Otherwise switches to
    /// `Undefined` and arms a poll for it.
    pub fn check<P: Probe + ?Sized>(&mut self, probe: &mut P, region: ByteRange, now: Instant) -> bool {
        if self.status == DefinitionStatus::Undefined {
            return false;
        }
        if region.is_empty() || probe.has_data(region.offset, region.length) {
            return true;
        }
        self.enter_undefined(region, now);
        false
    }

    fn enter_undefined(&mut self, region: ByteRange, now: Instant) {
        log::debug!("bytes 0x{:X}..0x{:X} unavailable, polling", region.offset, region.end());
        self.status = DefinitionStatus::Undefined;
        self.poll = Some(RetryPoll { region, due: now + self.interval });
    }

    /// Read the visible bytes, or switch to `Undefined` and arm a poll when
    /// the source does not have them. Returns `None` while undefined.
    pub fn fetch_visible(
        &mut self,
        source: &mut dyn DataSource,
        region: ByteRange,
        now: Instant,
    ) -> Option<Vec<u8>> {
        if !self.check(&mut *source, region, now) {
            return None;
        }
        if region.is_empty() {
            return Some(Vec::new());
        }
        match source.get_data(region.offset, region.length) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("read of {:?} failed after has_data: {}", region, e);
                self.enter_undefined(region, now);
                None
            }
        }
    }

    /// Poll if the deadline has passed. Returns true if the status changed.
    pub fn tick<P: Probe + ?Sized>(&mut self, probe: &mut P, now: Instant) -> bool {
        match self.poll {
            Some(poll) if now >= poll.due => self.poll_at(probe, now),
            _ => false,
        }
    }

    /// Poll immediately, ignoring the deadline. Returns true if the status
    /// changed.
    pub fn poll_at<P: Probe + ?Sized>(&mut self, probe: &mut P, now: Instant) -> bool {
        let Some(poll) = self.poll.take() else {
            return false;
        };

        if probe.has_data(poll.region.offset, poll.region.length) {
            log::debug!("bytes 0x{:X}..0x{:X} arrived", poll.region.offset, poll.region.end());
            self.status = DefinitionStatus::Defined;
            return true;
        }

        if !probe.keep_trying() {
            log::info!(
                "source gave up on 0x{:X}..0x{:X}; view stays undefined",
                poll.region.offset,
                poll.region.end()
            );
            return false;
        }

        self.poll = Some(RetryPoll { due: now + self.interval, ..poll });
        false
    }

    /// Time until the next poll is due, `None` when not polling.
    pub fn next_poll_in(&self, now: Instant) -> Option<Duration> {
        self.poll.map(|p| p.due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::layout::{Layout, Metrics};
    use crate::source::MemorySource;
    use std::collections::VecDeque;

    /// Answers `has_data` from a script, then repeats the last answer.
    struct Scripted {
        answers: VecDeque<bool>,
        last: bool,
        keep_trying: bool,
        calls: usize,
    }

    impl Scripted {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                last: false,
                keep_trying: true,
                calls: 0,
            }
        }
    }

    impl DataSource for Scripted {
        fn len(&self) -> u64 {
            256
        }
        fn has_data(&mut self, _offset: u64, _len: u64) -> bool {
            self.calls += 1;
            if let Some(a) = self.answers.pop_front() {
                self.last = a;
            }
            self.last
        }
        fn get_data(&mut self, _offset: u64, len: u64) -> Result<Vec<u8>> {
            Ok(vec![0xAB; len as usize])
        }
        fn set_data(&mut self, _offset: u64, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }
        fn is_editable(&self) -> bool {
            false
        }
        fn keep_trying(&self) -> bool {
            self.keep_trying
        }
    }

    fn geometry(data_len: u64, visible_rows: u64) -> Geometry {
        Geometry {
            layout: Layout::default(),
            metrics: Metrics::default(),
            data_len,
            first_row: 0,
            first_column: 0,
            visible_rows,
        }
    }

    #[test]
    fn missing_data_then_arrives_on_second_poll() {
        let mut src = Scripted::new(&[false, false, true]);
        let mut driver = RenderDriver::default();
        let now = Instant::now();
        let region = ByteRange::new(0, 64);

        assert!(driver.fetch_visible(&mut src, region, now).is_none());
        assert_eq!(driver.status(), DefinitionStatus::Undefined);
        assert_eq!(driver.pending_poll(), Some(RetryPoll { region, due: now + DEFAULT_RETRY_INTERVAL }));

        // Not due yet.
        assert!(!driver.tick(&mut src, now));
        assert_eq!(src.calls, 1);

        let first = now + DEFAULT_RETRY_INTERVAL;
        assert!(!driver.tick(&mut src, first));
        assert_eq!(driver.status(), DefinitionStatus::Undefined);
        // Re-armed one interval after the failed poll.
        assert_eq!(driver.pending_poll().map(|p| p.due), Some(first + DEFAULT_RETRY_INTERVAL));

        let second = first + DEFAULT_RETRY_INTERVAL;
        assert!(driver.tick(&mut src, second));
        assert_eq!(driver.status(), DefinitionStatus::Defined);
        assert!(!driver.is_polling());
        assert_eq!(src.calls, 3);

        assert_eq!(driver.fetch_visible(&mut src, region, second).unwrap().len(), 64);
    }

    #[test]
    fn giving_up_is_terminal() {
        let mut src = Scripted::new(&[false]);
        src.keep_trying = false;
        let mut driver = RenderDriver::default();
        let now = Instant::now();

        driver.fetch_visible(&mut src, ByteRange::new(0, 16), now);
        assert!(!driver.poll_at(&mut src, now));
        assert!(!driver.is_polling());
        assert_eq!(driver.status(), DefinitionStatus::Undefined);
        assert_eq!(driver.next_poll_in(now), None);

        // Rendering again does not re-arm.
        assert!(driver.fetch_visible(&mut src, ByteRange::new(0, 16), now).is_none());
        assert!(!driver.is_polling());

        driver.reset();
        assert_eq!(driver.status(), DefinitionStatus::Defined);
    }

    #[test]
    fn next_poll_in_counts_down() {
        let mut src = Scripted::new(&[false]);
        let mut driver = RenderDriver::new(Duration::from_millis(250));
        let now = Instant::now();
        driver.fetch_visible(&mut src, ByteRange::new(0, 16), now);
        assert_eq!(driver.next_poll_in(now), Some(Duration::from_millis(250)));
        assert_eq!(driver.next_poll_in(now + Duration::from_secs(1)), Some(Duration::ZERO));
    }

    #[test]
    fn empty_region_is_always_defined() {
        let mut src = Scripted::new(&[false]);
        let mut driver = RenderDriver::default();
        assert_eq!(driver.fetch_visible(&mut src, ByteRange::new(0, 0), Instant::now()), Some(vec![]));
        assert_eq!(src.calls, 0);
    }

    fn frame_for(
        data: &[u8],
        geometry: Geometry,
        selection: &Selection,
        ranges: &ColoredRangeManager,
        colormap: Option<&dyn Colormap>,
        defined: bool,
    ) -> Frame {
        let palette = Palette::default();
        let inputs = FrameInputs {
            geometry,
            selection,
            ranges,
            colormap,
            palette: &palette,
            data: defined.then_some(data),
            active_pane: Pane::Hex,
            hover: None,
            enabled: true,
            show_caret: true,
        };
        compose(&inputs)
    }

    #[test]
    fn cells_for_visible_bytes() {
        let mut src = MemorySource::new((0..40u8).collect());
        let data = src.get_data(0, 40).unwrap();
        let g = geometry(40, 4);
        let sel = Selection::new(80);
        let frame = frame_for(&data, g, &sel, &ColoredRangeManager::default(), None, true);

        assert_eq!(frame.status, DefinitionStatus::Defined);
        assert_eq!(frame.cells_in(Pane::Hex).count(), 40);
        assert_eq!(frame.cells_in(Pane::Text).count(), 40);
        assert_eq!(frame.offsets.len(), 3);
        assert_eq!(frame.offsets[2].text, "00000020");

        let hex: Vec<&str> = frame.cells_in(Pane::Hex).take(3).map(|c| c.text.as_str()).collect();
        assert_eq!(hex, vec!["00", "01", "02"]);
        let cell = frame.cells_in(Pane::Text).nth(33).unwrap();
        assert_eq!(cell.text, "!");

        // Alternating column colors.
        let palette = Palette::default();
        let colors: Vec<Color> = frame.cells_in(Pane::Hex).take(4).map(|c| c.style.foreground).collect();
        assert_eq!(
            colors,
            vec![palette.hex_foreground, palette.hex_foreground, palette.hex_foreground_alt, palette.hex_foreground_alt]
        );
        assert!(frame.caret.is_some());
    }

    #[test]
    fn undefined_frame_shows_placeholders() {
        let g = geometry(40, 4);
        let sel = Selection::new(80);
        let frame = frame_for(&[], g, &sel, &ColoredRangeManager::default(), None, false);

        assert_eq!(frame.status, DefinitionStatus::Undefined);
        assert!(frame.cells_in(Pane::Hex).all(|c| c.text == "??"));
        assert!(frame.cells_in(Pane::Text).all(|c| c.text == "?"));
        assert!(frame.cells.iter().all(|c| c.style.foreground == Palette::default().disabled));
        assert!(frame.caret.is_none());
    }

    #[test]
    fn disabled_frame_uses_disabled_color() {
        let data: Vec<u8> = vec![0x41; 32];
        let g = geometry(32, 2);
        let mut sel = Selection::new(64);
        sel.set_length(4);
        let mut ranges = ColoredRangeManager::default();
        ranges.add_range(0, 0, 8, Some(Color::RED), None).unwrap();
        let palette = Palette::default();

        let (x, y) = g.nibble_bounds(3).center();
        let frame = compose(&FrameInputs {
            geometry: g,
            selection: &sel,
            ranges: &ranges,
            colormap: None,
            palette: &palette,
            data: Some(&data),
            active_pane: Pane::Hex,
            hover: Some((x, y)),
            enabled: false,
            show_caret: false,
        });

        assert_eq!(frame.status, DefinitionStatus::Defined);
        assert_eq!(frame.cells_in(Pane::Hex).next().unwrap().text, "41");
        assert!(frame.cells.iter().all(|c| c.style == disabled(&palette)));
        assert!(frame.hover.is_empty());
    }

    #[test]
    fn selection_beats_range_beats_colormap() {
        let data: Vec<u8> = vec![0; 32];
        let g = geometry(32, 2);
        let mut sel = Selection::new(64);
        sel.set_caret(0).unwrap();
        sel.set_length(4);
        let mut ranges = ColoredRangeManager::default();
        ranges.add_range(0, 1, 3, Some(Color::RED), Some(Color::BLUE)).unwrap();
        let colormap = ByteClassColormap::default();

        let frame = frame_for(&data, g, &sel, &ranges, Some(&colormap), true);
        let hex: Vec<&Cell> = frame.cells_in(Pane::Hex).collect();

        assert!(hex[0].style.selected);
        assert!(hex[1].style.selected);
        assert_eq!(hex[2].style.foreground, Color::RED);
        assert_eq!(hex[2].style.background, Some(Color::BLUE));
        assert_eq!(hex[4].style.foreground, colormap.zero);

        let text: Vec<&Cell> = frame.cells_in(Pane::Text).collect();
        assert!(text[1].style.selected);
        assert_eq!(text[3].style.foreground, Color::RED);
    }

    #[test]
    fn flipped_cells_show_reflected_bytes_and_ranges() {
        let data: Vec<u8> = (0..16u8).collect();
        let mut g = geometry(16, 1);
        g.layout.bytes_per_column = 4;
        g.layout.flip_bytes = true;
        let mut sel = Selection::new(32);
        sel.set_caret(0).unwrap();
        sel.set_length(2);
        let mut ranges = ColoredRangeManager::default();
        ranges.add_range(0, 0, 1, Some(Color::RED), None).unwrap();

        let frame = frame_for(&data, g, &sel, &ranges, None, true);
        let hex: Vec<&Cell> = frame.cells_in(Pane::Hex).collect();
        assert_eq!(hex[0].text, "03");
        assert_eq!(hex[0].offset, 3);
        assert_eq!(hex[3].text, "00");
        // Range on data offset 0 follows the byte to grid position 3.
        assert_eq!(hex[3].style.foreground, Color::RED);
        // Selection is positional: both panes mark grid position 0.
        assert!(hex[0].style.selected);
        assert!(frame.cells_in(Pane::Text).next().unwrap().style.selected);
    }

    #[test]
    fn hover_highlights_nibble_and_text_cell() {
        let data: Vec<u8> = vec![0x41; 32];
        let g = geometry(32, 2);
        let sel = Selection::new(64);
        let ranges = ColoredRangeManager::default();
        let palette = Palette::default();

        let (x, y) = g.nibble_bounds(5).center();
        let inputs = FrameInputs {
            geometry: g,
            selection: &sel,
            ranges: &ranges,
            colormap: None,
            palette: &palette,
            data: Some(&data),
            active_pane: Pane::Hex,
            hover: Some((x, y)),
            enabled: true,
            show_caret: false,
        };
        let frame = compose(&inputs);
        assert_eq!(frame.hover, vec![g.nibble_bounds(5), g.text_bounds(5)]);
        assert!(frame.caret.is_none());

        let (x, y) = g.text_bounds(6).center();
        let frame = compose(&FrameInputs { hover: Some((x, y)), ..inputs });
        assert_eq!(frame.hover, vec![g.nibble_bounds(6), g.nibble_bounds(7), g.text_bounds(6)]);
    }
}
