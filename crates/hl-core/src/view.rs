//! The viewer facade a host holds.
//!
//! `HexView` owns the data source, selection, viewport, colored ranges and
//! render driver. Hosts feed it input and font metrics, call `render` to get
//! a [`Frame`], call `tick` from their event loop while data is missing, and
//! drain [`ViewEvent`]s with `take_events`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::ViewerConfig;
use crate::coords::Geometry;
use crate::error::{HexViewError, Result};
use crate::layout::{AddressMode, Layout, Metrics};
use crate::ranges::ColoredRangeManager;
use crate::render::{compose, Colormap, DefinitionStatus, Frame, FrameInputs, Palette, RenderDriver};
use crate::selection::Selection;
use crate::source::DataSource;
use crate::types::{is_printable, ByteRange, Color, Pane};
use crate::viewport::Viewport;

/// Notifications for the host, queued once the viewer state is consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    SelectionChanged { start: u64, length: i64 },
    DataChanged,
    LayoutChanged,
    StatusChanged(DefinitionStatus),
    RepaintRequested,
}

/// Why a typed character was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoSource,
    Disabled,
    Undefined,
    ReadOnly,
    EndOfData,
    InvalidChar,
    WriteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The byte at `offset` now holds `value`.
    Applied { offset: u64, value: u8 },
    Rejected(RejectReason),
}

pub struct HexView {
    source: Option<Box<dyn DataSource>>,
    layout: Layout,
    metrics: Metrics,
    palette: Palette,
    selection: Selection,
    viewport: Viewport,
    ranges: ColoredRangeManager,
    colormap: Option<Box<dyn Colormap>>,
    driver: RenderDriver,
    active_pane: Pane,
    hover: Option<(i32, i32)>,
    focused: bool,
    enabled: bool,
    events: VecDeque<ViewEvent>,
}

impl Default for HexView {
    fn default() -> Self {
        Self {
            source: None,
            layout: Layout::default(),
            metrics: Metrics::default(),
            palette: Palette::default(),
            selection: Selection::default(),
            viewport: Viewport::default(),
            ranges: ColoredRangeManager::default(),
            colormap: None,
            driver: RenderDriver::default(),
            active_pane: Pane::Hex,
            hover: None,
            focused: true,
            enabled: true,
            events: VecDeque::new(),
        }
    }
}

impl HexView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ViewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: config.layout,
            palette: config.palette,
            ranges: ColoredRangeManager::new(config.layer_count),
            driver: RenderDriver::new(config.retry_interval()),
            ..Self::default()
        })
    }

    // ---- data source ----

    /// Install a data source. Resets the selection, scroll position and
    /// definition status.
    pub fn set_data_source(&mut self, source: Box<dyn DataSource>) {
        log::info!(
            "Installing data source ({} bytes, {})",
            source.len(),
            if source.is_editable() { "editable" } else { "read-only" }
        );
        self.source = Some(source);
        self.reset_for_source();
    }

    /// Remove the data source, leaving the viewer empty.
    pub fn clear_data_source(&mut self) -> Option<Box<dyn DataSource>> {
        let previous = self.source.take();
        self.reset_for_source();
        previous
    }

    fn reset_for_source(&mut self) {
        let was = self.driver.status();
        self.driver.reset();
        self.selection = Selection::new(2 * self.data_len());
        self.hover = None;
        self.relayout();
        self.viewport.set_first_row(0);
        self.viewport.set_first_column(0);

        self.events.push_back(ViewEvent::DataChanged);
        if was != DefinitionStatus::Defined {
            self.events.push_back(ViewEvent::StatusChanged(DefinitionStatus::Defined));
        }
        self.emit_selection();
    }

    pub fn data_source(&self) -> Option<&dyn DataSource> {
        self.source.as_deref()
    }

    pub fn data_source_mut(&mut self) -> Option<&mut (dyn DataSource + 'static)> {
        self.source.as_deref_mut()
    }

    pub fn data_len(&self) -> u64 {
        self.source.as_ref().map_or(0, |s| s.len())
    }

    /// The source's content or length changed behind the viewer's back.
    pub fn data_changed(&mut self) {
        let before = self.selection;
        self.selection.set_limit(2 * self.data_len());
        self.relayout();
        self.events.push_back(ViewEvent::DataChanged);
        if self.selection != before {
            self.emit_selection();
        } else {
            self.events.push_back(ViewEvent::RepaintRequested);
        }
    }

    // ---- layout ----

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    /// Replace the whole layout after validating it.
    pub fn set_layout(&mut self, layout: Layout) -> Result<()> {
        layout.validate()?;
        if layout == self.layout {
            return Ok(());
        }
        self.layout = layout;
        self.layout_changed();
        Ok(())
    }

    pub fn set_bytes_per_row(&mut self, bytes_per_row: u32) -> Result<()> {
        self.set_layout(Layout { bytes_per_row, ..self.layout })
    }

    pub fn set_bytes_per_column(&mut self, bytes_per_column: u32) -> Result<()> {
        self.set_layout(Layout { bytes_per_column, ..self.layout })
    }

    pub fn set_column_spacing(&mut self, column_spacing: u32) -> Result<()> {
        self.set_layout(Layout { column_spacing, ..self.layout })
    }

    pub fn set_address_mode(&mut self, address_mode: AddressMode) -> Result<()> {
        self.set_layout(Layout { address_mode, ..self.layout })
    }

    pub fn set_flip_bytes(&mut self, flip_bytes: bool) -> Result<()> {
        self.set_layout(Layout { flip_bytes, ..self.layout })
    }

    pub fn set_base_address(&mut self, base_address: u64) -> Result<()> {
        self.set_layout(Layout { base_address, ..self.layout })
    }

    /// Font measurements from the host.
    pub fn set_metrics(&mut self, metrics: Metrics) -> Result<()> {
        metrics.validate()?;
        if metrics == self.metrics {
            return Ok(());
        }
        self.metrics = metrics;
        self.layout_changed();
        Ok(())
    }

    /// Viewport size in pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.viewport.size() == (width, height) {
            return;
        }
        self.viewport.set_size(width, height);
        self.layout_changed();
    }

    fn layout_changed(&mut self) {
        self.relayout();
        self.ensure_caret_visible();
        self.events.push_back(ViewEvent::LayoutChanged);
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    fn relayout(&mut self) {
        let geometry = self.geometry();
        self.viewport.recompute_extents(&geometry);
    }

    /// Current coordinate snapshot.
    pub fn geometry(&self) -> Geometry {
        let probe = Geometry {
            layout: self.layout,
            metrics: self.metrics,
            data_len: self.data_len(),
            first_row: self.viewport.first_row(),
            first_column: self.viewport.first_column(),
            visible_rows: 0,
        };
        let visible_rows = self
            .viewport
            .visible_rows(probe.top_padding(), self.metrics.row_height);
        Geometry { visible_rows, ..probe }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_first_row(&mut self, row: u64) {
        self.viewport.set_first_row(row);
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    pub fn set_first_column(&mut self, column: u32) {
        self.viewport.set_first_column(column);
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    // ---- selection and navigation ----

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn caret(&self) -> u64 {
        self.selection.caret()
    }

    pub fn first_selected_offset(&self) -> u64 {
        self.selection.first_selected_offset()
    }

    pub fn last_selected_offset(&self) -> u64 {
        self.selection.last_selected_offset()
    }

    /// Data offset of the byte under the caret.
    pub fn caret_offset(&self) -> u64 {
        self.geometry().offset_for_nibble(self.caret())
    }

    /// Bytes of the current selection, read from the source.
    pub fn selected_data(&mut self) -> Result<Vec<u8>> {
        let Some(range) = self.selection.selected_bytes() else {
            return Ok(Vec::new());
        };
        let source = self
            .source
            .as_deref_mut()
            .ok_or_else(|| HexViewError::invalid("no data source"))?;
        source.get_data(range.offset, range.length)
    }

    pub fn active_pane(&self) -> Pane {
        self.active_pane
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.focused != focused {
            self.focused = focused;
            self.events.push_back(ViewEvent::RepaintRequested);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A disabled view draws every byte in the disabled color and ignores
    /// mouse and keyboard input.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            if !enabled {
                self.hover = None;
            }
            self.events.push_back(ViewEvent::RepaintRequested);
        }
    }

    /// Move the caret by `delta` nibbles, extending the selection if asked.
    pub fn move_by(&mut self, delta: i64, extend: bool) {
        if !self.enabled {
            return;
        }
        if self.selection.move_by(delta, extend) {
            self.ensure_caret_visible();
            self.emit_selection();
        }
    }

    /// Collapse the selection onto `nibble`.
    pub fn set_caret(&mut self, nibble: u64) -> Result<()> {
        self.selection.set_caret(nibble)?;
        self.ensure_caret_visible();
        self.emit_selection();
        Ok(())
    }

    pub fn set_selection_length(&mut self, length: i64) {
        self.selection.set_length(length);
        self.ensure_caret_visible();
        self.emit_selection();
    }

    /// Put the caret on `address`. Addresses below the base address are
    /// taken as offsets relative to the start of the data.
    pub fn goto_offset(&mut self, address: u64) -> Result<()> {
        let base = self.layout.base_address;
        let offset = if address >= base { address - base } else { address };
        let len = self.data_len();
        if offset >= len {
            return Err(HexViewError::OutOfRange { offset: address, len });
        }

        let geometry = self.geometry();
        if self.caret() < 2 * len && geometry.offset_for_nibble(self.caret()) == offset {
            if self.ensure_caret_visible() {
                self.events.push_back(ViewEvent::RepaintRequested);
            }
            return Ok(());
        }
        self.set_caret(geometry.nibble_for_offset(offset))
    }

    /// Put the caret on an absolute address in `[base, base + len]`.
    pub fn set_current_offset(&mut self, address: u64) -> Result<()> {
        let len = self.data_len();
        let base = self.layout.base_address;
        let offset = address
            .checked_sub(base)
            .filter(|&o| o <= len)
            .ok_or(HexViewError::OutOfRange { offset: address, len })?;
        let nibble = self.geometry().nibble_for_offset(offset);
        self.set_caret(nibble)
    }

    fn horizontal_step(&self) -> i64 {
        if self.active_pane == Pane::Text {
            2
        } else {
            1
        }
    }

    fn row_step(&self) -> i64 {
        2 * self.layout.bytes_per_row as i64
    }

    pub fn move_left(&mut self, extend: bool) {
        self.move_by(-self.horizontal_step(), extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        self.move_by(self.horizontal_step(), extend);
    }

    pub fn move_up(&mut self, extend: bool) {
        self.move_by(-self.row_step(), extend);
    }

    pub fn move_down(&mut self, extend: bool) {
        self.move_by(self.row_step(), extend);
    }

    pub fn page_up(&mut self, extend: bool) {
        let rows = self.geometry().visible_rows.max(1) as i64;
        self.move_by(-rows * self.row_step(), extend);
    }

    pub fn page_down(&mut self, extend: bool) {
        let rows = self.geometry().visible_rows.max(1) as i64;
        self.move_by(rows * self.row_step(), extend);
    }

    /// Switch between the hex and text panes. The text pane works on whole
    /// bytes, so the caret is aligned to an even nibble.
    pub fn toggle_pane(&mut self) {
        if !self.enabled {
            return;
        }
        self.active_pane = match self.active_pane {
            Pane::Text => Pane::Hex,
            _ => Pane::Text,
        };
        if self.active_pane == Pane::Text && self.caret() % 2 == 1 {
            self.selection.move_by(-1, false);
        }
        self.emit_selection();
    }

    fn ensure_caret_visible(&mut self) -> bool {
        let visible_rows = self.geometry().visible_rows;
        self.viewport
            .ensure_visible(self.caret(), self.layout.row_bytes(), visible_rows)
    }

    fn emit_selection(&mut self) {
        self.events.push_back(ViewEvent::SelectionChanged {
            start: self.selection.start(),
            length: self.selection.length(),
        });
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    // ---- editing ----

    fn input_enabled(&self) -> bool {
        self.enabled && self.source.is_some() && self.driver.status() == DefinitionStatus::Defined
    }

    /// Overwrite the nibble (hex pane) or byte (text pane) under the caret
    /// and advance.
    pub fn type_char(&mut self, c: char) -> EditOutcome {
        let outcome = self.apply_char(c);
        match outcome {
            EditOutcome::Applied { .. } => {
                let step = self.horizontal_step();
                self.selection.move_by(step, false);
                self.ensure_caret_visible();
                self.events.push_back(ViewEvent::DataChanged);
                self.emit_selection();
            }
            EditOutcome::Rejected(reason) => {
                log::debug!("rejected {:?} at nibble {}: {:?}", c, self.caret(), reason);
            }
        }
        outcome
    }

    fn apply_char(&mut self, c: char) -> EditOutcome {
        let caret = self.caret();
        let geometry = self.geometry();
        let pane = self.active_pane;
        let status = self.driver.status();

        let enabled = self.enabled;

        let Some(source) = self.source.as_deref_mut() else {
            return EditOutcome::Rejected(RejectReason::NoSource);
        };
        if !enabled {
            return EditOutcome::Rejected(RejectReason::Disabled);
        }
        if status == DefinitionStatus::Undefined {
            return EditOutcome::Rejected(RejectReason::Undefined);
        }
        if !source.is_editable() {
            return EditOutcome::Rejected(RejectReason::ReadOnly);
        }
        if caret >= 2 * source.len() {
            return EditOutcome::Rejected(RejectReason::EndOfData);
        }

        let offset = geometry.offset_for_nibble(caret);
        let value = if pane == Pane::Text {
            match u8::try_from(c) {
                Ok(b) if is_printable(b) => b,
                _ => return EditOutcome::Rejected(RejectReason::InvalidChar),
            }
        } else {
            let Some(digit) = c.to_digit(16) else {
                return EditOutcome::Rejected(RejectReason::InvalidChar);
            };
            let old = match source.get_data(offset, 1) {
                Ok(bytes) if bytes.len() == 1 => bytes[0],
                _ => return EditOutcome::Rejected(RejectReason::Undefined),
            };
            if caret % 2 == 0 {
                ((digit as u8) << 4) | (old & 0x0F)
            } else {
                (old & 0xF0) | digit as u8
            }
        };

        match source.set_data(offset, &[value]) {
            Ok(()) => EditOutcome::Applied { offset, value },
            Err(e) => {
                log::warn!("write of 0x{:02X} at 0x{:X} failed: {}", value, offset, e);
                EditOutcome::Rejected(RejectReason::WriteFailed)
            }
        }
    }

    // ---- mouse ----

    /// Place the caret under the pointer and activate that pane.
    pub fn press(&mut self, x: i32, y: i32) {
        if !self.input_enabled() {
            return;
        }
        let geometry = self.geometry();
        if let Some(pane @ (Pane::Hex | Pane::Text)) = geometry.pane_at(x, y) {
            self.active_pane = pane;
        }
        let nibble = geometry.pixel_to_nibble(x, y).unwrap_or(self.caret());
        // Nibbles under the pointer are always inside the data.
        let _ = self.selection.set_caret(nibble);
        self.emit_selection();
    }

    /// Extend the selection to the pointer. Above or below the grid the
    /// view scrolls and the selection grows by one row.
    pub fn drag(&mut self, x: i32, y: i32) {
        if !self.input_enabled() {
            return;
        }
        let geometry = self.geometry();
        let (_, height) = self.viewport.size();

        if y < geometry.row_top(0) {
            self.viewport.scroll_rows(-1);
            self.selection.move_by(-self.row_step(), true);
        } else if y >= height as i32 {
            self.viewport.scroll_rows(1);
            self.selection.move_by(self.row_step(), true);
        } else if let Some(nibble) = geometry.pixel_to_nibble(x, y) {
            self.selection.extend_to(nibble);
        } else {
            return;
        }
        self.emit_selection();
    }

    /// Record the pointer position for hover highlighting.
    pub fn hover(&mut self, x: i32, y: i32) {
        if !self.enabled {
            return;
        }
        if self.hover != Some((x, y)) {
            self.hover = Some((x, y));
            self.events.push_back(ViewEvent::RepaintRequested);
        }
    }

    pub fn leave(&mut self) {
        if self.hover.take().is_some() {
            self.events.push_back(ViewEvent::RepaintRequested);
        }
    }

    /// Data offset under the pointer, for a context menu.
    pub fn context_offset(&self, x: i32, y: i32) -> Option<u64> {
        let geometry = self.geometry();
        geometry
            .pixel_to_nibble(x, y)
            .map(|nibble| geometry.offset_for_nibble(nibble))
    }

    pub fn scroll_wheel(&mut self, rows: i64) {
        let before = self.viewport.first_row();
        self.viewport.scroll_rows(rows);
        if self.viewport.first_row() != before {
            self.events.push_back(ViewEvent::RepaintRequested);
        }
    }

    // ---- colorization ----

    pub fn ranges(&self) -> &ColoredRangeManager {
        &self.ranges
    }

    pub fn push_range_layer(&mut self) -> usize {
        self.ranges.push_layer()
    }

    pub fn colorize(
        &mut self,
        layer: usize,
        offset: u64,
        size: u64,
        foreground: Option<Color>,
        background: Option<Color>,
    ) -> Result<()> {
        self.ranges.add_range(layer, offset, size, foreground, background)?;
        self.events.push_back(ViewEvent::RepaintRequested);
        Ok(())
    }

    pub fn uncolorize(&mut self, layer: usize, offset: u64, size: u64) -> Result<()> {
        self.ranges.remove_range(layer, offset, size)?;
        self.events.push_back(ViewEvent::RepaintRequested);
        Ok(())
    }

    /// Remove every range of `layer`, or of all layers.
    pub fn uncolorize_all(&mut self, layer: Option<usize>) -> Result<()> {
        self.ranges.clear(layer)?;
        self.events.push_back(ViewEvent::RepaintRequested);
        Ok(())
    }

    pub fn set_colormap(&mut self, colormap: Option<Box<dyn Colormap>>) {
        self.colormap = colormap;
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    // ---- rendering and polling ----

    pub fn status(&self) -> DefinitionStatus {
        self.driver.status()
    }

    /// Bytes currently on screen, clipped to the data.
    pub fn visible_range(&self) -> ByteRange {
        self.viewport.visible_byte_range(&self.geometry())
    }

    pub fn render(&mut self) -> Frame {
        self.render_at(Instant::now())
    }

    /// Compute a frame. A missing visible range switches the view to
    /// `Undefined` and arms a poll due one interval after `now`.
    pub fn render_at(&mut self, now: Instant) -> Frame {
        let geometry = self.geometry();
        let region = self.viewport.visible_byte_range(&geometry);
        let before = self.driver.status();

        let data = match self.source.as_deref_mut() {
            Some(source) => self.driver.fetch_visible(source, region, now),
            None => Some(Vec::new()),
        };
        if self.driver.status() != before {
            self.events.push_back(ViewEvent::StatusChanged(self.driver.status()));
        }

        let inputs = FrameInputs {
            geometry,
            selection: &self.selection,
            ranges: &self.ranges,
            colormap: self.colormap.as_deref(),
            palette: &self.palette,
            data: data.as_deref(),
            active_pane: self.active_pane,
            hover: self.hover,
            enabled: self.enabled,
            show_caret: self.focused && self.enabled && self.source.is_some(),
        };
        compose(&inputs)
    }

    /// Advance the retry poll and pick up out-of-band source changes.
    pub fn tick(&mut self, now: Instant) {
        let Some(source) = self.source.as_deref_mut() else {
            return;
        };
        let changed = source.take_changed();
        let status_changed = self.driver.tick(source, now);

        if changed {
            self.data_changed();
        }
        if status_changed {
            self.status_changed();
        }
    }

    /// Poll for missing data right away.
    pub fn poll_now(&mut self) {
        let Some(source) = self.source.as_deref_mut() else {
            return;
        };
        if self.driver.poll_at(source, Instant::now()) {
            self.status_changed();
        }
    }

    fn status_changed(&mut self) {
        self.events.push_back(ViewEvent::StatusChanged(self.driver.status()));
        self.events.push_back(ViewEvent::RepaintRequested);
    }

    pub fn is_polling(&self) -> bool {
        self.driver.is_polling()
    }

    /// When the host should call `tick` next, `None` when nothing is pending.
    pub fn next_poll_in(&self, now: Instant) -> Option<Duration> {
        self.driver.next_poll_in(now)
    }

    pub fn retry_interval(&self) -> Duration {
        self.driver.interval()
    }

    pub fn set_retry_interval(&mut self, interval: Duration) {
        self.driver.set_interval(interval);
    }

    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        self.events.drain(..).collect()
    }
}
