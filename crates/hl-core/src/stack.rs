//! One-column stack panel: an address per row and the stack element stored
//! there, with the stack pointer row highlighted.

use std::time::{Duration, Instant};

use crate::coords::{OFFSET_LABEL_LEFT, OFFSET_PANE_PADDING, PADDING_TOP};
use crate::error::Result;
use crate::layout::{AddressMode, Metrics};
use crate::render::{DefinitionStatus, Probe, RenderDriver};
use crate::types::{ByteRange, Rect};

/// What the stack panel shows.
pub trait StackModel {
    /// Address of the first entry, `None` while the stack is unknown.
    fn start_address(&self) -> Option<u64>;

    fn entry_count(&self) -> u64;

    fn stack_pointer(&self) -> Option<u64>;

    fn has_data(&mut self, address: u64, len: u64) -> bool;

    /// Formatted element stored at `address`.
    fn element(&mut self, address: u64) -> String;

    fn keep_trying(&self) -> bool {
        true
    }
}

struct ModelProbe<'a>(&'a mut (dyn StackModel + 'static));

impl Probe for ModelProbe<'_> {
    fn has_data(&mut self, offset: u64, len: u64) -> bool {
        self.0.has_data(offset, len)
    }

    fn keep_trying(&self) -> bool {
        self.0.keep_trying()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRow {
    pub address: u64,
    pub label: String,
    pub label_x: i32,
    /// Element text, or `?` placeholders while undefined.
    pub value: String,
    pub value_x: i32,
    pub baseline: i32,
    /// Background of the address when this row is the stack pointer.
    pub highlight: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub status: DefinitionStatus,
    /// Right edge of the address column.
    pub offset_pane_width: i32,
    pub rows: Vec<StackRow>,
}

pub struct StackView {
    model: Box<dyn StackModel>,
    address_mode: AddressMode,
    metrics: Metrics,
    first_row: u64,
    first_column: u32,
    height: u32,
    driver: RenderDriver,
}

impl StackView {
    pub fn new(model: Box<dyn StackModel>) -> Self {
        Self {
            model,
            address_mode: AddressMode::Bit32,
            metrics: Metrics::default(),
            first_row: 0,
            first_column: 0,
            height: 400,
            driver: RenderDriver::default(),
        }
    }

    pub fn model(&self) -> &dyn StackModel {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn StackModel {
        self.model.as_mut()
    }

    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    pub fn set_address_mode(&mut self, mode: AddressMode) {
        self.address_mode = mode;
    }

    /// Bytes per stack entry: a machine word.
    pub fn element_size(&self) -> u64 {
        self.address_mode.word_size()
    }

    pub fn set_metrics(&mut self, metrics: Metrics) -> Result<()> {
        metrics.validate()?;
        self.metrics = metrics;
        Ok(())
    }

    pub fn resize(&mut self, height: u32) {
        self.height = height;
    }

    pub fn first_row(&self) -> u64 {
        self.first_row
    }

    pub fn set_first_row(&mut self, row: u64) {
        self.first_row = row.min(self.model.entry_count().saturating_sub(1));
    }

    pub fn set_first_column(&mut self, column: u32) {
        self.first_column = column;
    }

    pub fn set_retry_interval(&mut self, interval: Duration) {
        self.driver.set_interval(interval);
    }

    fn top_padding(&self) -> i32 {
        PADDING_TOP.max(self.metrics.char_height as i32 + 4)
    }

    fn scroll_x(&self) -> i32 {
        self.first_column as i32 * self.metrics.char_width as i32
    }

    pub fn offset_pane_width(&self) -> i32 {
        OFFSET_PANE_PADDING + self.metrics.char_width as i32 * self.address_mode.digits() as i32
    }

    pub fn visible_rows(&self) -> u64 {
        let raw = (self.height as i64 - self.top_padding() as i64).max(0) as u64;
        raw.div_ceil(u64::from(self.metrics.row_height))
    }

    /// Rows that hold an entry, never more than fit on screen.
    fn rows_to_draw(&self) -> u64 {
        self.visible_rows()
            .min(self.model.entry_count().saturating_sub(self.first_row))
    }

    fn visible_region(&self, start: u64) -> ByteRange {
        let size = self.element_size();
        ByteRange::new(
            start.wrapping_add(self.first_row * size),
            self.rows_to_draw() * size,
        )
    }

    pub fn status(&self) -> DefinitionStatus {
        self.driver.status()
    }

    pub fn render(&mut self) -> StackFrame {
        self.render_at(Instant::now())
    }

    pub fn render_at(&mut self, now: Instant) -> StackFrame {
        let mut frame = StackFrame {
            status: self.driver.status(),
            offset_pane_width: self.offset_pane_width() - self.scroll_x(),
            rows: Vec::new(),
        };
        let Some(start) = self.model.start_address() else {
            return frame;
        };

        let region = self.visible_region(start);
        let defined = self.driver.check(&mut ModelProbe(self.model.as_mut()), region, now);
        frame.status = self.driver.status();

        let size = self.element_size();
        let cw = self.metrics.char_width as i32;
        let ch = self.metrics.char_height as i32;
        let label_x = OFFSET_LABEL_LEFT - self.scroll_x();
        let value_x = OFFSET_LABEL_LEFT + self.offset_pane_width() - self.scroll_x();
        let stack_pointer = self.model.stack_pointer();

        for i in 0..self.rows_to_draw() {
            let address = region.offset.wrapping_add(i * size);
            let baseline = self.top_padding() + i as i32 * self.metrics.row_height as i32;
            let value = if defined {
                self.model.element(address)
            } else {
                "?".repeat(2 * size as usize)
            };
            frame.rows.push(StackRow {
                address,
                label: self.address_mode.format(address),
                label_x,
                value,
                value_x,
                baseline,
                highlight: (stack_pointer == Some(address)).then(|| {
                    Rect::new(label_x - 2, baseline - ch, cw * 2 * size as i32 + 4, ch + 2)
                }),
            });
        }
        frame
    }

    /// Element under a y coordinate, if its bytes are available.
    pub fn value_at(&mut self, y: i32) -> Option<String> {
        let row_height = self.metrics.row_height as i32;
        let line = y - self.top_padding() + row_height;
        if line < 0 {
            return None;
        }
        let line = (line / row_height) as u64;
        if line >= self.rows_to_draw() {
            return None;
        }

        let size = self.element_size();
        let address = self.model.start_address()?.wrapping_add((self.first_row + line) * size);
        if !self.model.has_data(address, size) {
            return None;
        }
        Some(self.model.element(address))
    }

    /// Poll if due. Returns true if the status changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.driver.tick(&mut ModelProbe(self.model.as_mut()), now)
    }

    pub fn poll_now(&mut self) -> bool {
        self.driver.poll_at(&mut ModelProbe(self.model.as_mut()), Instant::now())
    }

    pub fn is_polling(&self) -> bool {
        self.driver.is_polling()
    }

    pub fn next_poll_in(&self, now: Instant) -> Option<Duration> {
        self.driver.next_poll_in(now)
    }
}
