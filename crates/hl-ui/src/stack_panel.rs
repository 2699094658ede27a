use std::time::Instant;

use egui::{Align2, Color32, Pos2, Rect, Sense, Ui, Vec2};
use hl_core::{DefinitionStatus, StackView};

use crate::font::{font_metrics, grid_font};
use crate::state::color32;

const STACK_POINTER_BG: Color32 = Color32::from_rgb(200, 40, 40);

/// Stack panel: one machine word per row.
pub struct StackPanel;

impl StackPanel {
    pub fn show(ui: &mut Ui, stack: &mut StackView, palette: &hl_core::Palette) {
        let font_id = grid_font();
        if let Err(e) = stack.set_metrics(font_metrics(ui.ctx(), &font_id)) {
            log::warn!("font metrics rejected: {}", e);
        }
        let available = ui.available_size();
        let (response, painter) = ui.allocate_painter(available, Sense::hover());
        let rect = response.rect;
        stack.resize(rect.height() as u32);

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let rows = if scroll > 0.0 { -1i64 } else { 1 };
                stack.set_first_row(stack.first_row().saturating_add_signed(rows));
            }
        }

        let now = Instant::now();
        if stack.tick(now) {
            ui.ctx().request_repaint();
        }
        let frame = stack.render_at(now);

        let at = |x: i32, y: i32| rect.min + Vec2::new(x as f32, y as f32);
        painter.rect_filled(
            Rect::from_min_max(rect.min, Pos2::new(at(frame.offset_pane_width, 0).x, rect.bottom())),
            0.0,
            color32(palette.offset_background),
        );

        let (label_color, value_color) = match frame.status {
            DefinitionStatus::Defined => (color32(palette.offset_foreground), Color32::BLACK),
            DefinitionStatus::Undefined => (color32(palette.disabled), color32(palette.disabled)),
        };
        for row in &frame.rows {
            if let Some(h) = row.highlight {
                painter.rect_filled(
                    Rect::from_min_size(at(h.x, h.y), Vec2::new(h.width as f32, h.height as f32)),
                    0.0,
                    STACK_POINTER_BG,
                );
            }
            painter.text(at(row.label_x, row.baseline), Align2::LEFT_BOTTOM, &row.label, font_id.clone(), label_color);
            painter.text(at(row.value_x, row.baseline), Align2::LEFT_BOTTOM, &row.value, font_id.clone(), value_color);
        }

        if let Some(pos) = response.hover_pos() {
            if let Some(value) = stack.value_at((pos.y - rect.top()) as i32) {
                response.on_hover_text(value);
            }
        }

        if let Some(delay) = stack.next_poll_in(now) {
            ui.ctx().request_repaint_after(delay);
        }
    }
}
