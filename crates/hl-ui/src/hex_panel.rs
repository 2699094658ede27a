use std::time::Instant;

use egui::{Align2, Color32, Event, EventFilter, FontId, Key, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use hl_core::{DefinitionStatus, EditOutcome, Frame, Pane};

use crate::font::{font_metrics, grid_font};
use crate::state::{color32, AppState};

/// Width reserved for the vertical scroll slider.
const SCROLLBAR_WIDTH: f32 = 18.0;

/// Hex view panel: paints engine frames and feeds input back to the engine.
pub struct HexPanel;

impl HexPanel {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        if !state.has_source() {
            ui.centered_and_justified(|ui| {
                ui.label("Open a file to view its contents.");
            });
            return;
        }

        let font_id = grid_font();
        let metrics = font_metrics(ui.ctx(), &font_id);
        if let Err(e) = state.view.set_metrics(metrics) {
            log::warn!("font metrics rejected: {}", e);
        }

        let available = ui.available_size();
        ui.horizontal(|ui| {
            let grid_size = Vec2::new((available.x - SCROLLBAR_WIDTH).max(0.0), available.y);
            let (response, painter) = ui.allocate_painter(grid_size, Sense::click_and_drag());
            let rect = response.rect;
            state.view.resize(rect.width() as u32, rect.height() as u32);

            Self::handle_pointer(ui, &response, state);
            Self::handle_keyboard(ui, &response, state);

            state.view.tick(Instant::now());
            let frame = state.view.render();
            Self::paint(&painter, rect, &frame, state, &font_id);

            Self::show_scrollbar(ui, state, available.y);
        });

        if let Some(delay) = state.view.next_poll_in(Instant::now()) {
            ui.ctx().request_repaint_after(delay);
        }
        if state.process_events() {
            ui.ctx().request_repaint();
        }

        if state.goto_open {
            Self::show_goto_dialog(ui, state);
        }
    }

    fn handle_pointer(ui: &Ui, response: &egui::Response, state: &mut AppState) {
        let origin = response.rect.min;
        let local = |p: Pos2| ((p.x - origin.x) as i32, (p.y - origin.y) as i32);

        match response.hover_pos() {
            Some(pos) => {
                let (x, y) = local(pos);
                state.view.hover(x, y);
            }
            None => state.view.leave(),
        }

        let primary_pressed = ui.input(|i| i.pointer.primary_pressed());
        if let Some(pos) = response.interact_pointer_pos() {
            let (x, y) = local(pos);
            if primary_pressed && response.is_pointer_button_down_on() {
                response.request_focus();
                state.view.press(x, y);
            } else if response.dragged() {
                state.view.drag(x, y);
            }
        }

        if response.secondary_clicked() {
            state.context_offset = response
                .interact_pointer_pos()
                .and_then(|pos| {
                    let (x, y) = local(pos);
                    state.view.context_offset(x, y)
                });
        }
        response.clone().context_menu(|ui| {
            let Some(offset) = state.context_offset else {
                ui.label("No byte under the pointer");
                return;
            };
            let layout = state.view.layout();
            let address = layout.address_mode.format(layout.base_address.wrapping_add(offset));
            ui.label(format!("Offset {}", address));
            if ui.button("Copy address").clicked() {
                ui.ctx().copy_text(address);
                ui.close_menu();
            }
            if ui.button("Go to").clicked() {
                let base = state.view.layout().base_address;
                if let Err(e) = state.view.goto_offset(base.wrapping_add(offset)) {
                    state.message = e.to_string();
                }
                ui.close_menu();
            }
        });

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let row_height = state.view.metrics().row_height.max(1) as f32;
                let rows = (-scroll / row_height).round() as i64;
                state.view.scroll_wheel(if rows == 0 { -(scroll.signum() as i64) } else { rows });
            }
        }
    }

    fn handle_keyboard(ui: &Ui, response: &egui::Response, state: &mut AppState) {
        state.view.set_focused(response.has_focus());
        if !response.has_focus() {
            return;
        }
        ui.memory_mut(|m| {
            m.set_focus_lock_filter(
                response.id,
                EventFilter { tab: true, horizontal_arrows: true, vertical_arrows: true, escape: false },
            )
        });

        let events = ui.input(|i| i.events.clone());
        for event in events {
            match event {
                Event::Text(text) => {
                    for c in text.chars() {
                        if let EditOutcome::Rejected(reason) = state.view.type_char(c) {
                            state.message = format!("Edit rejected: {:?}", reason);
                        }
                    }
                }
                Event::Key { key, pressed: true, modifiers, .. } => {
                    let view = &mut state.view;
                    let extend = modifiers.shift;
                    match key {
                        Key::ArrowLeft => view.move_left(extend),
                        Key::ArrowRight => view.move_right(extend),
                        Key::ArrowUp => view.move_up(extend),
                        Key::ArrowDown => view.move_down(extend),
                        Key::PageUp => view.page_up(extend),
                        Key::PageDown => view.page_down(extend),
                        Key::Home => view.move_by(-(view.caret() as i64), extend),
                        Key::End => view.move_by(view.selection().limit() as i64, extend),
                        Key::Tab => view.toggle_pane(),
                        Key::G if modifiers.command => {
                            state.goto_open = true;
                            state.goto_text.clear();
                            state.goto_error = None;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    fn paint(painter: &egui::Painter, rect: Rect, frame: &Frame, state: &AppState, font_id: &FontId) {
        let palette = state.view.palette();
        let at = |x: i32, y: i32| rect.min + Vec2::new(x as f32, y as f32);
        let span = |left: i32, right: i32| {
            Rect::from_min_max(Pos2::new(at(left, 0).x, rect.top()), Pos2::new(at(right, 0).x, rect.bottom()))
        };
        let panes = frame.panes;

        painter.rect_filled(span(panes.offsets_left, panes.hex_left), 0.0, color32(palette.offset_background));
        painter.rect_filled(span(panes.hex_left, panes.text_left), 0.0, color32(palette.hex_background));
        painter.rect_filled(span(panes.text_left, panes.content_right), 0.0, color32(palette.text_background));
        let separator = Stroke::new(1.0, color32(palette.separator));
        for x in [panes.text_left, panes.content_right] {
            painter.vline(at(x, 0).x, rect.y_range(), separator);
        }

        for r in &frame.hover {
            let min = at(r.x, r.y);
            painter.rect_filled(
                Rect::from_min_size(min, Vec2::new(r.width as f32, r.height as f32)),
                0.0,
                color32(palette.hover),
            );
        }

        let offset_color = if frame.status == DefinitionStatus::Defined {
            color32(palette.offset_foreground)
        } else {
            color32(palette.disabled)
        };
        for label in &frame.offsets {
            painter.text(at(label.x, label.baseline), Align2::LEFT_BOTTOM, &label.text, font_id.clone(), offset_color);
        }

        for cell in &frame.cells {
            if let Some(bg) = cell.style.background {
                let b = cell.bounds;
                painter.rect_filled(
                    Rect::from_min_size(at(b.x, b.y), Vec2::new(b.width as f32, b.height as f32)),
                    0.0,
                    color32(bg),
                );
            }
            painter.text(
                at(cell.x, cell.baseline),
                Align2::LEFT_BOTTOM,
                &cell.text,
                font_id.clone(),
                color32(cell.style.foreground),
            );
        }

        if let Some(caret) = frame.caret {
            painter.rect_filled(
                Rect::from_min_size(at(caret.x, caret.y), Vec2::new(caret.width as f32, caret.height as f32)),
                0.0,
                color32(palette.caret),
            );
        }

        if frame.status == DefinitionStatus::Undefined {
            painter.text(
                rect.right_top() + Vec2::new(-8.0, 4.0),
                Align2::RIGHT_TOP,
                "waiting for data",
                FontId::proportional(11.0),
                Color32::from_rgb(200, 120, 40),
            );
        }
    }

    fn show_scrollbar(ui: &mut Ui, state: &mut AppState, height: f32) {
        let extents = state.view.viewport().extents();
        let mut row = state.view.viewport().first_row();
        ui.add_enabled_ui(extents.vertical_enabled, |ui| {
            ui.spacing_mut().slider_width = height;
            let slider = egui::Slider::new(&mut row, extents.vertical_max..=0)
                .vertical()
                .show_value(false);
            if ui.add(slider).changed() {
                state.view.set_first_row(row);
            }
        });
    }

    fn show_goto_dialog(ui: &mut Ui, state: &mut AppState) {
        egui::Window::new("Go to offset")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ui.ctx(), |ui| {
                ui.label("Enter hex address (e.g. 0x401000 or 401000):");
                let response = ui.text_edit_singleline(&mut state.goto_text);
                if response.gained_focus() || state.goto_text.is_empty() {
                    response.request_focus();
                }
                if let Some(err) = &state.goto_error {
                    ui.colored_label(Color32::from_rgb(255, 100, 100), err);
                }

                ui.horizontal(|ui| {
                    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
                    if ui.button("Go").clicked() || enter {
                        match parse_offset(&state.goto_text) {
                            Some(address) => match state.view.goto_offset(address) {
                                Ok(()) => state.goto_open = false,
                                Err(e) => state.goto_error = Some(e.to_string()),
                            },
                            None => state.goto_error = Some("Not a number".to_string()),
                        }
                    }
                    if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(Key::Escape)) {
                        state.goto_open = false;
                    }
                });
            });
    }
}

/// Parse an address: "0x401000" or "401000" are hex, a "#" prefix means
/// decimal ("#1024").
pub fn parse_offset(input: &str) -> Option<u64> {
    let s = input.trim();
    if let Some(dec) = s.strip_prefix('#') {
        return dec.trim().parse::<u64>().ok();
    }
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if hex.is_empty() {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}
