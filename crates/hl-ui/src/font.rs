use egui::{Context, FontId};
use hl_core::Metrics;

/// Monospace font size used by the hex and stack panels.
pub const FONT_SIZE: f32 = 13.0;

pub fn grid_font() -> FontId {
    FontId::monospace(FONT_SIZE)
}

/// Character metrics of `font_id`, in whole pixels.
pub fn font_metrics(ctx: &Context, font_id: &FontId) -> Metrics {
    let (char_width, row_height) = ctx.fonts(|f| (f.glyph_width(font_id, '0'), f.row_height(font_id)));
    let char_height = (font_id.size * 0.8).ceil() as u32;
    Metrics {
        char_width: char_width.ceil().max(1.0) as u32,
        char_height: char_height.max(1),
        row_height: (row_height.ceil() as u32).max(char_height + 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_font_metrics_are_usable() {
        let ctx = Context::default();
        let mut metrics = Metrics::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            metrics = font_metrics(ctx, &grid_font());
        });

        assert!(metrics.validate().is_ok());
        assert!(metrics.row_height >= metrics.char_height + 2);
        assert!(metrics.row_height > Metrics::default().row_height);
    }
}
