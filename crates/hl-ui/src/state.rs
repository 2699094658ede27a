use std::path::PathBuf;

use anyhow::{Context, Result};
use egui::Color32;
use hl_core::{Color, DataSource, DefinitionStatus, HexView, StackView, ViewEvent, ViewerConfig};

/// Convert an engine color for painting.
pub fn color32(c: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Central UI state shared across panels.
pub struct AppState {
    /// The hex viewer engine.
    pub view: HexView,
    /// Optional stack panel shown next to the hex view.
    pub stack: Option<StackView>,
    /// Name of the installed data source, for the title and status bar.
    pub source_name: Option<String>,
    /// Config file the viewer settings came from (and are saved to).
    pub config_path: Option<PathBuf>,
    /// Whether the "Go to offset" dialog is open.
    pub goto_open: bool,
    /// Text in the "Go to offset" input field.
    pub goto_text: String,
    /// Error shown in the "Go to offset" dialog.
    pub goto_error: Option<String>,
    /// Offset under the pointer when the context menu was opened.
    pub context_offset: Option<u64>,
    /// Last status bar message.
    pub message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            view: HexView::new(),
            stack: None,
            source_name: None,
            config_path: None,
            goto_open: false,
            goto_text: String::new(),
            goto_error: None,
            context_offset: None,
            message: String::new(),
        }
    }
}

impl AppState {
    pub fn with_view(view: HexView) -> Self {
        Self { view, ..Self::default() }
    }

    pub fn has_source(&self) -> bool {
        self.view.data_source().is_some()
    }

    /// Install a data source under a display name.
    pub fn install_source(&mut self, name: impl Into<String>, source: Box<dyn DataSource>) {
        let name = name.into();
        self.message = format!("{} ({} bytes)", name, source.len());
        self.source_name = Some(name);
        self.goto_open = false;
        self.context_offset = None;
        self.view.set_data_source(source);
    }

    pub fn close_source(&mut self) {
        self.view.clear_data_source();
        self.source_name = None;
        self.message.clear();
    }

    /// Drain engine events. Returns true if a repaint was asked for.
    pub fn process_events(&mut self) -> bool {
        let mut repaint = false;
        for event in self.view.take_events() {
            match event {
                ViewEvent::StatusChanged(DefinitionStatus::Undefined) => {
                    self.message = "Waiting for data...".to_string();
                    repaint = true;
                }
                ViewEvent::StatusChanged(DefinitionStatus::Defined) => {
                    self.message = self.selection_summary();
                    repaint = true;
                }
                ViewEvent::SelectionChanged { .. } => {
                    self.message = self.selection_summary();
                    repaint = true;
                }
                ViewEvent::DataChanged | ViewEvent::LayoutChanged | ViewEvent::RepaintRequested => {
                    repaint = true;
                }
            }
        }
        repaint
    }

    /// Viewer settings as currently applied.
    pub fn current_config(&self) -> ViewerConfig {
        ViewerConfig {
            layout: *self.view.layout(),
            palette: *self.view.palette(),
            retry_interval_ms: self.view.retry_interval().as_millis() as u64,
            layer_count: self.view.ranges().layer_count(),
        }
    }

    /// Write the current settings back to the config file.
    pub fn save_config(&self) -> Result<()> {
        let path = self.config_path.as_ref().context("no config file was loaded")?;
        self.current_config().save(path)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Caret address and selection size for the status bar.
    pub fn selection_summary(&self) -> String {
        let layout = self.view.layout();
        let caret = layout
            .address_mode
            .format(layout.base_address.wrapping_add(self.view.caret_offset()));
        match self.view.selection().selected_bytes() {
            Some(range) => format!("{}  selected {} bytes", caret, range.length),
            None => caret,
        }
    }
}
