use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui;
use hl_core::{
    AddressMode, ByteClassColormap, HexView, LazySource, MappedSource, MemorySource, StackModel,
    StackView, ViewerConfig,
};
use hl_ui::{AppState, HexPanel, StackPanel};

/// Command line: `hexlens [FILE] [--config PATH]`.
#[derive(Debug, Default, PartialEq)]
struct Args {
    file: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args(args: impl Iterator<Item = std::ffi::OsString>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            parsed.config = Some(PathBuf::from(path));
        } else if parsed.file.is_none() {
            parsed.file = Some(PathBuf::from(arg));
        } else {
            anyhow::bail!("unexpected argument {:?}", arg);
        }
    }
    Ok(parsed)
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = match parse_args(std::env::args_os().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("hexlens: {:#}", e);
            std::process::exit(2);
        }
    };

    let config = match &args.config {
        Some(path) => match ViewerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{:#}; using defaults", e);
                ViewerConfig::default()
            }
        },
        None => ViewerConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("HexLens")
            .with_inner_size([1100.0, 720.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "HexLens",
        options,
        Box::new(move |_cc| {
            let mut app = HexLensApp::new(&config);
            app.state.config_path = args.config;
            if let Some(path) = args.file {
                app.open_file(&path, OpenMode::Mapped);
            }
            Ok(Box::new(app))
        }),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenMode {
    /// Read-only memory map.
    Mapped,
    /// Copy into memory and allow edits.
    Editable,
    /// Editable copy revealed page by page, like a remote target.
    Lazy,
}

/// Machine words of a byte buffer shown as a stack.
struct BufferStack {
    data: Vec<u8>,
    word_size: usize,
    stack_pointer: u64,
}

impl BufferStack {
    fn new(data: Vec<u8>, word_size: usize) -> Self {
        let entries = data.len() / word_size;
        let stack_pointer = (entries / 2 * word_size) as u64;
        Self { data, word_size, stack_pointer }
    }
}

impl StackModel for BufferStack {
    fn start_address(&self) -> Option<u64> {
        (!self.data.is_empty()).then_some(0)
    }

    fn entry_count(&self) -> u64 {
        (self.data.len() / self.word_size) as u64
    }

    fn stack_pointer(&self) -> Option<u64> {
        Some(self.stack_pointer)
    }

    fn has_data(&mut self, address: u64, len: u64) -> bool {
        address.saturating_add(len) <= self.data.len() as u64
    }

    fn element(&mut self, address: u64) -> String {
        let start = address as usize;
        let Some(bytes) = self.data.get(start..start + self.word_size) else {
            return "?".repeat(2 * self.word_size);
        };
        bytes.iter().rev().map(|b| format!("{:02X}", b)).collect()
    }
}

/// Bytes shown in the stack panel.
const STACK_BYTES: usize = 4096;

struct HexLensApp {
    state: AppState,
    show_stack: bool,
    byte_classes: bool,
    /// Bytes backing the stack panel.
    stack_bytes: Vec<u8>,
    pending_drop: Option<PathBuf>,
}

impl HexLensApp {
    fn new(config: &ViewerConfig) -> Self {
        let view = HexView::from_config(config).unwrap_or_else(|e| {
            log::error!("invalid viewer config: {}; using defaults", e);
            HexView::new()
        });
        Self {
            state: AppState::with_view(view),
            show_stack: false,
            byte_classes: false,
            stack_bytes: Vec::new(),
            pending_drop: None,
        }
    }

    fn open_file(&mut self, path: &Path, mode: OpenMode) {
        match self.install(path, mode) {
            Ok(()) => log::info!("Opened {} ({:?})", path.display(), mode),
            Err(e) => {
                log::error!("{:#}", e);
                self.state.message = format!("{:#}", e);
            }
        }
    }

    fn install(&mut self, path: &Path, mode: OpenMode) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let head = match mode {
            OpenMode::Mapped => {
                let mapped = MappedSource::open(path)?;
                let head = mapped
                    .slice(hl_core::ByteRange::new(0, STACK_BYTES as u64))
                    .to_vec();
                self.state.install_source(name, Box::new(mapped));
                head
            }
            OpenMode::Editable | OpenMode::Lazy => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let head = bytes[..bytes.len().min(STACK_BYTES)].to_vec();
                let source = MemorySource::editable(bytes);
                if mode == OpenMode::Lazy {
                    self.state.install_source(name, Box::new(LazySource::with_latency(source, 2)));
                } else {
                    self.state.install_source(name, Box::new(source));
                }
                head
            }
        };

        self.stack_bytes = head;
        self.rebuild_stack();
        Ok(())
    }

    /// Stack panel over the first bytes of the file, one machine word per row.
    fn rebuild_stack(&mut self) {
        let address_mode = self.state.view.layout().address_mode;
        let word_size = address_mode.word_size() as usize;
        let model = BufferStack::new(self.stack_bytes.clone(), word_size);
        let mut stack = StackView::new(Box::new(model));
        stack.set_address_mode(address_mode);
        stack.set_retry_interval(self.state.view.retry_interval());
        self.state.stack = Some(stack);
    }

    fn pick_and_open(&mut self, mode: OpenMode) {
        if let Some(path) = rfd::FileDialog::new().pick_file() {
            self.open_file(&path, mode);
        }
    }

    fn layout_menu(&mut self, ui: &mut egui::Ui) {
        let mut rebuild = false;
        let view = &mut self.state.view;
        let layout = *view.layout();

        ui.menu_button("Bytes per row", |ui| {
            for n in [8u32, 16, 32, 64] {
                if ui.radio(layout.bytes_per_row == n, n.to_string()).clicked() {
                    report(view.set_bytes_per_row(n));
                    ui.close_menu();
                }
            }
        });
        ui.menu_button("Bytes per column", |ui| {
            for n in [1u32, 2, 4, 8] {
                if ui.radio(layout.bytes_per_column == n, n.to_string()).clicked() {
                    report(view.set_bytes_per_column(n));
                    ui.close_menu();
                }
            }
        });
        ui.menu_button("Address width", |ui| {
            for (mode, label) in [(AddressMode::Bit32, "32-bit"), (AddressMode::Bit64, "64-bit")] {
                if ui.radio(layout.address_mode == mode, label).clicked() {
                    report(view.set_address_mode(mode));
                    rebuild = true;
                    ui.close_menu();
                }
            }
        });

        let mut flip = layout.flip_bytes;
        if ui.checkbox(&mut flip, "Flip bytes").changed() {
            report(view.set_flip_bytes(flip));
        }

        if rebuild && self.state.stack.is_some() {
            self.rebuild_stack();
        }
    }
}

fn report(result: hl_core::Result<()>) {
    if let Err(e) = result {
        log::warn!("{}", e);
    }
}

impl eframe::App for HexLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle drag & drop
        ctx.input(|i| {
            if let Some(path) = i.raw.dropped_files.first().and_then(|f| f.path.clone()) {
                self.pending_drop = Some(path);
            }
        });
        if let Some(path) = self.pending_drop.take() {
            self.open_file(&path, OpenMode::Mapped);
        }

        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open...").clicked() {
                        ui.close_menu();
                        self.pick_and_open(OpenMode::Mapped);
                    }
                    if ui.button("Open for editing...").clicked() {
                        ui.close_menu();
                        self.pick_and_open(OpenMode::Editable);
                    }
                    if ui.button("Open as remote target...").clicked() {
                        ui.close_menu();
                        self.pick_and_open(OpenMode::Lazy);
                    }
                    ui.separator();
                    if ui.add_enabled(self.state.has_source(), egui::Button::new("Close")).clicked() {
                        self.state.close_source();
                        self.state.stack = None;
                        self.stack_bytes.clear();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(self.state.config_path.is_some(), egui::Button::new("Save settings"))
                        .clicked()
                    {
                        if let Err(e) = self.state.save_config() {
                            self.state.message = format!("{:#}", e);
                        }
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    self.layout_menu(ui);
                    ui.separator();
                    if ui.checkbox(&mut self.byte_classes, "Color by byte class").changed() {
                        let colormap: Option<Box<dyn hl_core::Colormap>> = if self.byte_classes {
                            Some(Box::new(ByteClassColormap::default()))
                        } else {
                            None
                        };
                        self.state.view.set_colormap(colormap);
                    }
                    ui.checkbox(&mut self.show_stack, "Stack panel");
                    let mut locked = !self.state.view.is_enabled();
                    if ui.checkbox(&mut locked, "Lock view").changed() {
                        self.state.view.set_enabled(!locked);
                    }
                });
                ui.menu_button("Go", |ui| {
                    if ui.button("Go to offset...  Ctrl+G").clicked() {
                        self.state.goto_open = true;
                        self.state.goto_text.clear();
                        self.state.goto_error = None;
                        ui.close_menu();
                    }
                    if ui.button("Highlight selection").clicked() {
                        if let Some(range) = self.state.view.selection().selected_bytes() {
                            let color = hl_core::Color::rgb(255, 200, 120);
                            report(self.state.view.colorize(0, range.offset, range.length, None, Some(color)));
                        }
                        ui.close_menu();
                    }
                    if ui.button("Clear highlights").clicked() {
                        report(self.state.view.uncolorize_all(None));
                        ui.close_menu();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(name) = &self.state.source_name {
                    ui.label(name);
                    ui.separator();
                }
                ui.label(&self.state.message);
            });
        });

        if self.show_stack {
            let palette = *self.state.view.palette();
            if let Some(stack) = self.state.stack.as_mut() {
                egui::SidePanel::right("stack")
                    .resizable(true)
                    .default_width(260.0)
                    .show(ctx, |ui| StackPanel::show(ui, stack, &palette));
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            HexPanel::show(ui, &mut self.state);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(OsString::from))
    }

    #[test]
    fn parses_file_and_config() {
        let parsed = args(&["dump.bin", "--config", "viewer.json"]).unwrap();
        assert_eq!(parsed.file, Some(PathBuf::from("dump.bin")));
        assert_eq!(parsed.config, Some(PathBuf::from("viewer.json")));

        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["a.bin", "b.bin"]).is_err());
    }

    #[test]
    fn buffer_stack_reads_little_endian_words() {
        let mut stack = BufferStack::new(vec![0x78, 0x56, 0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE], 4);
        assert_eq!(stack.entry_count(), 2);
        assert_eq!(stack.stack_pointer(), Some(4));
        assert_eq!(stack.element(0), "12345678");
        assert_eq!(stack.element(4), "DEADBEEF");
        assert_eq!(stack.element(6), "????????");
        assert!(!stack.has_data(4, 8));
    }
}
