pub mod state;
pub mod font;
pub mod hex_panel;
pub mod stack_panel;

pub use state::{color32, AppState};
pub use font::{font_metrics, grid_font};
pub use hex_panel::{parse_offset, HexPanel};
pub use stack_panel::StackPanel;
