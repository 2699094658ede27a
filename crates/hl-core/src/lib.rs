pub mod types;
pub mod error;
pub mod source;
pub mod mapped_source;
pub mod ranges;
pub mod layout;
pub mod coords;
pub mod selection;
pub mod viewport;
pub mod render;
pub mod view;
pub mod stack;
pub mod config;

pub use types::*;
pub use error::{HexViewError, Result};
pub use source::{DataSource, LazySource, MemorySource, LAZY_PAGE_SIZE};
pub use mapped_source::MappedSource;
pub use ranges::{ColoredRange, ColoredRangeManager, RangeLayer, DEFAULT_LAYER_COUNT};
pub use layout::{AddressMode, Layout, Metrics};
pub use coords::Geometry;
pub use selection::Selection;
pub use viewport::{ScrollExtents, Viewport};
pub use render::{
    ByteClassColormap, Cell, CellStyle, Colormap, DefinitionStatus, Frame, OffsetLabel,
    Palette, PaneBounds,
};
pub use view::{EditOutcome, HexView, RejectReason, ViewEvent};
pub use stack::{StackFrame, StackModel, StackRow, StackView};
pub use config::ViewerConfig;
