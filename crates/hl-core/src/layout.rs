use serde::{Deserialize, Serialize};

use crate::error::{HexViewError, Result};

/// Largest row the pixel grid can hold.
pub const MAX_BYTES_PER_ROW: u32 = 4096;
/// Largest gap between two hex columns, in pixels.
pub const MAX_COLUMN_SPACING: u32 = 256;
/// Largest glyph or row size accepted from the host, in pixels.
pub const MAX_METRIC: u32 = 256;

/// Width of the addresses shown in the offset pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressMode {
    #[default]
    Bit32,
    Bit64,
}

impl AddressMode {
    /// Number of hex digits of a formatted address.
    pub fn digits(&self) -> u32 {
        match self {
            AddressMode::Bit32 => 8,
            AddressMode::Bit64 => 16,
        }
    }

    /// Size in bytes of a machine word, used as the stack element size.
    pub fn word_size(&self) -> u64 {
        match self {
            AddressMode::Bit32 => 4,
            AddressMode::Bit64 => 8,
        }
    }

    pub fn format(&self, address: u64) -> String {
        match self {
            AddressMode::Bit32 => format!("{:08X}", address),
            AddressMode::Bit64 => format!("{:016X}", address),
        }
    }
}

/// How bytes are arranged on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub bytes_per_row: u32,
    pub bytes_per_column: u32,
    /// Extra pixels between two columns in the hex pane.
    pub column_spacing: u32,
    pub address_mode: AddressMode,
    /// Reverse the display order of the bytes inside each column.
    pub flip_bytes: bool,
    /// Address shown for offset 0.
    pub base_address: u64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            bytes_per_row: 16,
            bytes_per_column: 2,
            column_spacing: 4,
            address_mode: AddressMode::Bit32,
            flip_bytes: false,
            base_address: 0,
        }
    }
}

impl Layout {
    pub fn validate(&self) -> Result<()> {
        if self.bytes_per_row == 0 {
            return Err(HexViewError::invalid("bytes per row must be positive"));
        }
        if self.bytes_per_row > MAX_BYTES_PER_ROW {
            return Err(HexViewError::invalid(format!(
                "bytes per row ({}) can't exceed {}",
                self.bytes_per_row, MAX_BYTES_PER_ROW
            )));
        }
        if self.bytes_per_column == 0 {
            return Err(HexViewError::invalid("bytes per column must be positive"));
        }
        if self.bytes_per_column > self.bytes_per_row {
            return Err(HexViewError::invalid(format!(
                "bytes per column ({}) can't exceed bytes per row ({})",
                self.bytes_per_column, self.bytes_per_row
            )));
        }
        if self.column_spacing == 0 || self.column_spacing > MAX_COLUMN_SPACING {
            return Err(HexViewError::invalid(format!(
                "column spacing must be in 1..={}",
                MAX_COLUMN_SPACING
            )));
        }
        Ok(())
    }

    pub fn row_bytes(&self) -> u64 {
        u64::from(self.bytes_per_row)
    }

    pub fn column_bytes(&self) -> u64 {
        u64::from(self.bytes_per_column)
    }

    /// Number of columns in a row; the last one may be partial.
    pub fn columns_per_row(&self) -> u32 {
        self.bytes_per_row.div_ceil(self.bytes_per_column)
    }
}

/// Font measurements supplied by the host, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub char_width: u32,
    /// Height of a glyph above the baseline.
    pub char_height: u32,
    /// Distance between two baselines.
    pub row_height: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self { char_width: 8, char_height: 8, row_height: 12 }
    }
}

impl Metrics {
    pub fn validate(&self) -> Result<()> {
        if self.char_width == 0 || self.char_height == 0 || self.row_height == 0 {
            return Err(HexViewError::invalid("font metrics must be positive"));
        }
        if self.char_width.max(self.row_height) > MAX_METRIC {
            return Err(HexViewError::invalid(format!("font metrics can't exceed {}", MAX_METRIC)));
        }
        if self.char_height > self.row_height {
            return Err(HexViewError::invalid("glyph height can't exceed the row height"));
        }
        Ok(())
    }
}
