use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

use crate::error::HexViewError;
use crate::source::{check_bounds, DataSource};
use crate::types::ByteRange;

/// A read-only, memory-mapped file exposed as a data source.
pub struct MappedSource {
    mmap: Mmap,
    len: u64,
}

impl MappedSource {
    /// Open and memory-map a file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let len = file
            .metadata()
            .with_context(|| format!("failed to read metadata for {}", path.display()))?
            .len();

        // SAFETY: The file must not be truncated externally while mapped.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("failed to mmap {}", path.display()))?;

        log::info!("Mapped {} ({} bytes)", path.display(), len);
        Ok(Self { mmap, len })
    }

    /// Zero-copy view of a region, truncated at the end of the file.
    pub fn slice(&self, region: ByteRange) -> &[u8] {
        let start = region.offset as usize;
        let end = region.end().min(self.len) as usize;

        if start >= self.mmap.len() || start >= end {
            return &[];
        }

        &self.mmap[start..end]
    }
}

impl DataSource for MappedSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn has_data(&mut self, offset: u64, len: u64) -> bool {
        check_bounds(offset, len, self.len).is_ok()
    }

    fn get_data(&mut self, offset: u64, len: u64) -> crate::error::Result<Vec<u8>> {
        check_bounds(offset, len, self.len)?;
        Ok(self.slice(ByteRange::new(offset, len)).to_vec())
    }

    fn set_data(&mut self, _offset: u64, _bytes: &[u8]) -> crate::error::Result<()> {
        Err(HexViewError::ReadOnly)
    }

    fn is_editable(&self) -> bool {
        false
    }
}
