//! Colorized byte ranges, stacked in priority layers.
//!
//! Layer 0 has the highest priority. Within one layer ranges never overlap:
//! inserting a range first clears its span, so the last insert wins.

use std::collections::BTreeMap;

use crate::error::{HexViewError, Result};
use crate::types::{ByteRange, Color};

/// Number of layers a new manager starts with.
pub const DEFAULT_LAYER_COUNT: usize = 10;

/// A byte range drawn with custom colors. `None` keeps the default color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColoredRange {
    pub start: u64,
    pub size: u64,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl ColoredRange {
    pub fn new(start: u64, size: u64, foreground: Option<Color>, background: Option<Color>) -> Self {
        Self { start, size, foreground, background }
    }

    pub fn as_range(&self) -> ByteRange {
        ByteRange::new(self.start, self.size)
    }

    pub fn end(&self) -> u64 {
        self.as_range().end()
    }

    pub fn contains_offset(&self, offset: u64) -> bool {
        self.as_range().contains_offset(offset)
    }
}

/// One priority layer: ranges keyed by start offset.
#[derive(Debug, Clone, Default)]
pub struct RangeLayer {
    ranges: BTreeMap<u64, ColoredRange>,
}

impl RangeLayer {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColoredRange> {
        self.ranges.values()
    }

    /// The range containing `offset`, if any.
    pub fn find(&self, offset: u64) -> Option<&ColoredRange> {
        self.ranges
            .range(..=offset)
            .next_back()
            .map(|(_, r)| r)
            .filter(|r| r.contains_offset(offset))
    }

    fn insert(&mut self, range: ColoredRange) {
        if range.size == 0 {
            return;
        }
        self.cut(range.as_range());
        self.ranges.insert(range.start, range);
    }

    /// Remove coloring from `span`, trimming or splitting ranges that
    /// straddle its edges.
    fn cut(&mut self, span: ByteRange) {
        if span.is_empty() {
            return;
        }

        let affected: Vec<u64> = self
            .ranges
            .range(..span.end())
            .rev()
            .take_while(|(_, r)| r.end() > span.offset)
            .map(|(&start, _)| start)
            .collect();

        for start in affected {
            let Some(existing) = self.ranges.remove(&start) else {
                continue;
            };

            if existing.start < span.offset {
                let head = ColoredRange { size: span.offset - existing.start, ..existing };
                self.ranges.insert(head.start, head);
            }
            if existing.end() > span.end() {
                let tail = ColoredRange {
                    start: span.end(),
                    size: existing.end() - span.end(),
                    ..existing
                };
                self.ranges.insert(tail.start, tail);
            }
        }
    }

    fn clear(&mut self) {
        self.ranges.clear();
    }
}

/// Ordered list of range layers; lookups scan from layer 0 upward.
#[derive(Debug, Clone)]
pub struct ColoredRangeManager {
    layers: Vec<RangeLayer>,
}

impl Default for ColoredRangeManager {
    fn default() -> Self {
        Self::new(DEFAULT_LAYER_COUNT)
    }
}

impl ColoredRangeManager {
    pub fn new(layer_count: usize) -> Self {
        Self { layers: vec![RangeLayer::default(); layer_count] }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Append a layer below all existing ones and return its index.
    pub fn push_layer(&mut self) -> usize {
        self.layers.push(RangeLayer::default());
        self.layers.len() - 1
    }

    pub fn layer(&self, layer: usize) -> Option<&RangeLayer> {
        self.layers.get(layer)
    }

    fn layer_mut(&mut self, layer: usize) -> Result<&mut RangeLayer> {
        let count = self.layers.len();
        self.layers.get_mut(layer).ok_or_else(|| {
            HexViewError::invalid(format!("layer {} is outside 0..{}", layer, count))
        })
    }

    /// Color `size` bytes starting at `offset` on `layer`. Overlapping
    /// ranges on the same layer are replaced where they overlap. A zero
    /// size is accepted and does nothing.
    pub fn add_range(
        &mut self,
        layer: usize,
        offset: u64,
        size: u64,
        foreground: Option<Color>,
        background: Option<Color>,
    ) -> Result<()> {
        self.layer_mut(layer)?
            .insert(ColoredRange::new(offset, size, foreground, background));
        Ok(())
    }

    /// Remove coloring of `size` bytes starting at `offset` on `layer`.
    pub fn remove_range(&mut self, layer: usize, offset: u64, size: u64) -> Result<()> {
        if size == 0 {
            return Err(HexViewError::invalid("size must be positive"));
        }
        self.layer_mut(layer)?.cut(ByteRange::new(offset, size));
        Ok(())
    }

    /// Clear one layer, or every layer when `layer` is `None`.
    pub fn clear(&mut self, layer: Option<usize>) -> Result<()> {
        match layer {
            Some(layer) => self.layer_mut(layer)?.clear(),
            None => self.layers.iter_mut().for_each(RangeLayer::clear),
        }
        Ok(())
    }

    /// The highest-priority range containing `offset`.
    pub fn find_range(&self, offset: u64) -> Option<&ColoredRange> {
        self.layers.iter().find_map(|layer| layer.find(offset))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(RangeLayer::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Option<Color> = Some(Color::RED);
    const BLUE: Option<Color> = Some(Color::BLUE);

    #[test]
    fn colorize_then_find_then_uncolorize() {
        let mut m = ColoredRangeManager::default();
        m.add_range(0, 10, 5, None, RED).unwrap();

        let r = m.find_range(12).unwrap();
        assert_eq!((r.start, r.size, r.background), (10, 5, RED));
        assert!(m.find_range(9).is_none());
        assert!(m.find_range(15).is_none());

        m.remove_range(0, 10, 5).unwrap();
        assert!(m.find_range(12).is_none());
        assert!(m.is_empty());
    }

    #[test]
    fn lower_layer_wins() {
        let mut m = ColoredRangeManager::default();
        m.add_range(3, 0, 100, BLUE, None).unwrap();
        m.add_range(1, 40, 10, RED, None).unwrap();

        assert_eq!(m.find_range(45).unwrap().foreground, RED);
        assert_eq!(m.find_range(39).unwrap().foreground, BLUE);

        // Removing the higher-priority range exposes the lower one again.
        m.remove_range(1, 40, 10).unwrap();
        assert_eq!(m.find_range(45).unwrap().foreground, BLUE);
    }

    #[test]
    fn last_insert_wins_within_layer() {
        let mut m = ColoredRangeManager::default();
        m.add_range(0, 0, 20, RED, None).unwrap();
        m.add_range(0, 5, 5, BLUE, None).unwrap();

        let layer = m.layer(0).unwrap();
        let spans: Vec<(u64, u64)> = layer.iter().map(|r| (r.start, r.size)).collect();
        assert_eq!(spans, vec![(0, 5), (5, 5), (10, 10)]);
        assert_eq!(m.find_range(4).unwrap().foreground, RED);
        assert_eq!(m.find_range(7).unwrap().foreground, BLUE);
        assert_eq!(m.find_range(10).unwrap().foreground, RED);
    }

    #[test]
    fn insert_covering_several_ranges_replaces_them() {
        let mut m = ColoredRangeManager::default();
        m.add_range(0, 0, 4, RED, None).unwrap();
        m.add_range(0, 6, 4, RED, None).unwrap();
        m.add_range(0, 12, 4, RED, None).unwrap();
        m.add_range(0, 2, 12, BLUE, None).unwrap();

        let spans: Vec<(u64, u64)> = m.layer(0).unwrap().iter().map(|r| (r.start, r.size)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 12), (14, 2)]);
    }

    #[test]
    fn repeated_calls_are_idempotent() {
        let mut m = ColoredRangeManager::default();
        m.add_range(2, 8, 8, RED, BLUE).unwrap();
        m.add_range(2, 8, 8, RED, BLUE).unwrap();
        assert_eq!(m.layer(2).unwrap().len(), 1);

        m.remove_range(2, 8, 8).unwrap();
        m.remove_range(2, 8, 8).unwrap();
        assert!(m.layer(2).unwrap().is_empty());
    }

    #[test]
    fn partial_remove_splits() {
        let mut m = ColoredRangeManager::default();
        m.add_range(0, 0, 10, RED, None).unwrap();
        m.remove_range(0, 3, 2).unwrap();

        assert!(m.find_range(2).is_some());
        assert!(m.find_range(3).is_none());
        assert!(m.find_range(4).is_none());
        assert!(m.find_range(5).is_some());
    }

    #[test]
    fn invalid_arguments() {
        let mut m = ColoredRangeManager::default();
        assert!(matches!(m.add_range(10, 0, 1, RED, None), Err(HexViewError::InvalidArgument(_))));
        assert!(matches!(m.remove_range(0, 0, 0), Err(HexViewError::InvalidArgument(_))));
        assert!(m.clear(Some(42)).is_err());

        m.add_range(0, 5, 0, RED, None).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn clear_one_or_all_layers() {
        let mut m = ColoredRangeManager::default();
        m.add_range(0, 0, 4, RED, None).unwrap();
        m.add_range(5, 0, 4, BLUE, None).unwrap();

        m.clear(Some(0)).unwrap();
        assert_eq!(m.find_range(1).unwrap().foreground, BLUE);

        m.clear(None).unwrap();
        assert!(m.find_range(1).is_none());
    }

    #[test]
    fn pushed_layer_has_lowest_priority() {
        let mut m = ColoredRangeManager::new(1);
        let extra = m.push_layer();
        assert_eq!(extra, 1);
        m.add_range(extra, 0, 10, BLUE, None).unwrap();
        m.add_range(0, 0, 10, RED, None).unwrap();
        assert_eq!(m.find_range(3).unwrap().foreground, RED);
    }

    #[test]
    fn add_then_remove_restores_lookup() {
        let mut m = ColoredRangeManager::default();
        m.add_range(4, 0, 64, BLUE, None).unwrap();
        let before: Vec<Option<ColoredRange>> = (0..64).map(|o| m.find_range(o).copied()).collect();

        m.add_range(2, 16, 16, RED, None).unwrap();
        m.remove_range(2, 16, 16).unwrap();

        let after: Vec<Option<ColoredRange>> = (0..64).map(|o| m.find_range(o).copied()).collect();
        assert_eq!(before, after);
    }
}
