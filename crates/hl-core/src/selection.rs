use crate::error::{HexViewError, Result};
use crate::types::ByteRange;

/// Caret and selection, measured in display nibbles.
///
/// The selection starts at `start` and spans `length` nibbles, backwards
/// when `length` is negative. The caret is the moving end, `start + length`.
/// Both ends always stay within `[0, limit]`, where `limit` is twice the
/// data length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    start: u64,
    length: i64,
    limit: u64,
}

impl Selection {
    pub fn new(limit: u64) -> Self {
        Self { start: 0, length: 0, limit }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn caret(&self) -> u64 {
        self.start.saturating_add_signed(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn clamp(&self, nibble: i128) -> u64 {
        nibble.clamp(0, i128::from(self.limit)) as u64
    }

    /// Move the caret by `delta` nibbles. With `extend` the anchor stays and
    /// the selection grows or shrinks; otherwise the selection collapses.
    /// Returns true if anything changed.
    pub fn move_by(&mut self, delta: i64, extend: bool) -> bool {
        let before = *self;
        let target = self.clamp(i128::from(self.caret()) + i128::from(delta));
        if extend {
            self.length = target as i64 - self.start as i64;
        } else {
            self.start = target;
            self.length = 0;
        }
        *self != before
    }

    /// Collapse the selection and put the caret at `nibble`.
    pub fn set_caret(&mut self, nibble: u64) -> Result<()> {
        if nibble > self.limit {
            return Err(HexViewError::OutOfRange { offset: nibble / 2, len: self.limit / 2 });
        }
        self.start = nibble;
        self.length = 0;
        Ok(())
    }

    /// Set the signed selection length, clamped so the caret stays in range.
    pub fn set_length(&mut self, length: i64) {
        let caret = self.clamp(i128::from(self.start) + i128::from(length));
        self.length = caret as i64 - self.start as i64;
    }

    /// Extend the selection so the caret lands on `nibble`.
    pub fn extend_to(&mut self, nibble: u64) {
        let caret = self.clamp(i128::from(nibble));
        self.length = caret as i64 - self.start as i64;
    }

    /// Change the data length, pulling both ends back inside if needed.
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = limit;
        let caret = self.caret().min(limit);
        self.start = self.start.min(limit);
        self.length = caret as i64 - self.start as i64;
    }

    /// Lower and upper nibble of the selection, in ascending order.
    pub fn nibble_span(&self) -> (u64, u64) {
        let caret = self.caret();
        (self.start.min(caret), self.start.max(caret))
    }

    /// First byte that has at least one selected nibble.
    pub fn first_selected_offset(&self) -> u64 {
        self.nibble_span().0 / 2
    }

    /// One past the last byte that has at least one selected nibble.
    pub fn last_selected_offset(&self) -> u64 {
        self.nibble_span().1.div_ceil(2)
    }

    /// Selected bytes, or `None` for an empty selection.
    pub fn selected_bytes(&self) -> Option<ByteRange> {
        if self.is_empty() {
            return None;
        }
        let first = self.first_selected_offset();
        Some(ByteRange::new(first, self.last_selected_offset() - first))
    }

    /// Whether the grid byte at `position` is drawn as selected.
    pub fn is_selected(&self, position: u64) -> bool {
        if self.is_empty() {
            return false;
        }
        let (low, high) = self.nibble_span();
        position >= low / 2 && 2 * position < high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn move_collapses_and_clamps() {
        let mut s = Selection::new(512);
        assert!(s.move_by(64, false));
        assert_eq!((s.start(), s.length(), s.caret()), (64, 0, 64));

        s.move_by(-1000, false);
        assert_eq!(s.caret(), 0);
        assert!(!s.move_by(-1, false));

        s.move_by(10_000, false);
        assert_eq!(s.caret(), 512);
    }

    #[test]
    fn extend_grows_both_directions() {
        let mut s = Selection::new(100);
        s.set_caret(40).unwrap();

        s.move_by(6, true);
        assert_eq!((s.start(), s.length()), (40, 6));

        s.move_by(-20, true);
        assert_eq!((s.start(), s.length(), s.caret()), (40, -14, 26));

        s.move_by(-1000, true);
        assert_eq!((s.start(), s.length()), (40, -40));

        s.move_by(1000, true);
        assert_eq!((s.start(), s.length()), (40, 60));
    }

    #[test]
    fn plain_move_after_selection_continues_from_caret() {
        let mut s = Selection::new(100);
        s.set_caret(10).unwrap();
        s.move_by(8, true);
        s.move_by(1, false);
        assert_eq!((s.start(), s.length()), (19, 0));
    }

    #[test]
    fn set_caret_past_end_is_rejected() {
        let mut s = Selection::new(20);
        s.set_caret(6).unwrap();
        assert!(matches!(s.set_caret(21), Err(HexViewError::OutOfRange { .. })));
        assert_eq!(s.caret(), 6);
        s.set_caret(20).unwrap();
    }

    #[test]
    fn set_length_is_clamped() {
        let mut s = Selection::new(20);
        s.set_caret(10).unwrap();
        s.set_length(50);
        assert_eq!(s.length(), 10);
        s.set_length(-50);
        assert_eq!(s.length(), -10);
    }

    #[test]
    fn selected_offsets_round_outward() {
        let mut s = Selection::new(100);
        s.set_caret(3).unwrap();
        s.set_length(4);
        // Nibbles 3..7 touch bytes 1, 2 and 3.
        assert_eq!(s.first_selected_offset(), 1);
        assert_eq!(s.last_selected_offset(), 4);
        assert_eq!(s.selected_bytes(), Some(ByteRange::new(1, 3)));

        s.set_length(-3);
        // Nibbles 0..3 touch bytes 0 and 1.
        assert_eq!(s.first_selected_offset(), 0);
        assert_eq!(s.last_selected_offset(), 2);
    }

    #[test]
    fn is_selected_matches_offsets() {
        let mut s = Selection::new(100);
        s.set_caret(4).unwrap();
        s.set_length(4);
        let selected: Vec<u64> = (0..6).filter(|&p| s.is_selected(p)).collect();
        assert_eq!(selected, vec![2, 3]);

        s.set_length(0);
        assert!((0..50).all(|p| !s.is_selected(p)));
    }

    #[test]
    fn shrinking_limit_pulls_selection_back() {
        let mut s = Selection::new(100);
        s.set_caret(80).unwrap();
        s.set_length(10);
        s.set_limit(50);
        assert_eq!((s.start(), s.caret()), (50, 50));
    }

    #[test]
    fn random_operations_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let limit = 2 * rng.gen_range(0..300u64);
            let mut s = Selection::new(limit);
            for _ in 0..200 {
                match rng.gen_range(0..4) {
                    0 => {
                        s.move_by(rng.gen_range(-700..700), rng.gen_bool(0.5));
                    }
                    1 => s.set_length(rng.gen_range(-700..700)),
                    2 => {
                        let _ = s.set_caret(rng.gen_range(0..limit + 10));
                    }
                    _ => s.extend_to(rng.gen_range(0..limit + 10)),
                }
                assert!(s.start() <= limit);
                assert!(s.caret() <= limit);
                assert_eq!(s.caret() as i64, s.start() as i64 + s.length());
                if !s.is_empty() {
                    assert!(s.first_selected_offset() <= s.last_selected_offset());
                }
            }
        }
    }
}
