use crate::platform::RawUpdate;

/// Lower bound for the next `getUpdates` call.
///
/// Starts unset, meaning the server decides where to start. After a
/// non-empty batch it is one past the highest update id seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    next: Option<i64>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<i64> {
        self.next
    }

    /// Move past every update in `batch`. Never moves backwards.
    pub fn advance(&mut self, batch: &[RawUpdate]) {
        let Some(max_id) = batch.iter().map(|u| u.id).max() else {
            return;
        };
        let candidate = max_id.saturating_add(1);
        self.next = Some(self.next.map_or(candidate, |n| n.max(candidate)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(ids: &[i64]) -> Vec<RawUpdate> {
        ids.iter()
            .map(|&id| RawUpdate {
                id,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_starts_unset() {
        assert_eq!(Cursor::new().current(), None);
    }

    #[test]
    fn test_empty_batch_leaves_cursor_alone() {
        let mut cursor = Cursor::new();
        cursor.advance(&[]);
        assert_eq!(cursor.current(), None);

        cursor.advance(&batch(&[3]));
        cursor.advance(&[]);
        assert_eq!(cursor.current(), Some(4));
    }

    #[test]
    fn test_advances_past_highest_id_even_out_of_order() {
        let mut cursor = Cursor::new();
        cursor.advance(&batch(&[10, 14, 12]));
        assert_eq!(cursor.current(), Some(15));
    }

    #[test]
    fn test_tracks_max_seen_and_never_decreases() {
        let mut cursor = Cursor::new();
        let mut max_seen = i64::MIN;
        let mut previous = None;

        let batches: [&[i64]; 5] = [&[5, 6, 7], &[9], &[2, 3], &[100, 101], &[50]];
        for ids in batches {
            cursor.advance(&batch(ids));
            max_seen = max_seen.max(*ids.iter().max().unwrap());

            assert_eq!(cursor.current(), Some(max_seen + 1));
            assert!(cursor.current() >= previous);
            previous = cursor.current();
        }
    }

    #[test]
    fn test_highest_possible_id_does_not_overflow() {
        let mut cursor = Cursor::new();
        cursor.advance(&batch(&[i64::MAX - 1, i64::MAX]));
        assert_eq!(cursor.current(), Some(i64::MAX));
    }
}
