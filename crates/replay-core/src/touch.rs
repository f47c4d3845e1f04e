//! Touch contact occurrences and workspace coding.
//!
//! The input device recycles raw touch ids across distinct physical
//! contacts, so a contact is identified by `(raw id, occurrence index)`;
//! the index increments every time a raw id is reused by a touch-down.
//!
//! Coding assigns each occurrence the workspace it began in. A contact that
//! lands in an ambiguous region (the fixed-layout gutter, or outside every
//! movable workspace) stays uncoded until a later move reaches an
//! unambiguous position; the first successful classification is permanent.

use std::collections::HashMap;

/// One physical touch contact: raw device id plus reuse count.
pub type OccurrenceKey = (i64, u32);

/// Occurrence allocation and permanent workspace coding for one trial.
#[derive(Debug, Default)]
pub struct TouchCoder {
    next_index: HashMap<i64, u32>,
    coding: HashMap<OccurrenceKey, String>,
}

impl TouchCoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the occurrence for a touch-down of `raw_id`.
    pub fn touch_down(&mut self, raw_id: i64) -> OccurrenceKey {
        let index = self
            .next_index
            .entry(raw_id)
            .and_modify(|i| *i += 1)
            .or_insert(0);
        (raw_id, *index)
    }

    /// The occurrence a move event with `raw_id` belongs to, if a down has
    /// ever been seen for that id.
    pub fn current(&self, raw_id: i64) -> Option<OccurrenceKey> {
        self.next_index.get(&raw_id).map(|index| (raw_id, *index))
    }

    /// Permanently code an occurrence to a participant. Once coded, later
    /// calls are ignored: the first classification wins.
    pub fn code(&mut self, key: OccurrenceKey, participant: &str) {
        self.coding
            .entry(key)
            .or_insert_with(|| participant.to_string());
    }

    /// Whether the occurrence has been coded yet.
    pub fn is_coded(&self, key: OccurrenceKey) -> bool {
        self.coding.contains_key(&key)
    }

    /// The participant an occurrence was coded to.
    pub fn coded(&self, key: OccurrenceKey) -> Option<&str> {
        self.coding.get(&key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_reuse_allocates_new_occurrence() {
        let mut coder = TouchCoder::new();
        assert_eq!(coder.touch_down(3), (3, 0));
        assert_eq!(coder.current(3), Some((3, 0)));
        assert_eq!(coder.touch_down(3), (3, 1));
        assert_eq!(coder.current(3), Some((3, 1)));
        // An id with no down yet has no current occurrence.
        assert_eq!(coder.current(9), None);
    }

    #[test]
    fn test_coding_is_permanent_per_occurrence() {
        let mut coder = TouchCoder::new();
        let key = coder.touch_down(1);
        coder.code(key, "left");
        coder.code(key, "right");
        assert_eq!(coder.coded(key), Some("left"));

        // A new occurrence of the same raw id codes independently.
        let next = coder.touch_down(1);
        assert!(!coder.is_coded(next));
        coder.code(next, "right");
        assert_eq!(coder.coded(next), Some("right"));
        assert_eq!(coder.coded(key), Some("left"));
    }
}
