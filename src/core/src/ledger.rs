//! Row bookkeeping for per-stage progress lines.
//!
//! Each stage gets the next free row the first time it reports progress.
//! Rows are counted from the first stage line of the current phase, so the
//! stage lines always form a contiguous block directly above the cursor.

use std::collections::HashMap;

/// Where a progress update for a stage should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// First sighting: append a new row
    Append,
    /// Known stage: redraw the row this many lines above the cursor
    Redraw { rows_above: usize },
}

/// Maps stage ids to their assigned row offset.
#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    offsets: HashMap<String, usize>,
    next_offset: usize,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a progress update for `id` and decide where to draw it.
    ///
    /// Unknown ids take the next offset. Known ids are redrawn
    /// `lines_printed() - offset` rows above the cursor, computed from the
    /// current line count rather than the one seen at first sighting.
    pub fn place(&mut self, id: &str) -> Placement {
        match self.offsets.get(id) {
            Some(&offset) => Placement::Redraw {
                rows_above: self.rows_above(offset),
            },
            None => {
                self.offsets.insert(id.to_string(), self.next_offset);
                self.next_offset += 1;
                Placement::Append
            }
        }
    }

    /// Distance from the cursor up to the row at `offset`.
    pub fn rows_above(&self, offset: usize) -> usize {
        self.next_offset - offset
    }

    /// Offset assigned to `id` in the current phase.
    pub fn offset(&self, id: &str) -> Option<usize> {
        self.offsets.get(id).copied()
    }

    /// Number of stage lines printed in the current phase.
    pub fn lines_printed(&self) -> usize {
        self.next_offset
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Start a new phase: forget every stage and restart numbering at 0.
    pub fn reset(&mut self) {
        self.offsets.clear();
        self.next_offset = 0;
    }
}
