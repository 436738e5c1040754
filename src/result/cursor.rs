//! Row cursor over one or more result sets.

use std::collections::VecDeque;

use super::row::{ResultSet, Row};

/// Walks the result sets of a query.
///
/// The cursor starts on the first set. [`Cursor::next_row`] yields rows of
/// the current set; [`Cursor::advance_to_next_result_set`] moves on to the
/// next one produced by a multi-statement query.
#[derive(Debug, Default)]
pub struct Cursor {
    current: Option<ResultSet>,
    position: usize,
    pending: VecDeque<ResultSet>,
}

impl Cursor {
    /// Build a cursor over the given sets.
    pub fn new(sets: Vec<ResultSet>) -> Self {
        let mut pending: VecDeque<_> = sets.into();
        let current = pending.pop_front();
        Self {
            current,
            position: 0,
            pending,
        }
    }

    /// Whether the cursor is positioned on a result set.
    pub fn has_result_set(&self) -> bool {
        self.current.is_some()
    }

    /// Number of columns in the current set.
    pub fn column_count(&self) -> usize {
        self.current.as_ref().map_or(0, |rs| rs.columns.len())
    }

    /// Name of a column in the current set, empty if out of range.
    pub fn column_name(&self, index: usize) -> &str {
        self.current
            .as_ref()
            .and_then(|rs| rs.columns.get(index))
            .map_or("", |s| s.as_str())
    }

    /// Column names of the current set.
    pub fn columns(&self) -> &[String] {
        self.current
            .as_ref()
            .map_or(&[][..], |rs| rs.columns.as_slice())
    }

    /// Next row of the current set, `None` at end of data.
    pub fn next_row(&mut self) -> Option<Row> {
        let rs = self.current.as_mut()?;
        let row = rs.rows.get_mut(self.position).map(std::mem::take)?;
        self.position += 1;
        Some(row)
    }

    /// Discard the rest of the current set and move to the next one.
    ///
    /// Returns false when no further set exists.
    pub fn advance_to_next_result_set(&mut self) -> bool {
        self.position = 0;
        self.current = self.pending.pop_front();
        self.current.is_some()
    }

    /// Read the remaining rows of the current set.
    pub fn collect_rows(&mut self) -> Vec<Row> {
        std::iter::from_fn(|| self.next_row()).collect()
    }

    /// Number of sets not yet reached.
    pub fn remaining_sets(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row()
    }
}
