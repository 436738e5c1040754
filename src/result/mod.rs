//! Query result types.
//!
//! Drivers hand back fully read [`ResultSet`]s; a [`Cursor`] walks them
//! row by row and set by set, the way multi-statement results are consumed.

mod cursor;
mod row;

pub use cursor::Cursor;
pub use row::{ResultSet, Row};
