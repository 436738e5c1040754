//! Connection handles.
//!
//! A [`Connection`] is one pool slot: an index, an exclusive lock, and the
//! [`Session`] that lock protects. Locking yields a [`ConnectionGuard`],
//! through which the session is connected, probed and used.

mod handle;
mod session;

pub use handle::{Connection, ConnectionGuard};
pub use session::{ExecOptions, Session};
