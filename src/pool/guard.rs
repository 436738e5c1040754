//! Usage right for a pooled connection.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::Ordering;

use tracing::trace;

use super::stats::Counters;
use crate::connection::{ConnectionGuard, Session};
use crate::driver::Driver;

/// A connection borrowed from a pool.
///
/// Dereferences to the [`Session`], so statements are issued directly on
/// it. The handle goes back to the pool on [`release`](Self::release) or
/// when this value is dropped; either way the release policy chosen at
/// acquire time applies.
pub struct PooledConnection<'p, D: Driver> {
    // Unlocks the handle when dropped, after `Drop::drop` has run.
    guard: ConnectionGuard<'p, D>,
    counters: &'p Counters,
    close_on_release: bool,
}

impl<'p, D: Driver> PooledConnection<'p, D> {
    pub(crate) fn new(guard: ConnectionGuard<'p, D>, counters: &'p Counters) -> Self {
        Self {
            guard,
            counters,
            close_on_release: false,
        }
    }

    /// Position of the handle in its pool.
    pub fn index(&self) -> usize {
        self.guard.index()
    }

    /// Whether releasing will close the link.
    pub fn close_on_release(&self) -> bool {
        self.close_on_release
    }

    /// Choose whether releasing closes the link.
    pub fn set_close_on_release(&mut self, value: bool) {
        self.close_on_release = value;
    }

    /// Return the handle to the pool.
    pub fn release(self) {
        drop(self);
    }

    /// Return the handle, overriding the release policy.
    pub fn release_with(mut self, disconnect: bool) {
        self.close_on_release = disconnect;
        drop(self);
    }
}

impl<D: Driver> Deref for PooledConnection<'_, D> {
    type Target = Session<D>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<D: Driver> DerefMut for PooledConnection<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl<D: Driver> Drop for PooledConnection<'_, D> {
    fn drop(&mut self) {
        let disconnect = self.close_on_release;
        trace!(index = self.guard.index(), disconnect, "connection released");
        if disconnect {
            self.guard.disconnect();
        }
        self.counters.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<D: Driver> std::fmt::Debug for PooledConnection<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("index", &self.index())
            .field("close_on_release", &self.close_on_release)
            .finish()
    }
}
