//! Pool-managed connection handle.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};

use super::session::Session;
use crate::driver::Driver;

/// A connection slot owned by a pool.
///
/// The handle embeds an exclusive, non-reentrant lock around its
/// [`Session`]. Holding the lock is the right to use the session; nobody
/// else can touch the link until it is released.
pub struct Connection<D: Driver> {
    index: usize,
    session: Mutex<Session<D>>,
}

impl<D: Driver> Connection<D> {
    /// Create a disconnected handle.
    pub fn new(index: usize, driver: Arc<D>) -> Self {
        Self {
            index,
            session: Mutex::new(Session::new(driver)),
        }
    }

    /// Position of this handle in its pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Block until the handle is free and take it.
    pub fn lock(&self) -> ConnectionGuard<'_, D> {
        self.guard(self.session.lock())
    }

    /// Take the handle if nobody holds it.
    pub fn try_lock(&self) -> Option<ConnectionGuard<'_, D>> {
        self.session.try_lock().map(|g| self.guard(g))
    }

    /// Wait for the handle until `deadline`.
    pub fn try_lock_until(&self, deadline: Instant) -> Option<ConnectionGuard<'_, D>> {
        self.session.try_lock_until(deadline).map(|g| self.guard(g))
    }

    /// Whether some caller currently holds the handle.
    pub fn is_locked(&self) -> bool {
        self.session.is_locked()
    }

    fn guard<'a>(&'a self, session: MutexGuard<'a, Session<D>>) -> ConnectionGuard<'a, D> {
        ConnectionGuard {
            index: self.index,
            session,
        }
    }
}

/// Exclusive use of a [`Connection`]. Dropping it unlocks the handle and
/// keeps the link open.
pub struct ConnectionGuard<'a, D: Driver> {
    index: usize,
    session: MutexGuard<'a, Session<D>>,
}

impl<D: Driver> ConnectionGuard<'_, D> {
    /// Position of the held handle in its pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Release the handle, closing the link first if asked.
    pub fn unlock(mut self, disconnect_first: bool) {
        if disconnect_first {
            self.session.disconnect();
        }
    }
}

impl<D: Driver> Deref for ConnectionGuard<'_, D> {
    type Target = Session<D>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<D: Driver> DerefMut for ConnectionGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;
    use crate::driver::ConnectParams;

    fn handle() -> (MemoryDriver, Connection<MemoryDriver>) {
        let driver = MemoryDriver::new();
        let conn = Connection::new(3, Arc::new(driver.clone()));
        (driver, conn)
    }

    #[test]
    fn test_exclusive_lock() {
        let (_driver, conn) = handle();
        let guard = conn.lock();
        assert_eq!(guard.index(), 3);
        assert!(conn.is_locked());
        assert!(conn.try_lock().is_none());

        guard.unlock(false);
        assert!(!conn.is_locked());
        assert!(conn.try_lock().is_some());
    }

    #[test]
    fn test_try_lock_until_times_out() {
        let (_driver, conn) = handle();
        let _held = conn.lock();
        let deadline = Instant::now() + std::time::Duration::from_millis(20);
        assert!(conn.try_lock_until(deadline).is_none());
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_unlock_with_disconnect() {
        let (driver, conn) = handle();
        let params = ConnectParams::new("db.local", "app", "secret", "shop");

        let mut guard = conn.lock();
        assert!(guard.connect(&params));
        guard.unlock(false);
        assert_eq!(driver.open_links(), 1);
        assert!(conn.lock().is_connected());

        let guard = conn.lock();
        guard.unlock(true);
        assert_eq!(driver.open_links(), 0);
        assert!(!conn.lock().is_connected());
    }
}
