//! Application-facing pool with a release policy.

use std::time::Duration;

use super::config::PoolConfig;
use super::error::PoolResult;
use super::guard::PooledConnection;
use super::pool::ConnectionPool;
use super::stats::PoolStats;
use crate::driver::Driver;

/// A [`ConnectionPool`] plus the close-on-release policy.
///
/// With the policy set, every released handle drops its link and the next
/// acquirer of that handle reconnects. Otherwise links stay warm.
#[derive(Debug)]
pub struct Pool<D: Driver> {
    pool: ConnectionPool<D>,
    close_on_release: bool,
}

impl<D: Driver> Pool<D> {
    /// Build the pool described by `config`.
    pub fn new(driver: D, config: PoolConfig) -> PoolResult<Self> {
        let pool = ConnectionPool::new(driver, &config)?;
        Ok(Self::from_pool(pool, config.close_on_release))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: ConnectionPool<D>, close_on_release: bool) -> Self {
        Self {
            pool,
            close_on_release,
        }
    }

    /// Get a healthy connection. See [`ConnectionPool::acquire`].
    pub fn acquire(&self) -> PoolResult<PooledConnection<'_, D>> {
        self.pool.acquire().map(|conn| self.apply_policy(conn))
    }

    /// Get a healthy connection within `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<PooledConnection<'_, D>> {
        self.pool
            .acquire_timeout(timeout)
            .map(|conn| self.apply_policy(conn))
    }

    /// Give a connection back under this pool's policy.
    pub fn release(&self, conn: PooledConnection<'_, D>) {
        conn.release_with(self.close_on_release);
    }

    /// Validate the configuration with a throwaway connection.
    pub fn check_connection(&self) -> bool {
        self.pool.check_connection()
    }

    /// The release policy.
    pub fn close_on_release(&self) -> bool {
        self.close_on_release
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The wrapped pool.
    pub fn inner(&self) -> &ConnectionPool<D> {
        &self.pool
    }

    fn apply_policy<'p>(&self, mut conn: PooledConnection<'p, D>) -> PooledConnection<'p, D> {
        conn.set_close_on_release(self.close_on_release);
        conn
    }
}
