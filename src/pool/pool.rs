//! Fixed-size connection pool and its acquisition algorithm.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::PoolConfig;
use super::error::{PoolError, PoolResult};
use super::guard::PooledConnection;
use super::retry::RetryPolicy;
use super::stats::{Counters, PoolStats};
use crate::connection::{Connection, ConnectionGuard, Session};
use crate::driver::{ConnectParams, Driver};

/// A fixed set of connection handles shared by many threads.
///
/// All handles are created up front, disconnected; links are opened lazily
/// by the first acquire that selects a handle. The pool never grows or
/// shrinks, so handle indexes are stable identities.
///
/// Acquiring works in two steps:
///
/// 1. Scan the handles in index order and take the first one whose lock is
///    free.
/// 2. If none is free, take the handle under the round-robin cursor,
///    advance the cursor, and block on that handle's lock. The cursor lock
///    is dropped before blocking.
///
/// The handle is then health-checked (`is_connected` and `ping`) and
/// reconnected under the pool's [`RetryPolicy`] before it is returned.
pub struct ConnectionPool<D: Driver> {
    driver: Arc<D>,
    params: ConnectParams,
    retry: RetryPolicy,
    connections: Box<[Connection<D>]>,
    /// Next slow-path handle. Guards nothing else.
    cursor: Mutex<usize>,
    counters: Counters,
}

impl<D: Driver> ConnectionPool<D> {
    /// Create a pool of `config.capacity` disconnected handles.
    ///
    /// No link is opened here.
    pub fn new(driver: D, config: &PoolConfig) -> PoolResult<Self> {
        config.validate()?;

        let driver = Arc::new(driver);
        let connections = (0..config.capacity)
            .map(|index| Connection::new(index, Arc::clone(&driver)))
            .collect();

        info!(
            driver = driver.name(),
            host = %config.host,
            database = %config.database,
            capacity = config.capacity,
            "connection pool created"
        );

        Ok(Self {
            driver,
            params: config.connect_params(),
            retry: config.retry,
            connections,
            cursor: Mutex::new(0),
            counters: Counters::default(),
        })
    }

    /// Get a healthy connection, waiting as long as it takes for a handle.
    ///
    /// Fails only when the retry policy gives up on reconnecting.
    pub fn acquire(&self) -> PoolResult<PooledConnection<'_, D>> {
        self.acquire_inner(None)
    }

    /// Like [`acquire`](Self::acquire), giving up after `timeout`.
    ///
    /// A timeout too large to represent as a deadline waits without limit.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<PooledConnection<'_, D>> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.acquire_until(deadline),
            None => self.acquire_inner(None),
        }
    }

    /// Like [`acquire`](Self::acquire), giving up at `deadline`.
    ///
    /// The deadline bounds both the wait for a busy handle and the
    /// reconnect loop.
    pub fn acquire_until(&self, deadline: Instant) -> PoolResult<PooledConnection<'_, D>> {
        self.acquire_inner(Some(deadline))
    }

    /// Take a free handle without waiting for a busy one.
    ///
    /// Returns `Ok(None)` when every handle is in use.
    pub fn try_acquire(&self) -> PoolResult<Option<PooledConnection<'_, D>>> {
        let start = Instant::now();
        match self.scan_free() {
            Some(guard) => {
                Counters::bump(&self.counters.fast_path);
                self.finish_acquire(guard, start, None).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Open and immediately drop a throwaway session with the pool's
    /// parameters. Pooled handles are not touched.
    pub fn check_connection(&self) -> bool {
        Session::new(Arc::clone(&self.driver)).connect(&self.params)
    }

    /// Number of handles.
    pub fn capacity(&self) -> usize {
        self.connections.len()
    }

    /// Handle the next slow-path acquire will wait on.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock()
    }

    /// Parameters used for every connect.
    pub fn connect_params(&self) -> &ConnectParams {
        &self.params
    }

    /// Reconnect policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The shared driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.capacity())
    }

    fn acquire_inner(&self, deadline: Option<Instant>) -> PoolResult<PooledConnection<'_, D>> {
        let start = Instant::now();

        let guard = match self.scan_free() {
            Some(guard) => {
                Counters::bump(&self.counters.fast_path);
                guard
            }
            None => {
                let guard = self.wait_round_robin(start, deadline)?;
                Counters::bump(&self.counters.slow_path);
                guard
            }
        };

        self.finish_acquire(guard, start, deadline)
    }

    /// First-fit scan from index 0.
    fn scan_free(&self) -> Option<ConnectionGuard<'_, D>> {
        self.connections.iter().find_map(Connection::try_lock)
    }

    fn wait_round_robin(
        &self,
        start: Instant,
        deadline: Option<Instant>,
    ) -> PoolResult<ConnectionGuard<'_, D>> {
        let index = self.advance_cursor();
        let conn = &self.connections[index];
        debug!(index, "no free connection, waiting");

        match deadline {
            None => Ok(conn.lock()),
            Some(deadline) => conn.try_lock_until(deadline).ok_or_else(|| PoolError::Timeout {
                waited: start.elapsed(),
            }),
        }
    }

    /// Read and advance the cursor. The cursor lock is released on return,
    /// before any handle lock is waited on.
    fn advance_cursor(&self) -> usize {
        let mut cursor = self.cursor.lock();
        let index = *cursor;
        *cursor = (index + 1) % self.connections.len();
        index
    }

    fn finish_acquire<'p>(
        &'p self,
        mut guard: ConnectionGuard<'p, D>,
        start: Instant,
        deadline: Option<Instant>,
    ) -> PoolResult<PooledConnection<'p, D>> {
        self.ensure_healthy(&mut guard, start, deadline)?;

        self.counters
            .in_use
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Counters::bump(&self.counters.acquisitions);
        Ok(PooledConnection::new(guard, &self.counters))
    }

    /// Make sure the held handle is connected and answers a ping,
    /// reconnecting until it does or the policy or deadline runs out.
    fn ensure_healthy(
        &self,
        guard: &mut ConnectionGuard<'_, D>,
        start: Instant,
        deadline: Option<Instant>,
    ) -> PoolResult<()> {
        if guard.is_connected() && guard.ping() {
            return Ok(());
        }

        let index = guard.index();
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            Counters::bump(&self.counters.connect_attempts);
            if guard.connect(&self.params) && guard.ping() {
                debug!(index, attempts, "connection established");
                return Ok(());
            }
            Counters::bump(&self.counters.connect_failures);

            if !self.retry.allows(attempts) {
                let reason = match guard.last_error() {
                    "" => "ping failed after connect".to_string(),
                    e => e.to_string(),
                };
                warn!(index, attempts, reason = %reason, "giving up on connection");
                return Err(PoolError::Unavailable {
                    index,
                    attempts,
                    reason,
                });
            }

            let delay = self.retry.backoff.delay(attempts - 1);
            if let Some(deadline) = deadline {
                let wakes_at = Instant::now().checked_add(delay);
                if wakes_at.map_or(true, |at| at >= deadline) {
                    warn!(index, attempts, "acquire deadline reached while reconnecting");
                    return Err(PoolError::Timeout {
                        waited: start.elapsed(),
                    });
                }
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }
}

impl<D: Driver> std::fmt::Debug for ConnectionPool<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("driver", &self.driver.name())
            .field("host", &self.params.host)
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor())
            .finish()
    }
}
