//! Connection pooling.
//!
//! A [`ConnectionPool`] owns a fixed number of [`Connection`] handles and
//! hands them out one caller at a time. [`Pool`] wraps it with the
//! close-on-release policy applications usually want to set once.
//!
//! # Usage
//!
//! ```
//! use connpool::driver::memory::MemoryDriver;
//! use connpool::pool::{Pool, PoolConfig};
//!
//! let config = PoolConfig::new("localhost", "app", "secret", "shop").capacity(2);
//! let pool = Pool::new(MemoryDriver::new(), config).unwrap();
//!
//! let mut conn = pool.acquire().unwrap();
//! conn.execute("INSERT INTO orders VALUES (1)", Default::default()).unwrap();
//! assert_eq!(conn.last_insert_id(), 1);
//! pool.release(conn);
//! ```
//!
//! [`Connection`]: crate::connection::Connection

mod config;
mod error;
mod facade;
mod guard;
mod pool;
mod retry;
mod stats;


pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use facade::Pool;
pub use guard::PooledConnection;
pub use pool::ConnectionPool;
pub use retry::{Backoff, RetryPolicy};
pub use stats::PoolStats;
