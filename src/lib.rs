//! connpool - a fixed-size pool of database connections
//!
//! This crate hands out exclusive, health-checked connections to threads
//! that share a MySQL server. The pool owns a fixed number of handles;
//! each handle carries its own lock, and a caller holds that lock from
//! acquire to release. Broken links are reconnected transparently, under a
//! bounded retry policy, before a handle is returned.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "mysql")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use connpool::driver::mysql::MySqlDriver;
//! use connpool::pool::{Pool, PoolConfig};
//!
//! let config = PoolConfig::new("127.0.0.1", "app", "secret", "shop").capacity(8);
//! let pool = Pool::new(MySqlDriver::new(), config)?;
//!
//! let mut conn = pool.acquire()?;
//! conn.execute("UPDATE stock SET qty = qty - 1 WHERE id = 7", Default::default())?;
//! pool.release(conn);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mysql"))]
//! # fn main() {}
//! ```

pub mod connection;
pub mod driver;
pub mod pool;
pub mod result;

pub use connection::{ExecOptions, Session};
pub use pool::{Pool, PoolConfig, PoolError, PoolResult, PooledConnection};
