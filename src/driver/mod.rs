//! Database driver boundary.
//!
//! The pool never talks to the server itself. Everything below the
//! connection handle (opening a link, sending statement text, reading
//! result sets) goes through the [`Driver`] and [`Link`] traits, so the
//! acquisition protocol can be exercised against [`memory::MemoryDriver`]
//! as well as a real server.
//!
//! ```text
//! ┌──────────────┐  connect()   ┌──────────────┐
//! │    Driver    │ ───────────► │     Link     │  (one physical link)
//! └──────────────┘              └──────────────┘
//!                                 ping / query / exec, closed on drop
//! ```

mod error;
pub mod memory;
#[cfg(feature = "mysql")]
pub mod mysql;

pub use error::{DriverError, DriverResult};

use serde::{Deserialize, Serialize};

use crate::result::ResultSet;

/// Standard MySQL server port, used when a port of 0 is configured.
pub const DEFAULT_PORT: u16 = 3306;

/// Statements issued on every freshly opened link, in order.
///
/// Sessions always run with 4-byte UTF-8 and UTC.
pub const SESSION_SETUP: [&str; 2] = ["SET NAMES utf8mb4", "SET time_zone = '+00:00'"];

/// Parameters for opening a link.
///
/// Values are passed through to the driver as-is; no parsing happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Server port, 0 for [`DEFAULT_PORT`].
    pub port: u16,
    /// Request protocol compression.
    pub compress: bool,
}

impl ConnectParams {
    /// Create parameters with the default port and compression enabled.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port: 0,
            compress: true,
        }
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the compression flag.
    pub fn compress(mut self, value: bool) -> Self {
        self.compress = value;
        self
    }

    /// The port to actually dial.
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        }
    }
}

/// Opens links to a database server.
///
/// Implementations must enable multi-statement and multi-result support on
/// every link they open.
pub trait Driver: Send + Sync + 'static {
    /// The physical link type this driver produces.
    type Link: Link;

    /// Open a new link.
    fn connect(&self, params: &ConnectParams) -> DriverResult<Self::Link>;

    /// Short driver name for diagnostics.
    fn name(&self) -> &str;
}

/// One physical link to the server.
///
/// Dropping the link tears it down.
pub trait Link: Send {
    /// Round-trip liveness probe.
    fn ping(&mut self) -> bool;

    /// Run a statement and collect every result set it produces.
    fn query(&mut self, sql: &str) -> DriverResult<Vec<ResultSet>>;

    /// Run a statement for its side effects.
    ///
    /// Returns the affected-row count of the first result, or the sum over
    /// all results when `multiline` is set.
    fn exec(&mut self, sql: &str, multiline: bool) -> DriverResult<u64>;

    /// Server version string, if the driver knows it.
    fn server_info(&self) -> Option<String> {
        None
    }
}
