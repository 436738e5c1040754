//! A database session: one optional physical link plus its error state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::driver::{ConnectParams, Driver, DriverError, DriverResult, Link, SESSION_SETUP};
use crate::result::Cursor;

/// Options for [`Session::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOptions {
    /// Sum affected rows over every statement in the text.
    pub multiline: bool,
    /// Bracket the statement in a transaction, rolling back on failure.
    pub transactional: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            multiline: false,
            transactional: true,
        }
    }
}

impl ExecOptions {
    /// Set the multiline flag.
    pub fn multiline(mut self, value: bool) -> Self {
        self.multiline = value;
        self
    }

    /// Set the transactional flag.
    pub fn transactional(mut self, value: bool) -> Self {
        self.transactional = value;
        self
    }
}

/// State behind a connection handle.
///
/// The link is `Some` exactly while the session is connected. Statement
/// failures are returned and also kept for [`Session::last_error`] until
/// the next statement runs.
pub struct Session<D: Driver> {
    driver: Arc<D>,
    link: Option<D::Link>,
    last_error: String,
}

impl<D: Driver> Session<D> {
    /// Create a disconnected session.
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            driver,
            link: None,
            last_error: String::new(),
        }
    }

    /// Open a fresh link, dropping any existing one first.
    ///
    /// Session setup (UTF-8 and UTC) runs after the link is up. A failing
    /// setup statement is logged but does not fail the connect.
    pub fn connect(&mut self, params: &ConnectParams) -> bool {
        self.disconnect();

        let mut link = match self.driver.connect(params) {
            Ok(link) => link,
            Err(e) => {
                warn!(
                    host = %params.host,
                    port = params.effective_port(),
                    error = %e,
                    "connect failed"
                );
                self.last_error = e.to_string();
                return false;
            }
        };

        for stmt in SESSION_SETUP {
            if let Err(e) = link.exec(stmt, false) {
                warn!(statement = stmt, error = %e, "session setup statement failed");
            }
        }

        debug!(host = %params.host, database = %params.database, "connected");
        self.link = Some(link);
        self.last_error.clear();
        true
    }

    /// Close the link. Returns false if there was none.
    pub fn disconnect(&mut self) -> bool {
        self.link.take().is_some()
    }

    /// Whether a link is held. Does not contact the server.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Round-trip liveness probe. False when disconnected.
    pub fn ping(&mut self) -> bool {
        self.link.as_mut().is_some_and(|link| link.ping())
    }

    /// Run a query and return a cursor over its result sets.
    pub fn query(&mut self, sql: &str) -> DriverResult<Cursor> {
        let result = self.link_mut().and_then(|link| link.query(sql));
        self.record(result).map(Cursor::new)
    }

    /// Run a statement without transaction bracketing.
    pub fn exec(&mut self, sql: &str, multiline: bool) -> DriverResult<u64> {
        let result = self.link_mut().and_then(|link| link.exec(sql, multiline));
        self.record(result)
    }

    /// Run a statement and return the affected-row count.
    ///
    /// With `transactional` set the statement runs between
    /// [`transaction_start`](Self::transaction_start) and a commit, or a
    /// rollback if it fails. After a failed statement `last_error` still
    /// describes the statement, not the rollback.
    pub fn execute(&mut self, sql: &str, options: ExecOptions) -> DriverResult<u64> {
        if options.transactional {
            self.transaction_start();
        }

        let result = self.exec(sql, options.multiline);

        if options.transactional {
            match &result {
                Ok(_) => self.transaction_commit(),
                Err(e) => {
                    let error = e.to_string();
                    self.transaction_rollback();
                    self.last_error = error;
                }
            }
        }
        result
    }

    /// Turn off autocommit and open a transaction.
    pub fn transaction_start(&mut self) {
        self.control(&["SET AUTOCOMMIT=0", "BEGIN"]);
    }

    /// Commit and restore autocommit.
    pub fn transaction_commit(&mut self) {
        self.control(&["COMMIT", "SET AUTOCOMMIT=1"]);
    }

    /// Roll back and restore autocommit.
    pub fn transaction_rollback(&mut self) {
        self.control(&["ROLLBACK", "SET AUTOCOMMIT=1"]);
    }

    /// Server text of the most recent failure, empty if none.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Id generated by the last insert on this session.
    ///
    /// The value is advisory: any query or parse failure yields 0.
    pub fn last_insert_id(&mut self) -> i64 {
        let mut cursor = match self.query("SELECT LAST_INSERT_ID() AS ID") {
            Ok(cursor) => cursor,
            Err(_) => return 0,
        };
        let Some(row) = cursor.next_row() else {
            return 0;
        };
        match row.parse::<i64>(0) {
            Some(id) => id,
            None => {
                warn!(value = row.value(0), "unparsable LAST_INSERT_ID");
                0
            }
        }
    }

    /// Name of the driver that opens this session's links.
    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// Server version, when connected and known.
    pub fn server_info(&self) -> Option<String> {
        self.link.as_ref().and_then(|link| link.server_info())
    }

    fn link_mut(&mut self) -> DriverResult<&mut D::Link> {
        self.link.as_mut().ok_or(DriverError::NotConnected)
    }

    fn record<T>(&mut self, result: DriverResult<T>) -> DriverResult<T> {
        match &result {
            Ok(_) => self.last_error.clear(),
            Err(e) => self.last_error = e.to_string(),
        }
        result
    }

    fn control(&mut self, statements: &[&str]) {
        for stmt in statements {
            if let Err(e) = self.exec(stmt, false) {
                warn!(statement = stmt, error = %e, "transaction control failed");
            }
        }
    }
}

impl<D: Driver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.driver.name())
            .field("connected", &self.is_connected())
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;
    use crate::result::{ResultSet, Row};

    fn setup() -> (MemoryDriver, Session<MemoryDriver>, ConnectParams) {
        let driver = MemoryDriver::new();
        let session = Session::new(Arc::new(driver.clone()));
        let params = ConnectParams::new("db.local", "app", "secret", "shop");
        (driver, session, params)
    }

    #[test]
    fn test_connect_runs_session_setup() {
        let (driver, mut session, params) = setup();
        assert!(!session.is_connected());
        assert!(session.connect(&params));
        assert!(session.is_connected());
        assert!(session.ping());

        assert_eq!(
            driver.statements(),
            vec!["SET NAMES utf8mb4", "SET time_zone = '+00:00'"]
        );

        let mut cursor = session
            .query("SELECT @@session.time_zone, @@character_set_connection")
            .unwrap();
        let row = cursor.next_row().unwrap();
        assert_eq!(row.value(0), "+00:00");
        assert_eq!(row.value(1), "utf8mb4");
    }

    #[test]
    fn test_connect_failure_leaves_disconnected() {
        let (driver, mut session, params) = setup();
        driver.set_down(true);
        assert!(!session.connect(&params));
        assert!(!session.is_connected());
        assert!(!session.ping());
        assert!(session.last_error().contains("can't connect"));
    }

    #[test]
    fn test_setup_failure_does_not_fail_connect() {
        let (driver, mut session, params) = setup();
        driver.fail_statements_containing("time_zone");
        assert!(session.connect(&params));
        assert!(session.is_connected());
    }

    #[test]
    fn test_reconnect_replaces_link() {
        let (driver, mut session, params) = setup();
        assert!(session.connect(&params));
        assert!(session.connect(&params));
        assert_eq!(driver.open_links(), 1);

        assert!(session.disconnect());
        assert!(!session.disconnect());
        assert_eq!(driver.open_links(), 0);
    }

    #[test]
    fn test_statement_on_disconnected_session() {
        let (_driver, mut session, _params) = setup();
        assert!(matches!(session.exec("SELECT 1", false), Err(DriverError::NotConnected)));
        assert_eq!(session.last_error(), "not connected");
    }

    #[test]
    fn test_last_error_cleared_by_success() {
        let (driver, mut session, params) = setup();
        session.connect(&params);
        driver.fail_statements_containing("missing");

        assert!(session.exec("SELECT * FROM missing", false).is_err());
        let error: &str = session.last_error();
        assert!(error.contains("missing"));

        session.exec("SELECT 1", false).unwrap();
        assert!(session.last_error().is_empty());
    }

    #[test]
    fn test_transactional_execute_commits() {
        let (driver, mut session, params) = setup();
        session.connect(&params);
        driver.clear_statements();

        let affected = session
            .execute("UPDATE items SET qty = 0", ExecOptions::default())
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            driver.statements(),
            vec![
                "SET AUTOCOMMIT=0",
                "BEGIN",
                "UPDATE items SET qty = 0",
                "COMMIT",
                "SET AUTOCOMMIT=1"
            ]
        );
    }

    #[test]
    fn test_transactional_execute_rolls_back() {
        let (driver, mut session, params) = setup();
        session.connect(&params);
        driver.clear_statements();
        driver.fail_statements_containing("bad_table");

        let result = session.execute("DELETE FROM bad_table", ExecOptions::default());
        assert!(result.is_err());
        assert!(session.last_error().contains("bad_table"));
        assert_eq!(
            driver.statements(),
            vec![
                "SET AUTOCOMMIT=0",
                "BEGIN",
                "DELETE FROM bad_table",
                "ROLLBACK",
                "SET AUTOCOMMIT=1"
            ]
        );
    }

    #[test]
    fn test_plain_execute_multiline() {
        let (driver, mut session, params) = setup();
        session.connect(&params);
        driver.clear_statements();

        let options = ExecOptions::default().transactional(false).multiline(true);
        let affected = session
            .execute("INSERT INTO t VALUES (1); INSERT INTO t VALUES (2)", options)
            .unwrap();
        assert_eq!(affected, 2);
        assert_eq!(driver.statements().len(), 1);
    }

    #[test]
    fn test_last_insert_id() {
        let (_driver, mut session, params) = setup();
        session.connect(&params);
        session
            .execute("INSERT INTO t VALUES (1)", ExecOptions::default())
            .unwrap();
        assert_eq!(session.last_insert_id(), 1);
    }

    #[test]
    fn test_last_insert_id_defaults_to_zero() {
        let (driver, mut session, params) = setup();
        assert_eq!(session.last_insert_id(), 0);

        session.connect(&params);
        driver.respond(
            "SELECT LAST_INSERT_ID() AS ID",
            vec![ResultSet::new(vec!["ID".into()]).with_row(Row::from_strs(["garbage"]))],
        );
        assert_eq!(session.last_insert_id(), 0);

        driver.respond("SELECT LAST_INSERT_ID() AS ID", Vec::new());
        assert_eq!(session.last_insert_id(), 0);
    }
}
