//! In-process driver for tests and examples.
//!
//! [`MemoryDriver`] opens links that live entirely in memory. It keeps
//! counters for connect attempts, open links and pings, records every
//! statement it sees, and can be told to misbehave: refuse connections,
//! fail statements, or invalidate every open link as if the server had
//! dropped them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{ConnectParams, Driver, DriverError, DriverResult, Link};
use crate::result::{ResultSet, Row};

/// In-memory [`Driver`]. Clones share state, so a test can keep one clone
/// for inspection while the pool owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    connect_attempts: AtomicUsize,
    open_links: AtomicUsize,
    pings: AtomicUsize,
    next_link_id: AtomicUsize,
    next_insert_id: AtomicI64,
    /// Bumped to invalidate every link opened before.
    generation: AtomicU64,
    refuse_next: AtomicUsize,
    down: AtomicBool,
    password: Mutex<Option<String>>,
    failing: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, Vec<ResultSet>>>,
    statements: Mutex<Vec<String>>,
}

impl MemoryDriver {
    /// Create a driver that accepts any credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept connections carrying this password.
    pub fn require_password(self, password: impl Into<String>) -> Self {
        *self.inner.password.lock() = Some(password.into());
        self
    }

    /// Total connect attempts, successful or not.
    pub fn connect_attempts(&self) -> usize {
        self.inner.connect_attempts.load(Ordering::SeqCst)
    }

    /// Links currently open.
    pub fn open_links(&self) -> usize {
        self.inner.open_links.load(Ordering::SeqCst)
    }

    /// Total pings received.
    pub fn pings(&self) -> usize {
        self.inner.pings.load(Ordering::SeqCst)
    }

    /// Refuse the next `count` connect attempts.
    pub fn refuse_next_connects(&self, count: usize) {
        self.inner.refuse_next.store(count, Ordering::SeqCst);
    }

    /// Simulate the server going away (`true`) or coming back.
    ///
    /// While down, connects are refused and existing links fail pings.
    pub fn set_down(&self, down: bool) {
        self.inner.down.store(down, Ordering::SeqCst);
    }

    /// Invalidate every link opened so far.
    pub fn drop_links(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Fail every statement whose text contains `pattern`.
    pub fn fail_statements_containing(&self, pattern: impl Into<String>) {
        self.inner.failing.lock().push(pattern.into());
    }

    /// Stop failing statements.
    pub fn clear_failures(&self) {
        self.inner.failing.lock().clear();
    }

    /// Return `sets` whenever exactly `sql` is queried.
    pub fn respond(&self, sql: impl Into<String>, sets: Vec<ResultSet>) {
        self.inner.responses.lock().insert(sql.into(), sets);
    }

    /// Every statement seen so far, in arrival order.
    pub fn statements(&self) -> Vec<String> {
        self.inner.statements.lock().clone()
    }

    /// Forget recorded statements.
    pub fn clear_statements(&self) {
        self.inner.statements.lock().clear();
    }
}

impl Driver for MemoryDriver {
    type Link = MemoryLink;

    fn connect(&self, params: &ConnectParams) -> DriverResult<MemoryLink> {
        let inner = &self.inner;
        inner.connect_attempts.fetch_add(1, Ordering::SeqCst);

        if inner.down.load(Ordering::SeqCst) {
            return Err(DriverError::Connect(format!(
                "can't connect to server on '{}:{}'",
                params.host,
                params.effective_port()
            )));
        }
        let refused = inner
            .refuse_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(DriverError::Connect("connection refused".into()));
        }
        if let Some(expected) = inner.password.lock().as_deref() {
            if expected != params.password {
                return Err(DriverError::Connect(format!(
                    "access denied for user '{}'",
                    params.user
                )));
            }
        }

        inner.open_links.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryLink {
            inner: Arc::clone(inner),
            id: inner.next_link_id.fetch_add(1, Ordering::SeqCst),
            generation: inner.generation.load(Ordering::SeqCst),
            charset: "latin1".into(),
            time_zone: "SYSTEM".into(),
            autocommit: true,
            last_insert_id: 0,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// A link opened by [`MemoryDriver`].
#[derive(Debug)]
pub struct MemoryLink {
    inner: Arc<Inner>,
    id: usize,
    generation: u64,
    charset: String,
    time_zone: String,
    autocommit: bool,
    last_insert_id: i64,
}

impl MemoryLink {
    /// Link serial number, unique per driver.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current autocommit mode of the session.
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    fn alive(&self) -> bool {
        !self.inner.down.load(Ordering::SeqCst)
            && self.generation == self.inner.generation.load(Ordering::SeqCst)
    }

    fn check(&self, sql: &str) -> DriverResult<()> {
        if !self.alive() {
            return Err(DriverError::Closed);
        }
        self.inner.statements.lock().push(sql.to_string());
        let failing = self.inner.failing.lock();
        if let Some(pattern) = failing.iter().find(|p| sql.contains(p.as_str())) {
            return Err(DriverError::Query(format!(
                "statement rejected near '{}'",
                pattern
            )));
        }
        Ok(())
    }

    /// Apply one statement to the session and report affected rows.
    fn apply(&mut self, stmt: &str) -> u64 {
        let upper = stmt.to_ascii_uppercase();
        if let Some(charset) = upper.strip_prefix("SET NAMES ") {
            self.charset = charset.trim().to_ascii_lowercase();
            0
        } else if upper.starts_with("SET TIME_ZONE") {
            if let Some(value) = stmt.split('\'').nth(1) {
                self.time_zone = value.to_string();
            }
            0
        } else if let Some(mode) = upper.strip_prefix("SET AUTOCOMMIT") {
            self.autocommit = mode.trim_start_matches([' ', '=']).trim() != "0";
            0
        } else if upper.starts_with("INSERT") {
            self.last_insert_id = self.inner.next_insert_id.fetch_add(1, Ordering::SeqCst) + 1;
            1
        } else if upper.starts_with("UPDATE") || upper.starts_with("DELETE") {
            1
        } else {
            0
        }
    }

    fn variables(&self, stmt: &str) -> ResultSet {
        let columns: Vec<String> = stmt
            .trim_start_matches(|c: char| !c.is_whitespace())
            .split(',')
            .map(|c| c.trim().to_string())
            .collect();
        let row = columns
            .iter()
            .map(|c| {
                let name = c.to_ascii_lowercase();
                if name.contains("time_zone") {
                    Some(self.time_zone.clone())
                } else if name.contains("character_set") {
                    Some(self.charset.clone())
                } else if name.contains("autocommit") {
                    Some(if self.autocommit { "1" } else { "0" }.to_string())
                } else {
                    None
                }
            })
            .collect();
        ResultSet::new(columns).with_row(Row::new(row))
    }
}

fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

impl Link for MemoryLink {
    fn ping(&mut self) -> bool {
        self.inner.pings.fetch_add(1, Ordering::SeqCst);
        self.alive()
    }

    fn query(&mut self, sql: &str) -> DriverResult<Vec<ResultSet>> {
        self.check(sql)?;
        if let Some(sets) = self.inner.responses.lock().get(sql.trim()) {
            return Ok(sets.clone());
        }

        let mut sets = Vec::new();
        for stmt in statements(sql) {
            let upper = stmt.to_ascii_uppercase();
            if upper.starts_with("SELECT LAST_INSERT_ID()") {
                sets.push(
                    ResultSet::new(vec!["ID".into()])
                        .with_row(Row::from_strs([self.last_insert_id.to_string()])),
                );
            } else if upper.starts_with("SELECT @@") {
                sets.push(self.variables(stmt));
            } else {
                self.apply(stmt);
            }
        }
        Ok(sets)
    }

    fn exec(&mut self, sql: &str, multiline: bool) -> DriverResult<u64> {
        self.check(sql)?;
        let mut affected = 0;
        for (i, stmt) in statements(sql).enumerate() {
            let rows = self.apply(stmt);
            if i == 0 || multiline {
                affected += rows;
            }
        }
        Ok(affected)
    }

    fn server_info(&self) -> Option<String> {
        Some(format!("memory link #{}", self.id))
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.inner.open_links.fetch_sub(1, Ordering::SeqCst);
    }
}
