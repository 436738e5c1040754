//! MySQL / MariaDB driver built on the synchronous `mysql` crate.

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Value};

use super::{ConnectParams, Driver, DriverError, DriverResult, Link};
use crate::result::{ResultSet, Row};

/// Driver for MySQL-compatible servers.
///
/// The `mysql` crate always negotiates multi-statement and multi-result
/// support, which the pool relies on for multiline execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl MySqlDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for MySqlDriver {
    type Link = MySqlLink;

    fn connect(&self, params: &ConnectParams) -> DriverResult<MySqlLink> {
        let mut opts = OptsBuilder::new()
            .ip_or_hostname(Some(params.host.as_str()))
            .tcp_port(params.effective_port())
            .user(Some(params.user.as_str()))
            .pass(Some(params.password.as_str()))
            .db_name(Some(params.database.as_str()));
        if params.compress {
            opts = opts.compress(Some(mysql::Compression::default()));
        }

        let conn = Conn::new(opts).map_err(|e| DriverError::Connect(e.to_string()))?;
        Ok(MySqlLink { conn })
    }

    fn name(&self) -> &str {
        "mysql"
    }
}

/// An open MySQL connection.
pub struct MySqlLink {
    conn: Conn,
}

fn query_error(e: mysql::Error) -> DriverError {
    match e {
        mysql::Error::IoError(_) | mysql::Error::DriverError(_) => DriverError::Closed,
        other => DriverError::Query(other.to_string()),
    }
}

fn cell(value: Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        other => Some(other.as_sql(true)),
    }
}

impl Link for MySqlLink {
    fn ping(&mut self) -> bool {
        self.conn.ping().is_ok()
    }

    fn query(&mut self, sql: &str) -> DriverResult<Vec<ResultSet>> {
        let mut result = self.conn.query_iter(sql).map_err(query_error)?;
        let mut sets = Vec::new();
        while let Some(set) = result.iter() {
            let columns = set
                .columns()
                .as_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect();
            let mut rs = ResultSet::new(columns);
            for row in set {
                let row = row.map_err(query_error)?;
                rs.push(Row::new(row.unwrap().into_iter().map(cell).collect()));
            }
            sets.push(rs);
        }
        Ok(sets)
    }

    fn exec(&mut self, sql: &str, multiline: bool) -> DriverResult<u64> {
        let mut result = self.conn.query_iter(sql).map_err(query_error)?;
        let mut affected = 0;
        let mut first = true;
        while let Some(set) = result.iter() {
            if first || multiline {
                affected += set.affected_rows();
            }
            first = false;
            for row in set {
                row.map_err(query_error)?;
            }
        }
        Ok(affected)
    }

    fn server_info(&self) -> Option<String> {
        let (major, minor, patch) = self.conn.server_version();
        Some(format!("{}.{}.{}", major, minor, patch))
    }
}
