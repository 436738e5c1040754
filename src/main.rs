//! connpool - command-line front end for the connection pool.
//!
//! Checks server reachability, runs statements through a pooled connection,
//! and load-tests the pool from several threads.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::{Parser, Subcommand};
use tracing::error;

use connpool::driver::mysql::MySqlDriver;
use connpool::pool::{Pool, PoolConfig};
use connpool::result::Cursor;
use connpool::ExecOptions;

#[derive(Parser)]
#[command(name = "connpool", version, about = "MySQL connection pool tool")]
struct Cli {
    /// JSON pool configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port (0 for the default)
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Account name
    #[arg(short, long)]
    user: Option<String>,

    /// Account password
    #[arg(short, long, env = "CONNPOOL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Database name
    #[arg(short, long)]
    database: Option<String>,

    /// Number of pooled connections
    #[arg(long)]
    capacity: Option<usize>,

    /// Close links when connections are released
    #[arg(long)]
    close_on_release: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open and close a throwaway connection
    Check,
    /// Execute a statement and print affected rows
    Exec {
        sql: String,
        /// Count affected rows across every statement
        #[arg(long)]
        multiline: bool,
        /// Run without BEGIN/COMMIT bracketing
        #[arg(long)]
        no_transaction: bool,
    },
    /// Run a query and print its result sets
    Query { sql: String },
    /// Hammer the pool from several threads
    Bench {
        #[arg(long, default_value_t = 8)]
        threads: usize,
        #[arg(long, default_value_t = 100)]
        iterations: usize,
        #[arg(long, default_value = "SELECT 1")]
        sql: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("connpool=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<PoolConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PoolConfig::from_json_file(path)?,
        None => PoolConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(user) = &cli.user {
        config.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if cli.close_on_release {
        config.close_on_release = true;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(&cli)?;
    let pool = Pool::new(MySqlDriver::new(), config)?;

    match cli.command {
        Command::Check => {
            if pool.check_connection() {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("unreachable");
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Exec {
            sql,
            multiline,
            no_transaction,
        } => {
            let mut conn = pool.acquire()?;
            let options = ExecOptions::default()
                .multiline(multiline)
                .transactional(!no_transaction);
            let affected = conn.execute(&sql, options)?;
            println!("{} row(s) affected", affected);
            println!("last insert id: {}", conn.last_insert_id());
            pool.release(conn);
            Ok(ExitCode::SUCCESS)
        }
        Command::Query { sql } => {
            let mut conn = pool.acquire()?;
            if let Some(info) = conn.server_info() {
                eprintln!("server {} ({})", info, conn.driver_name());
            }
            let cursor = conn.query(&sql)?;
            print_cursor(cursor);
            pool.release(conn);
            Ok(ExitCode::SUCCESS)
        }
        Command::Bench {
            threads,
            iterations,
            sql,
        } => {
            let failures = bench(&pool, threads, iterations, &sql);
            println!("{}", serde_json::to_string_pretty(&pool.stats())?);
            if failures == 0 {
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{} operation(s) failed", failures);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn bench(pool: &Pool<MySqlDriver>, threads: usize, iterations: usize, sql: &str) -> usize {
    thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(move || {
                    let mut failures = 0;
                    for _ in 0..iterations {
                        match pool.acquire() {
                            Ok(mut conn) => {
                                if conn.query(sql).is_err() {
                                    failures += 1;
                                }
                                pool.release(conn);
                            }
                            Err(e) => {
                                error!(error = %e, "acquire failed");
                                failures += 1;
                            }
                        }
                    }
                    failures
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().unwrap_or(iterations))
            .sum()
    })
}

fn print_cursor(mut cursor: Cursor) {
    loop {
        if cursor.has_result_set() {
            println!("{}", cursor.columns().join("\t"));
            let mut count = 0;
            while let Some(row) = cursor.next_row() {
                let values: Vec<&str> = row.iter().map(|v| v.unwrap_or("NULL")).collect();
                println!("{}", values.join("\t"));
                count += 1;
            }
            println!("({} rows)", count);
        }
        if !cursor.advance_to_next_result_set() {
            break;
        }
    }
}
