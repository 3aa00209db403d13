//! fedmarks database layer.
//!
//! Provides SQLite connection management and schema migrations.
//!
//! # Usage
//!
//! ```no_run
//! use fedmarks::database::Database;
//!
//! let db = Database::open("fedmarks.db").expect("failed to open database");
//! let conn = db.connection();
//! # let _ = conn;
//! ```

pub mod connection;
pub mod migrations;

pub use connection::{in_transaction, parse_sql_date, read_sql_date, sql_date, Database};
