//! watchman-client - A Rust client for the watchman file-watching daemon
//!
//! This crate speaks watchman's newline-delimited JSON protocol over a Unix
//! socket:
//! - Typed query expression trees with watchman's wire encoding
//! - Result field selection via a bitmask
//! - `watch` / `watch-del` / `watch-list` / `query` commands
//! - Synchronous, blocking I/O with one request in flight per connection
//!
//! ```no_run
//! use watchman_client::{Connection, Expr, Fields};
//!
//! fn main() -> watchman_client::Result<()> {
//!     let mut conn = Connection::discover()?;
//!     conn.watch("/path/to/project")?;
//!
//!     let expr = Expr::all_of(vec![Expr::suffix("rs"), Expr::Exists]);
//!     let result = conn.query("/path/to/project", &expr, Fields::NAME | Fields::SIZE)?;
//!     for file in &result.files {
//!         println!("{} ({} bytes)", file.name, file.size);
//!     }
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod expr;
pub mod fields;
pub mod query;
pub mod watch;

pub use connection::Connection;
pub use error::{Result, WatchmanError};
pub use expr::{ClockSpec, Expr, NameScope, SinceValue};
pub use fields::Fields;
pub use query::{FileStat, QueryResult};
