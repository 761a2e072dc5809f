//! Local emulator for a hosted SQLite-over-HTTP service.
//!
//! Clients send pipelines of requests (`execute`, `batch`, `store_sql`, `close`, ...) as JSON;
//! each logical database is a SQLite file under one root directory. The crate exposes the
//! pieces separately so they can be driven without HTTP:
//!
//! - [`protocol`]: wire types and the value codec
//! - [`sqlite`]: statement execution against one database
//! - [`registry`]: database files and stored SQL per database
//! - [`pipeline`]: request dispatch, stored SQL ids and batch conditions
//! - [`server`]: axum routes for pipelines and database management

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod protocol;
pub mod registry;
pub mod results;
pub mod server;
pub mod sqlite;
pub mod types;

pub use error::SqlEmulatorError;
pub use pipeline::handle_pipeline;
pub use registry::{DatabaseRegistry, SqlCache};
pub use results::{ResultSet, StatementDescription};
pub use types::RowValues;
