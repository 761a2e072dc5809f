// SQLite module - the embedded engine behind every logical database
//
// - connection: shared handle and blocking-pool execution
// - params: decoding and binding of statement parameters
// - query: row extraction and result building
// - executor: statement classification, execution and description

pub mod connection;
pub mod executor;
pub mod params;
pub mod query;

pub use connection::SqliteHandle;
pub use executor::{
    StatementKind, classify_statement, describe_statement, execute_statement, is_insert,
    is_multi_statement,
};
pub use params::StatementParams;
pub use query::build_result_set;
