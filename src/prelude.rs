//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to run pipelines in-process or to
//! embed the HTTP server.

pub use crate::config::ServerConfig;
pub use crate::error::SqlEmulatorError;
pub use crate::pipeline::handle_pipeline;
pub use crate::protocol::{
    Batch, BatchCond, BatchStep, NamedArg, PipelineRequestBody, PipelineResponseBody, Stmt,
    StmtResult, StreamRequest, StreamResponse, StreamResult, WireValue,
};
pub use crate::registry::DatabaseRegistry;
pub use crate::results::ResultSet;
pub use crate::server::{AppState, router, serve};
pub use crate::types::RowValues;
