// Pipeline module - executes pipeline calls against one logical database
//
// - resolver: SQL text or stored SQL id to the statement to run
// - condition: batch step gating over earlier step outcomes
// - handler: ordered request dispatch with per-request error isolation

pub mod condition;
pub mod handler;
pub mod resolver;

pub use condition::{StepOutcome, evaluate};
pub use handler::handle_pipeline;
pub use resolver::{resolve_sql, resolve_stmt};
