use tracing::{debug, warn};

use crate::error::SqlEmulatorError;
use crate::protocol::{
    Batch, BatchResult, PipelineRequestBody, PipelineResponseBody, ProtocolError, Stmt,
    StreamRequest, StreamResponse, StreamResult,
};
use crate::registry::{DatabaseRegistry, SqlCache};
use crate::results::ResultSet;
use crate::sqlite::{SqliteHandle, StatementParams, describe_statement, execute_statement};

use super::condition::{StepOutcome, evaluate};
use super::resolver::{resolve_sql, resolve_stmt};

/// Process one pipeline call against `database`.
///
/// Requests run in order and each one succeeds or fails on its own; the returned `results`
/// has exactly one entry per request. This never fails as a whole.
pub async fn handle_pipeline(
    registry: &DatabaseRegistry,
    database: &str,
    body: PipelineRequestBody,
) -> PipelineResponseBody {
    let mut ctx = PipelineContext::new(registry, database);
    let mut results = Vec::with_capacity(body.requests.len());

    for request in body.requests {
        let kind = request.kind();
        debug!(database, request = kind, "handling request");
        let result = ctx.handle_request(request).await;
        if let Err(err) = &result {
            warn!(database, request = kind, error = %err, "request failed");
        }
        results.push(StreamResult::from(result));
    }

    PipelineResponseBody {
        baton: None,
        base_url: None,
        results,
    }
}

struct PipelineContext<'a> {
    registry: &'a DatabaseRegistry,
    database: &'a str,
    sql_cache: SqlCache,
    handle: Option<SqliteHandle>,
}

impl<'a> PipelineContext<'a> {
    fn new(registry: &'a DatabaseRegistry, database: &'a str) -> Self {
        Self {
            registry,
            database,
            sql_cache: registry.sql_cache(database),
            handle: None,
        }
    }

    // Opened on the first request that touches the engine.
    fn handle(&mut self) -> Result<SqliteHandle, SqlEmulatorError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }
        let handle = self.registry.open(self.database)?;
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    async fn handle_request(
        &mut self,
        request: StreamRequest,
    ) -> Result<StreamResponse, SqlEmulatorError> {
        match request {
            StreamRequest::Close => {
                self.sql_cache.clear();
                Ok(StreamResponse::Close)
            }
            StreamRequest::Execute { stmt } => {
                let result = self.execute(&stmt).await?;
                Ok(StreamResponse::Execute {
                    result: result.into(),
                })
            }
            StreamRequest::Batch { batch } => Ok(StreamResponse::Batch {
                result: self.run_batch(batch).await,
            }),
            StreamRequest::Sequence { sql, sql_id } => {
                let sql = resolve_sql(sql.as_deref(), sql_id, &self.sql_cache)?;
                self.handle()?.execute_batch(sql).await?;
                Ok(StreamResponse::Sequence)
            }
            StreamRequest::Describe { sql, sql_id } => {
                let sql = resolve_sql(sql.as_deref(), sql_id, &self.sql_cache)?;
                let handle = self.handle()?;
                let description = describe_statement(&handle, sql).await?;
                Ok(StreamResponse::Describe {
                    result: description.into(),
                })
            }
            StreamRequest::StoreSql { sql_id, sql } => {
                self.sql_cache.store(sql_id, sql);
                Ok(StreamResponse::StoreSql)
            }
            StreamRequest::CloseSql { sql_id } => {
                self.sql_cache.remove(sql_id);
                Ok(StreamResponse::CloseSql)
            }
            StreamRequest::GetAutocommit => Ok(StreamResponse::GetAutocommit {
                is_autocommit: true,
            }),
            StreamRequest::Unknown => Err(SqlEmulatorError::UnsupportedRequest(
                "unrecognized request type".to_string(),
            )),
            StreamRequest::Malformed { message } => Err(SqlEmulatorError::DecodeError(message)),
        }
    }

    async fn execute(&mut self, stmt: &Stmt) -> Result<ResultSet, SqlEmulatorError> {
        let sql = resolve_stmt(stmt, &self.sql_cache)?;
        let params = StatementParams::from_stmt(stmt)?;
        let handle = self.handle()?;
        execute_statement(&handle, sql, params).await
    }

    async fn run_batch(&mut self, batch: Batch) -> BatchResult {
        let step_count = batch.steps.len();
        let mut outcomes = Vec::with_capacity(step_count);
        let mut result = BatchResult {
            step_results: Vec::with_capacity(step_count),
            step_errors: Vec::with_capacity(step_count),
        };

        for (idx, step) in batch.steps.iter().enumerate() {
            let runs = step
                .condition
                .as_ref()
                .is_none_or(|cond| evaluate(cond, &outcomes));
            if !runs {
                debug!(database = self.database, step = idx, "batch step skipped");
                outcomes.push(StepOutcome::Skipped);
                result.step_results.push(None);
                result.step_errors.push(None);
                continue;
            }

            match self.execute(&step.stmt).await {
                Ok(rs) => {
                    outcomes.push(StepOutcome::Succeeded);
                    result.step_results.push(Some(rs.into()));
                    result.step_errors.push(None);
                }
                Err(err) => {
                    warn!(database = self.database, step = idx, error = %err, "batch step failed");
                    outcomes.push(StepOutcome::Failed);
                    result.step_results.push(None);
                    result.step_errors.push(Some(ProtocolError::from(&err)));
                }
            }
        }

        result
    }
}
