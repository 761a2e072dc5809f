use serde::{Deserialize, Serialize};

use crate::error::SqlEmulatorError;
use crate::results::{ResultSet, StatementDescription};

use super::value::{WireValue, encode};

/// Error code attached to every failed request; callers only distinguish ok from error.
pub const GENERIC_ERROR_CODE: &str = "SQLITE_ERROR";

/// Body answered to a pipeline call; `results` is index-aligned with the request list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponseBody {
    pub baton: Option<String>,
    pub base_url: Option<String>,
    pub results: Vec<StreamResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: ProtocolError },
}

impl StreamResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, StreamResult::Ok { .. })
    }
}

impl From<Result<StreamResponse, SqlEmulatorError>> for StreamResult {
    fn from(result: Result<StreamResponse, SqlEmulatorError>) -> Self {
        match result {
            Ok(response) => StreamResult::Ok { response },
            Err(err) => StreamResult::Error {
                error: ProtocolError::from(&err),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamResponse {
    Close,
    Execute { result: StmtResult },
    Batch { result: BatchResult },
    Sequence,
    Describe { result: DescribeResult },
    StoreSql,
    CloseSql,
    GetAutocommit { is_autocommit: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolError {
    pub message: String,
    pub code: String,
}

impl From<&SqlEmulatorError> for ProtocolError {
    fn from(err: &SqlEmulatorError) -> Self {
        Self {
            message: err.to_string(),
            code: GENERIC_ERROR_CODE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Col {
    pub name: String,
}

/// Wire form of one statement's result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StmtResult {
    pub cols: Vec<Col>,
    pub rows: Vec<Vec<WireValue>>,
    pub affected_row_count: u64,
    pub last_insert_rowid: Option<String>,
}

impl From<ResultSet> for StmtResult {
    fn from(result_set: ResultSet) -> Self {
        Self {
            cols: result_set
                .column_names
                .into_iter()
                .map(|name| Col { name })
                .collect(),
            rows: result_set
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(encode).collect())
                .collect(),
            affected_row_count: result_set.rows_affected,
            last_insert_rowid: result_set.last_insert_rowid.map(|id| id.to_string()),
        }
    }
}

/// Per-step outcome of a batch, both vectors index-aligned with the steps.
///
/// A skipped step has `None` in both; a failed step only has an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub step_results: Vec<Option<StmtResult>>,
    pub step_errors: Vec<Option<ProtocolError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeParam {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeCol {
    pub name: String,
    pub decltype: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeResult {
    pub params: Vec<DescribeParam>,
    pub cols: Vec<DescribeCol>,
    pub is_explain: bool,
    pub is_readonly: bool,
}

impl From<StatementDescription> for DescribeResult {
    fn from(desc: StatementDescription) -> Self {
        Self {
            params: desc
                .params
                .into_iter()
                .map(|name| DescribeParam { name })
                .collect(),
            cols: desc
                .columns
                .into_iter()
                .map(|(name, decltype)| DescribeCol { name, decltype })
                .collect(),
            is_explain: desc.is_explain,
            is_readonly: desc.is_readonly,
        }
    }
}
