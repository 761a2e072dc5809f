use serde::{Deserialize, Deserializer, Serialize};

use super::value::WireValue;

/// Body of a pipeline call.
///
/// Each entry of `requests` is decoded on its own; an entry that does not decode becomes
/// [`StreamRequest::Malformed`] so the rest of the pipeline still runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequestBody {
    /// Accepted for compatibility; streams are never continued.
    #[serde(default)]
    pub baton: Option<String>,
    #[serde(default, deserialize_with = "deserialize_requests")]
    pub requests: Vec<StreamRequest>,
}

fn deserialize_requests<'de, D>(deserializer: D) -> Result<Vec<StreamRequest>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(StreamRequest::from_json)
        .collect())
}

/// One request inside a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRequest {
    /// Forget every stored SQL id of the database.
    Close,
    Execute {
        stmt: Stmt,
    },
    Batch {
        batch: Batch,
    },
    /// Run a raw script without parameters or results.
    Sequence {
        #[serde(default)]
        sql: Option<String>,
        #[serde(default)]
        sql_id: Option<i64>,
    },
    Describe {
        #[serde(default)]
        sql: Option<String>,
        #[serde(default)]
        sql_id: Option<i64>,
    },
    StoreSql {
        sql_id: i64,
        sql: String,
    },
    CloseSql {
        sql_id: i64,
    },
    GetAutocommit,
    /// A request whose fields or values did not decode; carries the decoder message.
    #[serde(skip)]
    Malformed { message: String },
    /// Any `type` this server does not implement.
    #[serde(other)]
    Unknown,
}

impl StreamRequest {
    /// Decode one request, keeping a decode failure as [`StreamRequest::Malformed`].
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|err| StreamRequest::Malformed {
            message: err.to_string(),
        })
    }

    /// Wire name of the request kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StreamRequest::Close => "close",
            StreamRequest::Execute { .. } => "execute",
            StreamRequest::Batch { .. } => "batch",
            StreamRequest::Sequence { .. } => "sequence",
            StreamRequest::Describe { .. } => "describe",
            StreamRequest::StoreSql { .. } => "store_sql",
            StreamRequest::CloseSql { .. } => "close_sql",
            StreamRequest::GetAutocommit => "get_autocommit",
            StreamRequest::Unknown => "unknown",
            StreamRequest::Malformed { .. } => "malformed",
        }
    }
}

/// A statement, given either as SQL text or as a stored SQL id, plus its arguments.
///
/// Positional `args` and `named_args` are mutually exclusive; when a client sends both, the
/// named arguments are bound and the positional list is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_id: Option<i64>,
    #[serde(default)]
    pub args: Vec<WireValue>,
    #[serde(default)]
    pub named_args: Vec<NamedArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub want_rows: Option<bool>,
}

impl Stmt {
    #[must_use]
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stored(sql_id: i64) -> Self {
        Self {
            sql_id: Some(sql_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<WireValue>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_named_args(mut self, named_args: Vec<NamedArg>) -> Self {
        self.named_args = named_args;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub value: WireValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub steps: Vec<BatchStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<BatchCond>,
    pub stmt: Stmt,
}

/// Gate on a batch step, evaluated against the outcomes of earlier steps of the same batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchCond {
    Ok { step: usize },
    Error { step: usize },
    Not { cond: Box<BatchCond> },
    And { conds: Vec<BatchCond> },
    Or { conds: Vec<BatchCond> },
    IsAutocommit,
    #[serde(other)]
    Unknown,
}
