// Protocol module - JSON shapes of the pipeline protocol
//
// - value: wire values and the codec to and from native values
// - request: pipeline requests, statements, batch steps and conditions
// - response: pipeline results, statement and batch results

pub mod request;
pub mod response;
pub mod value;

pub use request::{
    Batch, BatchCond, BatchStep, NamedArg, PipelineRequestBody, Stmt, StreamRequest,
};
pub use response::{
    BatchResult, Col, DescribeResult, PipelineResponseBody, ProtocolError, StmtResult,
    StreamResponse, StreamResult,
};
pub use value::{WireValue, decode, encode};
