//! Run requests: the realised parameter values for one execution

/// Read a run request from disk and validate it against the parameter schema
pub mod message;

/// Typed, schema-ordered parameter values
pub mod run_request;
