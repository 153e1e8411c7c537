use std::io;

use thiserror::Error;

use crate::storage::provision::ProvisionError;

/// Everything that ends a run
///
/// Log upload problems never end up here, they are logged as warnings and leave the outcome alone.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to get execution token from ${var}")]
    MissingToken { var: String },
    #[error("failed to provision shared storage: {0}")]
    Provisioning(#[from] ProvisionError),
    #[error("failed to copy workspace to shared storage: {0}")]
    Materialize(#[source] io::Error),
    #[error("failed to launch nextflow: {0}")]
    Launch(#[source] io::Error),
    #[error("nextflow exited with {}", .code.map(|c| format!("status {c}")).unwrap_or_else(|| "a signal".to_string()))]
    PipelineFailed { code: Option<i32> },
}
