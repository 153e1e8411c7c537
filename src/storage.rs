//! Shared storage for a run
//!
//! A volume is provisioned by the platform's dispatcher, the task's working tree is copied onto
//! it, and nextflow's log is shipped to object storage once the run is over.

/// Ask the dispatcher for a shared volume
pub mod provision;

/// Copy the local working tree into the shared directory
pub mod workspace;

/// Upload the nextflow log to remote storage
pub mod upload;
