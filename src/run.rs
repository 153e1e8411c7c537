//! Run orchestration: provision, materialize, launch, upload the log
//!
//! A run moves through [`state::RunState`] in a fixed order. Any error is terminal, there are no
//! retries. Once nextflow has been launched the log upload always happens, whatever the outcome.

/// Run states, used for operator-facing logging
pub mod state;

/// Fatal run errors
pub mod error;

/// The orchestrator itself
pub mod orchestrator;
