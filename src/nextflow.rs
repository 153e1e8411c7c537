//! Everything that talks to the nextflow runner
//!
//! Building the command line is pure and lives in [`command`]. Starting the process, with the
//! environment nextflow needs inside the cluster, lives in [`runner`].

pub mod command;
pub mod runner;
