use std::io;
use std::path::Path;

use log::info;
use tokio::process::Command;

use crate::nextflow::command::CommandLine;

/// JVM tuning for the nextflow head process
pub static NXF_OPTS: &str = "-Xms2048M -Xmx8G -XX:ActiveProcessorCount=4";

/// How the runner process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerExit {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl RunnerExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Environment variables layered over the inherited process environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverlay {
    pub vars: Vec<(String, String)>,
}

impl EnvOverlay {
    /// Fixed nextflow settings plus the storage claim the run should mount
    pub fn nextflow(nxf_home: &Path, claim_name: &str) -> EnvOverlay {
        let vars = vec![
            ("NXF_HOME".to_string(), nxf_home.display().to_string()),
            ("NXF_OPTS".to_string(), NXF_OPTS.to_string()),
            ("K8S_STORAGE_CLAIM_NAME".to_string(), claim_name.to_string()),
            ("NXF_DISABLE_CHECK_LATEST".to_string(), "true".to_string()),
        ];
        EnvOverlay { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Starts the pipeline and waits for it to finish
///
/// An `Err` means the process never started. A process that ran and failed is an `Ok` with a
/// non-zero [`RunnerExit`].
pub trait PipelineRunner {
    async fn run(&self, command: &CommandLine, env: &EnvOverlay, cwd: &Path) -> io::Result<RunnerExit>;
}

/// Runs nextflow as a child process that inherits stdout and stderr
pub struct NextflowProcess;

impl PipelineRunner for NextflowProcess {
    async fn run(&self, command: &CommandLine, env: &EnvOverlay, cwd: &Path) -> io::Result<RunnerExit> {
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(cwd);

        info!(
            "Running nextflow process in {} on claim {}",
            cwd.display(),
            env.get("K8S_STORAGE_CLAIM_NAME").unwrap_or("<none>")
        );
        let status = process.status().await?;
        Ok(RunnerExit { code: status.code() })
    }
}
