use std::io;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::config::{ExecutionContext, RuntimeConfig};
use crate::nextflow::command::CommandLine;
use crate::nextflow::runner::{EnvOverlay, PipelineRunner};
use crate::params::schema::ParameterSchema;
use crate::request::run_request::RunRequest;
use crate::run::error::RunError;
use crate::run::state::RunState;
use crate::storage::provision::StorageProvisioner;
use crate::storage::upload::{remote_log_url, LogStore, NEXTFLOW_LOG};
use crate::storage::workspace::materialize;

/// Drives one run of the pipeline
///
/// The orchestrator owns nothing: schema, configuration and the three external collaborators are
/// borrowed, so each run is built from explicit values.
pub struct Orchestrator<'a, P, R, L> {
    schema: &'a ParameterSchema,
    config: &'a RuntimeConfig,
    provisioner: &'a P,
    runner: &'a R,
    log_store: &'a L,
}

impl<'a, P, R, L> Orchestrator<'a, P, R, L>
where
    P: StorageProvisioner,
    R: PipelineRunner,
    L: LogStore,
{
    pub fn new(
        schema: &'a ParameterSchema,
        config: &'a RuntimeConfig,
        provisioner: &'a P,
        runner: &'a R,
        log_store: &'a L,
    ) -> Orchestrator<'a, P, R, L> {
        Orchestrator { schema, config, provisioner, runner, log_store }
    }

    pub async fn run(&self, request: &RunRequest, context: &ExecutionContext) -> Result<(), RunError> {
        let outcome = self.execute(request, context).await;
        match &outcome {
            Ok(()) => enter(RunState::Done),
            Err(err) => {
                error!("{err}");
                enter(RunState::Failed);
            }
        }
        outcome
    }

    async fn execute(&self, request: &RunRequest, context: &ExecutionContext) -> Result<(), RunError> {
        enter(RunState::Provisioning);
        let token = context
            .token
            .as_deref()
            .ok_or_else(|| RunError::MissingToken { var: self.config.token_var.clone() })?;
        let claim_name = self.provisioner.provision(token, self.config.storage_gib).await?;

        enter(RunState::Materializing);
        let local_root = self.config.local_root.clone();
        let shared_dir = self.config.shared_dir.clone();
        tokio::task::spawn_blocking(move || materialize(&local_root, &shared_dir))
            .await
            .map_err(|err| RunError::Materialize(io::Error::new(io::ErrorKind::Other, err)))?
            .map_err(RunError::Materialize)?;

        // from here on the log upload runs exactly once, whatever launch returns
        let outcome = self.launch(request, &claim_name).await;
        self.upload_log(context).await;
        outcome
    }

    async fn launch(&self, request: &RunRequest, claim_name: &str) -> Result<(), RunError> {
        enter(RunState::Launching);
        let command = CommandLine::synthesize(&self.config.runner, &self.config.shared_dir, self.schema, request);
        let env = EnvOverlay::nextflow(&self.config.nxf_home, claim_name);
        info!("Launching Nextflow Runtime");
        info!("{command}");
        debug!("{} parameter tokens after the structural prefix", command.flags().len());

        enter(RunState::Running);
        let started = Utc::now();
        let exit = self
            .runner
            .run(&command, &env, &self.config.shared_dir)
            .await
            .map_err(RunError::Launch)?;
        let finished = Utc::now();
        info!(
            "nextflow exited with {:?} at {finished} after {}s",
            exit.code,
            (finished - started).num_seconds()
        );

        match exit.success() {
            true => Ok(()),
            false => Err(RunError::PipelineFailed { code: exit.code }),
        }
    }

    /// Best effort: nothing in here can fail the run
    async fn upload_log(&self, context: &ExecutionContext) {
        enter(RunState::UploadingLog);
        let log_path = self.config.shared_dir.join(NEXTFLOW_LOG);
        if !log_path.exists() {
            info!("No {NEXTFLOW_LOG} in {}, nothing to upload", self.config.shared_dir.display());
            return;
        }

        let Some(name) = context.name.as_deref() else {
            warn!("Skipping logs upload, failed to get execution name");
            return;
        };

        let remote = match remote_log_url(&self.config.log_prefix, name) {
            Ok(remote) => remote,
            Err(err) => {
                warn!("Skipping logs upload: {err:#}");
                return;
            }
        };

        info!("Uploading {NEXTFLOW_LOG} to {remote}");
        if let Err(err) = self.log_store.upload(&log_path, &remote).await {
            warn!("Failed to upload {NEXTFLOW_LOG}: {err:#}");
        }
    }
}

fn enter(state: RunState) {
    info!("Run state: {state}");
}
