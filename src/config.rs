use std::env;
use std::path::PathBuf;

use clap::Args;
use url::Url;

/// Where things live inside the task container and how to reach the platform
///
/// Every option has the value the platform deploys with, so a bare `nf-hicar run` works in the
/// cluster. Overrides exist for local testing.
#[derive(Args, Debug, Clone)]
pub struct RuntimeConfig {
    /// Task root copied to shared storage
    #[arg(long, env = "NF_HICAR_LOCAL_ROOT", default_value = "/root")]
    pub local_root: PathBuf,

    /// Shared directory on the provisioned volume, also nextflow's work and launch directory
    #[arg(long, env = "NF_HICAR_SHARED_DIR", default_value = "/nf-workdir")]
    pub shared_dir: PathBuf,

    /// nextflow launcher
    #[arg(long, env = "NF_HICAR_RUNNER", default_value = "/root/nextflow")]
    pub runner: PathBuf,

    #[arg(long, env = "NXF_HOME", default_value = "/root/.nextflow")]
    pub nxf_home: PathBuf,

    /// Dispatcher endpoint that provisions shared volumes
    #[arg(
        long,
        env = "NF_HICAR_DISPATCHER_URL",
        default_value = "http://nf-dispatcher-service.flyte.svc.cluster.local/provision-storage"
    )]
    pub dispatcher_url: Url,

    /// Size of the shared volume
    #[arg(long, default_value_t = 100)]
    pub storage_gib: u32,

    /// Environment variable holding the execution token
    #[arg(long, default_value = "FLYTE_INTERNAL_EXECUTION_ID")]
    pub token_var: String,

    /// Environment variable holding the execution's display name
    #[arg(long, default_value = "LATCH_EXECUTION_NAME")]
    pub execution_name_var: String,

    /// Remote directory that receives one log folder per execution
    #[arg(long, env = "NF_HICAR_LOG_PREFIX", default_value = "latch:///your_log_dir/nf_nf_core_hicar")]
    pub log_prefix: String,

    #[arg(long, env = "NF_HICAR_LOG_BUCKET", default_value = "latch-workflow-logs")]
    pub log_bucket: String,

    #[arg(long, env = "AWS_REGION", default_value = "us-west-2")]
    pub log_region: String,

    /// Custom object storage endpoint (S3 compatible)
    #[arg(long, env = "NF_HICAR_LOG_ENDPOINT")]
    pub log_endpoint: Option<String>,
}

/// Identity of the current execution, as handed over by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    pub token: Option<String>,
    pub name: Option<String>,
}

impl ExecutionContext {
    pub fn from_env(config: &RuntimeConfig) -> ExecutionContext {
        ExecutionContext {
            token: non_empty_var(&config.token_var),
            name: non_empty_var(&config.execution_name_var),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
