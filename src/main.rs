use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::config::{ExecutionContext, RuntimeConfig};
use crate::nextflow::command::CommandLine;
use crate::nextflow::runner::NextflowProcess;
use crate::params::schema::ParameterSchema;
use crate::request::message::Message;
use crate::run::orchestrator::Orchestrator;
use crate::storage::provision::Dispatcher;
use crate::storage::upload::S3LogStore;

mod config;
mod nextflow;
mod params;
mod request;
mod run;
mod storage;

/// Run nf-core/hicar on shared cluster storage
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the parameter surface as a JSON schema
    Schema,
    /// Validate a run request and print the nextflow command line without running anything
    Command {
        /// JSON object of parameter values
        #[arg(long)]
        request: PathBuf,
        #[command(flatten)]
        config: RuntimeConfig,
    },
    /// Provision storage, run the pipeline and upload its log
    Run {
        /// JSON object of parameter values
        #[arg(long)]
        request: PathBuf,
        #[command(flatten)]
        config: RuntimeConfig,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("terve! nf-hicar starting up :)");

    let args = Cli::parse();
    let schema = ParameterSchema::load()?;

    match args.command {
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema.to_json_schema())?);
        }
        Commands::Command { request, config } => {
            let request = Message::new(&request, &schema)?.read()?;
            let command = CommandLine::synthesize(&config.runner, &config.shared_dir, &schema, &request);
            println!("{command}");
        }
        Commands::Run { request, config } => {
            let request = Message::new(&request, &schema)?.read()?;
            let context = ExecutionContext::from_env(&config);

            let dispatcher = Dispatcher::new(config.dispatcher_url.clone());
            // log shipping problems never stop the pipeline from running
            let log_store = match S3LogStore::new(&config.log_bucket, &config.log_region, config.log_endpoint.as_deref()) {
                Ok(store) => Some(store),
                Err(err) => {
                    warn!("Logs will not be uploaded: {err:#}");
                    None
                }
            };
            let orchestrator = Orchestrator::new(&schema, &config, &dispatcher, &NextflowProcess, &log_store);
            orchestrator.run(&request, &context).await?;
            info!("nf-core/hicar finished");
        }
    }

    Ok(())
}
