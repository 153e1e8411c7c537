use std::fmt;
use std::path::Path;

use crate::params::descriptor::ParamValue;
use crate::params::schema::ParameterSchema;
use crate::request::run_request::RunRequest;

/// Pipeline entry point inside the shared directory
pub static MAIN_SCRIPT: &str = "main.nf";
/// Execution profile: every process runs in a container
pub static PROFILE: &str = "docker";
/// Cluster configuration shipped with the workflow, resolved relative to the shared directory
pub static CONFIG_FILE: &str = "latch.config";

/// A complete nextflow invocation: program plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Translate a run request into a nextflow command line
    ///
    /// The structural prefix selects the runner, the pipeline script, the work directory, the
    /// profile and the config file. Parameter flags follow in schema declaration order.
    pub fn synthesize(runner: &Path, shared_dir: &Path, schema: &ParameterSchema, request: &RunRequest) -> CommandLine {
        let mut args: Vec<String> = vec![
            "run".to_string(),
            shared_dir.join(MAIN_SCRIPT).display().to_string(),
            "-work-dir".to_string(),
            shared_dir.display().to_string(),
            "-profile".to_string(),
            PROFILE.to_string(),
            "-c".to_string(),
            CONFIG_FILE.to_string(),
        ];

        for d in schema.iter() {
            args.extend(get_flag(&d.name, request.get(&d.name)));
        }

        CommandLine { program: runner.display().to_string(), args }
    }

    /// Parameter flags only, without the structural prefix
    pub fn flags(&self) -> &[String] {
        let prefix = self.args.iter().position(|a| a.starts_with("--")).unwrap_or(self.args.len());
        &self.args[prefix..]
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Zero, one or two tokens for a single parameter
///
/// Booleans are switches: `--name` when true, nothing otherwise. Anything else is `--name value`
/// when set and nothing when null.
pub fn get_flag(name: &str, value: Option<&ParamValue>) -> Vec<String> {
    let flag = format!("--{name}");
    match value {
        None | Some(ParamValue::Boolean(false)) => vec![],
        Some(ParamValue::Boolean(true)) => vec![flag],
        Some(value) => vec![flag, value.to_string()],
    }
}
