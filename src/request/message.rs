use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::params::schema::ParameterSchema;
use crate::request::run_request::RunRequest;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("can't read run request at {path}: {source}")]
    MessageReadError { path: PathBuf, source: io::Error },
    #[error("run request is not valid JSON: {0}")]
    JSONDecodeError(#[from] serde_json::Error),
    #[error("run request fails validation: {}", .0.join("; "))]
    JSONValidationError(Vec<String>),
    #[error("invalid value for {name}: {reason}")]
    DeserialisationError { name: String, reason: String },
}

/// A run request file on disk, checked against the JSON schema generated from the parameter table
pub struct Message<'a> {
    pub path: PathBuf,
    schema: &'a ParameterSchema,
    compiled_schema: JSONSchema,
}

impl<'a> Message<'a> {
    pub fn new(path: &Path, schema: &'a ParameterSchema) -> anyhow::Result<Message<'a>> {
        let json_schema = schema.to_json_schema();
        let compiled_schema = JSONSchema::compile(&json_schema)
            .map_err(|err| anyhow!("Generated request schema doesn't compile: {err}"))?;
        Ok(Message { path: path.to_path_buf(), schema, compiled_schema })
    }

    pub fn read(&self) -> Result<RunRequest, MessageError> {
        let json: Value = self.parse_untyped_json()?;

        match self.validate(&json) {
            Ok(_) => {
                info!("Run request is valid");
                self.parse_request(&json)
            }
            Err(err) => {
                warn!("Run request fails validation");
                Err(err)
            }
        }
    }

    fn validate(&self, json: &Value) -> Result<(), MessageError> {
        info!("Validating run request against parameter schema");
        self.compiled_schema.validate(json).map_err(|errors| {
            let reasons: Vec<String> = errors
                .map(|err| format!("{}: {}", err.instance_path, err))
                .collect();
            for reason in &reasons {
                warn!("{reason}");
            }
            MessageError::JSONValidationError(reasons)
        })
    }

    fn read_file(&self) -> Result<String, MessageError> {
        let path: &Path = self.path.as_path();
        info!("Reading run request at {}", path.display());
        fs::read_to_string(path).map_err(|source| MessageError::MessageReadError {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse_request(&self, json: &Value) -> Result<RunRequest, MessageError> {
        info!("Deserialising valid JSON into a typed run request");
        let object = json
            .as_object()
            .ok_or_else(|| MessageError::JSONValidationError(vec!["request must be a JSON object".to_string()]))?;
        RunRequest::from_json(self.schema, object)
            .map_err(|(name, reason)| MessageError::DeserialisationError { name, reason })
    }

    fn parse_untyped_json(&self) -> Result<Value, MessageError> {
        let json_string = self.read_file()?;
        Ok(serde_json::from_str::<Value>(&json_string)?)
    }
}
