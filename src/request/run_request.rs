use serde_json::{Map, Value};

use crate::params::descriptor::ParamValue;
use crate::params::schema::ParameterSchema;

/// The value of every declared parameter for one run, in declaration order
///
/// A parameter missing from the request takes its declared default. An explicit `null` is kept
/// as "no value" so the pipeline falls back to its own default.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    values: Vec<(String, Option<ParamValue>)>,
}

impl RunRequest {
    /// A request where every parameter holds its declared default
    pub fn defaults(schema: &ParameterSchema) -> RunRequest {
        let values = schema
            .iter()
            .map(|d| (d.name.clone(), d.default.clone()))
            .collect();
        RunRequest { values }
    }

    /// Build a typed request from a JSON object that already passed schema validation
    pub fn from_json(schema: &ParameterSchema, object: &Map<String, Value>) -> Result<RunRequest, (String, String)> {
        let mut request = RunRequest::defaults(schema);
        for d in schema.iter() {
            if let Some(json) = object.get(&d.name) {
                let value = ParamValue::from_json(d.param_type, json).map_err(|reason| (d.name.clone(), reason))?;
                request.set(&d.name, value);
            }
        }
        Ok(request)
    }

    /// Replace the value of a declared parameter. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: Option<ParamValue>) -> &mut RunRequest {
        if let Some(slot) = self.values.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }
}
