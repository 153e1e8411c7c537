use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Semantic type of a pipeline parameter
///
/// Nullability is tracked separately on the descriptor, so "optional text" is `Text` with
/// `optional: true`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Text,
    Integer,
    Float,
    Boolean,
    File,
    Directory,
    OutputDirectory,
}

impl ParamType {
    /// JSON schema `type` keyword used to validate incoming values
    pub fn json_type(&self) -> &str {
        match self {
            ParamType::Text | ParamType::File | ParamType::Directory | ParamType::OutputDirectory => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamType::Text => write!(f, "text"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Float => write!(f, "float"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::File => write!(f, "file"),
            ParamType::Directory => write!(f, "directory"),
            ParamType::OutputDirectory => write!(f, "output directory"),
        }
    }
}

/// A realised parameter value
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Remote URI (`latch:///...`, `s3://...`) or absolute path of a file or directory
    Location(String),
}

impl ParamValue {
    /// Convert a JSON value into a typed value. `null` means "no value".
    pub fn from_json(param_type: ParamType, value: &Value) -> Result<Option<ParamValue>, String> {
        if value.is_null() {
            return Ok(None);
        }

        let parsed = match param_type {
            ParamType::Text => value.as_str().map(|s| ParamValue::Text(s.to_string())),
            // JSON schema counts 20000.0 as an integer, so do we
            ParamType::Integer => value.as_i64().or_else(|| whole_number(value)).map(ParamValue::Integer),
            ParamType::Float => value.as_f64().map(ParamValue::Float),
            ParamType::Boolean => value.as_bool().map(ParamValue::Boolean),
            ParamType::File | ParamType::Directory | ParamType::OutputDirectory => {
                match value.as_str() {
                    Some(location) if is_resolvable(location) => Some(ParamValue::Location(location.to_string())),
                    Some(location) => return Err(format!("{location} is not a URI or an absolute path")),
                    None => None,
                }
            }
        };

        parsed
            .map(Some)
            .ok_or_else(|| format!("expected {param_type}, got {value}"))
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(s) | ParamValue::Location(s) => Value::from(s.as_str()),
            ParamValue::Integer(i) => Value::from(*i),
            ParamValue::Float(x) => Value::from(*x),
            ParamValue::Boolean(b) => Value::from(*b),
        }
    }
}

/// Stringified the way nextflow expects to read it back: floats always carry a decimal point
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Text(s) | ParamValue::Location(s) => write!(f, "{s}"),
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => write!(f, "{x:.1}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

fn whole_number(value: &Value) -> Option<i64> {
    let x = value.as_f64()?;
    // 2^63 itself does not fit
    (x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64).then_some(x as i64)
}

fn is_resolvable(location: &str) -> bool {
    Url::parse(location).is_ok() || Path::new(location).is_absolute()
}

/// One declared pipeline input
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    pub name: String,
    pub param_type: ParamType,
    pub optional: bool,
    pub default: Option<ParamValue>,
    /// UI grouping, already carried forward from earlier descriptors
    pub section: Option<String>,
    pub description: String,
}

impl ParameterDescriptor {
    /// A parameter the caller must supply: not nullable and nothing to fall back on
    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(ParamValue::Float(2.0).to_string(), "2.0");
        assert_eq!(ParamValue::Float(0.5).to_string(), "0.5");
        assert_eq!(ParamValue::Float(0.01).to_string(), "0.01");
        assert_eq!(ParamValue::Integer(-75).to_string(), "-75");
    }

    #[test]
    fn null_is_no_value() {
        for ty in [ParamType::Text, ParamType::Boolean, ParamType::File, ParamType::Float] {
            assert_eq!(ParamValue::from_json(ty, &Value::Null), Ok(None));
        }
    }

    #[test]
    fn integer_is_accepted_as_float() {
        let value = ParamValue::from_json(ParamType::Float, &json!(2)).unwrap();
        assert_eq!(value, Some(ParamValue::Float(2.0)));
    }

    #[test]
    fn whole_float_is_accepted_as_integer() {
        let value = ParamValue::from_json(ParamType::Integer, &json!(20000.0)).unwrap();
        assert_eq!(value, Some(ParamValue::Integer(20000)));
        assert_eq!(value.unwrap().to_string(), "20000");
        assert!(ParamValue::from_json(ParamType::Integer, &json!(1e300)).is_err());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        assert!(ParamValue::from_json(ParamType::Integer, &json!("12")).is_err());
        assert!(ParamValue::from_json(ParamType::Boolean, &json!(1)).is_err());
        assert!(ParamValue::from_json(ParamType::Integer, &json!(1.5)).is_err());
    }

    #[test]
    fn locations_must_resolve() {
        let remote = ParamValue::from_json(ParamType::File, &json!("latch:///hicar/samplesheet.csv")).unwrap();
        assert_eq!(remote, Some(ParamValue::Location("latch:///hicar/samplesheet.csv".into())));
        assert!(ParamValue::from_json(ParamType::Directory, &json!("/data/results")).is_ok());
        assert!(ParamValue::from_json(ParamType::File, &json!("relative/samples.csv")).is_err());
    }
}
