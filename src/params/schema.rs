use std::collections::HashSet;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::params::descriptor::{ParamType, ParamValue, ParameterDescriptor};

/// included nf-core/hicar parameter table, in UI and command line order
static PARAMETERS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/parameters.json"));

/// A parameter table entry as authored in `data/parameters.json`
#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    param_type: ParamType,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    default: Value,
    #[serde(default)]
    section: Option<String>,
    description: String,
}

/// Ordered, immutable mapping from parameter name to descriptor
///
/// Declaration order is significant: the UI renders parameters in this order and command line
/// flags are emitted in this order.
#[derive(Debug)]
pub struct ParameterSchema {
    descriptors: Vec<ParameterDescriptor>,
}

impl ParameterSchema {
    /// Load the parameter table compiled into the binary
    pub fn load() -> Result<ParameterSchema> {
        let schema = ParameterSchema::from_json_str(PARAMETERS).context("Embedded parameter table is malformed")?;
        info!("Loaded {} pipeline parameters", schema.len());
        Ok(schema)
    }

    /// Parse and check a parameter table
    ///
    /// Authoring mistakes (duplicate names, defaults that don't match the declared type, a
    /// missing or repeated output directory) are reported here rather than at run time.
    pub fn from_json_str(json: &str) -> Result<ParameterSchema> {
        let raw: Vec<RawParameter> = serde_json::from_str(json)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut section: Option<String> = None;
        let mut descriptors: Vec<ParameterDescriptor> = Vec::with_capacity(raw.len());

        for param in raw {
            if !seen.insert(param.name.clone()) {
                bail!("Duplicate parameter {}", param.name);
            }

            // an unset section continues the previous one
            if param.section.is_some() {
                section = param.section.clone();
            }

            let default = ParamValue::from_json(param.param_type, &param.default)
                .map_err(|err| anyhow!("Invalid default for {}: {err}", param.name))?;

            debug!("Declared {} ({}, optional: {})", param.name, param.param_type, param.optional);
            descriptors.push(ParameterDescriptor {
                name: param.name,
                param_type: param.param_type,
                optional: param.optional,
                default,
                section: section.clone(),
                description: param.description,
            });
        }

        let outputs = descriptors
            .iter()
            .filter(|d| d.param_type == ParamType::OutputDirectory)
            .count();
        if outputs != 1 {
            bail!("Expected exactly one output directory parameter, found {outputs}");
        }

        Ok(ParameterSchema { descriptors })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.descriptors.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// JSON schema describing a valid run request
    ///
    /// Properties keep declaration order. Sections and the output marker are carried as `x-`
    /// annotations for the UI, validators ignore them.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required: Vec<&str> = Vec::new();

        for d in &self.descriptors {
            let json_type = match d.optional {
                true => json!([d.param_type.json_type(), "null"]),
                false => json!(d.param_type.json_type()),
            };
            let mut property = json!({
                "type": json_type,
                "description": d.description,
                "x-param-type": d.param_type,
            });
            if let Some(default) = &d.default {
                property["default"] = default.to_json();
            }
            if let Some(section) = &d.section {
                property["x-section"] = json!(section);
            }
            if d.param_type == ParamType::OutputDirectory {
                property["x-output"] = json!(true);
            }
            if d.is_required() {
                required.push(&d.name);
            }
            properties.insert(d.name.clone(), property);
        }

        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "nf-core/hicar",
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_loads_in_declaration_order() {
        let schema = ParameterSchema::load().unwrap();
        let names: Vec<&str> = schema.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(schema.len(), 66);
        assert_eq!(&names[..4], &["input", "method", "anchor_peaks", "outdir"]);
        assert_eq!(names.last(), Some(&"skip_circos"));
    }

    #[test]
    fn sections_carry_forward() {
        let schema = ParameterSchema::load().unwrap();
        let section = |name: &str| schema.get(name).unwrap().section.clone();
        assert_eq!(section("input").as_deref(), Some("Input/output options"));
        assert_eq!(section("outdir").as_deref(), Some("Input/output options"));
        assert_eq!(section("bwa_index").as_deref(), Some("Reference genome options"));
        assert_eq!(section("skip_circos").as_deref(), Some("Pipeline controler"));
    }

    #[test]
    fn embedded_defaults() {
        let schema = ParameterSchema::load().unwrap();
        let default = |name: &str| schema.get(name).unwrap().default.clone();
        assert_eq!(default("method"), Some(ParamValue::Text("HiCAR".into())));
        assert_eq!(default("shiftsize"), Some(ParamValue::Integer(-75)));
        assert_eq!(default("maps_cutoff_fdr"), Some(ParamValue::Float(2.0)));
        // the pipeline parses the literal string, it is not a missing value
        assert_eq!(default("maps_filter"), Some(ParamValue::Text("None".into())));
        assert_eq!(default("maps_digest_file"), Some(ParamValue::Text("None".into())));
        assert_eq!(default("skip_fastqc"), None);
    }

    #[test]
    fn only_input_and_outdir_are_required() {
        let schema = ParameterSchema::load().unwrap();
        let required: Vec<&str> = schema.iter().filter(|d| d.is_required()).map(|d| d.name.as_str()).collect();
        assert_eq!(required, vec!["input", "outdir"]);
        assert_eq!(schema.get("outdir").unwrap().param_type, ParamType::OutputDirectory);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let table = r#"[
            {"name": "outdir", "type": "output_directory", "description": "out"},
            {"name": "outdir", "type": "text", "optional": true, "description": "again"}
        ]"#;
        let err = ParameterSchema::from_json_str(table).unwrap_err();
        assert!(err.to_string().contains("Duplicate parameter outdir"));
    }

    #[test]
    fn default_must_match_type() {
        let table = r#"[
            {"name": "outdir", "type": "output_directory", "description": "out"},
            {"name": "res_tads", "type": "integer", "optional": true, "default": "10kb", "description": "bad"}
        ]"#;
        assert!(ParameterSchema::from_json_str(table).is_err());
    }

    #[test]
    fn exactly_one_output_directory() {
        let table = r#"[{"name": "genome", "type": "text", "optional": true, "description": "g"}]"#;
        assert!(ParameterSchema::from_json_str(table).is_err());
    }

    #[test]
    fn json_schema_keeps_order_and_nullability() {
        let schema = ParameterSchema::load().unwrap();
        let json = schema.to_json_schema();
        let properties = json["properties"].as_object().unwrap();
        let keys: Vec<&String> = properties.keys().take(2).collect();
        assert_eq!(keys, vec!["input", "method"]);
        assert_eq!(properties["input"]["type"], json!("string"));
        assert_eq!(properties["skip_fastqc"]["type"], json!(["boolean", "null"]));
        assert_eq!(properties["outdir"]["x-output"], json!(true));
        assert_eq!(json["required"], json!(["input", "outdir"]));
    }
}
