//! Declared nf-core/hicar parameter surface
//!
//! The parameter table is embedded in the binary and loaded once into an immutable
//! [`schema::ParameterSchema`] that is handed to whoever needs it (request validation, command
//! synthesis, the `schema` subcommand).

/// Semantic types, descriptors and typed values
pub mod descriptor;

/// Load the ordered parameter table and derive a JSON schema from it
pub mod schema;
