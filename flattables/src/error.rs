//! Error types for schema and code generation
//!
//! Every failure the pipeline can report is a [`CodegenError`] variant.
//! Validation and mapping errors are deterministic for a given input: they
//! are returned to the caller, never retried, and never logged here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::tables::TablesError;

/// Result type for generation operations
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Which kind of identifier is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    /// Table names: UpperCamelCase.
    Table,
    /// Column names: lowerCamelCase.
    Column,
}

impl std::fmt::Display for NameRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameRole::Table => f.write_str("table"),
            NameRole::Column => f.write_str("column"),
        }
    }
}

/// Errors raised while validating tables, building the template context,
/// rendering artefacts or invoking the schema compiler.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// A table declares no columns, so it has no schema.
    #[error("table [{table}] has no columns (remove it or declare its columns)")]
    EmptyTable { table: String },

    /// Identifier does not follow the FlatBuffers casing convention.
    #[error("{role} name '{name}' must start with {expected} case letter: rename '{name}' to '{suggestion}'{}", in_table(.table))]
    NamingConvention {
        role: NameRole,
        name: String,
        expected: &'static str,
        suggestion: String,
        table: Option<String>,
    },

    /// Identifier collides with a Rust keyword or a schema word.
    #[error("cannot use reserved word '{name}' as a {role} name, even with different case: rename '{name}'{}", in_table(.table))]
    ReservedWord {
        role: NameRole,
        name: String,
        table: Option<String>,
    },

    /// Identifier contains a character the generated code cannot carry.
    #[error("cannot use '{ch}' in {role} name '{name}'{}", in_table(.table))]
    IllegalCharacter {
        role: NameRole,
        name: String,
        ch: char,
        table: Option<String>,
    },

    /// Two columns of one table map to the same field.
    #[error("table [{table}] declares column '{column}' more than once (deprecated columns count by their name without the marker)")]
    DuplicateColumn { table: String, column: String },

    /// The set has no tables, so there is no root type.
    #[error("table set '{namespace}' has no tables")]
    NoTables { namespace: String },

    /// The namespace cannot be used in the schema or as a Rust module.
    #[error("invalid namespace '{name}': {reason}")]
    InvalidNamespace { name: String, reason: String },

    /// Column type has no equivalent in the requested target schema.
    #[error("no {target} type for column type '{type_name}' ({advice})")]
    UnsupportedType {
        type_name: String,
        target: &'static str,
        advice: String,
    },

    /// A cell value does not fit its column's type.
    #[error("table [{table}] row {row} column '{column}': value {value} is not a valid {expected}")]
    CellTypeMismatch {
        table: String,
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// Neither the FlatBuffers nor the GraphQL target was requested.
    #[error("no generation target requested: enable FlatBuffers, GraphQL, or both")]
    NoTargets,

    /// A template failed to render.
    #[error("rendering '{task}' failed: {source}")]
    TemplateRender {
        task: String,
        #[source]
        source: askama::Error,
    },

    /// The schema compiler could not be started.
    #[error("cannot run schema compiler '{program}': {source}")]
    CompilerUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The schema compiler rejected the generated schema.
    #[error("schema compiler failed on {} ({status})\n{output}", shown(.schema))]
    CompilerFailed {
        schema: PathBuf,
        status: String,
        output: String,
    },

    /// The schema compiler did not finish within the configured limit.
    #[error("schema compiler timed out after {}s on {}", secs(.after), shown(.schema))]
    CompilerTimeout { schema: PathBuf, after: Duration },

    /// An artefact could not be written.
    #[error("writing {}: {source}", shown(.path))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before the named task was written.
    #[error("generation aborted before writing '{task}'")]
    Aborted { task: String },

    /// Tables input violated a model invariant.
    #[error(transparent)]
    Tables(#[from] TablesError),
}

fn in_table(table: &Option<String>) -> String {
    match table {
        Some(t) => format!(" (in table [{t}])"),
        None => String::new(),
    }
}

fn shown(path: &Path) -> String {
    path.display().to_string()
}

fn secs(d: &Duration) -> f64 {
    d.as_secs_f64()
}

impl CodegenError {
    /// Attach the enclosing table to a column naming error.
    pub fn with_table(mut self, name: &str) -> Self {
        if let CodegenError::NamingConvention { table, .. }
        | CodegenError::ReservedWord { table, .. }
        | CodegenError::IllegalCharacter { table, .. } = &mut self
        {
            *table = Some(name.to_string());
        }
        self
    }

    /// Process exit code for this failure category.
    ///
    /// Distinct per category so scripted callers can branch on it.
    pub fn exit_code(&self) -> i32 {
        match self {
            CodegenError::Tables(_) => 10,
            CodegenError::EmptyTable { .. } => 11,
            CodegenError::NamingConvention { .. } => 12,
            CodegenError::ReservedWord { .. } => 13,
            CodegenError::IllegalCharacter { .. } => 14,
            CodegenError::UnsupportedType { .. } => 15,
            CodegenError::CellTypeMismatch { .. } => 16,
            CodegenError::DuplicateColumn { .. } => 17,
            CodegenError::NoTables { .. } => 18,
            CodegenError::InvalidNamespace { .. } => 19,
            CodegenError::NoTargets => 2,
            CodegenError::TemplateRender { .. } => 20,
            CodegenError::CompilerUnavailable { .. } => 21,
            CodegenError::CompilerFailed { .. } => 22,
            CodegenError::CompilerTimeout { .. } => 23,
            CodegenError::Write { .. } => 30,
            CodegenError::Aborted { .. } => 130,
        }
    }

    /// A short, actionable suggestion to print under the diagnostic.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CodegenError::EmptyTable { .. } => Some("every table needs at least one column"),
            CodegenError::NamingConvention { .. } => Some(
                "FlatBuffers style: table names are UpperCamelCase, column names are lowerCamelCase",
            ),
            CodegenError::ReservedWord { .. } => {
                Some("names must not match Rust keywords or FlatBuffers schema words")
            }
            CodegenError::IllegalCharacter { .. } => Some(
                "names may only use ASCII letters and digits; '_' is only allowed in the _deprecated_ marker of column names",
            ),
            CodegenError::DuplicateColumn { .. } => Some("rename or remove one of the columns"),
            CodegenError::NoTables { .. } => Some("declare at least one [[tables]] entry"),
            CodegenError::InvalidNamespace { .. } => {
                Some("a namespace is an ASCII letter followed by ASCII letters, digits or '_'")
            }
            CodegenError::UnsupportedType { .. } => Some(
                "supported types: bool, int8, int16, int32, int64, uint8, uint16, uint32, uint64, float32, float64, string",
            ),
            CodegenError::NoTargets => Some("pass --graphql or leave FlatBuffers generation enabled"),
            CodegenError::TemplateRender { .. } => Some("this is a bug in the generator templates"),
            CodegenError::CompilerUnavailable { .. } => {
                Some("have you installed flatc? See https://flatbuffers.dev")
            }
            CodegenError::CompilerFailed { .. } => Some(
                "flatc rejected the generated schema; the schema file was left in place for inspection",
            ),
            CodegenError::CompilerTimeout { .. } => Some("raise --compiler-timeout or check flatc"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_category() {
        let errors = [
            CodegenError::EmptyTable { table: "T".into() },
            CodegenError::NamingConvention {
                role: NameRole::Column,
                name: "Name".into(),
                expected: "a lower",
                suggestion: "name".into(),
                table: None,
            },
            CodegenError::ReservedWord {
                role: NameRole::Table,
                name: "Table".into(),
                table: None,
            },
            CodegenError::IllegalCharacter {
                role: NameRole::Column,
                name: "a_b".into(),
                ch: '_',
                table: None,
            },
            CodegenError::UnsupportedType {
                type_name: "int".into(),
                target: "FlatBuffers",
                advice: "use int32 or int64".into(),
            },
            CodegenError::DuplicateColumn {
                table: "T".into(),
                column: "age".into(),
            },
            CodegenError::NoTables {
                namespace: "Demo".into(),
            },
            CodegenError::InvalidNamespace {
                name: "".into(),
                reason: "it is empty".into(),
            },
            CodegenError::NoTargets,
            CodegenError::CompilerTimeout {
                schema: PathBuf::from("a.fbs"),
                after: Duration::from_secs(1),
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len(), "exit codes collide: {codes:?}");
    }

    #[test]
    fn naming_message_names_the_table() {
        let e = CodegenError::NamingConvention {
            role: NameRole::Column,
            name: "Name".into(),
            expected: "a lower",
            suggestion: "name".into(),
            table: Some("User".into()),
        };
        let s = e.to_string();
        assert!(s.contains("rename 'Name' to 'name'"), "{s}");
        assert!(s.contains("(in table [User])"), "{s}");
    }

    #[test]
    fn unavailable_compiler_hint_mentions_install() {
        let e = CodegenError::CompilerUnavailable {
            program: "flatc".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(e.hint().unwrap().contains("installed flatc"));
    }
}
