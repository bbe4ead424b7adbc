//! FlatTables: tables to FlatBuffers schema and Rust glue code
//!
//! This library reads a tables file (named, column-typed relations with
//! optional rows) and emits:
//!
//! - **FlatBuffers schema**: `<ns>/<ns>.fbs`, one table per input table,
//!   one vector field per column (see [`registry::GENERATIONS`])
//! - **Rust glue**: conversions between [`Table`] and FlatBuffers bytes,
//!   typed row structs, round-trip tests and an example program
//! - **GraphQL schema**: `<ns>/<ns>.graphql`, when requested
//!
//! The schema is then compiled with `flatc --rust` (see [`compile_schema`]).
//!
//! # Usage
//!
//! ```rust
//! use flattables::{build_context, render_all, BuildOptions, OutputLayout, RenderOptions};
//! use flattables::{TableSet, GENERATIONS};
//!
//! let toml = r#"
//! name = "Demo"
//!
//! [[tables]]
//! name = "User"
//! columns = [
//!     { name = "name", type = "string" },
//!     { name = "id", type = "uint64" },
//! ]
//! "#;
//!
//! let set = TableSet::from_toml(toml).unwrap();
//! let mut ctx = build_context(&set, &BuildOptions::new("demo_tables::Demo")).unwrap();
//!
//! let mut options = RenderOptions::new(OutputLayout::for_namespace("gen".as_ref(), "Demo"));
//! options.dry_run = true;
//!
//! let report = render_all(&mut ctx, GENERATIONS, &options).unwrap();
//! let schema = &report.artifacts[0].contents;
//! assert!(schema.contains("namespace Demo;"));
//! assert!(schema.contains("root_type User;"));
//! ```

pub mod context;
pub mod error;
pub mod flatc;
pub mod registry;
pub mod render;
pub mod tables;
pub mod tidy;
pub mod types;
pub mod validate;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use context::{build_context, BuildOptions, ColInfo, GenerationContext, TableInfo, Targets};
pub use error::{CodegenError, CodegenResult, NameRole};
pub use flatc::{compile_schema, compiler_args, CompileOutput, CompilerOptions};
pub use registry::{ArtifactCategory, ArtifactKind, GenerationTask, GENERATIONS};
pub use render::{
    generate, render_all, write_if_changed, ArtifactReport, GenerationReport, OutputLayout,
    RenderOptions, WriteOutcome,
};
pub use tables::{Cell, Column, FromCell, Table, TableSet, TablesError};
pub use tidy::{format_source, tidy, SourceFormatter};
pub use types::{is_scalar, map_graphql_type, map_type, SemanticType};
pub use validate::{
    is_reserved_word, starts_with_lower, starts_with_upper, validate_name, validate_namespace,
};
