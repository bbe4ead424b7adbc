//! Template context builder
//!
//! Turns a validated [`TableSet`] into the data model every template renders
//! against. The context is built fresh per run. After construction only the
//! task fields (`task_name`, `generated_file`, `imports`) change, once per
//! generation task, right before that task renders.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{CodegenError, CodegenResult, NameRole};
use crate::tables::{Cell, FromCell, Table, TableSet};
use crate::types::{unsupported, SemanticType};
use crate::validate::{
    first_char_to_lower, strip_deprecation, validate_name, validate_namespace,
};

// ── Options ───────────────────────────────────────────────────────────────────

/// Which schema families to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targets {
    pub flatbuffers: bool,
    pub graphql: bool,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            flatbuffers: true,
            graphql: false,
        }
    }
}

impl Targets {
    pub fn validate(&self) -> CodegenResult<()> {
        if !self.flatbuffers && !self.graphql {
            return Err(CodegenError::NoTargets);
        }
        Ok(())
    }

    /// FlatBuffers naming rules apply only when GraphQL, whose conventions
    /// conflict, is not also requested.
    pub fn enforces_naming(&self) -> bool {
        self.flatbuffers && !self.graphql
    }
}

/// Caller-supplied settings for [`build_context`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Rust module path of the generated library, ending with the namespace.
    pub package: String,
    pub targets: Targets,
    /// Whether `flatc` is asked for mutable accessors (recorded in provenance).
    pub mutable: bool,
    pub generated_at: DateTime<Utc>,
}

impl BuildOptions {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            targets: Targets::default(),
            mutable: false,
            generated_at: Utc::now(),
        }
    }
}

// ── Context model ─────────────────────────────────────────────────────────────

/// One column, resolved for templates.
#[derive(Debug, Clone, PartialEq)]
pub struct ColInfo {
    /// Name with any deprecation marker removed.
    pub name: String,
    /// Name exactly as declared in the tables file.
    pub declared_name: String,
    /// Type exactly as declared in the tables file.
    pub col_type: String,
    pub semantic: SemanticType,
    pub fbs_type: &'static str,
    /// Empty unless the GraphQL target is on.
    pub graphql_type: &'static str,
    pub rust_type: &'static str,
    pub index: usize,
    pub is_scalar: bool,
    pub is_string: bool,
    pub is_bool: bool,
    pub is_deprecated: bool,
}

impl ColInfo {
    /// Accessor and builder-argument name `flatc` derives for this field.
    pub fn field_ident(&self) -> String {
        to_snake_case(&self.name)
    }

    /// Schema field attributes, including the leading space.
    pub fn fbs_attributes(&self) -> &'static str {
        if self.is_deprecated {
            " (deprecated)"
        } else {
            ""
        }
    }
}

/// One table, resolved for templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub index: usize,
    pub row_count: usize,
    pub col_count: usize,
    pub cols: Vec<ColInfo>,
    /// Cells rendered as typed Rust literals, e.g. `42u64` or `"Arthur Dent"`.
    pub rows: Vec<Vec<String>>,
}

impl TableInfo {
    pub fn snake_name(&self) -> String {
        to_snake_case(&self.name)
    }

    pub fn row_struct(&self) -> String {
        format!("{}Row", self.name)
    }

    /// GraphQL query field, e.g. `planetOrbit`.
    pub fn query_field(&self) -> String {
        first_char_to_lower(&self.name)
    }

    /// Columns that appear in conversion code.
    pub fn live_cols(&self) -> Vec<&ColInfo> {
        self.cols.iter().filter(|c| !c.is_deprecated).collect()
    }
}

/// Everything a template can see.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub namespace: String,
    pub package: String,
    /// Tables file the set came from, or a placeholder for in-memory sets.
    pub source_file: String,
    pub generated_banner: String,
    pub using_command: String,
    pub tables: Vec<TableInfo>,
    /// Data-free copy of the input, rendered as text.
    pub table_set_metadata: String,
    pub targets: Targets,

    // Task-specific, overwritten before each render.
    pub task_name: String,
    pub generated_file: String,
    pub imports: &'static [&'static str],
}

impl GenerationContext {
    /// Point the context at the next task.
    pub fn set_task(&mut self, task_name: &str, generated_file: &str, imports: &'static [&'static str]) {
        self.task_name = task_name.to_string();
        self.generated_file = generated_file.to_string();
        self.imports = imports;
    }

    /// Table metadata with each line behind `prefix`.
    pub fn metadata_comment(&self, prefix: &str) -> String {
        prefix_lines(prefix, &self.table_set_metadata)
    }

    /// Schema file name `flatc` compiles, e.g. `Demo.fbs`.
    pub fn schema_file_name(&self) -> String {
        format!("{}.fbs", self.namespace)
    }

    /// Module name of the `flatc` output file, e.g. `Demo_generated`.
    pub fn generated_module(&self) -> String {
        format!("{}_generated", self.namespace)
    }

    /// Module `flatc` wraps the namespace in, e.g. `demo`.
    pub fn namespace_module(&self) -> String {
        to_snake_case(&self.namespace)
    }

    /// Sibling module for another task's output, e.g. `Demo_helpers`.
    pub fn task_module(&self, task: &str) -> String {
        format!("{}_{}", self.namespace, task)
    }

    /// Package as a Rust path, e.g. `demo_tables::Demo`.
    pub fn package_path(&self) -> String {
        self.package.replace('/', "::").replace('-', "_")
    }

    /// Error type declared by the generated helpers, e.g. `DemoError`.
    pub fn error_type(&self) -> String {
        format!("{}Error", self.namespace)
    }

    pub fn root_table(&self) -> &str {
        self.tables.first().map(|t| t.name.as_str()).unwrap_or_default()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Validate `set` and project it into a [`GenerationContext`].
///
/// Fails on the first problem found; no partial context is returned.
pub fn build_context(set: &TableSet, options: &BuildOptions) -> CodegenResult<GenerationContext> {
    options.targets.validate()?;
    validate_namespace(&set.name)?;
    set.validate()?;

    if set.tables.is_empty() {
        return Err(CodegenError::NoTables {
            namespace: set.name.clone(),
        });
    }

    if let Some(empty) = set.tables.iter().find(|t| t.columns.is_empty()) {
        return Err(CodegenError::EmptyTable {
            table: empty.name.clone(),
        });
    }

    let mut tables = Vec::with_capacity(set.tables.len());
    for (index, table) in set.tables.iter().enumerate() {
        debug!(table = %table.name, index, "adding table");
        if options.targets.enforces_naming() {
            validate_name(&table.name, NameRole::Table)?;
        }
        tables.push(table_info(table, index, &options.targets)?);
    }

    let metadata = set.metadata_only();
    let source_file = set
        .file_name
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(in-memory tables)".to_string());

    Ok(GenerationContext {
        namespace: set.name.clone(),
        package: options.package.clone(),
        generated_banner: format!(
            "Generated {} from your tables file {}",
            options.generated_at.format("%-I:%M %p %A %-d %b %Y UTC"),
            source_file
        ),
        using_command: using_command(set.file_name.as_deref(), &set.name, options),
        source_file,
        tables,
        table_set_metadata: metadata.to_tables_text(),
        targets: options.targets,
        task_name: String::new(),
        generated_file: String::new(),
        imports: &[],
    })
}

fn table_info(table: &Table, index: usize, targets: &Targets) -> CodegenResult<TableInfo> {
    let mut cols = Vec::with_capacity(table.columns.len());
    for (col_index, column) in table.columns.iter().enumerate() {
        if targets.enforces_naming() {
            validate_name(&column.name, NameRole::Column).map_err(|e| e.with_table(&table.name))?;
        }

        let (name, is_deprecated) = strip_deprecation(&column.name);
        let field = to_snake_case(&name);
        if cols.iter().any(|c: &ColInfo| c.field_ident() == field) {
            return Err(CodegenError::DuplicateColumn {
                table: table.name.clone(),
                column: name.into_owned(),
            });
        }
        if is_deprecated {
            info!(table = %table.name, column = %name, "column is deprecated");
        }

        let semantic: SemanticType = column.col_type.parse()?;
        let graphql_type = match (targets.graphql, semantic.graphql_type()) {
            (false, _) => "",
            (true, Some(ty)) => ty,
            (true, None) => return Err(unsupported(&column.col_type, "GraphQL")),
        };
        debug!(table = %table.name, column = %name, ty = %semantic, "mapped column");

        cols.push(ColInfo {
            name: name.into_owned(),
            declared_name: column.name.clone(),
            col_type: column.col_type.clone(),
            semantic,
            fbs_type: semantic.flatbuffers_type(),
            graphql_type,
            rust_type: semantic.rust_type(),
            index: col_index,
            is_scalar: semantic.is_scalar(),
            is_string: semantic == SemanticType::String,
            is_bool: semantic == SemanticType::Bool,
            is_deprecated,
        });
    }

    let mut rows = Vec::with_capacity(table.rows.len());
    for (row_index, row) in table.rows.iter().enumerate() {
        let rendered = row
            .iter()
            .zip(&cols)
            .map(|(cell, col)| {
                render_cell(cell, col.semantic).ok_or_else(|| CodegenError::CellTypeMismatch {
                    table: table.name.clone(),
                    row: row_index,
                    column: col.declared_name.clone(),
                    value: cell.to_string(),
                    expected: col.semantic.name(),
                })
            })
            .collect::<CodegenResult<Vec<_>>>()?;
        rows.push(rendered);
    }

    Ok(TableInfo {
        name: table.name.clone(),
        index,
        row_count: table.row_count(),
        col_count: table.col_count(),
        cols,
        rows,
    })
}

/// Render a cell as a Rust literal of the column's type.
///
/// Returns `None` when the value does not fit, e.g. `300` in a `uint8` column.
pub fn render_cell(cell: &Cell, ty: SemanticType) -> Option<String> {
    fn int<T: FromCell + std::fmt::Display>(cell: &Cell, suffix: &str) -> Option<String> {
        T::from_cell(cell).map(|v| format!("{v}{suffix}"))
    }

    match ty {
        SemanticType::Bool => bool::from_cell(cell).map(|b| b.to_string()),
        SemanticType::Int8 => int::<i8>(cell, "i8"),
        SemanticType::Int16 => int::<i16>(cell, "i16"),
        SemanticType::Int32 => int::<i32>(cell, "i32"),
        SemanticType::Int64 => int::<i64>(cell, "i64"),
        SemanticType::UInt8 => int::<u8>(cell, "u8"),
        SemanticType::UInt16 => int::<u16>(cell, "u16"),
        SemanticType::UInt32 => int::<u32>(cell, "u32"),
        SemanticType::UInt64 => int::<u64>(cell, "u64"),
        SemanticType::Float64 => f64::from_cell(cell).map(|x| float_literal(x, "f64")),
        SemanticType::Float32 => {
            let x = f64::from_cell(cell)?;
            let narrowed = x as f32;
            if x.is_finite() && narrowed.is_infinite() {
                return None;
            }
            let literal = if narrowed.is_finite() {
                format!("{narrowed:?}f32")
            } else {
                float_literal(f64::from(narrowed), "f32")
            };
            Some(literal)
        }
        SemanticType::String => String::from_cell(cell).map(|s| format!("{s:?}")),
    }
}

fn float_literal(x: f64, ty: &str) -> String {
    if x.is_nan() {
        format!("{ty}::NAN")
    } else if x.is_infinite() && x > 0.0 {
        format!("{ty}::INFINITY")
    } else if x.is_infinite() {
        format!("{ty}::NEG_INFINITY")
    } else {
        format!("{x:?}{ty}")
    }
}

// ── Provenance ────────────────────────────────────────────────────────────────

fn using_command(file: Option<&Path>, namespace: &str, options: &BuildOptions) -> String {
    let file = file
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<tables file>".to_string());
    let mut cmd = format!(
        "flattablesc generate -f {} -n {} -p {}",
        shell_quote(&file),
        shell_quote(namespace),
        shell_quote(&options.package)
    );
    match (options.targets.flatbuffers, options.targets.graphql) {
        (true, true) => cmd.push_str(" -g"),
        (false, true) => cmd.push_str(" -G"),
        _ => {}
    }
    if options.mutable {
        cmd.push_str(" -m");
    }
    cmd
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn prefix_lines(prefix: &str, text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `PlanetOrbit` → `planet_orbit`, `orbit2` → `orbit_2`, `myHTTPServer` → `my_httpserver`.
///
/// The same rule `flatc` applies when it derives Rust module, accessor and
/// builder-argument names: an `_` goes before a non-lowercase character that
/// follows a lowercase one, or before a non-digit that follows a digit.
/// Runs of capitals are not split.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev: Option<char> = None;
    for c in s.chars() {
        match prev {
            None => result.push(c.to_ascii_lowercase()),
            Some(_) if c == '_' => result.push('_'),
            Some(p) if !c.is_ascii_lowercase() => {
                if p.is_ascii_lowercase() || (p.is_ascii_digit() && !c.is_ascii_digit()) {
                    result.push('_');
                }
                result.push(c.to_ascii_lowercase());
            }
            Some(_) => result.push(c),
        }
        prev = Some(c);
    }
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
