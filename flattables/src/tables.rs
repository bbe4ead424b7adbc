//! Tables model and TOML loader
//!
//! A [`TableSet`] is an ordered, named collection of [`Table`]s. Each table
//! has an ordered column schema and optional row data. Sets are read from a
//! TOML tables file:
//!
//! ```toml
//! [[tables]]
//! name = "User"
//! columns = [{ name = "name", type = "string" }, { name = "id", type = "uint64" }]
//! rows = [["Arthur Dent", 42]]
//! ```
//!
//! Column types are kept exactly as declared. Whether a type is usable is
//! decided later by [`crate::types::map_type`], which can then explain how
//! to fix it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the tables model.
#[derive(Debug, Error)]
pub enum TablesError {
    #[error("parsing tables: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialising tables: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("reading tables file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} name {name:?} is not an identifier: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("duplicate table name [{0}]")]
    DuplicateTable(String),

    #[error("table [{table}] row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table [{table}] has no cell at row {row}, column {col}")]
    OutOfBounds {
        table: String,
        row: usize,
        col: usize,
    },

    #[error("table [{table}] row {row} column '{column}': expected {expected}, found {found}")]
    CellType {
        table: String,
        row: usize,
        column: String,
        expected: &'static str,
        found: String,
    },
}

// ── Table set ────────────────────────────────────────────────────────────────

/// An ordered, named collection of tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSet {
    /// Set name; doubles as the schema namespace.
    #[serde(default)]
    pub name: String,
    /// File the set was read from, if any.
    #[serde(skip)]
    pub file_name: Option<PathBuf>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl TableSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            tables: Vec::new(),
        }
    }

    /// Parse from a TOML string and check the model invariants.
    pub fn from_toml(s: &str) -> Result<Self, TablesError> {
        let set: TableSet = toml::from_str(s)?;
        set.validate()?;
        Ok(set)
    }

    /// Read a tables file, remembering its path for provenance.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TablesError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| TablesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut set = Self::from_toml(&src)?;
        set.file_name = Some(path.to_path_buf());
        Ok(set)
    }

    /// Serialise back to a TOML string.
    pub fn to_toml(&self) -> Result<String, TablesError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that table names are unique and every row matches its schema width.
    pub fn validate(&self) -> Result<(), TablesError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            if seen.contains(&table.name.as_str()) {
                return Err(TablesError::DuplicateTable(table.name.clone()));
            }
            seen.push(&table.name);
            check_identifier("table", &table.name)?;
            for column in &table.columns {
                check_identifier("column", &column.name)?;
            }
            table.check_rows()?;
        }
        Ok(())
    }

    /// Append a table, keeping names unique.
    pub fn push_table(&mut self, table: Table) -> Result<(), TablesError> {
        if self.table(&table.name).is_some() {
            return Err(TablesError::DuplicateTable(table.name));
        }
        table.check_rows()?;
        self.tables.push(table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Deep copy with every row removed. Shares nothing with `self`.
    pub fn metadata_only(&self) -> TableSet {
        TableSet {
            name: self.name.clone(),
            file_name: self.file_name.clone(),
            tables: self.tables.iter().map(Table::metadata_only).collect(),
        }
    }

    /// Human-readable rendering used in provenance comments.
    ///
    /// Tables without rows print one `name type` line per column; tables
    /// with rows print a header of names, a line of types, then the data.
    pub fn to_tables_text(&self) -> String {
        let mut out = String::new();
        for (idx, table) in self.tables.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            table.write_text(&mut out);
        }
        out
    }
}

// ── Table ────────────────────────────────────────────────────────────────────

/// A named relation: ordered columns plus optional rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Row data, one cell per column in column order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TablesError> {
        if row.len() != self.columns.len() {
            return Err(TablesError::RaggedRow {
                table: self.name.clone(),
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell, TablesError> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or_else(|| TablesError::OutOfBounds {
                table: self.name.clone(),
                row,
                col,
            })
    }

    /// Typed cell access, e.g. `table.get::<u64>(0, 1)`.
    pub fn get<T: FromCell>(&self, row: usize, col: usize) -> Result<T, TablesError> {
        if col >= self.columns.len() {
            return Err(TablesError::OutOfBounds {
                table: self.name.clone(),
                row,
                col,
            });
        }
        let cell = self.cell(row, col)?;
        T::from_cell(cell).ok_or_else(|| TablesError::CellType {
            table: self.name.clone(),
            row,
            column: self.columns[col].name.clone(),
            expected: T::TYPE_NAME,
            found: cell.to_string(),
        })
    }

    pub fn metadata_only(&self) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    fn check_rows(&self) -> Result<(), TablesError> {
        for (idx, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(TablesError::RaggedRow {
                    table: self.name.clone(),
                    row: idx,
                    expected: self.columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(())
    }

    fn write_text(&self, out: &mut String) {
        let _ = writeln!(out, "[{}]", self.name);
        if self.rows.is_empty() {
            let width = self.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
            for col in &self.columns {
                let _ = writeln!(out, "{:<width$} {}", col.name, col.col_type);
            }
            return;
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|r| r[i].len())
                    .chain([c.name.len(), c.col_type.len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut write_line = |items: Vec<&str>| {
            let line: Vec<String> = items
                .iter()
                .zip(&widths)
                .map(|(s, w)| format!("{s:<w$}"))
                .collect();
            let _ = writeln!(out, "{}", line.join(" ").trim_end());
        };
        write_line(self.columns.iter().map(|c| c.name.as_str()).collect());
        write_line(self.columns.iter().map(|c| c.col_type.as_str()).collect());
        for row in &cells {
            write_line(row.iter().map(String::as_str).collect());
        }
    }
}

/// ASCII identifier: a letter or `_`, then letters, digits or `_`.
fn check_identifier(kind: &'static str, name: &str) -> Result<(), TablesError> {
    let reason = match name.chars().next() {
        None => "it is empty".to_string(),
        Some(c) if c.is_ascii_digit() => format!("it starts with the digit '{c}'"),
        Some(_) => match name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            Some(c) => format!("'{}' is not allowed", c.escape_default()),
            None => return Ok(()),
        },
    };
    Err(TablesError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    })
}

// ── Column ───────────────────────────────────────────────────────────────────

/// A column declaration: name plus declared type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type, e.g. `"uint64"`. Not checked until generation.
    #[serde(rename = "type")]
    pub col_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, col_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            col_type: col_type.into(),
        }
    }
}

// ── Cell ─────────────────────────────────────────────────────────────────────

/// One cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    /// Only for unsigned values above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::UInt(u) => write!(f, "{u}"),
            Cell::Float(x) => write!(f, "{x:?}"),
            Cell::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Str(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Str(v.to_string())
    }
}

impl From<f32> for Cell {
    fn from(v: f32) -> Self {
        Cell::Float(f64::from(v))
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<u64> for Cell {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Cell::Int).unwrap_or(Cell::UInt(v))
    }
}

macro_rules! cell_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Cell {
            fn from(v: $t) -> Self {
                Cell::Int(i64::from(v))
            }
        }
    )*};
}

cell_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Conversion from a [`Cell`] into a concrete Rust value.
pub trait FromCell: Sized {
    /// Type name used in error messages.
    const TYPE_NAME: &'static str;

    fn from_cell(cell: &Cell) -> Option<Self>;
}

macro_rules! from_cell_int {
    ($($t:ty => $name:literal),*) => {$(
        impl FromCell for $t {
            const TYPE_NAME: &'static str = $name;

            fn from_cell(cell: &Cell) -> Option<Self> {
                match cell {
                    Cell::Int(i) => <$t>::try_from(*i).ok(),
                    Cell::UInt(u) => <$t>::try_from(*u).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

from_cell_int!(
    i8 => "int8", i16 => "int16", i32 => "int32", i64 => "int64",
    u8 => "uint8", u16 => "uint16", u32 => "uint32", u64 => "uint64"
);

impl FromCell for f64 {
    const TYPE_NAME: &'static str = "float64";

    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Float(x) => Some(*x),
            Cell::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromCell for f32 {
    const TYPE_NAME: &'static str = "float32";

    fn from_cell(cell: &Cell) -> Option<Self> {
        f64::from_cell(cell).map(|x| x as f32)
    }
}

impl FromCell for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromCell for String {
    const TYPE_NAME: &'static str = "string";

    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
