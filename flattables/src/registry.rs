//! Generation registry
//!
//! The fixed, ordered list of artefacts a run can produce. Each
//! [`GenerationTask`] binds a name and an import list to one askama template.
//! Tasks are rendered in declared order by [`crate::render::render_all`].

use std::path::{Path, PathBuf};

use askama::Template;
use serde::Serialize;

use crate::context::{GenerationContext, Targets};

/// Which schema family an artefact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactCategory {
    FlatBuffers,
    GraphQl,
}

impl ArtifactCategory {
    pub fn enabled(self, targets: &Targets) -> bool {
        match self {
            ArtifactCategory::FlatBuffers => targets.flatbuffers,
            ArtifactCategory::GraphQl => targets.graphql,
        }
    }
}

impl std::fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactCategory::FlatBuffers => f.write_str("flatbuffers"),
            ArtifactCategory::GraphQl => f.write_str("graphql"),
        }
    }
}

/// What kind of file a task produces; decides its name and directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `<namespace>.<extension>`
    Schema { extension: &'static str },
    /// `<TASK>.md`
    Documentation,
    /// `<namespace>_<task>.rs` in the library directory.
    Library,
    /// `<namespace>_<task>.rs` in the main directory.
    EntryPoint,
}

impl ArtifactKind {
    /// Rust source, and therefore subject to the source formatter.
    pub fn is_rust_source(self) -> bool {
        matches!(self, ArtifactKind::Library | ArtifactKind::EntryPoint)
    }
}

/// Renders one template against the shared context.
pub type RenderFn = fn(&GenerationContext) -> askama::Result<String>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct GenerationTask {
    pub category: ArtifactCategory,
    pub name: &'static str,
    pub kind: ArtifactKind,
    /// `use` paths printed under the provenance header.
    pub imports: &'static [&'static str],
    pub render: RenderFn,
}

impl std::fmt::Debug for GenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationTask")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}

impl GenerationTask {
    pub fn file_name(&self, namespace: &str) -> String {
        match self.kind {
            ArtifactKind::Schema { extension } => format!("{namespace}.{extension}"),
            ArtifactKind::Documentation => format!("{}.md", self.name),
            ArtifactKind::Library | ArtifactKind::EntryPoint => {
                format!("{namespace}_{}.rs", self.name)
            }
        }
    }

    /// Directory this task writes to: entry points are kept apart from the library.
    pub fn output_dir<'a>(&self, out_dir: &'a Path, main_dir: &'a Path) -> &'a Path {
        match self.kind {
            ArtifactKind::EntryPoint => main_dir,
            _ => out_dir,
        }
    }

    pub fn output_path(&self, namespace: &str, out_dir: &Path, main_dir: &Path) -> PathBuf {
        self.output_dir(out_dir, main_dir).join(self.file_name(namespace))
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Every task, in render order.
pub static GENERATIONS: &[GenerationTask] = &[
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "schema",
        kind: ArtifactKind::Schema { extension: "fbs" },
        imports: &[],
        render: render_flatbuffers_schema,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "README",
        kind: ArtifactKind::Documentation,
        imports: &[],
        render: render_readme,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "to_flatbuffers",
        kind: ArtifactKind::Library,
        imports: &[
            "flatbuffers::{FlatBufferBuilder, WIPOffset}",
            "flattables::{Table, TableSet, TablesError}",
        ],
        render: render_to_flatbuffers,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "from_flatbuffers",
        kind: ArtifactKind::Library,
        imports: &["flattables::{Cell, Column, Table, TableSet}"],
        render: render_from_flatbuffers,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "rows",
        kind: ArtifactKind::Library,
        imports: &["flattables::{Cell, Column, Table, TablesError}"],
        render: render_rows,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "helpers",
        kind: ArtifactKind::Library,
        imports: &[
            "std::fmt",
            "flattables::{Cell, Column, Table, TableSet, TablesError}",
        ],
        render: render_helpers,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "test",
        kind: ArtifactKind::Library,
        imports: &[],
        render: render_tests,
    },
    GenerationTask {
        category: ArtifactCategory::FlatBuffers,
        name: "main",
        kind: ArtifactKind::EntryPoint,
        imports: &["std::error::Error"],
        render: render_main,
    },
    GenerationTask {
        category: ArtifactCategory::GraphQl,
        name: "schema",
        kind: ArtifactKind::Schema { extension: "graphql" },
        imports: &[],
        render: render_graphql_schema,
    },
];

// ── Templates ─────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "schema.fbs.j2", escape = "none")]
struct FlatBuffersSchema<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "schema.graphql.j2", escape = "none")]
struct GraphQlSchema<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "readme.md.j2", escape = "none")]
struct Readme<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "to_flatbuffers.rs.j2", escape = "none")]
struct ToFlatBuffers<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "from_flatbuffers.rs.j2", escape = "none")]
struct FromFlatBuffers<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "rows.rs.j2", escape = "none")]
struct Rows<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "helpers.rs.j2", escape = "none")]
struct Helpers<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "test.rs.j2", escape = "none")]
struct Tests<'a> {
    ctx: &'a GenerationContext,
}

#[derive(Template)]
#[template(path = "main.rs.j2", escape = "none")]
struct MainProgram<'a> {
    ctx: &'a GenerationContext,
}

fn render_flatbuffers_schema(ctx: &GenerationContext) -> askama::Result<String> {
    FlatBuffersSchema { ctx }.render()
}

fn render_readme(ctx: &GenerationContext) -> askama::Result<String> {
    Readme { ctx }.render()
}

fn render_to_flatbuffers(ctx: &GenerationContext) -> askama::Result<String> {
    ToFlatBuffers { ctx }.render()
}

fn render_from_flatbuffers(ctx: &GenerationContext) -> askama::Result<String> {
    FromFlatBuffers { ctx }.render()
}

fn render_rows(ctx: &GenerationContext) -> askama::Result<String> {
    Rows { ctx }.render()
}

fn render_helpers(ctx: &GenerationContext) -> askama::Result<String> {
    Helpers { ctx }.render()
}

fn render_tests(ctx: &GenerationContext) -> askama::Result<String> {
    Tests { ctx }.render()
}

fn render_main(ctx: &GenerationContext) -> askama::Result<String> {
    MainProgram { ctx }.render()
}

fn render_graphql_schema(ctx: &GenerationContext) -> askama::Result<String> {
    GraphQlSchema { ctx }.render()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_is_fixed() {
        let names: Vec<(ArtifactCategory, &str)> =
            GENERATIONS.iter().map(|t| (t.category, t.name)).collect();
        assert_eq!(
            names,
            [
                (ArtifactCategory::FlatBuffers, "schema"),
                (ArtifactCategory::FlatBuffers, "README"),
                (ArtifactCategory::FlatBuffers, "to_flatbuffers"),
                (ArtifactCategory::FlatBuffers, "from_flatbuffers"),
                (ArtifactCategory::FlatBuffers, "rows"),
                (ArtifactCategory::FlatBuffers, "helpers"),
                (ArtifactCategory::FlatBuffers, "test"),
                (ArtifactCategory::FlatBuffers, "main"),
                (ArtifactCategory::GraphQl, "schema"),
            ]
        );
    }

    #[test]
    fn file_names_follow_kind() {
        let by_name = |cat, name| {
            GENERATIONS
                .iter()
                .find(|t| t.category == cat && t.name == name)
                .unwrap()
        };
        assert_eq!(by_name(ArtifactCategory::FlatBuffers, "schema").file_name("Demo"), "Demo.fbs");
        assert_eq!(by_name(ArtifactCategory::GraphQl, "schema").file_name("Demo"), "Demo.graphql");
        assert_eq!(by_name(ArtifactCategory::FlatBuffers, "README").file_name("Demo"), "README.md");
        assert_eq!(
            by_name(ArtifactCategory::FlatBuffers, "rows").file_name("Demo"),
            "Demo_rows.rs"
        );
    }

    #[test]
    fn entry_point_goes_to_main_dir() {
        let out = Path::new("out/Demo");
        let main = Path::new("out/Demo_main");
        for task in GENERATIONS {
            let path = task.output_path("Demo", out, main);
            if task.name == "main" {
                assert_eq!(path, Path::new("out/Demo_main/Demo_main.rs"));
            } else {
                assert!(path.starts_with(out), "{task:?} -> {}", path.display());
            }
        }
    }

    #[test]
    fn categories_follow_targets() {
        let fb_only = Targets::default();
        let both = Targets {
            flatbuffers: true,
            graphql: true,
        };
        assert!(ArtifactCategory::FlatBuffers.enabled(&fb_only));
        assert!(!ArtifactCategory::GraphQl.enabled(&fb_only));
        assert!(ArtifactCategory::GraphQl.enabled(&both));
    }
}
