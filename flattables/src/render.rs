//! Renderer
//!
//! Runs registry tasks against a [`GenerationContext`] and writes the
//! results. A dry run takes exactly the same path and only skips the final
//! write. The abort flag is checked before each write, never during one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::context::{build_context, BuildOptions, GenerationContext};
use crate::error::{CodegenError, CodegenResult};
use crate::registry::{ArtifactCategory, ArtifactKind, GenerationTask, GENERATIONS};
use crate::tables::TableSet;
use crate::tidy::{format_source, tidy, SourceFormatter};

// ── Options ───────────────────────────────────────────────────────────────────

/// Where artefacts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Schema, library sources and README.
    pub out_dir: PathBuf,
    /// Entry-point program.
    pub main_dir: PathBuf,
}

impl OutputLayout {
    /// `<base>/<namespace>` and `<base>/<namespace>_main`.
    pub fn for_namespace(base: &Path, namespace: &str) -> Self {
        Self {
            out_dir: base.join(namespace),
            main_dir: base.join(format!("{namespace}_main")),
        }
    }

    pub fn schema_path(&self, namespace: &str) -> PathBuf {
        self.out_dir.join(format!("{namespace}.fbs"))
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub layout: OutputLayout,
    pub dry_run: bool,
    pub formatter: SourceFormatter,
    /// Set to stop the run before the next write.
    pub abort: Arc<AtomicBool>,
}

impl RenderOptions {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            dry_run: false,
            formatter: SourceFormatter::default(),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// What happened to one artefact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteOutcome {
    Written,
    Unchanged,
    DryRun,
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOutcome::Written => f.write_str("written"),
            WriteOutcome::Unchanged => f.write_str("unchanged"),
            WriteOutcome::DryRun => f.write_str("dry-run"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactReport {
    pub task: &'static str,
    pub category: ArtifactCategory,
    pub path: PathBuf,
    pub bytes: usize,
    pub outcome: WriteOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter_warning: Option<String>,
    /// Rendered text; kept for callers that print dry runs.
    #[serde(skip)]
    pub contents: String,
    #[serde(skip)]
    pub is_schema: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub namespace: String,
    pub dry_run: bool,
    pub artifacts: Vec<ArtifactReport>,
}

impl GenerationReport {
    /// Path of the FlatBuffers schema, if it was part of the run.
    pub fn schema_path(&self) -> Option<&Path> {
        self.artifacts
            .iter()
            .find(|a| a.is_schema && a.category == ArtifactCategory::FlatBuffers)
            .map(|a| a.path.as_path())
    }

    pub fn written(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|a| a.outcome == WriteOutcome::Written)
            .count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.artifacts
            .iter()
            .filter_map(|a| a.formatter_warning.as_deref().map(|w| (a.path.as_path(), w)))
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render every task enabled by the context's targets, in registry order.
///
/// Any render failure aborts the run.
pub fn render_all(
    ctx: &mut GenerationContext,
    tasks: &[GenerationTask],
    options: &RenderOptions,
) -> CodegenResult<GenerationReport> {
    let targets = ctx.targets;
    targets.validate()?;

    let mut artifacts = Vec::new();
    for task in tasks.iter().filter(|t| t.category.enabled(&targets)) {
        let file_name = task.file_name(&ctx.namespace);
        let path = task.output_path(
            &ctx.namespace,
            &options.layout.out_dir,
            &options.layout.main_dir,
        );
        ctx.set_task(task.name, &file_name, task.imports);
        debug!(task = task.name, category = %task.category, path = %path.display(), "rendering");

        let rendered = (task.render)(ctx).map_err(|source| CodegenError::TemplateRender {
            task: format!("{}/{}", task.category, task.name),
            source,
        })?;
        let tidied = tidy(&rendered);
        let (text, formatter_warning) = if task.kind.is_rust_source() {
            format_source(&tidied, &options.formatter)
        } else {
            (tidied, None)
        };

        if options.abort.load(Ordering::SeqCst) {
            return Err(CodegenError::Aborted {
                task: task.name.to_string(),
            });
        }

        let outcome = if options.dry_run {
            WriteOutcome::DryRun
        } else {
            write_if_changed(&path, &text)?
        };

        artifacts.push(ArtifactReport {
            task: task.name,
            category: task.category,
            path,
            bytes: text.len(),
            outcome,
            formatter_warning,
            contents: text,
            is_schema: matches!(task.kind, ArtifactKind::Schema { .. }),
        });
    }

    Ok(GenerationReport {
        namespace: ctx.namespace.clone(),
        dry_run: options.dry_run,
        artifacts,
    })
}

/// Build the context for `set` and render every registry task.
///
/// Validation errors surface identically whether or not `options.dry_run`
/// is set.
pub fn generate(
    set: &TableSet,
    build: &BuildOptions,
    options: &RenderOptions,
) -> CodegenResult<GenerationReport> {
    let mut ctx = build_context(set, build)?;
    render_all(&mut ctx, GENERATIONS, options)
}

/// Write `contents` to `path`, creating parent directories as needed.
/// Files whose contents already match are left alone.
pub fn write_if_changed(path: &Path, contents: &str) -> CodegenResult<WriteOutcome> {
    let write_err = |source| CodegenError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let existing = std::fs::read_to_string(path).ok();
    if existing.as_deref() == Some(contents) {
        debug!(path = %path.display(), "unchanged");
        return Ok(WriteOutcome::Unchanged);
    }

    std::fs::write(path, contents).map_err(write_err)?;
    info!(path = %path.display(), bytes = contents.len(), "written");
    Ok(WriteOutcome::Written)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_defaults() {
        let layout = OutputLayout::for_namespace(Path::new("gen"), "Demo");
        assert_eq!(layout.out_dir, Path::new("gen/Demo"));
        assert_eq!(layout.main_dir, Path::new("gen/Demo_main"));
        assert_eq!(layout.schema_path("Demo"), Path::new("gen/Demo/Demo.fbs"));
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        assert_eq!(write_if_changed(&path, "a\n").unwrap(), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, "a\n").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "b\n").unwrap(), WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\n");
    }
}
