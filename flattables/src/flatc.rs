//! Schema compiler invocation
//!
//! Runs `flatc` on the generated schema to produce `<namespace>_generated.rs`.
//! Arguments are passed individually, never through a shell, so paths with
//! spaces survive. Failures are never retried: the same schema fails the
//! same way.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{CodegenError, CodegenResult};

/// Default bound on a single compiler run.
pub const DEFAULT_COMPILER_TIMEOUT: Duration = Duration::from_secs(60);

/// How to run the schema compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub program: String,
    /// Pass `--gen-mutable` for in-place update accessors.
    pub mutable: bool,
    pub timeout: Duration,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            program: "flatc".to_string(),
            mutable: false,
            timeout: DEFAULT_COMPILER_TIMEOUT,
        }
    }
}

/// Output of a successful compiler run.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Combined stdout and stderr.
    pub output: String,
}

/// Arguments passed to the compiler, program name excluded.
pub fn compiler_args(schema: &Path, out_dir: &Path, options: &CompilerOptions) -> Vec<String> {
    let mut args = vec!["--rust".to_string()];
    if options.mutable {
        args.push("--gen-mutable".to_string());
    }
    args.push("-o".to_string());
    args.push(out_dir.display().to_string());
    args.push(schema.display().to_string());
    args
}

/// Compile `schema` into Rust source under `out_dir`.
pub async fn compile_schema(
    schema: &Path,
    out_dir: &Path,
    options: &CompilerOptions,
) -> CodegenResult<CompileOutput> {
    let args = compiler_args(schema, out_dir, options);
    debug!(program = %options.program, ?args, "running schema compiler");

    let child = Command::new(&options.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CodegenError::CompilerUnavailable {
            program: options.program.clone(),
            source,
        })?;

    let output = tokio::time::timeout(options.timeout, child.wait_with_output())
        .await
        .map_err(|_| CodegenError::CompilerTimeout {
            schema: PathBuf::from(schema),
            after: options.timeout,
        })?
        .map_err(|source| CodegenError::CompilerUnavailable {
            program: options.program.clone(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(CodegenError::CompilerFailed {
            schema: PathBuf::from(schema),
            status: output.status.to_string(),
            output: combined,
        });
    }

    info!(schema = %schema.display(), "schema compiled");
    Ok(CompileOutput { output: combined })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
