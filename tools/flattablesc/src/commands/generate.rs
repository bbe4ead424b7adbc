//! `flattablesc generate` subcommand
//!
//! Reads a tables file and emits, under `<out-dir>`:
//! - `<ns>.fbs`: FlatBuffers schema, compiled with `flatc --rust`
//! - `<ns>_*.rs`: conversion code, row structs, helpers and tests
//! - `<ns>.graphql`: GraphQL schema, with `-g` or `-G`
//!
//! and an example program under `<out-dir-main>`.
//!
//! # Usage
//!
//! ```text
//! flattablesc generate -f tables.toml -n Demo -p demo_tables::Demo
//! flattablesc generate -f tables.toml -n Demo -p demo_tables::Demo --check    # validate only
//! flattablesc generate -f tables.toml -n Demo -p demo_tables::Demo --dry-run  # print, don't write
//! flattablesc generate -f tables.toml -n Demo -p demo_tables::Demo -G         # GraphQL only
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use flattables::{
    build_context, compile_schema, compiler_args, render_all, BuildOptions, CodegenError,
    CompilerOptions, GenerationReport, OutputLayout, RenderOptions, SourceFormatter, TableSet,
    Targets, GENERATIONS,
};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};
use crate::output::json::{format_json_pretty, JsonSummary};
use crate::output::table::format_report_table;

/// Generate a FlatBuffers schema and Rust glue code from a tables file
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Tables file to read
    #[arg(short = 'f', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Schema namespace; also names the output directories
    #[arg(short, long)]
    pub namespace: String,

    /// Rust module path of the generated library, ending with the namespace
    #[arg(short, long)]
    pub package: String,

    /// Directory for the schema and library sources [default: ./<namespace>]
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Directory for the example program [default: ./<namespace>_main]
    #[arg(long, value_name = "DIR")]
    pub out_dir_main: Option<PathBuf>,

    /// Also generate a GraphQL schema
    #[arg(short = 'g', long, conflicts_with_all = ["graphql_only", "flatbuffers_only"])]
    pub graphql: bool,

    /// Generate only the GraphQL schema
    #[arg(short = 'G', long, conflicts_with = "flatbuffers_only")]
    pub graphql_only: bool,

    /// Generate only FlatBuffers artefacts (the default)
    #[arg(short = 'B', long)]
    pub flatbuffers_only: bool,

    /// Ask flatc for mutable accessors
    #[arg(short, long)]
    pub mutable: bool,

    /// Print what would be generated without writing files or running flatc
    #[arg(long)]
    pub dry_run: bool,

    /// Validate the tables file without generating anything
    #[arg(long)]
    pub check: bool,

    /// Formatter for generated Rust: rustfmt, prettyplease or none
    #[arg(long, default_value = "rustfmt")]
    pub formatter: SourceFormatter,

    /// FlatBuffers compiler to run
    #[arg(long, env = "FLATC", default_value = "flatc", value_name = "PATH")]
    pub flatc: String,

    /// Seconds to wait for flatc before giving up
    #[arg(long, default_value_t = 60, value_name = "SECS")]
    pub compiler_timeout: u64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateCommand {
    pub async fn execute(self) -> CliResult<()> {
        validate_namespace(&self.namespace)?;
        validate_package(&self.package, &self.namespace)?;

        // ── Read tables ────────────────────────────────────────────────────
        let mut set = TableSet::from_file(&self.input)?;
        if !set.name.is_empty() && set.name != self.namespace {
            debug!(file = %set.name, flag = %self.namespace, "namespace flag overrides set name");
        }
        set.name = self.namespace.clone();

        // ── Validate ───────────────────────────────────────────────────────
        let build = BuildOptions {
            targets: self.targets(),
            mutable: self.mutable,
            ..BuildOptions::new(self.package.clone())
        };
        let mut ctx = build_context(&set, &build)?;

        if self.check {
            println!(
                "{} {} validated successfully ({} table(s))",
                "✓".green(),
                self.input.display(),
                ctx.table_count()
            );
            return Ok(());
        }

        // ── Generate ───────────────────────────────────────────────────────
        let mut options = RenderOptions::new(self.layout());
        options.dry_run = self.dry_run;
        options.formatter = self.formatter.clone();
        spawn_interrupt_listener(Arc::clone(&options.abort));

        let report = render_all(&mut ctx, GENERATIONS, &options)?;
        for (path, warning) in report.warnings() {
            warn!(path = %path.display(), "{warning}");
        }

        // ── Compile ────────────────────────────────────────────────────────
        let compiler = CompilerOptions {
            program: self.flatc.clone(),
            mutable: self.mutable,
            timeout: Duration::from_secs(self.compiler_timeout),
        };
        let compile_line = report.schema_path().map(|schema| {
            let mut line = vec![compiler.program.clone()];
            line.extend(compiler_args(schema, &options.layout.out_dir, &compiler));
            line
        });

        let mut compiler_output = None;
        if let (Some(schema), false) = (report.schema_path(), self.dry_run) {
            if options.abort.load(Ordering::SeqCst) {
                return Err(CodegenError::Aborted {
                    task: "flatc".to_string(),
                }
                .into());
            }
            let out = compile_schema(schema, &options.layout.out_dir, &compiler).await?;
            compiler_output = Some(out.output);
        }

        // ── Report ─────────────────────────────────────────────────────────
        if self.json {
            let summary = JsonSummary {
                report: &report,
                compiler: compile_line,
                compiler_output,
            };
            println!("{}", format_json_pretty(&summary)?);
            return Ok(());
        }

        if self.dry_run {
            print_dry_run(&report, compile_line.as_deref())?;
        } else {
            println!("{}", format_report_table(&report));
            if let Some(output) = compiler_output.filter(|o| !o.trim().is_empty()) {
                println!("{}", output.trim_end().dimmed());
            }
        }

        println!(
            "{} {} table(s) in namespace {}, {} file(s) written",
            "✓".green(),
            ctx.table_count(),
            report.namespace,
            report.written()
        );
        Ok(())
    }

    fn targets(&self) -> Targets {
        Targets {
            flatbuffers: !self.graphql_only,
            graphql: self.graphql || self.graphql_only,
        }
    }

    fn layout(&self) -> OutputLayout {
        let defaults = OutputLayout::for_namespace(Path::new("."), &self.namespace);
        OutputLayout {
            out_dir: self.out_dir.clone().unwrap_or(defaults.out_dir),
            main_dir: self.out_dir_main.clone().unwrap_or(defaults.main_dir),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// ASCII letters, digits and underscores, starting with a letter.
fn validate_namespace(namespace: &str) -> CliResult<()> {
    let mut chars = namespace.chars();
    match chars.next() {
        None => Err(CliError::usage("--namespace", "must not be empty")),
        Some(c) if !c.is_ascii_alphabetic() => Err(CliError::usage(
            "--namespace",
            format!("'{namespace}' must start with an ASCII letter"),
        )),
        Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => Err(CliError::usage(
            "--namespace",
            format!("'{namespace}' may only contain ASCII letters, digits and '_'"),
        )),
        Some(_) => Ok(()),
    }
}

/// The package names the module the namespace's code lives in, so it must
/// end with the namespace.
fn validate_package(package: &str, namespace: &str) -> CliResult<()> {
    if package.ends_with(namespace) {
        Ok(())
    } else {
        Err(CliError::usage(
            "--package",
            format!("'{package}' must end with the namespace '{namespace}'"),
        ))
    }
}

/// Flip `abort` on Ctrl-C. The renderer stops before its next write.
fn spawn_interrupt_listener(abort: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} interrupted, stopping before the next write", "!".yellow());
            abort.store(true, Ordering::SeqCst);
        }
    });
}

/// Print every rendered artefact, then the compiler command that would run.
fn print_dry_run(report: &GenerationReport, compile_line: Option<&[String]>) -> CliResult<()> {
    let mut out = std::io::stdout().lock();
    for artifact in &report.artifacts {
        writeln!(
            out,
            "{}  {} ({} bytes)",
            format!("── {}/{}", artifact.category, artifact.task).dimmed(),
            artifact.path.display(),
            artifact.bytes
        )
        .and_then(|()| writeln!(out, "{}", artifact.contents))
        .with_context(|| format!("printing {}", artifact.path.display()))?;
    }
    if let Some(line) = compile_line {
        writeln!(out, "{}  {}", "── would run".dimmed(), line.join(" "))
            .context("printing compiler command")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        cmd: GenerateCommand,
    }

    fn parse(args: &[&str]) -> GenerateCommand {
        let mut argv = vec!["flattablesc", "-f", "t.toml", "-n", "Demo", "-p", "pkg::Demo"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().cmd
    }

    #[test]
    fn namespace_rules() {
        assert!(validate_namespace("Demo").is_ok());
        assert!(validate_namespace("Demo_2").is_ok());
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("2Demo").is_err());
        assert!(validate_namespace("De-mo").is_err());
    }

    #[test]
    fn package_must_end_with_namespace() {
        assert!(validate_package("demo_tables::Demo", "Demo").is_ok());
        assert!(validate_package("demo_tables/Demo", "Demo").is_ok());
        let err = validate_package("demo_tables", "Demo").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn target_flags() {
        assert_eq!(parse(&[]).targets(), Targets::default());
        assert_eq!(
            parse(&["-g"]).targets(),
            Targets {
                flatbuffers: true,
                graphql: true
            }
        );
        assert_eq!(
            parse(&["-G"]).targets(),
            Targets {
                flatbuffers: false,
                graphql: true
            }
        );
        assert_eq!(parse(&["-B"]).targets(), Targets::default());
    }

    #[test]
    fn conflicting_target_flags_are_rejected() {
        let argv = ["flattablesc", "-f", "t", "-n", "Demo", "-p", "Demo", "-G", "-B"];
        assert!(Harness::try_parse_from(argv).is_err());
    }

    #[test]
    fn output_dirs_default_beside_the_namespace() {
        let layout = parse(&[]).layout();
        assert_eq!(layout.out_dir, Path::new("./Demo"));
        assert_eq!(layout.main_dir, Path::new("./Demo_main"));

        let layout = parse(&["--out-dir", "gen/lib"]).layout();
        assert_eq!(layout.out_dir, Path::new("gen/lib"));
        assert_eq!(layout.main_dir, Path::new("./Demo_main"));
    }

    #[test]
    fn formatter_flag() {
        assert_eq!(parse(&[]).formatter, SourceFormatter::default());
        assert_eq!(
            parse(&["--formatter", "none"]).formatter,
            SourceFormatter::Disabled
        );
        assert!(Harness::try_parse_from([
            "flattablesc", "-f", "t", "-n", "Demo", "-p", "Demo", "--formatter", "black"
        ])
        .is_err());
    }
}
