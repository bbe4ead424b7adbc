//! Post-render text cleanup
//!
//! [`tidy`] removes the blank-line and trailing-whitespace debris that
//! template control blocks leave behind. It is purely textual. Every rule
//! shortens the text, so repeated application always reaches a fixed point.
//!
//! Rust artefacts are then offered to a [`SourceFormatter`]. A formatter
//! that is missing or fails is not an error: the tidied text is kept and a
//! warning is returned alongside it.

use std::io::Write as _;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Literal rewrites, applied in order.
const RULES: &[(&str, &str)] = &[
    ("\r\n", "\n"),
    (" \n", "\n"),
    ("\t\n", "\n"),
    ("\n\n\n", "\n\n"),
    ("{\n\n", "{\n"),
    ("(\n\n", "(\n"),
    ("[\n\n", "[\n"),
    ("\n\n}", "\n}"),
    ("\n\n    }", "\n    }"),
    ("\n\n        }", "\n        }"),
    ("\n\n\t}", "\n\t}"),
    ("\n\n)", "\n)"),
    ("\n\n    )", "\n    )"),
];

/// Apply every rule until none changes the text, then end with exactly
/// one newline.
pub fn tidy(text: &str) -> String {
    let mut out = text.to_string();
    loop {
        let before = out.len();
        for (from, to) in RULES {
            while out.contains(from) {
                out = out.replace(from, to);
            }
        }
        if out.len() == before {
            break;
        }
    }

    let trimmed = out.trim_end_matches('\n');
    if trimmed.is_empty() {
        return String::new();
    }
    let mut out = trimmed.trim_start_matches('\n').to_string();
    out.push('\n');
    out
}

// ── Formatter ─────────────────────────────────────────────────────────────────

/// How Rust artefacts are formatted after tidying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormatter {
    /// External `rustfmt`, fed through stdin.
    Rustfmt { program: String },
    /// In-process `syn` + `prettyplease`. Drops non-doc comments in item
    /// bodies; the leading comment header is preserved.
    Prettyplease,
    Disabled,
}

impl Default for SourceFormatter {
    fn default() -> Self {
        SourceFormatter::Rustfmt {
            program: "rustfmt".to_string(),
        }
    }
}

impl std::str::FromStr for SourceFormatter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rustfmt" => Ok(SourceFormatter::default()),
            "prettyplease" => Ok(SourceFormatter::Prettyplease),
            "none" | "off" => Ok(SourceFormatter::Disabled),
            other => Err(format!(
                "unknown formatter '{other}' (expected rustfmt, prettyplease or none)"
            )),
        }
    }
}

/// Format `text`, falling back to it unchanged on failure.
///
/// Returns the text to write and, if formatting failed, why.
pub fn format_source(text: &str, formatter: &SourceFormatter) -> (String, Option<String>) {
    let result = match formatter {
        SourceFormatter::Disabled => return (text.to_string(), None),
        SourceFormatter::Rustfmt { program } => run_rustfmt(program, text),
        SourceFormatter::Prettyplease => run_prettyplease(text),
    };

    match result {
        Ok(formatted) => {
            debug!("formatted {} bytes", formatted.len());
            (formatted, None)
        }
        Err(reason) => {
            warn!("formatter unavailable, keeping tidied output: {reason}");
            (text.to_string(), Some(reason))
        }
    }
}

fn run_rustfmt(program: &str, text: &str) -> Result<String, String> {
    let mut child = Command::new(program)
        .args(["--edition", "2021", "--emit", "stdout"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("cannot run {program}: {e}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| format!("writing to {program}: {e}"))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("waiting for {program}: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{program} exited with {}: {}", output.status, stderr.trim()));
    }
    String::from_utf8(output.stdout).map_err(|e| format!("{program} produced invalid UTF-8: {e}"))
}

fn run_prettyplease(text: &str) -> Result<String, String> {
    let (header, body) = split_header(text);
    let file = syn::parse_file(body).map_err(|e| format!("generated source does not parse: {e}"))?;
    let mut out = String::with_capacity(text.len());
    out.push_str(header);
    out.push_str(&prettyplease::unparse(&file));
    Ok(out)
}

/// Split off the leading run of `//` comment lines and blank lines.
fn split_header(text: &str) -> (&str, &str) {
    let mut end = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || (trimmed.starts_with("//") && !trimmed.starts_with("///") && !trimmed.starts_with("//!")) {
            end += line.len();
        } else {
            break;
        }
    }
    text.split_at(end)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
