//! Table Output Formatting

use colored::Colorize;
use flattables::{GenerationReport, WriteOutcome};
use tabled::{builder::Builder, settings::Style};

/// Format the artefacts of a run as a table
pub fn format_report_table(report: &GenerationReport) -> String {
    if report.artifacts.is_empty() {
        return "No artefacts generated".to_string();
    }

    let mut builder = Builder::default();

    builder.push_record(vec!["Task", "Category", "Path", "Bytes", "Outcome"]);

    for artifact in &report.artifacts {
        let outcome = match artifact.outcome {
            WriteOutcome::Written => artifact.outcome.to_string().green().to_string(),
            WriteOutcome::Unchanged => artifact.outcome.to_string().dimmed().to_string(),
            WriteOutcome::DryRun => artifact.outcome.to_string().yellow().to_string(),
        };

        builder.push_record(vec![
            artifact.task.to_string(),
            artifact.category.to_string(),
            artifact.path.display().to_string(),
            artifact.bytes.to_string(),
            outcome,
        ]);
    }

    builder.build().with(Style::modern()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flattables::{ArtifactCategory, ArtifactReport};
    use std::path::PathBuf;

    #[test]
    fn lists_every_artifact() {
        colored::control::set_override(false);
        let artifact = |task, path: &str, outcome| ArtifactReport {
            task,
            category: ArtifactCategory::FlatBuffers,
            path: PathBuf::from(path),
            bytes: 42,
            outcome,
            formatter_warning: None,
            contents: String::new(),
            is_schema: false,
        };
        let report = GenerationReport {
            namespace: "Demo".into(),
            dry_run: false,
            artifacts: vec![
                artifact("schema", "Demo/Demo.fbs", WriteOutcome::Written),
                artifact("rows", "Demo/Demo_rows.rs", WriteOutcome::Unchanged),
            ],
        };

        let text = format_report_table(&report);
        assert!(text.contains("Demo/Demo.fbs"));
        assert!(text.contains("Demo/Demo_rows.rs"));
        assert!(text.contains("written"));
        assert!(text.contains("unchanged"));
    }

    #[test]
    fn empty_report() {
        let report = GenerationReport {
            namespace: "Demo".into(),
            dry_run: true,
            artifacts: vec![],
        };
        assert_eq!(format_report_table(&report), "No artefacts generated");
    }
}
