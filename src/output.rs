//! @ai:module:intent Format run reports for different formats (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_run_report, to_json
//! @ai:module:depends_on report
//! @ai:module:stateless true

use crate::report::{FileReport, RunReport};
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format a run report as a string
/// @ai:effects pure
pub fn format_run_report(report: &RunReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(report, false),
        OutputFormat::JsonPretty => to_json(report, true),
        OutputFormat::Text => format_run_report_text(report),
    }
}

/// @ai:intent Format a run report as human-readable text
/// @ai:effects pure
fn format_run_report_text(report: &RunReport) -> String {
    let mut output = String::new();

    for file in report.files.iter().filter(|f| f.is_changed()) {
        output.push_str(&format_file_text(file, report.dry_run));
    }

    for failure in &report.failures {
        output.push_str(&format!(
            "{} {} - {} ({})\n",
            "ERROR".red().bold(),
            failure.path.display().to_string().dimmed(),
            failure.message,
            failure.phase.dimmed()
        ));
    }

    if !output.is_empty() {
        output.push('\n');
    }

    let verb = if report.dry_run { "Would update" } else { "Updated" };
    output.push_str(&format!(
        "{} {} fields in {} of {} files\n",
        verb,
        report.fields_changed(),
        report.files_changed(),
        report.files.len() + report.failures.len()
    ));

    if report.passed() {
        output.push_str(&format!("{} No errors\n", "OK".green().bold()));
    } else {
        output.push_str(&format!(
            "{} files failed\n",
            report.failures.len().to_string().red().bold()
        ));
    }

    output
}

fn format_file_text(file: &FileReport, dry_run: bool) -> String {
    let mut output = format!("{}", file.path.display().to_string().bold());
    if dry_run {
        output.push_str(&format!(" {}", "(dry run)".yellow()));
    }
    output.push('\n');

    for change in &file.changes {
        let owner = match &change.struct_name {
            Some(name) => format!("{}.{}", name, change.field),
            None => change.field.clone(),
        };
        output.push_str(&format!(
            "  {} (line {})\n    {} {}\n    {} {}\n",
            owner.cyan(),
            change.line,
            "-".red(),
            change.old_tag.dimmed(),
            "+".green(),
            change.new_tag
        ));
    }

    if file.directives_removed > 0 {
        output.push_str(&format!(
            "  {} {} directive comments removed\n",
            "hint:".cyan(),
            file.directives_removed
        ));
    }

    output
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}
