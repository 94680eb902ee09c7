//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8Path;
use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode};
use serde::Serialize;
use source_map::{LineCol, LineIndex, Span};
use std::fmt;
use uiml_transform::{Diagnostic, Severity};

/// A formatted diagnostic for output.
#[derive(Debug, Serialize)]
pub struct FormattedDiagnostic {
    /// The diagnostic type (Error, Warning).
    #[serde(rename = "type")]
    pub diagnostic_type: String,
    /// The file path.
    pub filename: String,
    /// The start position.
    pub start: Position,
    /// The end position.
    pub end: Position,
    /// The message.
    pub message: String,
    /// The diagnostic code.
    pub code: String,
}

/// A position in the source.
#[derive(Debug, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    }
}

/// A diagnostic paired with its file, rendered through miette.
struct SourceReport {
    diagnostic: Diagnostic,
    source: NamedSource<String>,
}

impl fmt::Debug for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceReport").field("diagnostic", &self.diagnostic).finish()
    }
}

impl fmt::Display for SourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostic.message)
    }
}

impl std::error::Error for SourceReport {}

fn source_span(span: Span) -> miette::SourceSpan {
    (span.start_usize(), span.len_usize()).into()
}

impl miette::Diagnostic for SourceReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.diagnostic.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let mut labels = vec![LabeledSpan::at(source_span(self.diagnostic.span), "here")];
        if let Some(context) = self.diagnostic.context.filter(|c| *c != self.diagnostic.span) {
            labels.push(LabeledSpan::at(source_span(context), "related"));
        }
        Some(Box::new(labels.into_iter()))
    }
}

/// Formats diagnostics for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a collection of diagnostics.
    pub fn format(&self, diagnostics: &[Diagnostic], file_path: &Utf8Path, source: &str) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(diagnostics, file_path, source),
            OutputFormat::HumanVerbose => self.format_human_verbose(diagnostics, file_path, source),
            OutputFormat::Json => {
                let formatted = Self::format_json_diagnostics(diagnostics, file_path, source);
                serde_json::to_string_pretty(&formatted).unwrap_or_default()
            }
            OutputFormat::Machine => self.format_machine(diagnostics, file_path, source),
        }
    }

    fn format_human(&self, diagnostics: &[Diagnostic], file_path: &Utf8Path, source: &str) -> String {
        let line_index = LineIndex::new(source);
        let mut output = String::new();

        for diag in diagnostics {
            let start = line_index.line_col(diag.span.start).unwrap_or(LineCol::new(0, 0));
            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n\n",
                file_path,
                start.line + 1,
                start.col + 1,
                severity_label(diag.severity),
                diag.message,
                diag.code
            ));
        }

        output
    }

    /// Renders every diagnostic as a miette report with a source snippet.
    fn format_human_verbose(&self, diagnostics: &[Diagnostic], file_path: &Utf8Path, source: &str) -> String {
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        let mut output = String::new();

        for diag in diagnostics {
            let report = SourceReport {
                diagnostic: diag.clone(),
                source: NamedSource::new(file_path.as_str(), source.to_string()),
            };
            if handler.render_report(&mut output, &report).is_err() {
                output.push_str(&format!("{}: {} ({})\n", file_path, diag.message, diag.code));
            }
            output.push('\n');
        }

        output
    }

    /// Formats diagnostics into JSON-ready structs.
    pub fn format_json_diagnostics(
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> Vec<FormattedDiagnostic> {
        let line_index = LineIndex::new(source);
        diagnostics
            .iter()
            .map(|diag| {
                let start = line_index.line_col(diag.span.start).unwrap_or(LineCol::new(0, 0));
                let end = line_index.line_col(diag.span.end).unwrap_or(LineCol::new(0, 0));

                FormattedDiagnostic {
                    diagnostic_type: severity_label(diag.severity).to_string(),
                    filename: file_path.to_string(),
                    start: Position {
                        line: start.line + 1,
                        column: start.col + 1,
                        offset: u32::from(diag.span.start),
                    },
                    end: Position {
                        line: end.line + 1,
                        column: end.col + 1,
                        offset: u32::from(diag.span.end),
                    },
                    message: diag.message.clone(),
                    code: diag.code.to_string(),
                }
            })
            .collect()
    }

    fn format_machine(&self, diagnostics: &[Diagnostic], file_path: &Utf8Path, source: &str) -> String {
        let line_index = LineIndex::new(source);
        let mut output = String::new();

        for diag in diagnostics {
            let start = line_index.line_col(diag.span.start).unwrap_or(LineCol::new(0, 0));
            let end = line_index.line_col(diag.span.end).unwrap_or(LineCol::new(0, 0));

            output.push_str(&format!(
                "{} {}:{}:{}:{}:{} {} ({})\n",
                diag.severity.as_str().to_uppercase(),
                file_path,
                start.line + 1,
                start.col + 1,
                end.line + 1,
                end.col + 1,
                diag.message,
                diag.code
            ));
        }

        output
    }
}

/// Summary of a check run.
#[derive(Debug, Default)]
pub struct CheckSummary {
    /// Number of files checked.
    pub file_count: usize,
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Whether to fail on warnings.
    pub fail_on_warnings: bool,
}

impl CheckSummary {
    /// Returns true if the run should exit with a failure code.
    pub fn failed(&self) -> bool {
        self.error_count > 0 || (self.fail_on_warnings && self.warning_count > 0)
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{count} {word}")
            } else {
                format!("{count} {word}s")
            }
        };
        format!(
            "====================================\nuiml-check found {} and {} in {}",
            plural(self.error_count, "error"),
            plural(self.warning_count, "warning"),
            plural(self.file_count, "file"),
        )
    }
}
