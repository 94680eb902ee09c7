//! Main orchestration logic.

use crate::cli::{Args, OutputFormat, Threshold};
use crate::config::{Config, ConfigError};
use crate::output::{CheckSummary, FormattedDiagnostic, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::fs;
use thiserror::Error;
use uiml_script::NodeIdGenerator;
use uiml_transform::{compile, CompileOptions, Diagnostic, Severity};
use walkdir::WalkDir;

/// Directories that are never checked.
const DEFAULT_IGNORES: [&str; 3] = ["**/node_modules/**", "**/dist/**", "**/.git/**"];

/// Orchestration errors.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum OrchestratorError {
    /// The workspace directory does not exist.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(Utf8PathBuf),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Diagnostics of one checked file.
#[derive(Debug)]
pub struct FileReport {
    /// The path relative to the workspace.
    pub path: Utf8PathBuf,
    pub source: String,
    /// Diagnostics at or above the threshold.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the check on all files.
pub fn run(args: &Args) -> Result<CheckSummary, OrchestratorError> {
    let workspace = resolve_workspace(&args.workspace);
    if !workspace.is_dir() {
        return Err(OrchestratorError::WorkspaceNotFound(workspace));
    }

    let config = Config::load(&workspace, args.config.as_deref())?;
    let mut ignores = config.exclude.clone();
    ignores.extend(args.ignore.iter().cloned());
    let ignore_set = build_ignore_set(&ignores)?;

    let files = find_files(&workspace, &config.file_extensions(), &ignore_set);
    log::debug!("found {} files in {}", files.len(), workspace);

    let options = CompileOptions {
        parse_events: config.compile.parse_events,
        simplify: config.compile.simplify || args.simplify,
        ..CompileOptions::default()
    };
    let reports = check_files(&workspace, &files, &options, args.threshold);

    let mut summary = CheckSummary {
        file_count: files.len(),
        fail_on_warnings: args.fail_on_warnings,
        ..CheckSummary::default()
    };
    for diag in reports.iter().flat_map(|report| &report.diagnostics) {
        match diag.severity {
            Severity::Error => summary.error_count += 1,
            Severity::Warning => summary.warning_count += 1,
        }
    }

    if args.output == OutputFormat::Json {
        let json: Vec<FormattedDiagnostic> = reports
            .iter()
            .flat_map(|report| Formatter::format_json_diagnostics(&report.diagnostics, &report.path, &report.source))
            .collect();
        let json = serde_json::to_string_pretty(&json).unwrap_or_else(|_| "[]".to_string());
        println!("{}", json);
    } else {
        let formatter = Formatter::new(args.output);
        for report in &reports {
            print!("{}", formatter.format(&report.diagnostics, &report.path, &report.source));
        }
        println!("{}", summary.format());
    }

    Ok(summary)
}

fn resolve_workspace(workspace: &Utf8Path) -> Utf8PathBuf {
    if workspace.is_relative() {
        std::env::current_dir()
            .ok()
            .and_then(|dir| Utf8PathBuf::try_from(dir).ok())
            .unwrap_or_default()
            .join(workspace)
    } else {
        workspace.to_owned()
    }
}

/// Builds the set of ignored paths from user patterns and the defaults.
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(String::as_str).chain(DEFAULT_IGNORES) {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Finds the files to check, sorted by path.
pub fn find_files(workspace: &Utf8Path, extensions: &[&str], ignore_set: &GlobSet) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| {
            let file_name = p.file_name().unwrap_or("");
            extensions.iter().any(|ext| file_name.ends_with(ext))
        })
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p);
            !ignore_set.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    files
}

/// Compiles every file in parallel and keeps the diagnostics at or above
/// `threshold`. Files without diagnostics are left out.
pub fn check_files(
    workspace: &Utf8Path,
    files: &[Utf8PathBuf],
    options: &CompileOptions,
    threshold: Threshold,
) -> Vec<FileReport> {
    let ids = NodeIdGenerator::new();
    files
        .par_iter()
        .filter_map(|file_path| {
            let source = match fs::read_to_string(file_path) {
                Ok(source) => source,
                Err(e) => {
                    log::warn!("failed to read {file_path}: {e}");
                    return None;
                }
            };
            let path = file_path.strip_prefix(workspace).unwrap_or(file_path).to_owned();
            let options = CompileOptions {
                file_name: Some(path.to_string()),
                ids: ids.clone(),
                ..options.clone()
            };

            let mut diagnostics = compile(&source, &options).diagnostics;
            diagnostics.retain(|diag| include_severity(diag.severity, threshold));
            log::trace!("{path}: {} diagnostics", diagnostics.len());

            if diagnostics.is_empty() {
                None
            } else {
                Some(FileReport {
                    path,
                    source,
                    diagnostics,
                })
            }
        })
        .collect()
}

fn include_severity(severity: Severity, threshold: Threshold) -> bool {
    match threshold {
        Threshold::Error => severity == Severity::Error,
        Threshold::Warning => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn workspace(files: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        for (path, content) in files {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (dir, root)
    }

    #[test]
    fn test_find_files_respects_ignores() {
        let (_dir, root) = workspace(&[
            ("Main.xmlui", "<App />"),
            ("components/Card.xmlui", "<Component name='Card'><Text /></Component>"),
            ("legacy/Old.xmlui", "<App />"),
            ("node_modules/pkg/Lib.xmlui", "<App />"),
            ("notes.txt", "<App />"),
        ]);
        let ignore_set = build_ignore_set(&["legacy/**".to_string()]).unwrap();
        let files = find_files(&root, &[".xmlui"], &ignore_set);
        let relative: Vec<&str> = files.iter().map(|p| p.strip_prefix(&root).unwrap().as_str()).collect();
        assert_eq!(relative, vec!["Main.xmlui", "components/Card.xmlui"]);
    }

    #[test]
    fn test_invalid_glob() {
        let error = build_ignore_set(&["a/[".to_string()]).unwrap_err();
        assert!(matches!(error, OrchestratorError::InvalidGlob(_)));
    }

    #[test]
    fn test_check_files_threshold() {
        let (_dir, root) = workspace(&[
            ("Clean.xmlui", "<App><Text>ok</Text></App>"),
            ("Warn.xmlui", "<App Label='x' />"),
            ("Broken.xmlui", "<App><Button onClick='{ foo(bar }' /></App>"),
        ]);
        let files = find_files(&root, &[".xmlui"], &build_ignore_set(&[]).unwrap());
        assert_eq!(files.len(), 3);

        let options = CompileOptions::default();
        let mut reports = check_files(&root, &files, &options, Threshold::Warning);
        reports.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<&str> = reports.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Broken.xmlui", "Warn.xmlui"]);
        assert_eq!(reports[0].diagnostics[0].code.as_str(), "T012");
        assert_eq!(reports[1].diagnostics[0].code.as_str(), "U005");

        let reports = check_files(&root, &files, &options, Threshold::Error);
        assert_eq!(reports.len(), 1);
    }
}
