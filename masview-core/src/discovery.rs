//! Report discovery and manifest generation
//!
//! Each source keeps its runs under `<root>/<output_dir>/<experiment>/`.
//! The report sits either directly in the experiment directory or one level
//! deeper, in a run directory whose name starts with a known prefix:
//!
//! ```text
//! public/
//! ├── output_qwen/
//! │   └── output_20251208_1530_a1_0000_45-55/
//! │       └── mas_report.json
//! └── output_chatgpt/
//!     └── case_12/
//!         └── output_20251209_0912/
//!             └── mas_report.json
//! ```

use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::types::{ExperimentIndexItem, Source};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// How reports are located inside an experiment directory
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub report_file: String,
    pub nested_prefix: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from(&DiscoveryConfig::default())
    }
}

impl From<&DiscoveryConfig> for DiscoveryOptions {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            report_file: config.report_file.clone(),
            nested_prefix: config.nested_prefix.clone(),
        }
    }
}

/// Human title for an experiment directory.
///
/// Names like `output_20251208_1530_a1_0000_45-55` carry a case id and a
/// range in their last two tokens; shorter names are used as-is.
pub fn experiment_title(dir_name: &str) -> String {
    let parts: Vec<&str> = dir_name.split('_').collect();
    if parts.len() >= 5 {
        let case_id = parts[parts.len() - 2];
        let range = parts[parts.len() - 1];
        format!("{} ({})", case_id, range)
    } else {
        dir_name.to_string()
    }
}

fn glob_dirs(path: &Path, pattern_suffix: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&path.to_string_lossy()),
        pattern_suffix
    );
    let entries = glob::glob(&pattern).map_err(|e| Error::Discovery {
        path: path.to_path_buf(),
        message: format!("invalid glob pattern: {}", e),
    })?;
    Ok(entries.flatten().filter(|p| p.is_dir()).collect())
}

/// Find the report of one experiment directory.
///
/// Returns the report path on disk and its web-root relative path.
fn locate_report(
    experiment_dir: &Path,
    dir_name: &str,
    source: Source,
    options: &DiscoveryOptions,
) -> Result<Option<(PathBuf, String)>> {
    let direct = experiment_dir.join(&options.report_file);
    if direct.is_file() {
        let web_path = format!(
            "/{}/{}/{}",
            source.output_dir(),
            dir_name,
            options.report_file
        );
        return Ok(Some((direct, web_path)));
    }

    let nested_pattern = format!("{}*", Pattern::escape(&options.nested_prefix));
    let Some(nested_dir) = glob_dirs(experiment_dir, &nested_pattern)?.into_iter().next() else {
        return Ok(None);
    };
    let Some(nested_name) = nested_dir.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };

    let nested = nested_dir.join(&options.report_file);
    if !nested.is_file() {
        return Ok(None);
    }
    let web_path = format!(
        "/{}/{}/{}/{}",
        source.output_dir(),
        dir_name,
        nested_name,
        options.report_file
    );
    Ok(Some((nested, web_path)))
}

/// Discover every report of one source under `root`.
///
/// A missing source directory is not an error; it simply has no runs.
pub fn discover_reports(
    root: &Path,
    source: Source,
    options: &DiscoveryOptions,
) -> Result<Vec<ExperimentIndexItem>> {
    let base = root.join(source.output_dir());
    if !base.is_dir() {
        tracing::warn!(path = %base.display(), "Source directory not found");
        return Ok(vec![]);
    }

    let mut items = Vec::new();
    for experiment_dir in glob_dirs(&base, "*")? {
        let Some(dir_name) = experiment_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        match locate_report(&experiment_dir, dir_name, source, options)? {
            Some((report_path, web_path)) => items.push(ExperimentIndexItem {
                id: dir_name.to_string(),
                source,
                title: experiment_title(dir_name),
                path: web_path,
                full_path: report_path.to_string_lossy().to_string(),
            }),
            None => {
                tracing::debug!(dir = %experiment_dir.display(), "No report in experiment directory");
            }
        }
    }

    Ok(items)
}

/// Discover reports for all sources, qwen first.
pub fn build_manifest(root: &Path, options: &DiscoveryOptions) -> Result<Vec<ExperimentIndexItem>> {
    let mut manifest = Vec::new();
    for source in Source::ALL {
        let items = discover_reports(root, source, options)?;
        tracing::info!(source = %source, experiments = items.len(), "Discovered reports");
        manifest.extend(items);
    }
    Ok(manifest)
}

/// Write the manifest as pretty JSON, creating parent directories.
pub fn write_manifest(path: &Path, items: &[ExperimentIndexItem]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json)?;
    Ok(())
}
