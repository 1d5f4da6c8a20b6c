//! Image path resolution

use crate::types::{Source, SquadTag};

/// Resolve a raw image path for the given source.
///
/// Qwen runs log paths relative to their output directory, so they get the
/// `output_qwen/` prefix (once). ChatGPT runs already log fully-qualified
/// relative paths and are returned unchanged.
pub fn resolve_path(path: &str, source: Source) -> String {
    let prefix = format!("{}/", Source::Qwen.output_dir());
    match source {
        Source::Qwen if !path.starts_with(&prefix) => format!("{prefix}{path}"),
        _ => path.to_string(),
    }
}

/// Select the images shown in the final phase.
///
/// For qwen runs with a known run directory, the three squad renders
/// (`<run_dir>/squad_<tag>.png`) are prepended one by one unless a declared
/// image already ends with that file name. The combined list is then narrowed
/// to squad renders, falling back to everything when none match. Every
/// surviving path is resolved.
pub fn final_render_paths(
    declared: &[String],
    run_dir: Option<&str>,
    source: Source,
) -> Vec<String> {
    let mut images: Vec<String> = declared.to_vec();

    if let (Source::Qwen, Some(run_dir)) = (source, run_dir) {
        for tag in SquadTag::ALL {
            let file_name = tag.result_file_name();
            if !images.iter().any(|existing| existing.ends_with(file_name)) {
                images.insert(0, format!("{run_dir}/{file_name}"));
            }
        }
    }

    let squad_renders: Vec<&String> = images
        .iter()
        .filter(|image| {
            let lower = image.to_lowercase();
            SquadTag::ALL
                .iter()
                .any(|tag| lower.contains(tag.result_file_name()))
        })
        .collect();

    if squad_renders.is_empty() {
        images.iter().map(|p| resolve_path(p, source)).collect()
    } else {
        squad_renders
            .into_iter()
            .map(|p| resolve_path(p, source))
            .collect()
    }
}
