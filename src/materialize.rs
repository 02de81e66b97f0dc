//! Writes an artifact set to disk under a fixed output root.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::output::GeneratedArtifact;

/// Converts an artifact name into a path relative to the output root.
///
/// Only plain components are accepted; absolute paths, `..`, `.`-only names
/// and drive prefixes yield `None`. Forward-slash segments become
/// sub-directories.
pub fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name.trim());
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Writes every artifact under `root`, creating sub-directories as needed.
/// Artifacts with unsafe names are skipped with a warning.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn write_artifacts(root: &Path, artifacts: &[GeneratedArtifact]) -> Result<usize> {
    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create output directory {}", root.display()))?;

    let mut written = 0;
    for artifact in artifacts {
        let Some(relative) = safe_relative_path(&artifact.name) else {
            warn!("Refusing to write artifact with unsafe name {:?}", artifact.name);
            continue;
        };

        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&target, &artifact.content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }

    info!("Wrote {written} files to {}", root.display());
    Ok(written)
}
