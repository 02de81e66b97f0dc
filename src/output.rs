//! The output module turns one model response into named artifacts.
//!
//! Responses are expected to use `<file name="…">…</file>` blocks. When a
//! response contains none, fenced code blocks preceded by a filename are used
//! instead.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TAGGED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<file name="([^"]+)">([\s\S]*?)</file>"#)
        .expect("Failed to compile TAGGED_BLOCK regex")
});
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[\w-]*\r?\n([\s\S]*?)```").expect("Failed to compile FENCED_BLOCK regex")
});
static TRAILING_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[`*_]*([a-z0-9._/-]+\.[a-z]{2,5})[`*_]*\s*[:–-]?[`*_]*\s*$")
        .expect("Failed to compile TRAILING_FILENAME regex")
});

/// How far back from a fenced block the fallback looks for a filename, in bytes.
const FILENAME_WINDOW: usize = 120;

/// One named unit of generated text. The name comes from the model and is
/// not trusted as a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub name: String,
    pub content: String,
}

/// Artifact category derived from the name's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Css,
    Php,
    Json,
    Js,
    Markdown,
    Other,
}

impl GeneratedArtifact {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        let extension = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "html" | "htm" => ArtifactKind::Html,
            "css" => ArtifactKind::Css,
            "php" => ArtifactKind::Php,
            "json" => ArtifactKind::Json,
            "js" | "mjs" => ArtifactKind::Js,
            "md" => ArtifactKind::Markdown,
            _ => ArtifactKind::Other,
        }
    }

    /// Size of the content as `123 B` or `4.5 KB`.
    pub fn display_size(&self) -> String {
        let bytes = self.content.len();
        if bytes < 1024 {
            format!("{bytes} B")
        } else {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        }
    }
}

/// Parses every artifact out of a model response. Never fails; an empty
/// result means nothing recognizable was found.
pub fn parse_files(response: &str) -> Vec<GeneratedArtifact> {
    let tagged: Vec<GeneratedArtifact> = TAGGED_BLOCK
        .captures_iter(response)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str().trim();
            let content = captures.get(2)?.as_str().trim_matches(['\r', '\n']);
            (!name.is_empty() && !content.is_empty())
                .then(|| GeneratedArtifact::new(name, content))
        })
        .collect();

    if !tagged.is_empty() {
        return tagged;
    }

    parse_fenced_files(response)
}

fn parse_fenced_files(response: &str) -> Vec<GeneratedArtifact> {
    FENCED_BLOCK
        .captures_iter(response)
        .filter_map(|captures| {
            let block = captures.get(0)?;
            let mut window_start = block.start().saturating_sub(FILENAME_WINDOW);
            while !response.is_char_boundary(window_start) {
                window_start += 1;
            }
            let before = response.get(window_start..block.start())?;

            let name = TRAILING_FILENAME.captures(before)?.get(1)?.as_str();
            let content = captures.get(1)?.as_str().trim();
            (!content.is_empty()).then(|| GeneratedArtifact::new(name, content))
        })
        .collect()
}
