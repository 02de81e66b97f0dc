//! The links module decides which hrefs the crawler may follow and how a page
//! path turns into an output filename and a navigation label.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::{Origin, Url};

static NON_HTML_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(pdf|jpg|jpeg|png|gif|svg|webp|mp4|zip|doc|docx|xml|rss|json)$")
        .expect("Failed to compile NON_HTML_EXTENSION regex")
});

static NON_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^a-z0-9-]").expect("Failed to compile NON_FILENAME_CHARS regex"));

static REPEATED_DASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-+").expect("Failed to compile REPEATED_DASHES regex"));

const SKIPPED_PREFIXES: [&str; 4] = ["#", "javascript:", "mailto:", "tel:"];

/// Resolves `href` against `base` and admits it only if it is a same-origin,
/// HTML-looking target. The returned URL has fragment and query removed and is
/// therefore usable as a dedup key.
pub fn resolve_href(href: &str, origin: &Origin, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || SKIPPED_PREFIXES.iter().any(|prefix| href.starts_with(prefix)) {
        return None;
    }

    let resolved = base.join(href).ok()?;
    if &resolved.origin() != origin {
        return None;
    }
    if NON_HTML_EXTENSION.is_match(resolved.path()) {
        return None;
    }

    Some(dedup_key(&resolved))
}

/// Strips fragment and query so that `/about#team` and `/about?x=1` are the same page.
pub fn dedup_key(url: &Url) -> Url {
    let mut key = url.clone();
    key.set_fragment(None);
    key.set_query(None);
    key
}

/// Flattens a URL path into an output filename, e.g. `/services/web-design`
/// becomes `services-web-design.html`. The empty path becomes `index.html`.
pub fn path_to_filename(path: &str) -> String {
    let trimmed = path.trim_matches('/').replace('/', "-");
    let flat = NON_FILENAME_CHARS.replace_all(&trimmed, "-");
    let flat = REPEATED_DASHES.replace_all(&flat, "-");

    if flat.is_empty() {
        "index.html".to_owned()
    } else {
        format!("{flat}.html")
    }
}

/// Human label from the last path segment, e.g. `/about-us` becomes `About Us`.
pub fn path_to_label(path: &str) -> String {
    let segment = match path.split('/').filter(|s| !s.is_empty()).next_back() {
        Some(segment) => segment,
        None => return "Home".to_owned(),
    };

    segment
        .replace(['-', '_'], " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hands out output filenames that are unique within one crawl.
#[derive(Debug, Default)]
pub struct FilenameRegistry {
    taken: HashSet<String>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `wanted` if free, otherwise the first free `stem-N.ext` with N ≥ 2.
    pub fn claim(&mut self, wanted: &str) -> String {
        if self.taken.insert(wanted.to_owned()) {
            return wanted.to_owned();
        }

        let (stem, ext) = match wanted.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{ext}")),
            None => (wanted, String::new()),
        };

        let mut counter = 2;
        loop {
            let candidate = format!("{stem}-{counter}{ext}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
