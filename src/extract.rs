//! Content extraction from one fetched HTML document.
//!
//! Both entry points are pure and never fail: anything missing from the markup
//! degrades to an empty value.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::{Origin, Url};

use crate::constants::{
    BODY_PREVIEW_CHARS, MAX_COLORS, MAX_FONTS, MAX_FOOTER_LINKS, MAX_HEADINGS, MAX_NAV_LINKS,
    MAX_SECTIONS, SECTION_BODY_CHARS,
};
use crate::links::{path_to_filename, path_to_label, resolve_href};

fn selector(query: &str) -> Selector {
    Selector::parse(query).expect("Static selector must be valid")
}

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="og:description"]"#));
static HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h1, h2, h3"));
static H2: Lazy<Selector> = Lazy::new(|| selector("h2"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static ANY_ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static HTML_ROOT: Lazy<Selector> = Lazy::new(|| selector("html"));
static NAV: Lazy<Selector> = Lazy::new(|| selector(r#"nav, header, [role="navigation"]"#));
static FOOTER: Lazy<Selector> = Lazy::new(|| selector("footer"));
static STYLE: Lazy<Selector> = Lazy::new(|| selector("style"));
static PREVIEW_CANDIDATES: Lazy<[Selector; 4]> = Lazy::new(|| {
    [
        selector("main"),
        selector("article"),
        selector(r#"[role="main"]"#),
        selector("body"),
    ]
});

static HEX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[0-9a-fA-F]{3,8}\b").expect("Failed to compile HEX_LITERAL regex"));
static CUSTOM_PROPERTY_HEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"--[\w-]+:\s*(#[0-9a-fA-F]{3,8})")
        .expect("Failed to compile CUSTOM_PROPERTY_HEX regex")
});
static GOOGLE_FONTS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)fonts\.googleapis\.com/css[^"']+"#)
        .expect("Failed to compile GOOGLE_FONTS_URL regex")
});
static FAMILY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"family=([^&]+)").expect("Failed to compile FAMILY_PARAM regex"));
static FONT_FAMILY_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)font-family\s*:\s*['"]?([^'";,}{]+)"#)
        .expect("Failed to compile FONT_FAMILY_DECLARATION regex")
});

/// One `h2` heading paired with the text of the paragraph that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// One crawled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub path: String,
    pub filename: String,
    pub nav_label: String,
    pub title: String,
    pub description: String,
    pub headings: Vec<String>,
    pub sections: Vec<Section>,
    pub body_preview: String,
}

/// A page record together with the same-origin links found on it.
#[derive(Debug, Clone)]
pub struct PageExtract {
    pub page: PageRecord,
    pub links: Vec<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub text: String,
    pub href: String,
}

/// Site-wide signals, only ever taken from the root document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFacts {
    pub site_title: String,
    pub site_description: String,
    pub nav_links: Vec<NavLink>,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub footer_links: Vec<String>,
    pub lang: String,
}

/// Collapses runs of whitespace and trims.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn push_unique(items: &mut Vec<String>, item: String, max: usize) {
    if items.len() < max && !items.contains(&item) {
        items.push(item);
    }
}

fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(clean_text)
}

/// Extracts the page record and outbound same-origin links from one document.
pub fn extract_page(html: &str, url: &Url, origin: &Origin) -> PageExtract {
    let document = Html::parse_document(html);
    let path = url.path().to_owned();

    let title = first_text(&document, &TITLE);
    let description = first_attr(&document, &META_DESCRIPTION, "content")
        .or_else(|| first_attr(&document, &OG_DESCRIPTION, "content"))
        .unwrap_or_default();

    let mut headings = Vec::new();
    for element in document.select(&HEADINGS) {
        let text = element_text(element);
        let length = text.chars().count();
        if (3..=120).contains(&length) {
            push_unique(&mut headings, text, MAX_HEADINGS);
        }
    }

    let sections = document
        .select(&H2)
        .take(MAX_SECTIONS)
        .filter_map(|h2| {
            let heading = element_text(h2);
            if heading.chars().count() < 3 {
                return None;
            }
            let body = h2
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| sibling.value().name() == "p")
                .map(|paragraph| truncate_chars(&element_text(paragraph), SECTION_BODY_CHARS))
                .unwrap_or_default();
            Some(Section { heading, body })
        })
        .collect();

    let body_preview = PREVIEW_CANDIDATES
        .iter()
        .find_map(|candidate| document.select(candidate).next())
        .map(element_text)
        .unwrap_or_else(|| clean_text(&document.root_element().text().collect::<String>()));

    let links = document
        .select(&ANCHORS)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_href(href, origin, url))
        .collect();

    PageExtract {
        page: PageRecord {
            url: url.to_string(),
            filename: path_to_filename(&path),
            nav_label: path_to_label(&path),
            path,
            title,
            description,
            headings,
            sections,
            body_preview: truncate_chars(&body_preview, BODY_PREVIEW_CHARS),
        },
        links,
    }
}

/// Extracts site-wide signals (title, navigation, palette, fonts, footer, language).
pub fn extract_global(html: &str) -> GlobalFacts {
    let document = Html::parse_document(html);

    let lang = document
        .select(&HTML_ROOT)
        .next()
        .and_then(|root| root.value().attr("lang"))
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or("en")
        .to_owned();

    let mut nav_links = Vec::new();
    if let Some(nav) = document.select(&NAV).next() {
        for anchor in nav.select(&ANY_ANCHOR) {
            let text = element_text(anchor);
            let href = anchor.value().attr("href").unwrap_or_default().trim();
            if nav_links.len() < MAX_NAV_LINKS
                && !text.is_empty()
                && text.chars().count() < 50
                && !href.is_empty()
            {
                nav_links.push(NavLink {
                    text,
                    href: href.to_owned(),
                });
            }
        }
    }

    let style_blocks: Vec<String> = document
        .select(&STYLE)
        .map(|style| style.text().collect())
        .collect();

    let mut colors = Vec::new();
    for block in &style_blocks {
        for hex in HEX_LITERAL.find_iter(block) {
            push_unique(&mut colors, hex.as_str().to_lowercase(), MAX_COLORS);
        }
    }
    for captures in CUSTOM_PROPERTY_HEX.captures_iter(html) {
        if let Some(hex) = captures.get(1) {
            push_unique(&mut colors, hex.as_str().to_lowercase(), MAX_COLORS);
        }
    }

    let mut fonts = Vec::new();
    for font_url in GOOGLE_FONTS_URL.find_iter(html) {
        for family in FAMILY_PARAM.captures_iter(font_url.as_str()) {
            let Some(family) = family.get(1) else {
                continue;
            };
            for entry in family.as_str().split('|') {
                let name = entry
                    .split(':')
                    .next()
                    .unwrap_or_default()
                    .replace('+', " ")
                    .trim()
                    .to_owned();
                if !name.is_empty() {
                    push_unique(&mut fonts, name, MAX_FONTS);
                }
            }
        }
    }
    for block in &style_blocks {
        for captures in FONT_FAMILY_DECLARATION.captures_iter(block) {
            let Some(declared) = captures.get(1) else {
                continue;
            };
            let name = declared
                .as_str()
                .replace(['"', '\''], "")
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_owned();
            if !name.is_empty() && name.chars().count() < 40 {
                push_unique(&mut fonts, name, MAX_FONTS);
            }
        }
    }

    let mut footer_links = Vec::new();
    if let Some(footer) = document.select(&FOOTER).next() {
        for anchor in footer.select(&ANY_ANCHOR) {
            let text = element_text(anchor);
            if !text.is_empty() && text.chars().count() < 60 {
                push_unique(&mut footer_links, text, MAX_FOOTER_LINKS);
            }
        }
    }

    GlobalFacts {
        site_title: first_text(&document, &TITLE),
        site_description: first_attr(&document, &META_DESCRIPTION, "content").unwrap_or_default(),
        nav_links,
        colors,
        fonts,
        footer_links,
        lang,
    }
}
