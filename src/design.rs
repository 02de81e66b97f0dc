//! The design module turns a design-tool document into bounded design facts:
//! deduplicated colors and text styles, page/section names and components.

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

use crate::constants::{
    DESIGN_API_BASE, DESIGN_MAX_COLORS, DESIGN_MAX_COMPONENTS, DESIGN_MAX_DEPTH,
    DESIGN_MAX_FRAMES_PER_PAGE, DESIGN_MAX_PAGES, DESIGN_MAX_SECTIONS_PER_PAGE,
    DESIGN_MAX_TEXT_STYLES, DESIGN_TOKEN_HEADER,
};
use crate::error::DesignFetchError;

static DESIGN_URL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"figma\.com/(?:design|file|proto|board|slides)/([a-zA-Z0-9_-]{5,60})")
        .expect("Failed to compile DESIGN_URL_KEY regex")
});
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{5,60}$").expect("Failed to compile BARE_KEY regex"));
static NON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile NON_NAME_CHARS regex"));

const DEFAULT_FONT_FAMILY: &str = "Inter";
const DEFAULT_FONT_SIZE: f64 = 16.0;
const DEFAULT_FONT_WEIGHT: f64 = 400.0;

// document -> page -> frame, then the walk itself
const CONVERT_DEPTH: usize = DESIGN_MAX_DEPTH + 3;

/// Container node kinds whose names count as page sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Frame,
    Group,
    Component,
    ComponentSet,
}

impl ContainerKind {
    fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "FRAME" => Some(Self::Frame),
            "GROUP" => Some(Self::Group),
            "COMPONENT" => Some(Self::Component),
            "COMPONENT_SET" => Some(Self::ComponentSet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paint {
    pub kind: Option<String>,
    pub color: Option<Rgba>,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,
}

impl Paint {
    /// A visible solid fill with some opacity left.
    fn solid_color(&self) -> Option<Rgba> {
        if self.kind.as_deref() != Some("SOLID") || self.visible == Some(false) {
            return None;
        }
        if self.opacity == Some(0.0) {
            return None;
        }
        self.color.filter(|color| color.a != Some(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<f64>,
    pub line_height_px: Option<f64>,
    pub letter_spacing: Option<f64>,
}

/// One node of a design document. Every field may be absent.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignNode {
    Container {
        kind: ContainerKind,
        name: Option<String>,
        fills: Vec<Paint>,
        children: Vec<DesignNode>,
    },
    Text {
        name: Option<String>,
        fills: Vec<Paint>,
        style: Option<TypeStyle>,
    },
    Other {
        kind: Option<String>,
        name: Option<String>,
        fills: Vec<Paint>,
        children: Vec<DesignNode>,
    },
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn paint_from_json(value: &Value) -> Paint {
    let color = value.get("color").and_then(|color| {
        Some(Rgba {
            r: number(color, "r")?,
            g: number(color, "g")?,
            b: number(color, "b")?,
            a: number(color, "a"),
        })
    });

    Paint {
        kind: string(value, "type"),
        color,
        opacity: number(value, "opacity"),
        visible: value.get("visible").and_then(Value::as_bool),
    }
}

fn style_from_json(value: &Value) -> TypeStyle {
    TypeStyle {
        font_family: string(value, "fontFamily"),
        font_size: number(value, "fontSize"),
        font_weight: number(value, "fontWeight"),
        line_height_px: number(value, "lineHeightPx"),
        letter_spacing: number(value, "letterSpacing"),
    }
}

impl DesignNode {
    /// Builds a node from loosely-typed JSON, ignoring anything malformed.
    pub fn from_json(value: &Value) -> Self {
        Self::from_json_bounded(value, CONVERT_DEPTH)
    }

    fn from_json_bounded(value: &Value, depth_left: usize) -> Self {
        let kind = string(value, "type");
        let name = string(value, "name");
        let fills = value
            .get("fills")
            .and_then(Value::as_array)
            .map(|fills| fills.iter().map(paint_from_json).collect())
            .unwrap_or_default();

        if kind.as_deref() == Some("TEXT") {
            return DesignNode::Text {
                name,
                fills,
                style: value.get("style").filter(|s| s.is_object()).map(style_from_json),
            };
        }

        let children = match value.get("children").and_then(Value::as_array) {
            Some(children) if depth_left > 0 => children
                .iter()
                .map(|child| Self::from_json_bounded(child, depth_left - 1))
                .collect(),
            _ => Vec::new(),
        };

        match kind.as_deref().and_then(ContainerKind::from_type) {
            Some(container) => DesignNode::Container {
                kind: container,
                name,
                fills,
                children,
            },
            None => DesignNode::Other {
                kind,
                name,
                fills,
                children,
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            DesignNode::Container { name, .. }
            | DesignNode::Text { name, .. }
            | DesignNode::Other { name, .. } => name.as_deref(),
        }
    }

    pub fn fills(&self) -> &[Paint] {
        match self {
            DesignNode::Container { fills, .. }
            | DesignNode::Text { fills, .. }
            | DesignNode::Other { fills, .. } => fills,
        }
    }

    pub fn children(&self) -> &[DesignNode] {
        match self {
            DesignNode::Container { children, .. } | DesignNode::Other { children, .. } => children,
            DesignNode::Text { .. } => &[],
        }
    }

    fn is_container(&self) -> bool {
        matches!(self, DesignNode::Container { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorFact {
    pub name: String,
    pub hex: String,
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleFact {
    pub name: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignPage {
    pub name: String,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Bounded facts extracted from one design document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignFacts {
    pub file_name: String,
    pub colors: Vec<ColorFact>,
    pub text_styles: Vec<TextStyleFact>,
    pub pages: Vec<DesignPage>,
    pub components: Vec<ComponentFact>,
}

/// Deduplicating accumulator threaded through the tree walk.
#[derive(Debug, Default)]
pub struct FactAccumulator {
    colors: Vec<ColorFact>,
    color_keys: HashSet<String>,
    text_styles: Vec<TextStyleFact>,
    text_keys: HashSet<String>,
}

impl FactAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(&self) -> &[ColorFact] {
        &self.colors
    }

    pub fn text_styles(&self) -> &[TextStyleFact] {
        &self.text_styles
    }
}

fn channel_to_hex(value: f64) -> String {
    let byte = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("{byte:02x}")
}

/// `#rrggbb` for channels in `0.0..=1.0`.
pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    format!("#{}{}{}", channel_to_hex(r), channel_to_hex(g), channel_to_hex(b))
}

fn normalize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let normalized = NON_NAME_CHARS.replace_all(&lowered, "-");
    let normalized = normalized.trim_matches('-');
    if normalized.is_empty() {
        "color".to_owned()
    } else {
        normalized.to_owned()
    }
}

/// Collects color and text-style facts from `node` and its descendants down to
/// the depth cap. Facts are keyed by content, so identical styles from different
/// nodes collapse into the first one seen.
pub fn collect_node(node: &DesignNode, facts: &mut FactAccumulator, depth: usize) {
    if depth > DESIGN_MAX_DEPTH {
        return;
    }

    if let Some(color) = node.fills().iter().find_map(Paint::solid_color) {
        let hex = rgb_to_hex(color.r, color.g, color.b);
        if facts.color_keys.insert(hex.clone()) {
            facts.colors.push(ColorFact {
                name: normalize_name(node.name().unwrap_or("color")),
                hex,
                r: color.r,
                g: color.g,
                b: color.b,
                a: color.a.unwrap_or(1.0),
            });
        }
    }

    if let DesignNode::Text {
        name,
        style: Some(style),
        ..
    } = node
    {
        let font_family = style
            .font_family
            .clone()
            .filter(|family| !family.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_owned());
        let font_size = style
            .font_size
            .filter(|size| *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        let font_weight = style
            .font_weight
            .filter(|weight| *weight > 0.0)
            .unwrap_or(DEFAULT_FONT_WEIGHT);

        let key = format!("{font_family}-{font_size}-{font_weight}");
        if facts.text_keys.insert(key) {
            facts.text_styles.push(TextStyleFact {
                name: name.clone().unwrap_or_else(|| "text".to_owned()),
                font_family,
                font_size,
                font_weight,
                line_height_px: style.line_height_px,
                letter_spacing: style.letter_spacing,
            });
        }
    }

    for child in node.children() {
        collect_node(child, facts, depth + 1);
    }
}

/// Extracts design facts from a full design-document JSON body. Never fails.
pub fn extract_design(document: &Value) -> DesignFacts {
    let file_name = string(document, "name")
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Untitled design".to_owned());

    let root = document
        .get("document")
        .map(DesignNode::from_json)
        .unwrap_or(DesignNode::Other {
            kind: None,
            name: None,
            fills: Vec::new(),
            children: Vec::new(),
        });

    let mut facts = FactAccumulator::new();
    let mut pages = Vec::new();
    for page in root.children().iter().take(DESIGN_MAX_PAGES) {
        let mut sections = Vec::new();
        for frame in page.children().iter().take(DESIGN_MAX_FRAMES_PER_PAGE) {
            if frame.is_container()
                && sections.len() < DESIGN_MAX_SECTIONS_PER_PAGE
                && let Some(name) = frame.name()
            {
                sections.push(name.to_owned());
            }
            collect_node(frame, &mut facts, 0);
        }
        pages.push(DesignPage {
            name: page.name().unwrap_or("Untitled page").to_owned(),
            sections,
        });
    }

    let components = document
        .get("components")
        .and_then(Value::as_object)
        .map(|registry| {
            registry
                .values()
                .filter_map(|component| {
                    Some(ComponentFact {
                        name: string(component, "name").filter(|name| !name.is_empty())?,
                        description: string(component, "description")
                            .filter(|description| !description.is_empty()),
                    })
                })
                .take(DESIGN_MAX_COMPONENTS)
                .collect()
        })
        .unwrap_or_default();

    let FactAccumulator {
        mut colors,
        mut text_styles,
        ..
    } = facts;
    colors.truncate(DESIGN_MAX_COLORS);
    text_styles.sort_by(|a, b| b.font_size.total_cmp(&a.font_size));
    text_styles.truncate(DESIGN_MAX_TEXT_STYLES);

    debug!(
        "Design \"{file_name}\": {} colors, {} text styles, {} pages",
        colors.len(),
        text_styles.len(),
        pages.len()
    );

    DesignFacts {
        file_name,
        colors,
        text_styles,
        pages,
        components,
    }
}

/// Extracts the document key from a design-tool URL, or accepts a bare key.
pub fn extract_document_key(source: &str) -> Option<String> {
    let source = source.trim();
    if let Some(captures) = DESIGN_URL_KEY.captures(source) {
        return captures.get(1).map(|key| key.as_str().to_owned());
    }
    BARE_KEY.is_match(source).then(|| source.to_owned())
}

/// Source of design documents.
#[async_trait]
pub trait DesignSource: Send + Sync {
    /// Fetches the full document JSON for `key`.
    ///
    /// # Errors
    ///
    /// Returns a reason-specific error for bad tokens, missing access, unknown
    /// or rejected keys, timeouts and unreachable or failing APIs.
    async fn fetch_document(&self, key: &str, token: &str) -> Result<Value, DesignFetchError>;
}

/// `DesignSource` over the design tool's REST API.
pub struct HttpDesignSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDesignSource {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: DESIGN_API_BASE.to_owned(),
            timeout,
        })
    }
}

#[async_trait]
impl DesignSource for HttpDesignSource {
    async fn fetch_document(&self, key: &str, token: &str) -> Result<Value, DesignFetchError> {
        info!("Fetching design document {key}");
        let response = self
            .client
            .get(format!("{}/{key}", self.base_url))
            .header(DESIGN_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    DesignFetchError::Timeout {
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    DesignFetchError::Unreachable(err.to_string())
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            400 => return Err(DesignFetchError::Rejected { key: key.to_owned() }),
            401 => return Err(DesignFetchError::InvalidToken),
            403 => return Err(DesignFetchError::NoAccess),
            404 => return Err(DesignFetchError::NotFound),
            405 => return Err(DesignFetchError::MethodRejected { key: key.to_owned() }),
            _ if !status.is_success() => {
                return Err(DesignFetchError::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("unknown error").to_owned(),
                });
            }
            _ => {}
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| DesignFetchError::Decode(err.to_string()))
    }
}
