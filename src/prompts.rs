//! Fixed prompt templates and the bounded fact summaries embedded in them.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

use crate::crawl::SiteFacts;
use crate::design::DesignFacts;
use crate::extract::PageRecord;

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT — wrap every file in exactly this tag format and nothing else:
<file name="path/to/file.ext">
full file content
</file>"#;

const SITE_CONTEXT_TEMPLATE: &str = r#"## Site Context
Root URL: {root_url}
Site name: {site_name}
Description: {description}
Language: {lang}
Colours detected: {colors}
Fonts detected: {fonts}

## Full site navigation (all {page_count} pages):
{page_list}

## Nav HTML to reuse in EVERY page (set class="active" on the current page):
<nav class="site-nav">
  <div class="container nav__inner">
    <a href="index.html" class="nav__logo">{site_name}</a>
    <button class="nav__toggle js-nav-toggle" aria-expanded="false" aria-label="Menu">☰</button>
    <ul class="nav__links" id="nav-links">
{nav_items}
    </ul>
  </div>
</nav>

## Footer HTML to reuse in EVERY page:
<footer class="site-footer">
  <div class="container footer__grid">
    <div class="footer__brand"><strong>{site_name}</strong><p>{short_description}</p></div>
    <div class="footer__links"><h4>Pages</h4><ul>{footer_items}</ul></div>
    <div class="footer__contact"><h4>Contact</h4><p>hello@{host}</p></div>
  </div>
  <div class="footer__bottom"><div class="container"><p>© {year} {site_name}. All rights reserved.</p></div></div>
</footer>

RULES FOR ALL PAGES:
- Link tokens.css, then styles.css, then <script src="main.js" defer> in every <head>
- lang="{lang}", meta charset, viewport, a unique meta description per page
- Mark the current page nav link with class="active" aria-current="page"
- Semantic HTML5: <header><nav>, <main>, <section>, <article>, <footer>
- BEM class names. No Lorem ipsum; write copy matching the site's industry and tone
- Use emoji for icons (no icon libraries)"#;

const HTML_BATCH_TEMPLATE: &str = r#"You are a senior frontend developer rebuilding a website as clean semantic HTML.

{shared_context}

## Generate these {count} HTML page(s), each a COMPLETE standalone HTML document:

{file_instructions}

Each file must be a complete <!DOCTYPE html> document with <head> (charset, viewport, title, meta description, css/js links) and a full <body> built from that page's data. Never truncate a page.

{output_format}"#;

const SITE_ASSETS_TEMPLATE: &str = r#"Generate the complete CSS, design tokens and JavaScript for a {page_count}-page static site rebuild of "{site_name}".

Site: {site_name} — {description}
Pages: {page_labels}
Detected colours: {colors}
Detected fonts: {fonts}
Key headings from the site: {key_headings}

<file name="tokens.css">
CSS custom properties: --color-primary, --color-secondary, --color-accent from the DETECTED colours (or a brand-appropriate palette), a neutral scale 50–900, semantic colours, font stacks (body: {body_font}), a fluid type scale with clamp(), weights, a spacing scale, radii, shadows, transitions, z-index scale and container widths.
</file>

<file name="styles.css">
A COMPLETE production stylesheet covering every element used across the {page_count} pages: reset, layout container, sticky header, navigation with hamburger toggle and active state, hero, feature/service/pricing/testimonial/team/blog grids and cards, FAQ, contact form, CTA banner, footer, buttons, utilities, fade-in animation classes and responsive breakpoints at 1024/768/640/480px. BEM throughout, no frameworks.
</file>

<file name="main.js">
'use strict';
Vanilla JS for all pages: mobile nav toggle (aria-expanded, outside click and Escape close), sticky header shadow, scroll progress bar, FAQ accordion, smooth anchor scrolling, IntersectionObserver fade-in with stagger, contact form submit feedback, back-to-top button, active nav highlight from the current filename. No globals, no libraries.
</file>

{output_format}"#;

const THEME_DESIGN_SYSTEM_TEMPLATE: &str = r#"You are a senior WordPress theme developer. Generate a complete design system based on this design file.

## Design file: "{file_name}"
## Theme: {project} (slug: {slug})

### Colours extracted from the design:
{color_list}

### Typography extracted from the design:
{text_style_list}
Primary body font: {body_font}
Primary heading font: {heading_font}
All fonts used: {font_list}

### Pages: {page_names}
### Component names: {component_list}

Generate EXACTLY these two files:
- tokens.css: every design colour as a CSS custom property (--color-name: hex), plus spacing scale, radii, shadows and font stacks using ONLY the design values.
- style.css: MUST start with the WordPress theme comment block (Theme Name, Description, Version, Text Domain), then import tokens.css, then a complete stylesheet: reset, body, container, sticky header and nav with hamburger toggle, hero, features, services, pricing, testimonials, team, FAQ, contact form, blog grid, footer, responsive breakpoints, utilities.
- Use the EXACT hex values above. Body font "{body_font}", headings "{heading_font}". BEM class names, no frameworks.

{output_format}"#;

const THEME_SHARED_TEMPLATE: &str = r#"Theme: "{project}" (slug: {slug}, text-domain: {slug})
Primary: {primary} | Secondary: {secondary} | Font: {body_font}
Design sections: {section_list} | Components: {component_list}
RULES: esc_html()/esc_url()/esc_attr()/wp_kses_post() on all output. __() with the {slug} text domain for strings. get_field() for ACF. No TODOs."#;

const THEME_LAYOUT_TEMPLATE: &str = r#"WordPress theme developer. Generate 3 COMPLETE PHP files.
{shared}

<file name="functions.php">
Theme setup (title-tag, post-thumbnails, html5, custom-logo, primary and footer menus, wide alignment, responsive embeds); enqueue tokens.css, style.css and js/main.js (defer); register the {slug}_service, {slug}_team and {slug}_testimonial post types; a primary sidebar; hero, card-thumbnail and team-avatar image sizes; 25-word excerpts; remove the generator tag; localize ajaxurl and a nonce.
</file>

<file name="header.php">
Doctype, language_attributes(), head with wp_head(), body_class(), a sticky site header with logo fallback to the site name, an accessible nav toggle and the primary menu, then open <main id="main" class="site-main">.
</file>

<file name="footer.php">
Close </main>; footer grid with brand and social links from theme mods, the footer menu, the latest 4 {slug}_service posts and contact details; a bottom bar with the copyright year and privacy/terms links; wp_footer().
</file>

{output_format}"#;

const THEME_TEMPLATES_TEMPLATE: &str = r#"WordPress theme developer. Generate 4 COMPLETE PHP template files.
{shared}

<file name="page.php">
Flexible-content page: loop over the ACF page_sections rows rendering hero, features_grid, testimonials, cta_banner, services_grid ({slug}_service), team_grid ({slug}_team) and content_block layouts; fall back to the_content().
</file>

<file name="single.php">
Single post: featured image hero, breadcrumb, title, author/date/reading-time meta, content, tags, 3 related posts from the same category via template-parts/card-post, comments.
</file>

<file name="archive.php">
Archive hero with title and description, a grid of template-parts/card-post, an empty state and pagination.
</file>

<file name="index.php">
Blog index: hero, post grid plus sidebar (primary sidebar or recent posts and categories), pagination.
</file>

{output_format}"#;

const THEME_UTILITY_TEMPLATE: &str = r#"WordPress theme developer. Generate 3 COMPLETE PHP files.
{shared}

<file name="search.php">
Search results hero with the query and result count, the search form, a card grid, a helpful empty state and pagination.
</file>

<file name="404.php">
Friendly not-found page with links home and to the contact page, the search form and a list of recent pages.
</file>

<file name="template-parts/card-post.php">
Card partial: thumbnail or placeholder, category and date meta, linked title, 20-word excerpt and a read-more link, all escaped.
</file>

{output_format}"#;

const THEME_CONFIG_TEMPLATE: &str = r#"Generate three config/asset files for the WordPress theme "{project}" (slug: {slug}).

Design components found: {component_list}
Design pages/sections: {section_list}
Primary colour: {primary}, secondary: {secondary}

<file name="acf-fields.json">
A valid ACF v6 JSON array with field groups: Hero Section (pages), Page Sections flexible content (features_grid, testimonials, cta_banner, team_grid, services_list, content_block), Service Details (post_type {slug}_service) and Team Member (post_type {slug}_team). Field keys field_{slug}_<id>, group keys group_{slug}_<name>.
</file>

<file name="js/main.js">
'use strict';
Vanilla JS: mobile nav toggle, sticky header shadow, FAQ accordion, smooth scrolling, staggered IntersectionObserver fade-in for cards, contact form feedback, back-to-top button, reading progress bar. Self-invoking functions, no globals.
</file>

<file name="README.md">
Installation and usage guide for the {project} theme: requirements (WordPress 6+, PHP 8+, ACF PRO 6), installation and ACF import steps, menus, the design system (primary {primary}, secondary {secondary}, body font {body_font}, heading font {heading_font}), the file structure, custom post types and field groups.
</file>

{output_format}"#;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("Failed to compile placeholder regex"));

/// Replaces `{key}` placeholders in `template` in a single pass.
///
/// Inserted values are never scanned again; unknown placeholders stay as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .iter()
                .find(|(key, _)| caps.get(1).is_some_and(|name| name.as_str() == *key))
                .map_or_else(
                    || caps.get(0).map_or("", |whole| whole.as_str()).to_owned(),
                    |(_, value)| (*value).to_owned(),
                )
        })
        .into_owned()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn or_placeholder(list: String, placeholder: &str) -> String {
    if list.is_empty() {
        placeholder.to_owned()
    } else {
        list
    }
}

/// Lowercase, hyphen-separated identifier for a project name.
pub fn theme_slug(project_name: &str) -> String {
    let slug = project_name
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "theme".to_owned()
    } else {
        slug
    }
}

/// One-line summary of a crawled page.
pub fn summarize_page(page: &PageRecord) -> String {
    let headings = page
        .headings
        .iter()
        .take(6)
        .cloned()
        .collect::<Vec<_>>()
        .join(" | ");
    let sections = page
        .sections
        .iter()
        .take(4)
        .map(|section| format!("\"{}\": {}", section.heading, truncate_chars(&section.body, 120)))
        .collect::<Vec<_>>()
        .join(" · ");

    format!(
        "{} — \"{}\" — headings: {} — sections: {}",
        page.filename,
        page.title,
        or_placeholder(headings, "(none)"),
        if sections.is_empty() {
            truncate_chars(&page.body_preview, 200)
        } else {
            sections
        }
    )
}

fn site_name<'a>(facts: &'a SiteFacts, project_name: &'a str) -> &'a str {
    if facts.site_title.is_empty() {
        project_name
    } else {
        &facts.site_title
    }
}

fn detected_colors(facts: &SiteFacts) -> String {
    or_placeholder(
        facts.colors.iter().take(15).cloned().collect::<Vec<_>>().join(", "),
        "(none — choose a brand-appropriate palette)",
    )
}

fn detected_fonts(facts: &SiteFacts) -> String {
    or_placeholder(
        facts.fonts.iter().take(4).cloned().collect::<Vec<_>>().join(", "),
        "(none — use Inter for body)",
    )
}

/// Shared site context injected into every HTML batch prompt.
pub fn site_context(project_name: &str, facts: &SiteFacts, year: i32) -> String {
    let name = site_name(facts, project_name);
    let host = url::Url::parse(&facts.root_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_else(|| "example.com".to_owned());

    let page_list = facts
        .pages
        .iter()
        .map(|page| format!("  {} → {}", page.nav_label, page.filename))
        .collect::<Vec<_>>()
        .join("\n");
    let nav_items = facts
        .pages
        .iter()
        .map(|page| format!("      <li><a href=\"{}\">{}</a></li>", page.filename, page.nav_label))
        .collect::<Vec<_>>()
        .join("\n");
    let footer_items = facts
        .pages
        .iter()
        .map(|page| format!("<li><a href=\"{}\">{}</a></li>", page.filename, page.nav_label))
        .collect::<String>();

    fill(
        SITE_CONTEXT_TEMPLATE,
        &[
            ("root_url", facts.root_url.as_str()),
            ("site_name", name),
            ("description", facts.site_description.as_str()),
            ("short_description", truncate_chars(&facts.site_description, 120).as_str()),
            ("lang", facts.lang.as_str()),
            ("colors", detected_colors(facts).as_str()),
            ("fonts", detected_fonts(facts).as_str()),
            ("page_count", facts.pages.len().to_string().as_str()),
            ("page_list", page_list.as_str()),
            ("nav_items", nav_items.as_str()),
            ("footer_items", footer_items.as_str()),
            ("host", host.as_str()),
            ("year", year.to_string().as_str()),
        ],
    )
}

/// Prompt generating every page of `batch` as an independent document.
pub fn html_batch_prompt(shared_context: &str, batch: &[PageRecord]) -> String {
    let file_instructions = batch
        .iter()
        .map(|page| {
            format!(
                "<file name=\"{filename}\">\nComplete, full HTML page for: {label}\nSource page data: {summary}\nInclude the shared nav (mark {filename} as active) and the shared footer.\n</file>",
                filename = page.filename,
                label = page.nav_label,
                summary = summarize_page(page),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    fill(
        HTML_BATCH_TEMPLATE,
        &[
            ("shared_context", shared_context),
            ("count", batch.len().to_string().as_str()),
            ("file_instructions", file_instructions.as_str()),
            ("output_format", OUTPUT_FORMAT),
        ],
    )
}

/// Prompt generating the shared stylesheet, tokens and script of a crawled site.
pub fn site_assets_prompt(project_name: &str, facts: &SiteFacts) -> String {
    let page_labels = facts
        .pages
        .iter()
        .map(|page| page.nav_label.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let key_headings = facts
        .pages
        .iter()
        .flat_map(|page| page.headings.iter().take(2))
        .take(10)
        .cloned()
        .collect::<Vec<_>>()
        .join(" | ");
    let body_font = facts.fonts.first().map_or("Inter", String::as_str);

    fill(
        SITE_ASSETS_TEMPLATE,
        &[
            ("page_count", facts.pages.len().to_string().as_str()),
            ("site_name", site_name(facts, project_name)),
            ("description", facts.site_description.as_str()),
            ("page_labels", page_labels.as_str()),
            ("colors", detected_colors(facts).as_str()),
            ("fonts", detected_fonts(facts).as_str()),
            ("key_headings", key_headings.as_str()),
            ("body_font", body_font),
            ("output_format", OUTPUT_FORMAT),
        ],
    )
}

/// Bounded view of the design facts used by every theme prompt.
#[derive(Debug, Clone)]
pub struct DesignSummary {
    pub project: String,
    pub slug: String,
    pub file_name: String,
    pub color_list: String,
    pub text_style_list: String,
    pub primary: String,
    pub secondary: String,
    pub body_font: String,
    pub heading_font: String,
    pub font_list: String,
    pub page_names: String,
    pub section_list: String,
    pub component_list: String,
}

impl DesignSummary {
    pub fn new(project_name: &str, facts: &DesignFacts) -> Self {
        let top_colors: Vec<_> = facts.colors.iter().take(20).collect();
        let color_list = top_colors
            .iter()
            .map(|color| format!("  {}: {}", color.name, color.hex))
            .collect::<Vec<_>>()
            .join("\n");
        let primary = top_colors
            .first()
            .map_or("#1a3cff", |color| color.hex.as_str())
            .to_owned();
        let secondary = top_colors
            .get(1)
            .map_or("#ff6b2b", |color| color.hex.as_str())
            .to_owned();

        let body_font = facts
            .text_styles
            .first()
            .map_or("Inter", |style| style.font_family.as_str())
            .to_owned();
        let heading_font = facts
            .text_styles
            .iter()
            .find(|style| style.font_size >= 28.0)
            .map_or(body_font.as_str(), |style| style.font_family.as_str())
            .to_owned();

        let mut seen = HashSet::new();
        let font_list = facts
            .text_styles
            .iter()
            .map(|style| style.font_family.as_str())
            .filter(|family| seen.insert(*family))
            .collect::<Vec<_>>()
            .join(", ");

        let text_style_list = facts
            .text_styles
            .iter()
            .take(10)
            .map(|style| {
                format!(
                    "  {}: {} {}px / weight {}",
                    style.name, style.font_family, style.font_size, style.font_weight
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            project: project_name.to_owned(),
            slug: theme_slug(project_name),
            file_name: facts.file_name.clone(),
            color_list: or_placeholder(color_list, "  (none found — choose a palette)"),
            text_style_list: or_placeholder(text_style_list, "  (none found — use Inter)"),
            primary,
            secondary,
            body_font,
            heading_font,
            font_list: or_placeholder(font_list, "Inter"),
            page_names: facts
                .pages
                .iter()
                .map(|page| page.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            section_list: facts
                .pages
                .iter()
                .flat_map(|page| page.sections.iter().map(String::as_str))
                .take(20)
                .collect::<Vec<_>>()
                .join(", "),
            component_list: facts
                .components
                .iter()
                .take(20)
                .map(|component| component.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn shared(&self) -> String {
        fill(
            THEME_SHARED_TEMPLATE,
            &[
                ("project", self.project.as_str()),
                ("slug", self.slug.as_str()),
                ("primary", self.primary.as_str()),
                ("secondary", self.secondary.as_str()),
                ("body_font", self.body_font.as_str()),
                ("section_list", self.section_list.as_str()),
                ("component_list", self.component_list.as_str()),
            ],
        )
    }

    pub fn design_system_prompt(&self) -> String {
        fill(
            THEME_DESIGN_SYSTEM_TEMPLATE,
            &[
                ("file_name", self.file_name.as_str()),
                ("project", self.project.as_str()),
                ("slug", self.slug.as_str()),
                ("color_list", self.color_list.as_str()),
                ("text_style_list", self.text_style_list.as_str()),
                ("body_font", self.body_font.as_str()),
                ("heading_font", self.heading_font.as_str()),
                ("font_list", self.font_list.as_str()),
                ("page_names", self.page_names.as_str()),
                ("component_list", self.component_list.as_str()),
                ("output_format", OUTPUT_FORMAT),
            ],
        )
    }

    pub fn layout_prompt(&self) -> String {
        self.templated(THEME_LAYOUT_TEMPLATE)
    }

    pub fn templates_prompt(&self) -> String {
        self.templated(THEME_TEMPLATES_TEMPLATE)
    }

    pub fn utility_prompt(&self) -> String {
        self.templated(THEME_UTILITY_TEMPLATE)
    }

    pub fn config_prompt(&self) -> String {
        fill(
            THEME_CONFIG_TEMPLATE,
            &[
                ("project", self.project.as_str()),
                ("slug", self.slug.as_str()),
                ("component_list", self.component_list.as_str()),
                ("section_list", self.section_list.as_str()),
                ("primary", self.primary.as_str()),
                ("secondary", self.secondary.as_str()),
                ("body_font", self.body_font.as_str()),
                ("heading_font", self.heading_font.as_str()),
                ("output_format", OUTPUT_FORMAT),
            ],
        )
    }

    fn templated(&self, template: &str) -> String {
        fill(
            template,
            &[
                ("shared", self.shared().as_str()),
                ("slug", self.slug.as_str()),
                ("output_format", OUTPUT_FORMAT),
            ],
        )
    }
}
