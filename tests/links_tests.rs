use shipwright::links::{FilenameRegistry, dedup_key, path_to_label, resolve_href};
use spectral::prelude::*;
use url::Url;

fn base() -> Url {
    Url::parse("https://studio.test/work/").expect("valid base")
}

fn resolve(href: &str) -> Option<String> {
    let base = base();
    resolve_href(href, &base.origin(), &base).map(|url| url.to_string())
}

#[test]
fn fragment_and_query_collapse_to_one_key() {
    assert_that(&resolve("/about#team")).is_equal_to(Some("https://studio.test/about".to_owned()));
    assert_that(&resolve("/about?x=1")).is_equal_to(Some("https://studio.test/about".to_owned()));

    let url = Url::parse("https://studio.test/about?utm=1#top").expect("valid url");
    assert_that(&dedup_key(&url).as_str()).is_equal_to("https://studio.test/about");
}

#[test]
fn relative_hrefs_resolve_against_the_page() {
    assert_that(&resolve("case-study")).is_equal_to(Some("https://studio.test/work/case-study".to_owned()));
    assert_that(&resolve("../contact")).is_equal_to(Some("https://studio.test/contact".to_owned()));
}

#[test]
fn cross_origin_targets_are_rejected() {
    assert_that(&resolve("https://elsewhere.test/about")).is_none();
    assert_that(&resolve("http://studio.test/about")).is_none();
    assert_that(&resolve("https://studio.test:8443/about")).is_none();
}

#[test]
fn non_page_schemes_and_fragments_are_rejected() {
    for href in ["#pricing", "javascript:void(0)", "mailto:hi@studio.test", "tel:+100", "  "] {
        assert_that(&resolve(href)).named(href).is_none();
    }
}

#[test]
fn non_html_extensions_are_rejected() {
    for href in ["/brochure.pdf", "/img/Hero.JPG", "/feed.xml", "/data.json", "/pack.zip"] {
        assert_that(&resolve(href)).named(href).is_none();
    }
    assert_that(&resolve("/blog/post.html")).is_some();
}

#[test]
fn labels_come_from_the_last_segment() {
    assert_that(&path_to_label("/about-us")).is_equal_to("About Us".to_owned());
    assert_that(&path_to_label("/services/web_design/")).is_equal_to("Web Design".to_owned());
    assert_that(&path_to_label("/")).is_equal_to("Home".to_owned());
}

#[test]
fn colliding_filenames_get_a_counter() {
    let mut registry = FilenameRegistry::new();

    assert_that(&registry.claim("about.html")).is_equal_to("about.html".to_owned());
    assert_that(&registry.claim("about.html")).is_equal_to("about-2.html".to_owned());
    assert_that(&registry.claim("about.html")).is_equal_to("about-3.html".to_owned());
    assert_that(&registry.claim("README")).is_equal_to("README".to_owned());
    assert_that(&registry.claim("README")).is_equal_to("README-2".to_owned());
}
