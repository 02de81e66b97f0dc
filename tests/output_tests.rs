use shipwright::output::{ArtifactKind, GeneratedArtifact, parse_files};
use spectral::prelude::*;

#[test]
fn tagged_blocks_are_parsed_in_order() {
    let response = "Here you go:\n<file name=\"index.html\">\n<!doctype html>\n<p>Hi</p>\n</file>\n\n<file name=\"css/site.css\">\nbody { margin: 0; }\n</file>";

    let files = parse_files(response);

    assert_that(&files).is_equal_to(vec![
        GeneratedArtifact::new("index.html", "<!doctype html>\n<p>Hi</p>"),
        GeneratedArtifact::new("css/site.css", "body { margin: 0; }"),
    ]);
}

#[test]
fn tagged_parsing_is_idempotent() {
    let response = "<file name=\"a.js\">\nconsole.log(1);\n</file><file name=\"b.md\">\n# B\n</file>";

    assert_that(&parse_files(response)).is_equal_to(parse_files(response));
}

#[test]
fn empty_tagged_blocks_are_dropped() {
    let response = "<file name=\"empty.php\">\n\n</file><file name=\"page.php\">\n<?php get_header(); ?>\n</file>";

    let files = parse_files(response);

    assert_that(&files).has_length(1);
    assert_that(&files[0].name.as_str()).is_equal_to("page.php");
}

#[test]
fn only_leading_and_trailing_newlines_are_trimmed_from_tagged_content() {
    let response = "<file name=\"x.html\">\r\n  <div>\n    indented\n  </div>\r\n</file>";

    let files = parse_files(response);

    assert_that(&files[0].content.as_str()).is_equal_to("  <div>\n    indented\n  </div>");
}

#[test]
fn fenced_block_after_backticked_name_with_colon() {
    let response = "Sure! `styles.css:`\n```css\n:root { --brand: #123456; }\n```\n";

    let files = parse_files(response);

    assert_that(&files).is_equal_to(vec![GeneratedArtifact::new(
        "styles.css",
        ":root { --brand: #123456; }",
    )]);
}

#[test]
fn fenced_blocks_with_bold_names() {
    let response = "**header.php**\n```php\n<header></header>\n```\n\nAnd **template-parts/card-post.php**:\n```php\n<article></article>\n```";

    let files = parse_files(response);

    assert_that(&files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>())
        .is_equal_to(vec!["header.php", "template-parts/card-post.php"]);
}

#[test]
fn fenced_block_without_a_name_is_skipped() {
    let response = "Here is some code:\n```js\nconsole.log('x');\n```";

    assert_that(&parse_files(response)).is_empty();
}

#[test]
fn tagged_blocks_take_precedence_over_fences() {
    let response = "`other.css`\n```css\na{}\n```\n<file name=\"main.css\">\nb{}\n</file>";

    let files = parse_files(response);

    assert_that(&files).has_length(1);
    assert_that(&files[0].name.as_str()).is_equal_to("main.css");
}

#[test]
fn plain_prose_yields_nothing() {
    assert_that(&parse_files("I could not do that, sorry.")).is_empty();
}

#[test]
fn artifact_kind_and_size() {
    let small = GeneratedArtifact::new("theme/style.CSS", "a{}");
    let large = GeneratedArtifact::new("acf-fields.json", "x".repeat(2048));

    assert_that(&small.kind()).is_equal_to(ArtifactKind::Css);
    assert_that(&small.display_size()).is_equal_to("3 B".to_owned());
    assert_that(&large.kind()).is_equal_to(ArtifactKind::Json);
    assert_that(&large.display_size()).is_equal_to("2.0 KB".to_owned());
    assert_that(&GeneratedArtifact::new("LICENSE", "").kind()).is_equal_to(ArtifactKind::Other);
}
