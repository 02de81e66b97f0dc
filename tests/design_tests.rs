use serde_json::{Value, json};
use shipwright::design::{DesignNode, FactAccumulator, collect_node, extract_design, extract_document_key};
use spectral::prelude::*;

fn frame(name: &str, fills: Value, children: Vec<Value>) -> Value {
    json!({ "type": "FRAME", "name": name, "fills": fills, "children": children })
}

fn solid(r: f64, g: f64, b: f64) -> Value {
    json!([{ "type": "SOLID", "color": { "r": r, "g": g, "b": b } }])
}

fn text(name: &str, style: Value) -> Value {
    json!({ "type": "TEXT", "name": name, "style": style })
}

fn document(pages: Vec<Value>) -> Value {
    json!({
        "name": "Brand Site",
        "document": { "type": "DOCUMENT", "children": pages },
        "components": {
            "1:2": { "name": "Button", "description": "Primary action" },
            "1:3": { "name": "Card", "description": "" }
        }
    })
}

fn page(name: &str, frames: Vec<Value>) -> Value {
    json!({ "type": "CANVAS", "name": name, "children": frames })
}

#[test]
fn same_hex_with_and_without_alpha_is_one_color() {
    let tree = DesignNode::from_json(&frame(
        "Root",
        json!([]),
        vec![
            frame("Red", json!([{ "type": "SOLID", "color": { "r": 1, "g": 0, "b": 0 } }]), vec![]),
            frame(
                "Red Again",
                json!([{ "type": "SOLID", "color": { "r": 1, "g": 0, "b": 0, "a": 1 } }]),
                vec![],
            ),
        ],
    ));
    let mut facts = FactAccumulator::new();

    collect_node(&tree, &mut facts, 0);

    assert_that(&facts.colors().len()).is_equal_to(1);
    assert_that(&facts.colors()[0].hex.as_str()).is_equal_to("#ff0000");
    assert_that(&facts.colors()[0].name.as_str()).is_equal_to("red");
}

#[test]
fn only_visible_opaque_solid_fills_count() {
    let tree = DesignNode::from_json(&frame(
        "Root",
        json!([]),
        vec![
            frame("Hidden", json!([{ "type": "SOLID", "visible": false, "color": { "r": 0, "g": 0, "b": 1 } }]), vec![]),
            frame("Clear", json!([{ "type": "SOLID", "color": { "r": 0, "g": 1, "b": 0, "a": 0 } }]), vec![]),
            frame("Faded", json!([{ "type": "SOLID", "opacity": 0, "color": { "r": 1, "g": 1, "b": 0 } }]), vec![]),
            frame("Gradient", json!([{ "type": "GRADIENT_LINEAR" }]), vec![]),
            frame(
                "Layered",
                json!([
                    { "type": "IMAGE" },
                    { "type": "SOLID", "color": { "r": 0.2, "g": 0.4, "b": 0.6 } },
                    { "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1 } }
                ]),
                vec![],
            ),
        ],
    ));
    let mut facts = FactAccumulator::new();

    collect_node(&tree, &mut facts, 0);

    let hexes: Vec<&str> = facts.colors().iter().map(|c| c.hex.as_str()).collect();
    assert_that(&hexes).is_equal_to(vec!["#336699"]);
}

#[test]
fn text_styles_fall_back_to_defaults_and_deduplicate() {
    let tree = DesignNode::from_json(&frame(
        "Root",
        json!([]),
        vec![
            text("Body", json!({})),
            text("Body copy", json!({ "fontFamily": "Inter", "fontSize": 16, "fontWeight": 400 })),
            text("Title", json!({ "fontFamily": "Lora", "fontSize": 48, "fontWeight": 700, "lineHeightPx": 56 })),
        ],
    ));
    let mut facts = FactAccumulator::new();

    collect_node(&tree, &mut facts, 0);

    let styles = facts.text_styles();
    assert_that(&styles.len()).is_equal_to(2);
    assert_that(&styles[0].name.as_str()).is_equal_to("Body");
    assert_that(&styles[0].font_family.as_str()).is_equal_to("Inter");
    assert_that(&styles[0].font_size).is_equal_to(16.0);
    assert_that(&styles[0].font_weight).is_equal_to(400.0);
    assert_that(&styles[1].line_height_px).is_equal_to(Some(56.0));
}

#[test]
fn traversal_stops_below_the_depth_cap() {
    // chain of frames, level N filled with a distinct color
    let mut node = frame("Level 8", solid(0.0, 0.0, 8.0 / 255.0), vec![]);
    for level in (0..8).rev() {
        node = frame(
            &format!("Level {level}"),
            solid(0.0, 0.0, f64::from(level) / 255.0),
            vec![node],
        );
    }
    let tree = DesignNode::from_json(&node);
    let mut facts = FactAccumulator::new();

    collect_node(&tree, &mut facts, 0);

    assert_that(&facts.colors().len()).is_equal_to(7);
    assert_that(&facts.colors().last().map(|c| c.hex.as_str())).is_equal_to(Some("#000006"));
}

#[test]
fn malformed_nodes_degrade_gracefully() {
    let tree = DesignNode::from_json(&json!({
        "name": 42,
        "fills": "not a list",
        "children": [null, { "type": "SOLID" }, { "fills": [{ "type": "SOLID", "color": { "r": "x" } }] }]
    }));
    let mut facts = FactAccumulator::new();

    collect_node(&tree, &mut facts, 0);

    assert_that(&tree.name()).is_none();
    assert_that(&tree.children().len()).is_equal_to(3);
    assert_that(&facts.colors().is_empty()).is_true();
}

#[test]
fn document_facts_pages_sections_and_components() {
    let facts = extract_design(&document(vec![
        page(
            "Home",
            vec![
                frame("Hero", solid(1.0, 1.0, 1.0), vec![text("Heading", json!({ "fontSize": 40 }))]),
                frame("Features", json!([]), vec![]),
                text("Loose note", json!({ "fontSize": 12 })),
                json!({ "type": "GROUP", "name": "Footer" }),
            ],
        ),
        page("Blog", vec![]),
    ]));

    assert_that(&facts.file_name.as_str()).is_equal_to("Brand Site");
    assert_that(&facts.pages[0].sections).is_equal_to(vec![
        "Hero".to_owned(),
        "Features".to_owned(),
        "Footer".to_owned(),
    ]);
    assert_that(&facts.pages[1].name.as_str()).is_equal_to("Blog");
    assert_that(&facts.colors).has_length(1);

    let sizes: Vec<f64> = facts.text_styles.iter().map(|s| s.font_size).collect();
    assert_that(&sizes).is_equal_to(vec![40.0, 12.0]);

    let mut components: Vec<(String, Option<String>)> = facts
        .components
        .iter()
        .map(|c| (c.name.clone(), c.description.clone()))
        .collect();
    components.sort();
    assert_that(&components).is_equal_to(vec![
        ("Button".to_owned(), Some("Primary action".to_owned())),
        ("Card".to_owned(), None),
    ]);
}

#[test]
fn document_caps_pages_frames_and_sections() {
    let frames: Vec<Value> = (0..30).map(|i| frame(&format!("Frame {i}"), json!([]), vec![])).collect();
    let pages: Vec<Value> = (0..25).map(|i| page(&format!("Page {i}"), frames.clone())).collect();

    let facts = extract_design(&document(pages));

    assert_that(&facts.pages).has_length(20);
    assert_that(&facts.pages[0].sections).has_length(12);
}

#[test]
fn text_styles_are_sorted_by_size_and_capped() {
    let texts: Vec<Value> = (1..=25)
        .map(|size| text(&format!("Size {size}"), json!({ "fontSize": size })))
        .collect();

    let facts = extract_design(&document(vec![page("Type", vec![frame("Scale", json!([]), texts)])]));

    assert_that(&facts.text_styles).has_length(20);
    assert_that(&facts.text_styles[0].font_size).is_equal_to(25.0);
    assert_that(&facts.text_styles[19].font_size).is_equal_to(6.0);
}

#[test]
fn empty_document_uses_defaults() {
    let facts = extract_design(&json!({}));

    assert_that(&facts.file_name.as_str()).is_equal_to("Untitled design");
    assert_that(&facts.pages).is_empty();
    assert_that(&facts.colors).is_empty();
    assert_that(&facts.components).is_empty();
}

#[test]
fn document_keys_from_urls_and_bare_keys() {
    assert_that(&extract_document_key("https://www.figma.com/design/AbC123xyz/My-Site?node-id=1-2"))
        .is_equal_to(Some("AbC123xyz".to_owned()));
    assert_that(&extract_document_key("https://figma.com/file/KEY_12345/Old"))
        .is_equal_to(Some("KEY_12345".to_owned()));
    assert_that(&extract_document_key("  Zx9-abcdef  ")).is_equal_to(Some("Zx9-abcdef".to_owned()));
    assert_that(&extract_document_key("https://example.com/design/abc")).is_none();
    assert_that(&extract_document_key("abc")).is_none();
}

#[test]
fn components_keep_document_order() {
    let facts = extract_design(&json!({
        "components": {
            "9:1": { "name": "Zeta Banner" },
            "1:1": { "name": "Alpha Card" },
            "5:5": { "name": "Mid Button" }
        }
    }));

    let names: Vec<&str> = facts.components.iter().map(|c| c.name.as_str()).collect();
    assert_that(&names).is_equal_to(vec!["Zeta Banner", "Alpha Card", "Mid Button"]);
}
