//! Integration tests: classification of matplotlib-shaped SVG output.

use hp_core::classify::{DATA_GROUP, LEGEND_POINT, PLOT_ELEMENT, find_points};
use hp_core::*;
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn figure() -> Document {
    parse_document(include_str!("fixtures/figure.svg")).expect("fixture parses")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn ids(doc: &Document, sel: &Selection) -> Vec<String> {
    sel.nodes()
        .iter()
        .map(|&n| doc.attr(n, "id").unwrap_or("-").to_string())
        .collect()
}

/// Id of the nearest `g` ancestor carrying one, for id-less paths.
fn container_id(doc: &Document, node: NodeIndex) -> String {
    doc.ancestors(node)
        .find_map(|a| doc.attr(a, "id"))
        .unwrap_or("-")
        .to_string()
}

fn classify(doc: &mut Document, axes: &str, groups: &[&str]) -> AxesRegistry {
    let meta = Metadata::new(Vec::new(), strings(groups));
    classify_axes(doc, axes, &meta, &PlotConventions::default())
}

// ─── Completeness ────────────────────────────────────────────────────────

#[test]
fn finds_every_category_in_first_axes() {
    let mut doc = figure();
    let reg = classify(&mut doc, "axes_1", &[]);

    assert_eq!(ids(&doc, &reg.bars), vec!["patch_3", "patch_4", "patch_5"]);
    let line_parents: Vec<String> = reg
        .lines
        .nodes()
        .iter()
        .map(|&n| container_id(&doc, n))
        .collect();
    assert_eq!(line_parents, vec!["line2d_3", "line2d_4"]);
    assert!(reg.points.is_empty());
    assert!(reg.areas.is_empty());
    assert_eq!(reg.elements.size(), 5);

    for &bar in reg.bars.nodes() {
        assert_eq!(doc.attr(bar, "class"), Some("bar plot-element"));
    }
    for &line in reg.lines.nodes() {
        assert_eq!(doc.attr(line, "class"), Some("line plot-element"));
    }
}

#[test]
fn finds_areas_points_and_legend_in_second_axes() {
    let mut doc = figure();
    let reg = classify(&mut doc, "axes_2", &["a", "b", "a", "legend-a"]);

    assert_eq!(reg.areas.size(), 1);
    assert_eq!(reg.points.size(), 3);
    assert_eq!(reg.legend.size(), 1);
    assert!(reg.bars.is_empty());
    assert!(reg.lines.is_empty());

    let classified = reg.classified(&doc);
    let categories: Vec<Category> = classified.iter().map(|c| c.category).collect();
    assert_eq!(
        categories,
        vec![Category::Area, Category::Point, Category::Point, Category::Point]
    );
    assert_eq!(
        classified.iter().map(|c| c.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );

    let legend = reg.legend.nodes()[0];
    assert_eq!(doc.attr(legend, "class"), Some(LEGEND_POINT));
    assert_eq!(doc.attr(legend, DATA_GROUP), Some("legend-a"));
    assert!(!doc.has_class(legend, PLOT_ELEMENT));
}

#[test]
fn bars_without_clip_path_are_excluded() {
    let mut doc = figure();
    let reg = classify(&mut doc, "axes_1", &[]);
    for id in ["patch_1", "patch_2", "patch_6"] {
        let node = doc.get_by_id(id).unwrap();
        assert!(!reg.bars.contains(node), "{id} classified as a bar");
        assert_eq!(doc.attr(node, "class"), None);
    }
}

// ─── Isolation and joins ─────────────────────────────────────────────────

#[test]
fn axes_are_isolated() {
    let mut doc = figure();
    classify(&mut doc, "axes_1", &["x"]);
    let axes_2 = doc.get_by_id("axes_2").unwrap();
    assert!(
        Selection::from_node(axes_2)
            .select_all(&doc, ".plot-element, [data-group]")
            .is_empty()
    );

    let reg_2 = classify(&mut doc, "axes_2", &["x"]);
    let axes_1 = doc.get_by_id("axes_1").unwrap();
    for &node in reg_2.elements.nodes() {
        assert!(!doc.is_ancestor_of(axes_1, node));
    }
}

#[test]
fn point_groups_join_by_discovery_index() {
    let mut doc = figure();
    let reg = classify(&mut doc, "axes_2", &["10", "20"]);
    let groups: Vec<Option<&str>> = reg
        .points
        .nodes()
        .iter()
        .map(|&n| doc.attr(n, DATA_GROUP))
        .collect();
    assert_eq!(groups, vec![Some("10"), Some("20"), None]);
}

#[test]
fn axis_tick_lines_are_not_data_lines() {
    let mut doc = figure();
    let reg = classify(&mut doc, "axes_1", &[]);
    let tick_marker = doc.get_by_id("m0a1b2c3d4e").unwrap();
    assert!(!reg.lines.contains(tick_marker));
    let grid = Selection::query(&doc, "#line2d_2 path");
    assert_eq!(grid.size(), 1);
    assert!(!reg.lines.contains(grid.nodes()[0]));
}

// ─── Fallback and idempotence ────────────────────────────────────────────

#[test]
fn points_fall_back_to_paths() {
    let mut doc = parse_document(include_str!("fixtures/path_points.svg")).unwrap();
    let sets = find_points(
        &mut doc,
        "axes_1",
        &strings(&["g0", "g1", "legend"]),
        &PlotConventions::default(),
    );
    assert_eq!(sets.points.size(), 2);
    assert_eq!(sets.legend.size(), 1);
    for &n in sets.points.nodes() {
        assert_eq!(doc.tag_name(n), Some("path"));
        assert_eq!(doc.attr(n, "class"), Some("point plot-element"));
    }
    assert_eq!(doc.attr(sets.points.nodes()[1], DATA_GROUP), Some("g1"));
    assert_eq!(doc.attr(sets.legend.nodes()[0], DATA_GROUP), Some("legend"));
}

#[test]
fn classification_is_idempotent() {
    let mut doc = figure();
    let first = classify(&mut doc, "axes_2", &["a", "b", "c", "d"]);
    let markup = emit_document(&doc);
    let second = classify(&mut doc, "axes_2", &["a", "b", "c", "d"]);
    assert_eq!(first, second);
    assert_eq!(markup, emit_document(&doc));
}

#[test]
fn custom_conventions() {
    let mut doc = parse_document(
        r#"<svg><g id="ax"><g id="bar_1"><path clip-path="clip(a)"/></g></g></svg>"#,
    )
    .unwrap();
    let conv = PlotConventions {
        bar_prefix: "bar".into(),
        clip_marker: "clip(".into(),
        ..PlotConventions::default()
    };
    let reg = classify_axes(&mut doc, "ax", &Metadata::default(), &conv);
    assert_eq!(reg.bars.size(), 1);
    assert_eq!(reg.elements, reg.bars);
}
