//! Heuristic reconstruction of a UI tree from SVG markup.
//!
//! Each top-level element is matched against a fixed list of rules and the
//! first rule that applies decides the node:
//!
//! 1. `text` / `tspan` become `Text`, with the role picked from `font-size`.
//! 2. `rect` becomes a styled `Frame`; `image` becomes `Image`.
//! 3. A group with one `rect` and some `text` is a button, emitted as a
//!    single-field `Form`.
//! 4. A group with several `rect`s and some `text` is a form with one input
//!    per text label.
//! 5. Other primitives become a labelled placeholder `Frame`; other groups
//!    become a `Frame` of their inferred children.
//!
//! If nothing matched at all, the root gets a single diagnostic `Text`.

use std::collections::HashSet;

use tracing::debug;

use crate::features::{parse_number, Feature};
use crate::ir::{Field, FieldComponent, TextRole, UiNode, UiTree};
use crate::parser::MarkupNode;
use crate::style::{Border, Direction, Layout, Shadow, Style};

pub const NO_CONTENT_MESSAGE: &str = "SVG content detected but no recognizable elements found";

const PRIMITIVES: &[&str] = &["circle", "ellipse", "path", "polygon", "polyline"];

/// Root container settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOptions {
    pub root_layout: Layout,
    pub root_style: Style,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            root_layout: Layout::column(16.0, None),
            root_style: Style {
                bg: Some("#ffffff".to_string()),
                radius: Some(8.0),
                shadow: Some(Shadow::Sm),
                ..Style::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SemanticInferencer {
    options: InferenceOptions,
}

impl SemanticInferencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: InferenceOptions) -> Self {
        Self { options }
    }

    /// Infer a tree from a sanitized attribute tree.
    pub fn infer(&self, root: &MarkupNode) -> UiTree {
        let top_level: Vec<&MarkupNode> = if root.name == "svg" {
            root.elements().collect()
        } else {
            vec![root]
        };

        let children = top_level
            .into_iter()
            .filter_map(|node| self.infer_node(node))
            .collect();
        self.finish(children)
    }

    /// Infer a flat tree from a feature sequence. Groups are skipped; every
    /// other feature goes through the element rules in order.
    pub fn infer_features<I>(&self, features: I) -> UiTree
    where
        I: IntoIterator<Item = Feature>,
    {
        let children = features
            .into_iter()
            .filter(|f| !f.is_group())
            .filter_map(|f| {
                let attr = |name: &str| f.attribute(name);
                match f.kind.as_str() {
                    "text" | "tspan" => Some(text_node(attr("font-size"), attr("fill"), f.text.clone())),
                    "rect" => Some(rect_frame(attr("fill"), attr("rx"), attr("stroke"))),
                    "image" => Some(image_node(attr("href"))),
                    kind if PRIMITIVES.contains(&kind) => {
                        Some(primitive_frame(kind, attr("fill"), attr("stroke")))
                    }
                    _ => None,
                }
            })
            .collect();
        self.finish(children)
    }

    fn finish(&self, mut children: Vec<UiNode>) -> UiTree {
        if children.is_empty() {
            children.push(UiNode::text(TextRole::P, NO_CONTENT_MESSAGE, Style::default()));
        }
        debug!(nodes = children.len(), "inferred ui tree");
        UiTree::new(
            self.options.root_layout.clone(),
            self.options.root_style.clone(),
            children,
        )
    }

    fn infer_node(&self, node: &MarkupNode) -> Option<UiNode> {
        let attr = |name: &str| node.attribute(name);
        match node.name.as_str() {
            "text" | "tspan" => {
                let content = Some(node.text_content()).filter(|c| !c.is_empty());
                Some(text_node(attr("font-size"), attr("fill"), content))
            }
            "rect" => Some(rect_frame(attr("fill"), attr("rx"), attr("stroke"))),
            "image" => Some(image_node(attr("href"))),
            "g" | "svg" => self.infer_group(node),
            kind if PRIMITIVES.contains(&kind) => {
                Some(primitive_frame(kind, attr("fill"), attr("stroke")))
            }
            _ => None,
        }
    }

    fn infer_group(&self, group: &MarkupNode) -> Option<UiNode> {
        let descendants = group.descendants();
        let rects = descendants.iter().filter(|n| n.name == "rect").count();
        let texts: Vec<&MarkupNode> = descendants
            .iter()
            .copied()
            .filter(|n| n.name == "text")
            .collect();

        if rects == 1 && !texts.is_empty() {
            return Some(button_form(&texts[0].text_content()));
        }
        if rects > 1 && !texts.is_empty() {
            return Some(input_form(&texts));
        }

        let children: Vec<UiNode> = group
            .elements()
            .filter_map(|child| self.infer_node(child))
            .collect();
        if children.is_empty() {
            return None;
        }
        Some(UiNode::Frame {
            layout: Layout {
                direction: Some(Direction::Column),
                ..Layout::default()
            },
            style: Style::default(),
            children,
        })
    }
}

fn text_node(font_size: Option<&str>, fill: Option<&str>, content: Option<String>) -> UiNode {
    let role = font_size
        .and_then(parse_number)
        .map(TextRole::from_font_size)
        .unwrap_or(TextRole::P);
    let content = content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "Text".to_string());
    UiNode::text(
        role,
        content,
        Style {
            color: Some(fill.unwrap_or("#000000").to_string()),
            ..Style::default()
        },
    )
}

fn rect_frame(fill: Option<&str>, rx: Option<&str>, stroke: Option<&str>) -> UiNode {
    UiNode::Frame {
        layout: Layout::column(12.0, Some(16.0)),
        style: Style {
            bg: Some(fill.unwrap_or("#ffffff").to_string()),
            radius: Some(rx.and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(0.0)),
            shadow: Some(Shadow::Sm),
            border: Some(Border::Enabled(stroke.is_some())),
            ..Style::default()
        },
        children: Vec::new(),
    }
}

fn image_node(href: Option<&str>) -> UiNode {
    UiNode::Image {
        src: href.map(str::to_string),
        alt: Some(String::new()),
        style: Style::default(),
    }
}

fn primitive_frame(kind: &str, fill: Option<&str>, stroke: Option<&str>) -> UiNode {
    UiNode::Frame {
        layout: Layout::column(8.0, Some(12.0)),
        style: Style {
            bg: Some(fill.unwrap_or("#f0f0f0").to_string()),
            radius: Some(4.0),
            shadow: Some(Shadow::Sm),
            border: Some(Border::Enabled(stroke.is_some())),
            ..Style::default()
        },
        children: vec![UiNode::text(
            TextRole::P,
            format!("{} element", kind),
            Style {
                color: Some(stroke.unwrap_or("#666666").to_string()),
                ..Style::default()
            },
        )],
    }
}

fn button_form(label: &str) -> UiNode {
    let label = if label.is_empty() { "Button" } else { label };
    UiNode::Form {
        name: "buttonForm".to_string(),
        fields: vec![Field::new("button", FieldComponent::Button).with_label(label)],
        actions: None,
        style: Style {
            bg: Some("#3b82f6".to_string()),
            radius: Some(8.0),
            shadow: Some(Shadow::Sm),
            ..Style::default()
        },
    }
}

fn input_form(texts: &[&MarkupNode]) -> UiNode {
    let mut taken = HashSet::new();
    let fields = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let content = text.text_content();
            let (label, placeholder) = if content.is_empty() {
                (format!("Field {}", i + 1), format!("Enter field {}", i + 1))
            } else {
                (content.clone(), format!("Enter {}", content))
            };
            let name = unique_name(field_slug(&content, i), &mut taken);
            Field::new(name, FieldComponent::Input)
                .with_label(label)
                .with_placeholder(placeholder)
        })
        .collect();

    UiNode::Form {
        name: "generatedForm".to_string(),
        fields,
        actions: None,
        style: Style {
            bg: Some("#f9fafb".to_string()),
            radius: Some(8.0),
            shadow: Some(Shadow::Sm),
            ..Style::default()
        },
    }
}

/// camelCase identifier from a label; `field<i>` when nothing usable remains.
pub fn field_slug(label: &str, index: usize) -> String {
    let mut out = String::new();
    for word in label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_ascii_lowercase();
        if out.is_empty() {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    match out.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => out,
        _ => format!("field{}", index),
    }
}

fn unique_name(base: String, taken: &mut HashSet<String>) -> String {
    let mut name = base.clone();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{}{}", base, n);
        n += 1;
    }
    taken.insert(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::features;
    use crate::parser::parse_markup;
    use pretty_assertions::assert_eq;

    fn infer(xml: &str) -> UiTree {
        SemanticInferencer::new().infer(&parse_markup(xml).unwrap())
    }

    #[test]
    fn test_default_root_style() {
        let options = InferenceOptions::default();
        assert_eq!(options.root_style.bg.as_deref(), Some("#ffffff"));
        assert_eq!(options.root_style.radius, Some(8.0));
        assert_eq!(options.root_style.color, None);
        assert_eq!(options.root_style.border, None);

        let tree = infer(r#"<svg><text>Hi</text></svg>"#);
        assert_eq!(tree.style, options.root_style);
    }

    // Rule 1

    #[test]
    fn test_text_role_and_color() {
        let tree = infer(r##"<svg><text font-size="28" fill="#333">Welcome</text></svg>"##);
        assert_eq!(
            tree.children,
            vec![UiNode::text(
                TextRole::H2,
                "Welcome",
                Style {
                    color: Some("#333".into()),
                    ..Style::default()
                }
            )]
        );
    }

    #[test]
    fn test_text_defaults() {
        let tree = infer(r#"<svg><text></text></svg>"#);
        if let UiNode::Text { role, content, style } = &tree.children[0] {
            assert_eq!(*role, TextRole::P);
            assert_eq!(content, "Text");
            assert_eq!(style.color.as_deref(), Some("#000000"));
        } else {
            panic!("Expected Text");
        }
    }

    // Rule 2

    #[test]
    fn test_rect_frame() {
        let tree = infer(r##"<svg><rect rx="6" fill="#eee" stroke="#000"/><rect rx="wide"/></svg>"##);
        if let UiNode::Frame { layout, style, children } = &tree.children[0] {
            assert_eq!(layout.gap, Some(12.0));
            assert_eq!(layout.padding, Some(16.0));
            assert_eq!(style.bg.as_deref(), Some("#eee"));
            assert_eq!(style.radius, Some(6.0));
            assert_eq!(style.border, Some(Border::Enabled(true)));
            assert!(children.is_empty());
        } else {
            panic!("Expected Frame");
        }
        if let UiNode::Frame { style, .. } = &tree.children[1] {
            assert_eq!(style.bg.as_deref(), Some("#ffffff"));
            assert_eq!(style.radius, Some(0.0));
            assert_eq!(style.border, Some(Border::Enabled(false)));
        } else {
            panic!("Expected Frame");
        }
    }

    #[test]
    fn test_image_node() {
        let tree = infer(r#"<svg><image href="/logo.png" width="10" height="10"/></svg>"#);
        assert_eq!(
            tree.children[0],
            UiNode::Image {
                src: Some("/logo.png".into()),
                alt: Some(String::new()),
                style: Style::default()
            }
        );
    }

    // Rules 3 and 4

    #[test]
    fn test_button_group() {
        let tree = infer(r##"<svg><g><rect rx="8" fill="#fff"/><text>Submit</text></g></svg>"##);
        assert_eq!(tree.children.len(), 1);
        if let UiNode::Form { name, fields, .. } = &tree.children[0] {
            assert_eq!(name, "buttonForm");
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].component, FieldComponent::Button);
            assert_eq!(fields[0].label.as_deref(), Some("Submit"));
        } else {
            panic!("Expected Form");
        }
    }

    #[test]
    fn test_form_group() {
        let tree = infer(
            r#"<svg><g>
                <rect width="200" height="30"/><text>Email</text>
                <rect width="200" height="90"/><text>Message</text>
            </g></svg>"#,
        );
        if let UiNode::Form { name, fields, .. } = &tree.children[0] {
            assert_eq!(name, "generatedForm");
            let labels: Vec<_> = fields.iter().map(|f| f.label.clone().unwrap()).collect();
            assert_eq!(labels, vec!["Email", "Message"]);
            assert!(fields.iter().all(|f| f.component == FieldComponent::Input));
            assert_eq!(fields[0].name, "email");
            assert_eq!(fields[1].placeholder.as_deref(), Some("Enter Message"));
        } else {
            panic!("Expected Form");
        }
    }

    #[test]
    fn test_form_field_names_deduplicated() {
        let tree = infer(
            r#"<svg><g><rect/><rect/><text>Full name</text><text>Full name</text><text>!!</text></g></svg>"#,
        );
        if let UiNode::Form { fields, .. } = &tree.children[0] {
            let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, vec!["fullName", "fullName2", "field2"]);
        } else {
            panic!("Expected Form");
        }
    }

    // Rule 5

    #[test]
    fn test_primitive_placeholder_frame() {
        let tree = infer(r#"<svg><circle r="4" stroke="red"/></svg>"#);
        if let UiNode::Frame { style, children, .. } = &tree.children[0] {
            assert_eq!(style.bg.as_deref(), Some("#f0f0f0"));
            assert_eq!(style.radius, Some(4.0));
            if let UiNode::Text { content, style, .. } = &children[0] {
                assert_eq!(content, "circle element");
                assert_eq!(style.color.as_deref(), Some("red"));
            } else {
                panic!("Expected Text");
            }
        } else {
            panic!("Expected Frame");
        }
    }

    #[test]
    fn test_plain_group_recurses() {
        let tree = infer(r#"<svg><g><text>A</text><circle r="1"/></g><g><line x1="0"/></g></svg>"#);
        assert_eq!(tree.children.len(), 1);
        if let UiNode::Frame { children, .. } = &tree.children[0] {
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].type_name(), "Text");
        } else {
            panic!("Expected Frame");
        }
    }

    // Rule 6 and root

    #[test]
    fn test_empty_document_fallback() {
        let tree = infer(r#"<svg><title>Nothing</title></svg>"#);
        assert_eq!(
            tree.children,
            vec![UiNode::text(TextRole::P, NO_CONTENT_MESSAGE, Style::default())]
        );
        assert_eq!(tree.layout.gap, Some(16.0));
        assert_eq!(tree.style.radius, Some(8.0));
    }

    #[test]
    fn test_non_svg_root_is_single_top_level_node() {
        let tree = SemanticInferencer::new().infer(&MarkupNode::new("rect"));
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].type_name(), "Frame");
    }

    #[test]
    fn test_custom_root_options() {
        let options = InferenceOptions {
            root_layout: Layout::column(4.0, Some(2.0)),
            root_style: Style::default(),
        };
        let root = parse_markup("<svg><rect/></svg>").unwrap();
        let tree = SemanticInferencer::with_options(options.clone()).infer(&root);
        assert_eq!(tree.layout, options.root_layout);
        assert!(tree.style.is_empty());
    }

    #[test]
    fn test_feature_variant_skips_groups() {
        let root = parse_markup(
            r#"<svg><g><rect/><text font-size="40">Big</text></g><ellipse rx="1"/></svg>"#,
        )
        .unwrap();
        let tree = SemanticInferencer::new().infer_features(features(&root));
        let kinds: Vec<_> = tree.children.iter().map(UiNode::type_name).collect();
        assert_eq!(kinds, vec!["Frame", "Text", "Frame"]);
        if let UiNode::Text { role, .. } = &tree.children[1] {
            assert_eq!(*role, TextRole::H1);
        } else {
            panic!("Expected Text");
        }
    }

    #[test]
    fn test_deterministic() {
        let root = parse_markup(r#"<svg><g><rect/><text>Go</text></g></svg>"#).unwrap();
        let inferencer = SemanticInferencer::new();
        assert_eq!(inferencer.infer(&root), inferencer.infer(&root));
    }

    #[test]
    fn test_field_slug() {
        assert_eq!(field_slug("Email address", 0), "emailAddress");
        assert_eq!(field_slug("2nd line", 3), "field3");
        assert_eq!(field_slug("", 1), "field1");
    }
}
