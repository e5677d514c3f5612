use roxmltree::Node;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Limits;
use crate::error::{ForgeError, ForgeResult};
use crate::sanitizer::{check_attribute, check_element, Verdict};

/// One sanitized markup element with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupChild>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkupChild {
    Element(MarkupNode),
    Text(String),
}

impl MarkupNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Element children only, in order.
    pub fn elements(&self) -> impl Iterator<Item = &MarkupNode> {
        self.children.iter().filter_map(|c| match c {
            MarkupChild::Element(e) => Some(e),
            MarkupChild::Text(_) => None,
        })
    }

    /// All descendant elements in pre-order, excluding `self`.
    pub fn descendants(&self) -> Vec<&MarkupNode> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// First direct text child that is not blank, trimmed.
    pub fn first_text(&self) -> Option<&str> {
        self.children.iter().find_map(|c| match c {
            MarkupChild::Text(t) if !t.trim().is_empty() => Some(t.trim()),
            _ => None,
        })
    }

    /// Concatenated text of this element and all descendants, whitespace-collapsed.
    pub fn text_content(&self) -> String {
        let mut raw = String::new();
        collect_text(self, &mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn collect_descendants<'a>(node: &'a MarkupNode, out: &mut Vec<&'a MarkupNode>) {
    for child in node.elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn collect_text(node: &MarkupNode, out: &mut String) {
    for child in &node.children {
        match child {
            MarkupChild::Text(t) => {
                out.push_str(t);
                out.push(' ');
            }
            MarkupChild::Element(e) => collect_text(e, out),
        }
    }
}

// ─── Public parse functions ──────────────────────────────────────────────────

/// Parse and sanitize SVG markup with default limits.
pub fn parse_markup(xml: &str) -> ForgeResult<MarkupNode> {
    parse_markup_with_limits(xml, &Limits::default())
}

/// Parse and sanitize SVG markup.
///
/// Syntax errors, unsafe content and limit violations all fail the parse;
/// harmless non-allow-listed elements and attributes are dropped.
pub fn parse_markup_with_limits(xml: &str, limits: &Limits) -> ForgeResult<MarkupNode> {
    if xml.len() > limits.max_markup_bytes {
        return Err(ForgeError::LimitExceeded {
            limit: "markup bytes",
            value: xml.len(),
            max: limits.max_markup_bytes,
        });
    }
    if xml.trim().is_empty() {
        return Err(ForgeError::EmptyDocument);
    }

    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();

    let name = root.tag_name().name();
    if check_element(name)? == Verdict::Strip {
        return Err(ForgeError::UnsafeMarkup {
            reason: format!("root element <{}> is not an allowed SVG element", name),
        });
    }

    let mut walker = Walker {
        limits,
        elements: 0,
    };
    walker.convert(root, 1)
}

struct Walker<'l> {
    limits: &'l Limits,
    elements: usize,
}

impl Walker<'_> {
    fn convert(&mut self, node: Node, depth: usize) -> ForgeResult<MarkupNode> {
        if depth > self.limits.max_depth {
            return Err(ForgeError::LimitExceeded {
                limit: "nesting depth",
                value: depth,
                max: self.limits.max_depth,
            });
        }
        self.elements += 1;
        if self.elements > self.limits.max_elements {
            return Err(ForgeError::LimitExceeded {
                limit: "element count",
                value: self.elements,
                max: self.limits.max_elements,
            });
        }

        let name = node.tag_name().name();
        let mut out = MarkupNode::new(name);

        for attr in node.attributes() {
            match check_attribute(name, attr.name(), attr.value())? {
                Verdict::Keep => out
                    .attributes
                    .push((attr.name().to_string(), attr.value().to_string())),
                Verdict::Strip => debug!(element = name, attribute = attr.name(), "stripped attribute"),
            }
        }

        for child in node.children() {
            if child.is_element() {
                let child_name = child.tag_name().name();
                match check_element(child_name)? {
                    Verdict::Keep => {
                        let converted = self.convert(child, depth + 1)?;
                        out.children.push(MarkupChild::Element(converted));
                    }
                    Verdict::Strip => {
                        // Still scan the subtree so nested script content is rejected.
                        self.reject_unsafe_subtree(child)?;
                        debug!(element = child_name, "stripped element");
                    }
                }
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    if !text.trim().is_empty() {
                        out.children.push(MarkupChild::Text(text.to_string()));
                    }
                }
            }
        }

        Ok(out)
    }

    fn reject_unsafe_subtree(&self, node: Node) -> ForgeResult<()> {
        for d in node.descendants().filter(|n| n.is_element()) {
            let name = d.tag_name().name();
            check_element(name)?;
            for attr in d.attributes() {
                check_attribute(name, attr.name(), attr.value())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_nesting() {
        let xml = r#"<svg><g id="a"><rect width="1" height="2"/><text>Hi</text></g><circle r="3"/></svg>"#;
        let root = parse_markup(xml).unwrap();
        assert_eq!(root.name, "svg");
        let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["g", "circle"]);
        let group = root.elements().next().unwrap();
        let inner: Vec<_> = group.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(inner, vec!["rect", "text"]);
        let rect = group.elements().next().unwrap();
        assert_eq!(
            rect.attributes,
            vec![
                ("width".to_string(), "1".to_string()),
                ("height".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_invalid_xml_fails() {
        let result = parse_markup("<svg><rect></svg>");
        assert!(matches!(result, Err(ForgeError::Parse { .. })));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(parse_markup("  \n"), Err(ForgeError::EmptyDocument)));
    }

    #[test]
    fn test_dtd_rejected() {
        let xml = r#"<!DOCTYPE svg [<!ENTITY x "boom">]><svg><text>&x;</text></svg>"#;
        assert!(parse_markup(xml).is_err());
    }

    #[test]
    fn test_script_rejected() {
        let xml = r#"<svg><script>alert(1)</script></svg>"#;
        assert!(matches!(
            parse_markup(xml),
            Err(ForgeError::UnsafeMarkup { .. })
        ));
    }

    #[test]
    fn test_script_inside_stripped_element_rejected() {
        let xml = r#"<svg><defs><script>alert(1)</script></defs></svg>"#;
        assert!(matches!(
            parse_markup(xml),
            Err(ForgeError::UnsafeMarkup { .. })
        ));
    }

    #[test]
    fn test_harmless_content_stripped() {
        let xml = r#"<svg><defs><linearGradient id="g"/></defs><rect style="fill:red" fill="blue"/></svg>"#;
        let root = parse_markup(xml).unwrap();
        let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["rect"]);
        let rect = root.elements().next().unwrap();
        assert_eq!(rect.attribute("fill"), Some("blue"));
        assert!(!rect.has_attribute("style"));
    }

    #[test]
    fn test_non_svg_root_rejected() {
        assert!(parse_markup("<html><body/></html>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_depth: 3,
            ..Limits::default()
        };
        let xml = "<svg><g><g><g/></g></g></svg>";
        assert!(matches!(
            parse_markup_with_limits(xml, &limits),
            Err(ForgeError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_byte_limit() {
        let limits = Limits {
            max_markup_bytes: 10,
            ..Limits::default()
        };
        assert!(matches!(
            parse_markup_with_limits("<svg><rect/></svg>", &limits),
            Err(ForgeError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_text_content_collapses_tspans() {
        let xml = r#"<svg><text>Hello <tspan>big</tspan>   world</text></svg>"#;
        let root = parse_markup(xml).unwrap();
        let text = root.elements().next().unwrap();
        assert_eq!(text.text_content(), "Hello big world");
        assert_eq!(text.first_text(), Some("Hello"));
    }
}
