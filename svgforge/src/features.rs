use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::MarkupNode;

/// One flattened markup element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Feature {
    pub fn from_node(node: &MarkupNode) -> Self {
        let attributes: BTreeMap<String, String> = node
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            kind: node.name.clone(),
            text: node.first_text().map(str::to_string),
            bounds: bounds_of(node),
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind.as_str(), "g" | "svg")
    }
}

fn bounds_of(node: &MarkupNode) -> Option<Bounds> {
    let width = node.attribute("width").and_then(parse_number)?;
    let height = node.attribute("height").and_then(parse_number)?;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Bounds {
        x: node.attribute("x").and_then(parse_number).unwrap_or(0.0),
        y: node.attribute("y").and_then(parse_number).unwrap_or(0.0),
        width,
        height,
    })
}

/// Leading numeric prefix of an attribute value (`"24px"` → 24).
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in value.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    value[..end].parse().ok().filter(|n: &f64| n.is_finite())
}

/// Depth-first, pre-order walk over an attribute tree, one `Feature` per element.
///
/// The walk holds only borrowed nodes, so a clone taken before consumption
/// replays the same sequence.
#[derive(Debug, Clone)]
pub struct Features<'a> {
    stack: Vec<&'a MarkupNode>,
}

pub fn features(root: &MarkupNode) -> Features<'_> {
    Features { stack: vec![root] }
}

impl Iterator for Features<'_> {
    type Item = Feature;

    fn next(&mut self) -> Option<Feature> {
        let node = self.stack.pop()?;
        let children: Vec<&MarkupNode> = node.elements().collect();
        self.stack.extend(children.into_iter().rev());
        Some(Feature::from_node(node))
    }
}
