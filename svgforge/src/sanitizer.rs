//! Allow-list sanitizer for SVG markup.
//!
//! Elements and attributes are checked one at a time while the parser walks
//! the XML tree. Executable content is rejected outright; anything else that is
//! not on the allow-list is stripped.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ForgeError, ForgeResult};

/// Elements kept in the attribute tree.
pub const ALLOWED_ELEMENTS: &[&str] = &[
    "svg", "g", "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "text",
    "tspan", "image", "title", "desc",
];

/// Structural, graphic and text attributes. Nothing executable, nothing styled.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "viewBox",
    "width",
    "height",
    "x",
    "y",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "x1",
    "y1",
    "x2",
    "y2",
    "d",
    "points",
    "fill",
    "stroke",
    "stroke-width",
    "opacity",
    "transform",
    "font-family",
    "font-size",
    "font-weight",
    "text-anchor",
    "dominant-baseline",
    "id",
    "class",
    "href",
];

/// Elements whose presence fails the whole document.
const FORBIDDEN_ELEMENTS: &[&str] = &[
    "script",
    "foreignObject",
    "iframe",
    "object",
    "embed",
    "style",
    "handler",
    "listener",
    "set",
    "animate",
    "animateMotion",
    "animateTransform",
    "animateColor",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    /// Not allowed but harmless: dropped (elements are dropped with their subtree).
    Strip,
}

pub fn check_element(name: &str) -> ForgeResult<Verdict> {
    if FORBIDDEN_ELEMENTS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(name))
    {
        return Err(ForgeError::UnsafeMarkup {
            reason: format!("element <{}> is not allowed", name),
        });
    }
    if ALLOWED_ELEMENTS.contains(&name) {
        Ok(Verdict::Keep)
    } else {
        Ok(Verdict::Strip)
    }
}

pub fn check_attribute(element: &str, name: &str, value: &str) -> ForgeResult<Verdict> {
    if name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on") {
        return Err(ForgeError::UnsafeMarkup {
            reason: format!("event handler attribute '{}' on <{}>", name, element),
        });
    }

    let normalized = normalize_value(value);
    if script_scheme_regex().is_match(&normalized) {
        return Err(ForgeError::UnsafeMarkup {
            reason: format!("script URL in attribute '{}' on <{}>", name, element),
        });
    }

    if !ALLOWED_ATTRIBUTES.contains(&name) {
        return Ok(Verdict::Strip);
    }

    if name == "href" && !is_safe_href(&normalized) {
        return Err(ForgeError::UnsafeMarkup {
            reason: format!("URL scheme not allowed in href '{}' on <{}>", value, element),
        });
    }

    Ok(Verdict::Keep)
}

/// Relative references, `http(s)` and raster `data:image/*` payloads only.
fn is_safe_href(normalized: &str) -> bool {
    match scheme_regex().captures(normalized) {
        None => true,
        Some(caps) => match &caps[1] {
            "http" | "https" => true,
            "data" => {
                normalized.starts_with("data:image/") && !normalized.starts_with("data:image/svg")
            }
            _ => false,
        },
    }
}

/// Lowercased with ASCII whitespace and control characters removed, the way
/// browsers read a URL scheme.
fn normalize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z][a-z0-9+.\-]*):").expect("valid regex"))
}

fn script_scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(javascript|vbscript|livescript):").expect("valid regex"))
}
