//! # Tailwind lowering
//!
//! Turns the semantic [`Style`] and [`Layout`] of a UI node into Tailwind
//! utility classes, and provides [`ClassList`], the ordered token set the
//! patch engine uses to edit `className` values.
//!
//! Colors and pixel sizes that have no named utility are written as
//! arbitrary values (`bg-[#f9fafb]`, `gap-[12px]`).
//!
//! ## Usage
//! ```ignore
//! let classes = svgforge::tailwind::node_classes(Some(&layout), &style);
//! // "flex flex-col gap-[12px] p-[16px] bg-[#ffffff] rounded-md shadow-sm border"
//! ```

pub mod tokens;

pub use tokens::{merge_classes, ClassList};

use crate::style::{Alignment, Border, Direction, Display, Layout, Shadow, Style};

/// Classes for a node's style alone.
pub fn style_classes(style: &Style) -> Vec<String> {
    let mut classes = Vec::new();
    if let Some(bg) = &style.bg {
        classes.push(format!("bg-[{}]", arbitrary(bg)));
    }
    if let Some(color) = &style.color {
        classes.push(format!("text-[{}]", arbitrary(color)));
    }
    if let Some(radius) = style.radius {
        if radius >= 16.0 {
            classes.push("rounded-2xl".to_string());
        } else if radius >= 8.0 {
            classes.push("rounded-lg".to_string());
        } else if radius > 0.0 {
            classes.push("rounded-md".to_string());
        }
    }
    if let Some(shadow) = style.shadow {
        classes.push(
            match shadow {
                Shadow::Sm => "shadow-sm",
                Shadow::Md => "shadow-md",
                Shadow::Lg => "shadow-lg",
            }
            .to_string(),
        );
    }
    match &style.border {
        Some(Border::Enabled(true)) => classes.push("border".to_string()),
        Some(Border::Color(color)) => {
            classes.push("border".to_string());
            classes.push(format!("border-[{}]", arbitrary(color)));
        }
        Some(Border::Enabled(false)) | None => {}
    }
    classes
}

/// Classes for a container's layout.
pub fn layout_classes(layout: &Layout) -> Vec<String> {
    let mut classes = Vec::new();
    match layout.display {
        Display::Flex => {
            classes.push("flex".to_string());
            classes.push(
                match layout.direction {
                    Some(Direction::Row) => "flex-row",
                    Some(Direction::Column) | None => "flex-col",
                }
                .to_string(),
            );
        }
        Display::Grid => {
            classes.push("grid".to_string());
            classes.push(format!("grid-cols-{}", layout.columns.unwrap_or(1).max(1)));
        }
        Display::Block => classes.push("block".to_string()),
    }
    if let Some(gap) = layout.gap.filter(|g| *g > 0.0) {
        classes.push(format!("gap-[{}px]", number(gap)));
    }
    if let Some(padding) = layout.padding.filter(|p| *p > 0.0) {
        classes.push(format!("p-[{}px]", number(padding)));
    }
    if let Some(align) = layout.align {
        classes.push(
            match align {
                Alignment::Start => "items-start",
                Alignment::Center => "items-center",
                Alignment::End => "items-end",
                Alignment::Between => "content-between",
                Alignment::Around => "content-around",
            }
            .to_string(),
        );
    }
    if let Some(justify) = layout.justify {
        classes.push(
            match justify {
                Alignment::Start => "justify-start",
                Alignment::Center => "justify-center",
                Alignment::End => "justify-end",
                Alignment::Between => "justify-between",
                Alignment::Around => "justify-around",
            }
            .to_string(),
        );
    }
    classes
}

/// Layout (when the node has one) followed by style, as one class string.
pub fn node_classes(layout: Option<&Layout>, style: &Style) -> String {
    let mut classes = layout.map(layout_classes).unwrap_or_default();
    classes.extend(style_classes(style));
    classes.join(" ")
}

/// Arbitrary values cannot contain whitespace; Tailwind reads `_` as a space.
fn arbitrary(value: &str) -> String {
    value.trim().split_whitespace().collect::<Vec<_>>().join("_")
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
