use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::OnceLock;

use crate::error::{ForgeError, ForgeResult};
use crate::ir::{FieldComponent, ListItem, UiNode, UiTree};
use crate::patch::PatchOp;
use crate::plan::{BuildChild, BuildNode, BuildPlan};
use crate::style::{Layout, Style};

const MAX_TREE_DEPTH: usize = 32;

/// Validate a UI tree, reporting every problem with its path.
pub fn validate_tree(tree: &UiTree) -> ForgeResult<()> {
    let mut errors = Vec::new();
    if tree.children.is_empty() {
        errors.push("children: must not be empty".to_string());
    }
    check_layout(&tree.layout, "layout", &mut errors);
    check_style(&tree.style, "style", &mut errors);
    for (i, child) in tree.children.iter().enumerate() {
        check_node(child, &format!("children[{}]", i), 1, &mut errors);
    }
    into_result(errors)
}

/// Validate the structure of a build plan. Unknown component keys are not
/// errors here; the mapper and generator substitute them.
pub fn validate_plan(plan: &BuildPlan) -> ForgeResult<()> {
    let mut errors = Vec::new();
    if plan.name.trim().is_empty() {
        errors.push("name: must not be empty".to_string());
    }
    check_build_node(&plan.root, "root", 0, &mut errors);
    into_result(errors)
}

pub fn validate_patch_request(request: &crate::patch::PatchRequest) -> ForgeResult<()> {
    if request.ops.is_empty() {
        return Err(ForgeError::validation(
            "ops: must contain at least one operation",
        ));
    }
    let errors = request
        .ops
        .iter()
        .enumerate()
        .flat_map(|(i, op)| patch_op_problems(i, op))
        .collect();
    into_result(errors)
}

/// Problems with a single patch operation, prefixed with `ops[<index>]`.
pub fn patch_op_problems(index: usize, op: &PatchOp) -> Vec<String> {
    let mut errors = Vec::new();
    let mut require = |field: &str, value: &str| {
        if value.trim().is_empty() {
            errors.push(format!("ops[{}].{}: must not be empty", index, field));
        }
    };

    require("file", op.file());
    match op {
        PatchOp::AddClass { jsx, class_name, .. } | PatchOp::RemoveClass { jsx, class_name, .. } => {
            require("jsx", jsx);
            require("className", class_name);
        }
        PatchOp::ReplaceClass { jsx, from, to, .. } => {
            require("jsx", jsx);
            require("from", from);
            require("to", to);
            if from.split_whitespace().count() > 1 {
                errors.push(format!("ops[{}].from: must be a single class token", index));
            }
        }
        PatchOp::SetAttribute { jsx, name, .. } => {
            require("jsx", jsx);
            if !is_jsx_attribute_name(name) {
                errors.push(format!(
                    "ops[{}].name: '{}' is not a valid JSX attribute name",
                    index, name
                ));
            }
        }
        PatchOp::InsertAfter {
            target_jsx, code, ..
        } => {
            require("targetJsx", target_jsx);
            require("code", code);
        }
        PatchOp::TextEdit { find, .. } => {
            require("find", find);
        }
    }
    if !op.file().trim().is_empty() && !is_project_path(op.file()) {
        errors.push(format!(
            "ops[{}].file: '{}' must stay inside the project root",
            index,
            op.file()
        ));
    }
    errors
}

/// A patch target path relative to the project root. A leading `/` names the
/// root itself; `..`, drive prefixes and backslash traversal are rejected.
pub fn is_project_path(file: &str) -> bool {
    let relative = file.trim_start_matches('/');
    !relative.split(['/', '\\']).any(|segment| segment == "..")
        && Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

pub fn is_pascal_case(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Plain, dashed (`data-id`, `aria-label`) or namespaced (`xlink:href`) names.
pub fn is_jsx_attribute_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*(:[A-Za-z_][A-Za-z0-9_\-]*)?$").expect("valid regex")
    })
    .is_match(name)
}

fn into_result(errors: Vec<String>) -> ForgeResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ForgeError::Validation(errors))
    }
}

fn check_node(node: &UiNode, path: &str, depth: usize, errors: &mut Vec<String>) {
    if depth > MAX_TREE_DEPTH {
        errors.push(format!("{}: nesting deeper than {}", path, MAX_TREE_DEPTH));
        return;
    }
    check_style(node.style(), &format!("{}.style", path), errors);

    match node {
        UiNode::Text { content, .. } => {
            if content.trim().is_empty() {
                errors.push(format!("{}.content: must not be empty", path));
            }
        }
        UiNode::Image { .. } => {}
        UiNode::Icon { name, .. } => {
            if name.trim().is_empty() {
                errors.push(format!("{}.name: must not be empty", path));
            }
        }
        UiNode::Button { label, .. } => {
            if label.trim().is_empty() {
                errors.push(format!("{}.label: must not be empty", path));
            }
        }
        UiNode::Frame {
            layout, children, ..
        } => {
            check_layout(layout, &format!("{}.layout", path), errors);
            for (i, child) in children.iter().enumerate() {
                check_node(child, &format!("{}.children[{}]", path, i), depth + 1, errors);
            }
        }
        UiNode::Form { name, fields, .. } => {
            if name.trim().is_empty() {
                errors.push(format!("{}.name: must not be empty", path));
            }
            if fields.is_empty() {
                errors.push(format!("{}.fields: must not be empty", path));
            }
            let mut seen = HashSet::new();
            for (i, field) in fields.iter().enumerate() {
                let field_path = format!("{}.fields[{}]", path, i);
                if field.name.trim().is_empty() {
                    errors.push(format!("{}.name: must not be empty", field_path));
                } else if !seen.insert(field.name.as_str()) {
                    errors.push(format!("{}.name: duplicate '{}'", field_path, field.name));
                }
                if field.component == FieldComponent::Select
                    && field.options.as_ref().map_or(true, Vec::is_empty)
                {
                    errors.push(format!("{}.options: Select needs at least one option", field_path));
                }
            }
        }
        UiNode::List { items, .. } => {
            for (i, item) in items.iter().enumerate() {
                if let ListItem::Node(child) = item {
                    check_node(child, &format!("{}.items[{}]", path, i), depth + 1, errors);
                }
            }
        }
    }
}

fn check_layout(layout: &Layout, path: &str, errors: &mut Vec<String>) {
    for (name, value) in [("gap", layout.gap), ("padding", layout.padding)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                errors.push(format!("{}.{}: must be a non-negative number", path, name));
            }
        }
    }
    if layout.columns == Some(0) {
        errors.push(format!("{}.columns: must be at least 1", path));
    }
}

fn check_style(style: &Style, path: &str, errors: &mut Vec<String>) {
    if let Some(r) = style.radius {
        if !r.is_finite() || r < 0.0 {
            errors.push(format!("{}.radius: must be a non-negative number", path));
        }
    }
}

fn check_build_node(node: &BuildNode, path: &str, depth: usize, errors: &mut Vec<String>) {
    if depth > MAX_TREE_DEPTH {
        errors.push(format!("{}: nesting deeper than {}", path, MAX_TREE_DEPTH));
        return;
    }
    if node.component_key.trim().is_empty() {
        errors.push(format!("{}.componentKey: must not be empty", path));
    }
    for (i, child) in node.children.iter().flatten().enumerate() {
        if let BuildChild::Node(child) = child {
            check_build_node(child, &format!("{}.children[{}]", path, i), depth + 1, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, TextRole};
    use crate::patch::PatchRequest;

    fn tree(children: Vec<UiNode>) -> UiTree {
        UiTree::new(Layout::default(), Style::default(), children)
    }

    // Trees

    #[test]
    fn test_valid_tree() {
        let t = tree(vec![UiNode::text(TextRole::P, "Hi", Style::default())]);
        assert!(validate_tree(&t).is_ok());
    }

    #[test]
    fn test_empty_root_rejected() {
        let result = validate_tree(&tree(vec![]));
        assert!(matches!(result, Err(ForgeError::Validation(_))));
    }

    #[test]
    fn test_tree_problems_have_paths() {
        let t = tree(vec![
            UiNode::Frame {
                layout: Layout {
                    gap: Some(-4.0),
                    ..Layout::default()
                },
                style: Style::default(),
                children: vec![UiNode::Button {
                    label: " ".into(),
                    style: Style::default(),
                }],
            },
            UiNode::Form {
                name: "f".into(),
                fields: vec![
                    Field::new("email", FieldComponent::Input),
                    Field::new("email", FieldComponent::Select),
                ],
                actions: None,
                style: Style::default(),
            },
        ]);
        if let Err(ForgeError::Validation(errors)) = validate_tree(&t) {
            assert_eq!(
                errors,
                vec![
                    "children[0].layout.gap: must be a non-negative number",
                    "children[0].children[0].label: must not be empty",
                    "children[1].fields[1].name: duplicate 'email'",
                    "children[1].fields[1].options: Select needs at least one option",
                ]
            );
        } else {
            panic!("Expected validation error");
        }
    }

    // Plans

    #[test]
    fn test_plan_requires_name_and_keys() {
        let plan = BuildPlan {
            name: "".into(),
            imports: vec![],
            root: BuildNode::new("layout.card").with_child(BuildNode::new("")),
        };
        if let Err(ForgeError::Validation(errors)) = validate_plan(&plan) {
            assert_eq!(errors.len(), 2);
            assert!(errors[1].starts_with("root.children[0]"));
        } else {
            panic!("Expected validation error");
        }
    }

    // Patch requests

    #[test]
    fn test_patch_request_rules() {
        let request = PatchRequest::new(vec![
            PatchOp::SetAttribute {
                file: "a.tsx".into(),
                jsx: "<input".into(),
                name: "on click".into(),
                value: "x".into(),
            },
            PatchOp::ReplaceClass {
                file: "a.tsx".into(),
                jsx: "<div".into(),
                from: "a b".into(),
                to: "c".into(),
            },
        ]);
        if let Err(ForgeError::Validation(errors)) = validate_patch_request(&request) {
            assert_eq!(errors.len(), 2);
            assert!(errors[0].starts_with("ops[0].name"));
            assert!(errors[1].starts_with("ops[1].from"));
        } else {
            panic!("Expected validation error");
        }
        assert!(validate_patch_request(&PatchRequest::new(vec![])).is_err());
    }

    #[test]
    fn test_patch_files_stay_in_project() {
        assert!(is_project_path("A.tsx"));
        assert!(is_project_path("/src/components/generated/A.tsx"));
        assert!(is_project_path("./src/A.tsx"));
        assert!(!is_project_path("../../x.tsx"));
        assert!(!is_project_path("/src/../../x.tsx"));
        assert!(!is_project_path("src\\..\\..\\x.tsx"));

        let request = PatchRequest::new(vec![PatchOp::TextEdit {
            file: "../outside.tsx".into(),
            find: "a".into(),
            replace: "b".into(),
        }]);
        if let Err(ForgeError::Validation(errors)) = validate_patch_request(&request) {
            assert_eq!(
                errors,
                vec!["ops[0].file: '../outside.tsx' must stay inside the project root"]
            );
        } else {
            panic!("Expected validation error");
        }
    }

    #[test]
    fn test_name_helpers() {
        assert!(is_pascal_case("FeatureRequest"));
        assert!(!is_pascal_case("featureRequest"));
        assert!(!is_pascal_case("Feature Request"));
        assert!(is_jsx_attribute_name("data-testid"));
        assert!(is_jsx_attribute_name("aria-label"));
        assert!(is_jsx_attribute_name("xlink:href"));
        assert!(!is_jsx_attribute_name("1st"));
        assert!(!is_jsx_attribute_name("a b"));
    }
}
