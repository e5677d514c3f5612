//! # TSX emission
//!
//! Turns a [`BuildPlan`] (palette path) or a [`UiTree`] (direct path) into the
//! source of one React function component.
//!
//! Both paths first build a small [`Markup`] tree and then print it, so
//! indentation, escaping and self-closing rules live in one place. Text is
//! entity-escaped, string props go through [`string_literal`], and prop names
//! that are not JSX attribute names never reach the output.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::error::Warning;
use crate::ir::{Field, FieldComponent, ListItem, SubmitAction, UiNode, UiTree};
use crate::palette::Palette;
use crate::patch::jsx::string_literal;
use crate::plan::{BuildChild, BuildNode, BuildPlan};
use crate::tailwind::{node_classes, style_classes, ClassList};
use crate::validator::{is_jsx_attribute_name, is_pascal_case};

pub const DEFAULT_COMPONENT_NAME: &str = "GeneratedComponent";

const SELF_CLOSING: &[&str] = &["img", "input", "br", "hr"];
const FORM_CONTROL_TAGS: &[&str] = &["input", "textarea", "select"];
const CONTROL_CLASSES: &str = "border rounded-md px-3 py-2 w-full";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedComponent {
    pub name: String,
    pub file_path: String,
    pub code: String,
    pub warnings: Vec<Warning>,
}

/// Element or text to be printed.
#[derive(Debug, Clone, PartialEq)]
enum Markup {
    Element {
        tag: String,
        attrs: Vec<String>,
        children: Vec<Markup>,
    },
    Text(String),
}

impl Markup {
    fn element(tag: &str, attrs: Vec<String>, children: Vec<Markup>) -> Self {
        Markup::Element {
            tag: tag.to_string(),
            attrs,
            children,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodeGenerator<'p> {
    palette: &'p Palette,
    output_dir: String,
}

impl<'p> CodeGenerator<'p> {
    pub fn new(palette: &'p Palette) -> Self {
        Self {
            palette,
            output_dir: OutputConfig::default().dir,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Emit a plan, resolving every node through the palette.
    pub fn emit_plan(&self, plan: &BuildPlan) -> GeneratedComponent {
        let mut warnings = Vec::new();
        let name = self.resolve_name(&plan.name, &mut warnings);

        let mut imports: Vec<String> = Vec::new();
        for key in plan.component_keys() {
            if let Some(import) = self.palette.lookup(key).and_then(|e| e.import.as_ref()) {
                if !imports.contains(import) {
                    imports.push(import.clone());
                }
            }
        }

        let body = self.plan_markup(&plan.root, &mut warnings);
        let is_form = plan.root.walk().iter().any(|node| self.is_form_control(node));
        let code = component_source(&name, &imports, &body, is_form, None);

        info!(component = %name, warnings = warnings.len(), "emitted component from build plan");
        GeneratedComponent {
            file_path: self.file_path(&name),
            name,
            code,
            warnings,
        }
    }

    /// Emit a UI tree directly, without the palette. Submit actions on the
    /// first form that declares one are wired into `handleSubmit`.
    pub fn emit_tree(&self, tree: &UiTree, name: &str) -> GeneratedComponent {
        let mut warnings = Vec::new();
        let name = self.resolve_name(name, &mut warnings);

        let body = Markup::element(
            "div",
            class_attr(&node_classes(Some(&tree.layout), &tree.style)),
            tree.children.iter().map(tree_markup).collect(),
        );
        let action = tree.walk().into_iter().find_map(|node| match node {
            UiNode::Form {
                actions: Some(actions),
                ..
            } => actions.on_submit.as_ref(),
            _ => None,
        });
        let code = component_source(&name, &[], &body, tree.contains_form(), action);

        info!(component = %name, warnings = warnings.len(), "emitted component from UI tree");
        GeneratedComponent {
            file_path: self.file_path(&name),
            name,
            code,
            warnings,
        }
    }

    fn resolve_name(&self, requested: &str, warnings: &mut Vec<Warning>) -> String {
        let name = component_name(requested);
        if name != requested {
            warnings.push(Warning::RenamedComponent {
                requested: requested.to_string(),
                used: name.clone(),
            });
        }
        name
    }

    fn file_path(&self, name: &str) -> String {
        let dir = self.output_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{}.tsx", name)
        } else {
            format!("{}/{}.tsx", dir, name)
        }
    }

    fn is_form_control(&self, node: &BuildNode) -> bool {
        if node.component_key.starts_with("form.") {
            return true;
        }
        self.palette
            .lookup(&node.component_key)
            .is_some_and(|entry| FORM_CONTROL_TAGS.contains(&entry.tag.as_str()))
    }

    fn plan_markup(&self, node: &BuildNode, warnings: &mut Vec<Warning>) -> Markup {
        let key = &node.component_key;
        let Some(entry) = self.palette.lookup(key) else {
            warn!(key = %key, "no palette entry, emitting placeholder");
            warnings.push(Warning::UnresolvedComponentKey { key: key.clone() });
            return Markup::element(
                "div",
                vec![format!("data-unresolved={}", string_literal(key))],
                vec![Markup::Text(format!("Unknown component: {}", key))],
            );
        };

        let mut props: BTreeMap<String, Value> = entry.default_props.clone().unwrap_or_default();
        if let Some(own) = &node.props {
            props.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let mut classes = ClassList::parse(entry.tailwind.as_deref().unwrap_or(""));
        if let Some(extra) = &node.tailwind {
            classes.add(extra);
        }
        match props.remove("className") {
            Some(Value::String(extra)) => {
                classes.add(&extra);
            }
            Some(_) => warnings.push(Warning::DroppedProp {
                key: key.clone(),
                prop: "className".to_string(),
            }),
            None => {}
        }

        let mut attrs = class_attr(&classes.to_string());
        for (name, value) in &props {
            if !is_jsx_attribute_name(name) {
                warn!(key = %key, prop = %name, "dropping invalid prop name");
                warnings.push(Warning::DroppedProp {
                    key: key.clone(),
                    prop: name.clone(),
                });
                continue;
            }
            attrs.extend(render_prop(name, value));
        }

        let children = node
            .children
            .iter()
            .flatten()
            .map(|child| match child {
                BuildChild::Text(text) => Markup::Text(text.clone()),
                BuildChild::Node(child) => self.plan_markup(child, warnings),
            })
            .collect();

        Markup::element(&entry.tag, attrs, children)
    }
}

/// Normalize a requested name to a PascalCase identifier:
/// `"feature request"` → `FeatureRequest`, empty → `GeneratedComponent`.
pub fn component_name(requested: &str) -> String {
    let trimmed = requested.trim();
    if is_pascal_case(trimmed) {
        return trimmed.to_string();
    }
    let mut name = String::new();
    for word in trimmed
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(chars.as_str());
        }
    }
    if name.is_empty() {
        return DEFAULT_COMPONENT_NAME.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Component");
    }
    name
}

/// Escape text for a JSX child position.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

fn class_attr(classes: &str) -> Vec<String> {
    if classes.trim().is_empty() {
        Vec::new()
    } else {
        vec![format!("className={}", string_literal(classes))]
    }
}

fn render_prop(name: &str, value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some(name.to_string()),
        Value::String(s) => Some(format!("{}={}", name, string_literal(s))),
        other => Some(format!("{}={{{}}}", name, other)),
    }
}

fn render(node: &Markup, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Markup::Text(text) => {
            out.push_str(&indent);
            out.push_str(&escape_text(text));
            out.push('\n');
        }
        Markup::Element {
            tag,
            attrs,
            children,
        } => {
            let open = if attrs.is_empty() {
                tag.clone()
            } else {
                format!("{} {}", tag, attrs.join(" "))
            };
            match children.as_slice() {
                [] if SELF_CLOSING.contains(&tag.as_str()) => {
                    out.push_str(&format!("{}<{} />\n", indent, open));
                }
                [] => out.push_str(&format!("{}<{}></{}>\n", indent, open, tag)),
                [Markup::Text(text)] => out.push_str(&format!(
                    "{}<{}>{}</{}>\n",
                    indent,
                    open,
                    escape_text(text),
                    tag
                )),
                _ => {
                    out.push_str(&format!("{}<{}>\n", indent, open));
                    for child in children {
                        render(child, depth + 1, out);
                    }
                    out.push_str(&format!("{}</{}>\n", indent, tag));
                }
            }
        }
    }
}

fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn fetch_call(action: &SubmitAction) -> String {
    let (url, body) = match action {
        SubmitAction::HttpPost { url } => (js_string(url), "data".to_string()),
        SubmitAction::OpenApiOp {
            spec_url,
            operation_id,
        } => (
            js_string("/api/openapi"),
            format!(
                "{{ specUrl: {}, operationId: {}, data }}",
                js_string(spec_url),
                js_string(operation_id)
            ),
        ),
        SubmitAction::SupabaseInsert { table } => (
            js_string("/api/supabase"),
            format!("{{ table: {}, data }}", js_string(table)),
        ),
        SubmitAction::GraphqlMutation { endpoint, document } => (
            js_string("/api/graphql"),
            format!(
                "{{ endpoint: {}, query: {}, variables: data }}",
                js_string(endpoint),
                js_string(document)
            ),
        ),
    };
    format!(
        "await fetch({}, {{ method: \"POST\", headers: {{ \"Content-Type\": \"application/json\" }}, body: JSON.stringify({}) }});",
        url, body
    )
}

fn component_source(
    name: &str,
    imports: &[String],
    body: &Markup,
    is_form: bool,
    action: Option<&SubmitAction>,
) -> String {
    let mut out = String::new();
    for import in imports {
        out.push_str(import.trim_end_matches(';'));
        out.push_str(";\n");
    }
    if is_form {
        out.push_str("import type { FormEvent } from \"react\";\n");
    }
    if is_form || !imports.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!("export type {}Props = {{\n", name));
    out.push_str("  onSubmit?: (data: Record<string, FormDataEntryValue>) => void;\n");
    out.push_str("  className?: string;\n");
    out.push_str("};\n\n");

    if is_form {
        out.push_str(&format!(
            "export default function {}({{ onSubmit, className }}: {}Props) {{\n",
            name, name
        ));
        let asyncness = if action.is_some() { "async " } else { "" };
        out.push_str(&format!(
            "  {}function handleSubmit(event: FormEvent<HTMLFormElement>) {{\n",
            asyncness
        ));
        out.push_str("    event.preventDefault();\n");
        out.push_str("    const data = Object.fromEntries(new FormData(event.currentTarget));\n");
        if let Some(action) = action {
            out.push_str(&format!("    {}\n", fetch_call(action)));
        }
        out.push_str("    onSubmit?.(data);\n");
        out.push_str("  }\n\n");
    } else {
        out.push_str(&format!(
            "export default function {}({{ className }}: {}Props) {{\n",
            name, name
        ));
    }

    out.push_str("  return (\n");
    if is_form {
        out.push_str("    <form className={className} onSubmit={handleSubmit}>\n");
    } else {
        out.push_str("    <div className={className}>\n");
    }
    render(body, 3, &mut out);
    out.push_str(if is_form { "    </form>\n" } else { "    </div>\n" });
    out.push_str("  );\n");
    out.push_str("}\n");
    out
}

fn tree_markup(node: &UiNode) -> Markup {
    match node {
        UiNode::Text {
            role,
            content,
            style,
        } => Markup::element(
            role.as_str(),
            class_attr(&style_classes(style).join(" ")),
            vec![Markup::Text(content.clone())],
        ),
        UiNode::Image { src, alt, style } => {
            let mut attrs = Vec::new();
            if let Some(src) = src {
                attrs.push(format!("src={}", string_literal(src)));
            }
            attrs.push(format!("alt={}", string_literal(alt.as_deref().unwrap_or(""))));
            attrs.extend(class_attr(&style_classes(style).join(" ")));
            Markup::element("img", attrs, Vec::new())
        }
        UiNode::Icon { name, style } => {
            let mut attrs = vec![
                "role=\"img\"".to_string(),
                format!("aria-label={}", string_literal(name)),
            ];
            attrs.extend(class_attr(&style_classes(style).join(" ")));
            Markup::element("span", attrs, vec![Markup::Text(name.clone())])
        }
        UiNode::Button { label, style } => {
            let mut attrs = vec!["type=\"button\"".to_string()];
            attrs.extend(class_attr(&style_classes(style).join(" ")));
            Markup::element("button", attrs, vec![Markup::Text(label.clone())])
        }
        UiNode::Frame {
            layout,
            style,
            children,
        } => Markup::element(
            "div",
            class_attr(&node_classes(Some(layout), style)),
            children.iter().map(tree_markup).collect(),
        ),
        UiNode::List { items, style } => Markup::element(
            "ul",
            class_attr(&style_classes(style).join(" ")),
            items
                .iter()
                .map(|item| match item {
                    ListItem::Text(text) => {
                        Markup::element("li", Vec::new(), vec![Markup::Text(text.clone())])
                    }
                    ListItem::Node(node) => Markup::element("li", Vec::new(), vec![tree_markup(node)]),
                })
                .collect(),
        ),
        UiNode::Form { fields, style, .. } => {
            let mut classes = ClassList::parse("flex flex-col gap-4");
            classes.add(&style_classes(style).join(" "));
            Markup::element(
                "div",
                class_attr(&classes.to_string()),
                fields.iter().map(field_markup).collect(),
            )
        }
    }
}

fn field_markup(field: &Field) -> Markup {
    let label = field.label.as_deref().unwrap_or(&field.name);
    let id = format!("field-{}", field.name);

    let mut attrs = vec![
        format!("id={}", string_literal(&id)),
        format!("name={}", string_literal(&field.name)),
    ];
    if let Some(placeholder) = &field.placeholder {
        attrs.push(format!("placeholder={}", string_literal(placeholder)));
    }
    if field.required == Some(true) {
        attrs.push("required".to_string());
    }

    let label_markup = |classes: &str| {
        Markup::element(
            "label",
            vec![
                format!("htmlFor={}", string_literal(&id)),
                format!("className={}", string_literal(classes)),
            ],
            vec![Markup::Text(label.to_string())],
        )
    };

    let control = match field.component {
        FieldComponent::Button => {
            return Markup::element(
                "button",
                vec![
                    "type=\"submit\"".to_string(),
                    "className=\"bg-black text-white rounded-md px-4 py-2\"".to_string(),
                ],
                vec![Markup::Text(label.to_string())],
            );
        }
        FieldComponent::Checkbox | FieldComponent::Switch => {
            attrs.insert(0, "type=\"checkbox\"".to_string());
            attrs.push("className=\"h-4 w-4 rounded border\"".to_string());
            return Markup::element(
                "div",
                class_attr("flex items-center gap-2"),
                vec![
                    Markup::element("input", attrs, Vec::new()),
                    label_markup("text-sm"),
                ],
            );
        }
        FieldComponent::Input => {
            attrs.insert(0, "type=\"text\"".to_string());
            attrs.extend(class_attr(CONTROL_CLASSES));
            Markup::element("input", attrs, Vec::new())
        }
        FieldComponent::Textarea => {
            attrs.push("rows={4}".to_string());
            attrs.extend(class_attr(CONTROL_CLASSES));
            Markup::element("textarea", attrs, Vec::new())
        }
        FieldComponent::Select => {
            attrs.extend(class_attr(CONTROL_CLASSES));
            let options = field
                .options
                .iter()
                .flatten()
                .map(|option| {
                    Markup::element(
                        "option",
                        vec![format!("value={}", string_literal(option))],
                        vec![Markup::Text(option.clone())],
                    )
                })
                .collect();
            Markup::element("select", attrs, options)
        }
    };

    Markup::element(
        "div",
        class_attr("flex flex-col gap-1"),
        vec![label_markup("text-sm font-medium"), control],
    )
}
