use serde::{Deserialize, Serialize};

use crate::style::{Layout, Style};

/// Root of an inferred UI. Always a frame; serializes with `"type": "Frame"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiTree {
    #[serde(rename = "type", default)]
    pub kind: RootKind,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub style: Style,
    pub children: Vec<UiNode>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootKind {
    #[default]
    Frame,
}

impl UiTree {
    pub fn new(layout: Layout, style: Style, children: Vec<UiNode>) -> Self {
        Self {
            kind: RootKind::Frame,
            layout,
            style,
            children,
        }
    }

    /// Every node below the root, pre-order.
    pub fn walk(&self) -> Vec<&UiNode> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect(&mut out);
        }
        out
    }

    pub fn contains_form(&self) -> bool {
        self.walk().iter().any(|n| matches!(n, UiNode::Form { .. }))
    }
}

/// A node of the inferred UI, internally tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiNode {
    Text {
        #[serde(default)]
        role: TextRole,
        content: String,
        #[serde(default)]
        style: Style,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default)]
        style: Style,
    },
    Icon {
        name: String,
        #[serde(default)]
        style: Style,
    },
    Frame {
        #[serde(default)]
        layout: Layout,
        #[serde(default)]
        style: Style,
        #[serde(default)]
        children: Vec<UiNode>,
    },
    Form {
        name: String,
        fields: Vec<Field>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actions: Option<FormActions>,
        #[serde(default)]
        style: Style,
    },
    List {
        items: Vec<ListItem>,
        #[serde(default)]
        style: Style,
    },
    Button {
        label: String,
        #[serde(default)]
        style: Style,
    },
}

impl UiNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            UiNode::Text { .. } => "Text",
            UiNode::Image { .. } => "Image",
            UiNode::Icon { .. } => "Icon",
            UiNode::Frame { .. } => "Frame",
            UiNode::Form { .. } => "Form",
            UiNode::List { .. } => "List",
            UiNode::Button { .. } => "Button",
        }
    }

    pub fn style(&self) -> &Style {
        match self {
            UiNode::Text { style, .. }
            | UiNode::Image { style, .. }
            | UiNode::Icon { style, .. }
            | UiNode::Frame { style, .. }
            | UiNode::Form { style, .. }
            | UiNode::List { style, .. }
            | UiNode::Button { style, .. } => style,
        }
    }

    pub fn text(role: TextRole, content: impl Into<String>, style: Style) -> Self {
        UiNode::Text {
            role,
            content: content.into(),
            style,
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a UiNode>) {
        out.push(self);
        match self {
            UiNode::Frame { children, .. } => {
                for child in children {
                    child.collect(out);
                }
            }
            UiNode::List { items, .. } => {
                for item in items {
                    if let ListItem::Node(node) = item {
                        node.collect(out);
                    }
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRole {
    H1,
    H2,
    H3,
    #[default]
    P,
    Span,
}

impl TextRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TextRole::H1 => "h1",
            TextRole::H2 => "h2",
            TextRole::H3 => "h3",
            TextRole::P => "p",
            TextRole::Span => "span",
        }
    }

    /// Heading level from a font size in pixels.
    pub fn from_font_size(size: f64) -> Self {
        if size >= 32.0 {
            TextRole::H1
        } else if size >= 24.0 {
            TextRole::H2
        } else if size >= 18.0 {
            TextRole::H3
        } else {
            TextRole::P
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub component: FieldComponent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, component: FieldComponent) -> Self {
        Self {
            name: name.into(),
            label: None,
            component,
            required: None,
            options: None,
            placeholder: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldComponent {
    Input,
    Textarea,
    Select,
    Checkbox,
    Switch,
    Button,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_submit: Option<SubmitAction>,
}

/// Where a generated form sends its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SubmitAction {
    #[serde(rename = "http.post")]
    HttpPost { url: String },
    #[serde(rename = "openapi.op")]
    OpenApiOp {
        #[serde(rename = "specUrl")]
        spec_url: String,
        #[serde(rename = "operationId")]
        operation_id: String,
    },
    #[serde(rename = "supabase.insert")]
    SupabaseInsert { table: String },
    #[serde(rename = "graphql.mutation")]
    GraphqlMutation { endpoint: String, document: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Text(String),
    Node(UiNode),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Shadow;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_tree_serializes_as_frame() {
        let tree = UiTree::new(
            Layout::column(16.0, None),
            Style::default(),
            vec![UiNode::text(TextRole::H1, "Title", Style::default())],
        );
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["type"], "Frame");
        assert_eq!(value["children"][0]["type"], "Text");
        assert_eq!(value["children"][0]["role"], "h1");
    }

    #[test]
    fn test_oracle_shaped_json_deserializes() {
        let value = json!({
            "type": "Frame",
            "children": [
                {"type": "Text", "content": "Hello"},
                {"type": "Frame", "style": {"shadow": "sm"}, "children": [
                    {"type": "Button", "label": "Go"}
                ]},
                {"type": "Form", "name": "signup", "fields": [
                    {"name": "email", "component": "Input", "required": true}
                ], "actions": {"onSubmit": {"type": "http.post", "url": "/api/signup"}}},
                {"type": "List", "items": ["one", {"type": "Icon", "name": "star"}]}
            ]
        });
        let tree: UiTree = serde_json::from_value(value).unwrap();
        assert_eq!(tree.children.len(), 4);
        assert_eq!(
            tree.children[0],
            UiNode::text(TextRole::P, "Hello", Style::default())
        );
        if let UiNode::Frame { style, children, .. } = &tree.children[1] {
            assert_eq!(style.shadow, Some(Shadow::Sm));
            assert_eq!(children.len(), 1);
        } else {
            panic!("Expected Frame");
        }
        if let UiNode::Form { actions, fields, .. } = &tree.children[2] {
            assert_eq!(fields[0].required, Some(true));
            assert_eq!(
                actions.as_ref().unwrap().on_submit,
                Some(SubmitAction::HttpPost {
                    url: "/api/signup".into()
                })
            );
        } else {
            panic!("Expected Form");
        }
        assert!(tree.contains_form());
        assert_eq!(tree.walk().len(), 6);
    }

    #[test]
    fn test_submit_action_wire_names() {
        let action = SubmitAction::OpenApiOp {
            spec_url: "https://api.example.com/openapi.json".into(),
            operation_id: "createTicket".into(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "openapi.op");
        assert_eq!(value["specUrl"], "https://api.example.com/openapi.json");
        assert_eq!(value["operationId"], "createTicket");
    }

    #[test]
    fn test_role_from_font_size() {
        assert_eq!(TextRole::from_font_size(40.0), TextRole::H1);
        assert_eq!(TextRole::from_font_size(24.0), TextRole::H2);
        assert_eq!(TextRole::from_font_size(18.0), TextRole::H3);
        assert_eq!(TextRole::from_font_size(12.0), TextRole::P);
    }
}
