use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A palette-bound component tree ready for code generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<String>,
    pub root: BuildNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildNode {
    pub component_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<BTreeMap<String, Value>>,
    /// Extra classes appended to the palette defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailwind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BuildChild>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildChild {
    Text(String),
    Node(BuildNode),
}

impl BuildNode {
    pub fn new(component_key: impl Into<String>) -> Self {
        Self {
            component_key: component_key.into(),
            props: None,
            tailwind: None,
            children: None,
        }
    }

    pub fn with_tailwind(mut self, classes: impl Into<String>) -> Self {
        let classes = classes.into();
        if !classes.trim().is_empty() {
            self.tailwind = Some(classes);
        }
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: BuildNode) -> Self {
        self.children
            .get_or_insert_with(Vec::new)
            .push(BuildChild::Node(child));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = BuildNode>) -> Self {
        for child in children {
            self = self.with_child(child);
        }
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children
            .get_or_insert_with(Vec::new)
            .push(BuildChild::Text(text.into()));
        self
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &BuildNode> {
        self.children.iter().flatten().filter_map(|c| match c {
            BuildChild::Node(n) => Some(n),
            BuildChild::Text(_) => None,
        })
    }

    /// This node and every descendant node, pre-order.
    pub fn walk(&self) -> Vec<&BuildNode> {
        let mut out = vec![self];
        for child in self.child_nodes() {
            out.extend(child.walk());
        }
        out
    }

    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut BuildNode)) {
        f(self);
        for child in self.children.iter_mut().flatten() {
            if let BuildChild::Node(node) = child {
                node.walk_mut(f);
            }
        }
    }
}

impl BuildPlan {
    /// Component keys in first-seen pre-order, without duplicates.
    pub fn component_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for node in self.root.walk() {
            if !keys.contains(&node.component_key.as_str()) {
                keys.push(&node.component_key);
            }
        }
        keys
    }
}
