use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::config::OracleConfig;
use crate::error::Warning;
use crate::ir::{Field, FieldComponent, ListItem, UiNode, UiTree};
use crate::oracle::{consult, DesignOracle, OracleError};
use crate::palette::Palette;
use crate::plan::{BuildNode, BuildPlan};
use crate::tailwind::{node_classes, style_classes};
use crate::validator::validate_plan;

/// Key substituted for component keys the palette does not know.
pub const FALLBACK_KEY: &str = "layout.stack";

/// A plan together with the non-fatal conditions met while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned {
    pub plan: BuildPlan,
    pub warnings: Vec<Warning>,
}

/// Lowers UI trees to palette-bound build plans.
#[derive(Debug, Clone)]
pub struct BuildPlanMapper<'p> {
    palette: &'p Palette,
    oracle_timeout: Duration,
}

impl<'p> BuildPlanMapper<'p> {
    pub fn new(palette: &'p Palette) -> Self {
        Self {
            palette,
            oracle_timeout: OracleConfig::default().timeout(),
        }
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Deterministic mapping.
    pub fn plan(&self, tree: &UiTree, name: &str) -> Planned {
        let stack = BuildNode::new("layout.stack")
            .with_children(tree.children.iter().map(|child| self.map_node(child)));
        let plan = BuildPlan {
            name: name.to_string(),
            imports: Vec::new(),
            root: BuildNode::new("layout.card").with_child(stack),
        };
        self.finish(plan, Vec::new())
    }

    /// Ask the oracle for a plan; fall back to [`plan`](Self::plan) when it
    /// fails, times out, or returns a structurally invalid plan.
    pub async fn plan_with_oracle<O: DesignOracle>(
        &self,
        tree: &UiTree,
        name: &str,
        oracle: &O,
    ) -> Planned {
        let keys: Vec<String> = self.palette.keys().map(str::to_string).collect();
        let proposed = consult(self.oracle_timeout, oracle.propose_build_plan(tree, &keys))
            .await
            .and_then(|plan| match validate_plan(&plan) {
                Ok(()) => Ok(plan),
                Err(e) => Err(OracleError::Invalid(e.to_string())),
            });

        match proposed {
            Ok(mut plan) => {
                plan.name = name.to_string();
                self.finish(plan, Vec::new())
            }
            Err(e) => {
                warn!(error = %e, "build plan oracle failed, using deterministic mapping");
                let mut planned = self.plan(tree, name);
                planned.warnings.insert(
                    0,
                    Warning::OracleUnavailable {
                        stage: "buildPlan".to_string(),
                        reason: e.to_string(),
                    },
                );
                planned
            }
        }
    }

    /// Replace unknown keys and recompute imports from the palette.
    fn finish(&self, mut plan: BuildPlan, mut warnings: Vec<Warning>) -> Planned {
        let palette = self.palette;
        plan.root.walk_mut(&mut |node: &mut BuildNode| {
            if !palette.contains(&node.component_key) {
                warn!(key = %node.component_key, "unknown component key");
                warnings.push(Warning::UnresolvedComponentKey {
                    key: node.component_key.clone(),
                });
                if palette.contains(FALLBACK_KEY) {
                    node.component_key = FALLBACK_KEY.to_string();
                }
            }
        });

        let mut imports: Vec<String> = Vec::new();
        for key in plan.component_keys() {
            if let Some(import) = palette.lookup(key).and_then(|e| e.import.as_ref()) {
                if !imports.contains(import) {
                    imports.push(import.clone());
                }
            }
        }
        plan.imports = imports;

        Planned { plan, warnings }
    }

    fn map_node(&self, node: &UiNode) -> BuildNode {
        match node {
            UiNode::Text {
                role,
                content,
                style,
            } => {
                let key = format!("typography.{}", role.as_str());
                let key = if self.palette.contains(&key) {
                    key
                } else {
                    "typography.p".to_string()
                };
                BuildNode::new(key)
                    .with_tailwind(style_classes(style).join(" "))
                    .with_text(content.clone())
            }
            UiNode::Image { src, alt, style } => {
                let mut img = BuildNode::new("media.img")
                    .with_tailwind(style_classes(style).join(" "))
                    .with_prop("alt", alt.clone().unwrap_or_default());
                if let Some(src) = src {
                    img = img.with_prop("src", src.clone());
                }
                img
            }
            UiNode::Icon { name, style } => BuildNode::new("icon.button")
                .with_tailwind(style_classes(style).join(" "))
                .with_prop("aria-label", name.clone())
                .with_text(name.clone()),
            UiNode::Button { label, style } => BuildNode::new("form.button")
                .with_tailwind(style_classes(style).join(" "))
                .with_text(label.clone()),
            UiNode::Form { fields, style, .. } => BuildNode::new("layout.card")
                .with_tailwind(style_classes(style).join(" "))
                .with_child(
                    BuildNode::new("layout.stack")
                        .with_children(fields.iter().map(|field| self.map_field(field))),
                ),
            UiNode::List { items, style } => BuildNode::new("list.ul")
                .with_tailwind(style_classes(style).join(" "))
                .with_children(items.iter().map(|item| match item {
                    ListItem::Text(text) => BuildNode::new("list.li").with_text(text.clone()),
                    ListItem::Node(node) => BuildNode::new("list.li").with_child(self.map_node(node)),
                })),
            UiNode::Frame {
                layout,
                style,
                children,
            } => BuildNode::new("layout.stack")
                .with_tailwind(node_classes(Some(layout), style))
                .with_children(children.iter().map(|child| self.map_node(child))),
        }
    }

    fn map_field(&self, field: &Field) -> BuildNode {
        let label = field.label.clone().unwrap_or_else(|| field.name.clone());
        let control = |key: &str| {
            let mut node = BuildNode::new(key)
                .with_prop("name", field.name.clone())
                .with_prop("aria-label", label.clone());
            if field.required == Some(true) {
                node = node.with_prop("required", Value::Bool(true));
            }
            node
        };

        match field.component {
            FieldComponent::Input => {
                let mut node = control("form.input").with_prop("type", "text");
                if let Some(placeholder) = &field.placeholder {
                    node = node.with_prop("placeholder", placeholder.clone());
                }
                node
            }
            FieldComponent::Textarea => {
                let mut node = control("form.textarea");
                if let Some(placeholder) = &field.placeholder {
                    node = node.with_prop("placeholder", placeholder.clone());
                }
                node
            }
            FieldComponent::Select => control("form.select").with_children(
                field.options.iter().flatten().map(|option| {
                    BuildNode::new("form.option")
                        .with_prop("value", option.clone())
                        .with_text(option.clone())
                }),
            ),
            FieldComponent::Checkbox | FieldComponent::Switch => control("form.checkbox"),
            FieldComponent::Button => BuildNode::new("form.button").with_text(label.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TextRole;
    use crate::palette::PaletteEntry;
    use crate::features::Feature;
    use crate::plan::BuildChild;
    use crate::style::{Layout, Style};
    use pretty_assertions::assert_eq;

    fn tree(children: Vec<UiNode>) -> UiTree {
        UiTree::new(Layout::default(), Style::default(), children)
    }

    fn keys(node: &BuildNode) -> Vec<String> {
        node.walk().iter().map(|n| n.component_key.clone()).collect()
    }

    #[test]
    fn test_root_shape() {
        let palette = Palette::builtin();
        let planned = BuildPlanMapper::new(&palette).plan(
            &tree(vec![UiNode::text(TextRole::H1, "Title", Style::default())]),
            "Hero",
        );
        assert_eq!(planned.plan.name, "Hero");
        assert!(planned.warnings.is_empty());
        assert_eq!(
            keys(&planned.plan.root),
            vec!["layout.card", "layout.stack", "typography.h1"]
        );
        let h1 = planned.plan.root.walk()[2];
        assert_eq!(h1.children, Some(vec![BuildChild::Text("Title".into())]));
    }

    #[test]
    fn test_form_fields() {
        let palette = Palette::builtin();
        let form = UiNode::Form {
            name: "contact".into(),
            fields: vec![
                Field::new("email", FieldComponent::Input)
                    .with_label("Email")
                    .with_placeholder("Enter Email"),
                Field {
                    options: Some(vec!["Low".into(), "High".into()]),
                    ..Field::new("priority", FieldComponent::Select)
                },
                Field::new("agree", FieldComponent::Switch),
                Field::new("submit", FieldComponent::Button).with_label("Send"),
            ],
            actions: None,
            style: Style::default(),
        };
        let planned = BuildPlanMapper::new(&palette).plan(&tree(vec![form]), "Contact");
        assert_eq!(
            keys(&planned.plan.root),
            vec![
                "layout.card",
                "layout.stack",
                "layout.card",
                "layout.stack",
                "form.input",
                "form.select",
                "form.option",
                "form.option",
                "form.checkbox",
                "form.button",
            ]
        );
        let input = planned.plan.root.walk()[4];
        let props = input.props.as_ref().unwrap();
        assert_eq!(props["name"], "email");
        assert_eq!(props["placeholder"], "Enter Email");
        assert_eq!(props["aria-label"], "Email");
    }

    #[test]
    fn test_frame_style_lowered_to_classes() {
        let palette = Palette::builtin();
        let frame = UiNode::Frame {
            layout: Layout::column(12.0, Some(16.0)),
            style: Style {
                bg: Some("#eee".into()),
                ..Style::default()
            },
            children: vec![UiNode::Button {
                label: "Go".into(),
                style: Style::default(),
            }],
        };
        let planned = BuildPlanMapper::new(&palette).plan(&tree(vec![frame]), "F");
        let stack = planned.plan.root.walk()[2];
        assert_eq!(stack.component_key, "layout.stack");
        assert_eq!(
            stack.tailwind.as_deref(),
            Some("flex flex-col gap-[12px] p-[16px] bg-[#eee]")
        );
    }

    #[test]
    fn test_list_items() {
        let palette = Palette::builtin();
        let list = UiNode::List {
            items: vec![
                ListItem::Text("One".into()),
                ListItem::Node(UiNode::Icon {
                    name: "star".into(),
                    style: Style::default(),
                }),
            ],
            style: Style::default(),
        };
        let planned = BuildPlanMapper::new(&palette).plan(&tree(vec![list]), "L");
        assert_eq!(
            keys(&planned.plan.root)[2..].to_vec(),
            vec!["list.ul", "list.li", "list.li", "icon.button"]
        );
    }

    #[test]
    fn test_imports_from_palette() {
        let palette = Palette::from_yaml(
            r#"
entries:
  - key: form.button
    lib: shadcn
    tag: Button
    import: 'import { Button } from "@/components/ui/button"'
"#,
        )
        .unwrap();
        let t = tree(vec![
            UiNode::Button {
                label: "A".into(),
                style: Style::default(),
            },
            UiNode::Button {
                label: "B".into(),
                style: Style::default(),
            },
        ]);
        let planned = BuildPlanMapper::new(&palette).plan(&t, "Buttons");
        assert_eq!(
            planned.plan.imports,
            vec![r#"import { Button } from "@/components/ui/button""#]
        );
    }

    struct FixedOracle(BuildPlan);

    impl DesignOracle for FixedOracle {
        async fn propose_ui_tree(&self, _: &str, _: &[Feature]) -> Result<UiTree, OracleError> {
            Err(OracleError::Unavailable("unused".into()))
        }

        async fn propose_build_plan(
            &self,
            _: &UiTree,
            _: &[String],
        ) -> Result<BuildPlan, OracleError> {
            Ok(self.0.clone())
        }
    }

    struct SlowOracle;

    impl DesignOracle for SlowOracle {
        async fn propose_ui_tree(&self, _: &str, _: &[Feature]) -> Result<UiTree, OracleError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(OracleError::Unavailable("late".into()))
        }

        async fn propose_build_plan(
            &self,
            _: &UiTree,
            _: &[String],
        ) -> Result<BuildPlan, OracleError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(OracleError::Unavailable("late".into()))
        }
    }

    #[tokio::test]
    async fn test_oracle_unknown_keys_replaced() {
        let palette = Palette::builtin();
        let proposed = BuildPlan {
            name: "Whatever".into(),
            imports: vec!["import junk".into()],
            root: BuildNode::new("layout.card").with_child(BuildNode::new("ui.carousel")),
        };
        let planned = BuildPlanMapper::new(&palette)
            .plan_with_oracle(
                &tree(vec![UiNode::text(TextRole::P, "x", Style::default())]),
                "Gallery",
                &FixedOracle(proposed),
            )
            .await;
        assert_eq!(planned.plan.name, "Gallery");
        assert!(planned.plan.imports.is_empty());
        assert_eq!(keys(&planned.plan.root), vec!["layout.card", "layout.stack"]);
        assert_eq!(
            planned.warnings,
            vec![Warning::UnresolvedComponentKey {
                key: "ui.carousel".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_timeout_falls_back() {
        let palette = Palette::builtin();
        let t = tree(vec![UiNode::text(TextRole::H2, "Hi", Style::default())]);
        let mapper = BuildPlanMapper::new(&palette).with_oracle_timeout(Duration::from_millis(100));
        let fallback = mapper.plan_with_oracle(&t, "Hi", &SlowOracle).await;
        let direct = mapper.plan(&t, "Hi");
        assert_eq!(fallback.plan, direct.plan);
        assert!(matches!(
            fallback.warnings[0],
            Warning::OracleUnavailable { .. }
        ));
    }

    #[test]
    fn test_custom_palette_without_key_keeps_it() {
        let entry = PaletteEntry {
            key: "layout.card".into(),
            lib: Default::default(),
            tag: "div".into(),
            import: None,
            tailwind: None,
            default_props: None,
            match_hints: None,
        };
        let palette = Palette::new(vec![entry]).unwrap();
        let planned = BuildPlanMapper::new(&palette).plan(
            &tree(vec![UiNode::text(TextRole::P, "x", Style::default())]),
            "Tiny",
        );
        assert_eq!(planned.warnings.len(), 2);
        assert_eq!(
            keys(&planned.plan.root),
            vec!["layout.card", "layout.stack", "typography.p"]
        );
    }
}
