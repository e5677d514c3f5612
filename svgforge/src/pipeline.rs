//! End-to-end generation and patching entry points.
//!
//! [`Forge`] owns the configuration and the palette for a session. Each call
//! is request-scoped: markup is sanitized and parsed, features are extracted,
//! a UI tree is inferred (or proposed by an oracle), mapped to a build plan
//! and emitted as TSX. Parse and sanitize failures abort with no partial
//! output; everything after that only accumulates [`Warning`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::codegen::{component_name, CodeGenerator, DEFAULT_COMPONENT_NAME};
use crate::config::ForgeConfig;
use crate::error::{ForgeResult, Warning};
use crate::features::{features, Feature};
use crate::inference::SemanticInferencer;
use crate::ir::UiTree;
use crate::mapper::{BuildPlanMapper, Planned};
use crate::oracle::{consult, DesignOracle, OracleError};
use crate::palette::Palette;
use crate::parser::{parse_markup_with_limits, MarkupNode};
use crate::patch::{PatchEngine, PatchRequest, PatchResult};
use crate::plan::BuildPlan;
use crate::validator::{validate_patch_request, validate_tree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub markup: String,
    /// Requested component name; normalized to PascalCase.
    #[serde(default)]
    pub name: String,
}

impl GenerateRequest {
    pub fn new(markup: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub features: Vec<Feature>,
    pub tree: UiTree,
    pub plan: BuildPlan,
    pub code: String,
    pub file_path: String,
    pub warnings: Vec<Warning>,
}

/// A configured compiler session.
#[derive(Debug, Clone)]
pub struct Forge {
    config: ForgeConfig,
    palette: Palette,
    inferencer: SemanticInferencer,
}

impl Default for Forge {
    fn default() -> Self {
        Self::new(ForgeConfig::default(), Palette::builtin())
    }
}

impl Forge {
    pub fn new(config: ForgeConfig, palette: Palette) -> Self {
        Self {
            config,
            palette,
            inferencer: SemanticInferencer::new(),
        }
    }

    /// Build a session from config, loading `palette.catalog` when set.
    pub fn from_config(config: ForgeConfig) -> ForgeResult<Self> {
        config.validate()?;
        let palette = match &config.palette.catalog {
            Some(path) => Palette::load_catalog(path)?,
            None => Palette::builtin(),
        };
        Ok(Self::new(config, palette))
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Sanitize and parse markup under the configured limits.
    pub fn parse(&self, markup: &str) -> ForgeResult<MarkupNode> {
        parse_markup_with_limits(markup, &self.config.limits)
    }

    /// Features of sanitized markup, pre-order.
    pub fn extract_features(&self, markup: &str) -> ForgeResult<Vec<Feature>> {
        let root = self.parse(markup)?;
        Ok(features(&root).collect())
    }

    /// Deterministic generation: no oracle involved.
    pub fn generate(&self, request: &GenerateRequest) -> ForgeResult<GenerateResponse> {
        let root = self.parse(&request.markup)?;
        let features: Vec<Feature> = features(&root).collect();
        let (name, mut warnings) = self.component_name(&request.name);

        let tree = self.inferencer.infer(&root);
        let Planned {
            plan,
            warnings: plan_warnings,
        } = self.mapper().plan(&tree, &name);
        warnings.extend(plan_warnings);

        Ok(self.finish(features, tree, plan, warnings))
    }

    /// Generation with an oracle consulted for the tree and the plan. Each
    /// stage falls back to the deterministic path when the oracle fails,
    /// times out or proposes something invalid.
    pub async fn generate_with_oracle<O: DesignOracle>(
        &self,
        request: &GenerateRequest,
        oracle: &O,
    ) -> ForgeResult<GenerateResponse> {
        let root = self.parse(&request.markup)?;
        let features: Vec<Feature> = features(&root).collect();
        let (name, mut warnings) = self.component_name(&request.name);

        let proposed = consult(
            self.config.oracle.timeout(),
            oracle.propose_ui_tree(&request.markup, &features),
        )
        .await
        .and_then(|tree| match validate_tree(&tree) {
            Ok(()) => Ok(tree),
            Err(e) => Err(OracleError::Invalid(e.to_string())),
        });
        let tree = match proposed {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "UI tree oracle failed, using deterministic inference");
                warnings.push(Warning::OracleUnavailable {
                    stage: "uiTree".to_string(),
                    reason: e.to_string(),
                });
                self.inferencer.infer(&root)
            }
        };

        let Planned {
            plan,
            warnings: plan_warnings,
        } = self.mapper().plan_with_oracle(&tree, &name, oracle).await;
        warnings.extend(plan_warnings);

        Ok(self.finish(features, tree, plan, warnings))
    }

    /// Patch one source text with a JSON request.
    pub fn patch_json(&self, source: &str, json: &str) -> ForgeResult<PatchResult> {
        let request = PatchRequest::from_json(json)?;
        self.patch(source, &request)
    }

    pub fn patch(&self, source: &str, request: &PatchRequest) -> ForgeResult<PatchResult> {
        validate_patch_request(request)?;
        Ok(PatchEngine::new().apply(source, request))
    }

    /// Patch a set of files keyed by path, routing each op by its `file`.
    pub fn patch_files(
        &self,
        files: &mut BTreeMap<String, String>,
        request: &PatchRequest,
    ) -> ForgeResult<PatchResult> {
        validate_patch_request(request)?;
        Ok(PatchEngine::new().apply_to_files(files, request))
    }

    fn mapper(&self) -> BuildPlanMapper<'_> {
        BuildPlanMapper::new(&self.palette).with_oracle_timeout(self.config.oracle.timeout())
    }

    fn component_name(&self, requested: &str) -> (String, Vec<Warning>) {
        let requested = if requested.trim().is_empty() {
            DEFAULT_COMPONENT_NAME
        } else {
            requested
        };
        let name = component_name(requested);
        let mut warnings = Vec::new();
        if name != requested {
            warnings.push(Warning::RenamedComponent {
                requested: requested.to_string(),
                used: name.clone(),
            });
        }
        (name, warnings)
    }

    fn finish(
        &self,
        features: Vec<Feature>,
        tree: UiTree,
        plan: BuildPlan,
        mut warnings: Vec<Warning>,
    ) -> GenerateResponse {
        let generated = CodeGenerator::new(&self.palette)
            .with_output_dir(self.config.output.dir.clone())
            .emit_plan(&plan);
        warnings.extend(generated.warnings);

        info!(
            component = %generated.name,
            features = features.len(),
            warnings = warnings.len(),
            "generated component"
        );
        GenerateResponse {
            features,
            tree,
            plan,
            code: generated.code,
            file_path: generated.file_path,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use crate::ir::UiNode;
    use crate::oracle::NoOracle;
    use pretty_assertions::assert_eq;

    const BUTTON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <g><rect rx="8" fill="#fff"/><text>Submit</text></g>
</svg>"##;

    #[test]
    fn test_generate_button_form() {
        let forge = Forge::default();
        let response = forge
            .generate(&GenerateRequest::new(BUTTON, "SubmitButton"))
            .unwrap();
        assert_eq!(response.file_path, "src/components/generated/SubmitButton.tsx");
        assert!(response.warnings.is_empty());
        assert!(matches!(response.tree.children[0], UiNode::Form { .. }));
        assert!(response.code.contains("<form className={className} onSubmit={handleSubmit}>"));
        assert!(response.code.contains(">Submit</button>"));
        assert_eq!(
            response.code.matches("export default function SubmitButton").count(),
            1
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        let forge = Forge::default();
        let request = GenerateRequest::new(BUTTON, "Twice");
        let a = forge.generate(&request).unwrap();
        let b = forge.generate(&request).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_name_defaults() {
        let response = Forge::default()
            .generate(&GenerateRequest::new(BUTTON, ""))
            .unwrap();
        assert_eq!(response.plan.name, "GeneratedComponent");
        assert!(response.warnings.is_empty());
    }

    #[test]
    fn test_unsafe_markup_has_no_output() {
        let result = Forge::default().generate(&GenerateRequest::new(
            r#"<svg><script>alert(1)</script></svg>"#,
            "X",
        ));
        assert!(matches!(result, Err(ForgeError::UnsafeMarkup { .. })));
    }

    #[tokio::test]
    async fn test_no_oracle_matches_deterministic() {
        let forge = Forge::default();
        let request = GenerateRequest::new(BUTTON, "Same");
        let direct = forge.generate(&request).unwrap();
        let consulted = forge.generate_with_oracle(&request, &NoOracle).await.unwrap();
        assert_eq!(consulted.code, direct.code);
        assert_eq!(consulted.plan, direct.plan);
        assert_eq!(consulted.tree, direct.tree);
        let stages: Vec<&str> = consulted
            .warnings
            .iter()
            .filter_map(|w| match w {
                Warning::OracleUnavailable { stage, .. } => Some(stage.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(stages, vec!["uiTree", "buildPlan"]);
    }

    #[test]
    fn test_patch_json_validates_first() {
        let forge = Forge::default();
        let err = forge.patch_json("<div />", r#"{"ops": []}"#).unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));

        let result = forge
            .patch_json(
                r#"<button className="px-4">Go</button>"#,
                r#"{"ops": [{"op": "addClass", "file": "A.tsx", "jsx": "<button", "className": "bg-blue-500"}]}"#,
            )
            .unwrap();
        assert!(result.success);
        assert_eq!(
            result.source.as_deref(),
            Some(r#"<button className="px-4 bg-blue-500">Go</button>"#)
        );
    }
}
