//! # svgforge
//!
//! Compiles SVG design mockups into React/TSX components and applies targeted
//! structural edits to the generated source.
//!
//! ## Pipeline
//! - Sanitize and parse markup into an attribute tree (allow-list, size and depth limits)
//! - Extract a flat list of drawing features
//! - Infer a semantic UI tree (text, frames, forms, images)
//! - Map the tree onto a palette of components as a build plan
//! - Emit one TSX function component
//!
//! An optional [`DesignOracle`] can propose the tree and the plan; every call
//! is bounded by a timeout and falls back to the deterministic path.
//!
//! ## Example: generate
//! ```ignore
//! use svgforge::generate;
//!
//! let svg = r##"<svg><g><rect rx="8" fill="#fff"/><text>Submit</text></g></svg>"##;
//! let response = generate(svg, "SubmitButton").expect("valid markup");
//! println!("{}", response.code);
//! ```
//!
//! ## Example: patch
//! ```ignore
//! use svgforge::patch_json;
//!
//! let request = r#"{"ops": [
//!   {"op": "addClass", "file": "Hero.tsx", "jsx": "<button", "className": "bg-blue-500"}
//! ]}"#;
//! let result = patch_json(source, request).expect("valid request");
//! assert!(result.success);
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod ir;
pub mod mapper;
pub mod oracle;
pub mod palette;
pub mod parser;
pub mod patch;
pub mod pipeline;
pub mod plan;
pub mod sanitizer;
pub mod style;
pub mod tailwind;
pub mod validator;

// --- Core types ---
pub use config::ForgeConfig;
pub use error::{ForgeError, ForgeResult, Warning};
pub use features::Feature;
pub use ir::{UiNode, UiTree};
pub use parser::MarkupNode;
pub use plan::{BuildNode, BuildPlan};
pub use style::{Layout, Style};

// --- Stages ---
pub use codegen::{CodeGenerator, GeneratedComponent};
pub use inference::SemanticInferencer;
pub use mapper::BuildPlanMapper;
pub use oracle::{DesignOracle, NoOracle, OracleError};
pub use palette::{Palette, PaletteEntry};
pub use patch::{PatchEngine, PatchOp, PatchRequest, PatchResult};
pub use pipeline::{Forge, GenerateRequest, GenerateResponse};

/// Sanitize and parse SVG markup with default limits.
pub fn parse_markup(xml: &str) -> ForgeResult<MarkupNode> {
    parser::parse_markup(xml)
}

/// Deterministic generation with the default config and builtin palette.
pub fn generate(markup: &str, name: &str) -> ForgeResult<GenerateResponse> {
    Forge::default().generate(&GenerateRequest::new(markup, name))
}

/// Validate a JSON patch request and apply it to one source text.
pub fn patch_json(source: &str, json: &str) -> ForgeResult<PatchResult> {
    Forge::default().patch_json(source, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shortcut() {
        let response = generate(
            r#"<svg><text font-size="36">Welcome</text></svg>"#,
            "Welcome",
        )
        .unwrap();
        assert!(response.code.contains("<h1 className=\"text-2xl font-semibold"));
        assert!(response.code.contains(">Welcome</h1>"));
    }

    #[test]
    fn test_parse_shortcut_rejects_garbage() {
        assert!(matches!(
            parse_markup("<svg><g></svg>"),
            Err(ForgeError::Parse { .. })
        ));
    }
}
