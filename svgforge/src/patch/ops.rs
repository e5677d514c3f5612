use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ForgeError, ForgeResult};
use crate::validator::patch_op_problems;

/// One edit against a generated source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PatchOp {
    AddClass {
        file: String,
        jsx: String,
        #[serde(rename = "className")]
        class_name: String,
    },
    RemoveClass {
        file: String,
        jsx: String,
        #[serde(rename = "className")]
        class_name: String,
    },
    ReplaceClass {
        file: String,
        jsx: String,
        from: String,
        to: String,
    },
    SetAttribute {
        file: String,
        jsx: String,
        name: String,
        value: String,
    },
    InsertAfter {
        file: String,
        #[serde(rename = "targetJsx")]
        target_jsx: String,
        code: String,
    },
    TextEdit {
        file: String,
        find: String,
        replace: String,
    },
}

impl PatchOp {
    pub fn file(&self) -> &str {
        match self {
            PatchOp::AddClass { file, .. }
            | PatchOp::RemoveClass { file, .. }
            | PatchOp::ReplaceClass { file, .. }
            | PatchOp::SetAttribute { file, .. }
            | PatchOp::InsertAfter { file, .. }
            | PatchOp::TextEdit { file, .. } => file,
        }
    }

    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            PatchOp::AddClass { .. } => "addClass",
            PatchOp::RemoveClass { .. } => "removeClass",
            PatchOp::ReplaceClass { .. } => "replaceClass",
            PatchOp::SetAttribute { .. } => "setAttribute",
            PatchOp::InsertAfter { .. } => "insertAfter",
            PatchOp::TextEdit { .. } => "textEdit",
        }
    }

    /// The substring used to find the target element; `None` for whole-file edits.
    pub fn locator(&self) -> Option<&str> {
        match self {
            PatchOp::AddClass { jsx, .. }
            | PatchOp::RemoveClass { jsx, .. }
            | PatchOp::ReplaceClass { jsx, .. }
            | PatchOp::SetAttribute { jsx, .. } => Some(jsx),
            PatchOp::InsertAfter { target_jsx, .. } => Some(target_jsx),
            PatchOp::TextEdit { .. } => None,
        }
    }

    /// `<file>:<op>`, the prefix of every diff and error line for this op.
    pub fn label(&self) -> String {
        format!("{}:{}", self.file(), self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub ops: Vec<PatchOp>,
}

impl PatchRequest {
    pub fn new(ops: Vec<PatchOp>) -> Self {
        Self { ops }
    }

    /// Decode and validate a request. Every malformed op is reported, not just the first.
    pub fn from_json(json: &str) -> ForgeResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let ops = match value.get("ops") {
            Some(Value::Array(ops)) => ops,
            Some(_) => return Err(ForgeError::validation("ops: must be an array")),
            None => return Err(ForgeError::validation("ops: missing")),
        };

        if ops.is_empty() {
            return Err(ForgeError::validation(
                "ops: must contain at least one operation",
            ));
        }

        let mut errors = Vec::new();
        let mut decoded = Vec::with_capacity(ops.len());
        for (i, op) in ops.iter().enumerate() {
            match serde_json::from_value::<PatchOp>(op.clone()) {
                Ok(op) => {
                    errors.extend(patch_op_problems(i, &op));
                    decoded.push(op);
                }
                Err(e) => errors.push(format!("ops[{}]: {}", i, e)),
            }
        }

        if !errors.is_empty() {
            return Err(ForgeError::Validation(errors));
        }
        Ok(PatchRequest { ops: decoded })
    }
}

/// Outcome of applying a request. `success` holds exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchResult {
    pub success: bool,
    pub diffs: Vec<String>,
    pub errors: Vec<String>,
    /// Resulting text for single-source patching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
