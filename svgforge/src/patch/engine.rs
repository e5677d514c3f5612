use std::collections::BTreeMap;
use std::ops::Range;

use tracing::{debug, info, warn};

use crate::tailwind::ClassList;

use super::jsx::{string_literal, AttrValue, JsxDocument};
use super::ops::{PatchOp, PatchRequest, PatchResult};

/// Applies patch requests to generated source text.
///
/// Operations run in order against the text left by the previous one. A failed
/// operation is recorded and skipped; the rest still run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchEngine;

/// A single text replacement produced by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    text: String,
}

impl Edit {
    fn insert(at: usize, text: String) -> Self {
        Self {
            range: at..at,
            text,
        }
    }

    fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + self.text.len());
        out.push_str(&source[..self.range.start]);
        out.push_str(&self.text);
        out.push_str(&source[self.range.end..]);
        out
    }
}

impl PatchEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply every op of `request` to one source text, regardless of each op's `file`.
    pub fn apply(&self, source: &str, request: &PatchRequest) -> PatchResult {
        let mut text = source.to_string();
        let mut outcome = Outcome::default();
        for op in &request.ops {
            outcome.run(op, Some(&mut text));
        }

        info!(
            ops = request.ops.len(),
            changed = outcome.diffs.len(),
            failed = outcome.errors.len(),
            "applied patch request"
        );
        outcome.into_result(Some(text))
    }

    /// Apply a request across several files, routing each op by its `file`.
    /// Ops naming a file not in `files` fail individually.
    pub fn apply_to_files(
        &self,
        files: &mut BTreeMap<String, String>,
        request: &PatchRequest,
    ) -> PatchResult {
        let mut outcome = Outcome::default();
        for op in &request.ops {
            outcome.run(op, files.get_mut(op.file()));
        }

        info!(
            files = files.len(),
            changed = outcome.diffs.len(),
            failed = outcome.errors.len(),
            "applied patch request"
        );
        outcome.into_result(None)
    }
}

/// Diffs and errors accumulated over a request.
#[derive(Debug, Default)]
struct Outcome {
    diffs: Vec<String>,
    errors: Vec<String>,
}

impl Outcome {
    /// Run `op` against `text`, replacing it on change. `None` means the op's file is unknown.
    fn run(&mut self, op: &PatchOp, text: Option<&mut String>) {
        let Some(text) = text else {
            warn!(op = %op.label(), "patch target file not found");
            self.errors.push(format!("{} file not found", op.label()));
            return;
        };
        match apply_op(text, op) {
            Ok(Some(next)) => {
                *text = next;
                self.diffs.push(op.label());
            }
            Ok(None) => debug!(op = %op.label(), "no change"),
            Err(e) => {
                warn!(op = %op.label(), error = %e, "patch op failed");
                self.errors.push(e);
            }
        }
    }

    fn into_result(self, source: Option<String>) -> PatchResult {
        PatchResult {
            success: self.errors.is_empty(),
            diffs: self.diffs,
            errors: self.errors,
            source,
        }
    }
}

/// Run one op. `Ok(None)` is a successful no-op.
fn apply_op(source: &str, op: &PatchOp) -> Result<Option<String>, String> {
    let label = op.label();

    if let PatchOp::TextEdit { find, replace, .. } = op {
        let Some(at) = source.find(find.as_str()) else {
            return Err(format!("{} find text not found: {}", label, find));
        };
        if find == replace {
            return Ok(None);
        }
        let edit = Edit {
            range: at..at + find.len(),
            text: replace.clone(),
        };
        return Ok(Some(edit.apply(source)));
    }

    let doc = JsxDocument::parse(source)
        .map_err(|e| format!("{} could not parse source: {}", label, e))?;
    let locator = op.locator().unwrap_or_default();
    let Some(index) = doc.first_match(locator) else {
        return Err(format!("{} target not found: {}", label, locator));
    };

    let edit = match op {
        PatchOp::AddClass { class_name, .. } => {
            check_class_tokens(&label, class_name)?;
            edit_class(&doc, index, &label, true, |list| list.add(class_name))?
        }
        PatchOp::RemoveClass { class_name, .. } => {
            edit_class(&doc, index, &label, false, |list| list.remove(class_name))?
        }
        PatchOp::ReplaceClass { from, to, .. } => {
            check_class_tokens(&label, to)?;
            edit_class(&doc, index, &label, true, |list| list.replace(from, to))?
        }
        PatchOp::SetAttribute { name, value, .. } => {
            let rendered = format!("{}={}", name, string_literal(value));
            match doc.attribute(index, name) {
                Some(attr) if doc.source()[attr.span.clone()] == rendered => None,
                Some(attr) => Some(Edit {
                    range: attr.span.clone(),
                    text: rendered,
                }),
                None => Some(Edit::insert(
                    doc.attribute_insert_point(index),
                    format!(" {}", rendered),
                )),
            }
        }
        PatchOp::InsertAfter { code, .. } => Some(Edit::insert(
            doc.element(index).span.end,
            format!("\n{}", code),
        )),
        PatchOp::TextEdit { .. } => None,
    };

    Ok(edit.map(|e| e.apply(source)))
}

/// Rewrite the element's `className` through `change`. A missing attribute is
/// created when `create` is set.
fn edit_class(
    doc: &JsxDocument,
    index: usize,
    label: &str,
    create: bool,
    change: impl FnOnce(&mut ClassList) -> bool,
) -> Result<Option<Edit>, String> {
    match doc.attribute(index, "className") {
        Some(attr) => {
            let current = match &attr.value {
                None => "",
                Some(value) => value.as_literal().ok_or_else(|| match value {
                    AttrValue::Expression { source, .. } => format!(
                        "{} dynamic className cannot be edited: {}",
                        label, source
                    ),
                    AttrValue::Literal(_) => format!("{} invalid className", label),
                })?,
            };
            let mut list = ClassList::parse(current);
            if !change(&mut list) {
                return Ok(None);
            }
            Ok(Some(Edit {
                range: attr.span.clone(),
                text: format!("className=\"{}\"", list),
            }))
        }
        None if create => {
            let mut list = ClassList::default();
            change(&mut list);
            Ok(Some(Edit::insert(
                doc.attribute_insert_point(index),
                format!(" className=\"{}\"", list),
            )))
        }
        None => Ok(None),
    }
}

fn check_class_tokens(label: &str, classes: &str) -> Result<(), String> {
    match classes
        .split_whitespace()
        .find(|t| t.contains(['"', '\'', '{', '}', '<', '>', '`']))
    {
        Some(token) => Err(format!("{} invalid class token: {}", label, token)),
        None => Ok(()),
    }
}
