//! Targeted edits to generated TSX.
//!
//! A [`PatchRequest`] is an ordered list of [`PatchOp`]s. Each op that names an
//! element locates it with [`JsxDocument::first_match`] on a fresh scan of the
//! current text, so later ops see the effects of earlier ones.

pub mod engine;
pub mod jsx;
pub mod ops;

pub use engine::PatchEngine;
pub use jsx::{JsxDocument, ScanError};
pub use ops::{PatchOp, PatchRequest, PatchResult};
