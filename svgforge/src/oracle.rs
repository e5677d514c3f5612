use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::features::Feature;
use crate::ir::UiTree;
use crate::plan::BuildPlan;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle returned an invalid result: {0}")]
    Invalid(String),

    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
}

/// External design-inference capability that may replace the deterministic
/// inferencer and mapper.
///
/// Callers never await these futures directly; they go through [`consult`],
/// which bounds them with a timeout.
pub trait DesignOracle: Send + Sync {
    fn propose_ui_tree(
        &self,
        markup: &str,
        features: &[Feature],
    ) -> impl Future<Output = Result<UiTree, OracleError>> + Send;

    fn propose_build_plan(
        &self,
        tree: &UiTree,
        palette_keys: &[String],
    ) -> impl Future<Output = Result<BuildPlan, OracleError>> + Send;
}

/// Oracle that is never available. Every request takes the deterministic path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl DesignOracle for NoOracle {
    async fn propose_ui_tree(
        &self,
        _markup: &str,
        _features: &[Feature],
    ) -> Result<UiTree, OracleError> {
        Err(OracleError::Unavailable("no oracle configured".to_string()))
    }

    async fn propose_build_plan(
        &self,
        _tree: &UiTree,
        _palette_keys: &[String],
    ) -> Result<BuildPlan, OracleError> {
        Err(OracleError::Unavailable("no oracle configured".to_string()))
    }
}

/// Await an oracle call, failing with [`OracleError::Timeout`] once `timeout` elapses.
pub async fn consult<T, F>(timeout: Duration, call: F) -> Result<T, OracleError>
where
    F: Future<Output = Result<T, OracleError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(timeout)),
    }
}
