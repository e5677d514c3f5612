use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, ForgeResult};

/// Top-level configuration, read from `svgforge.yaml`.
///
/// Every section is optional; missing fields fall back to their defaults.
///
/// ```yaml
/// oracle:
///   timeoutMs: 5000
/// limits:
///   maxDepth: 32
/// output:
///   dir: app/components/generated
/// palette:
///   catalog: palette.yaml
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForgeConfig {
    pub oracle: OracleConfig,
    pub limits: Limits,
    pub output: OutputConfig,
    pub palette: PaletteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleConfig {
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { timeout_ms: 8_000 }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Resource limits applied while parsing markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    pub max_markup_bytes: usize,
    pub max_depth: usize,
    pub max_elements: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_markup_bytes: 1024 * 1024,
            max_depth: 64,
            max_elements: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputConfig {
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "src/components/generated".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaletteConfig {
    /// Extra palette catalog merged over the builtin entries at startup.
    pub catalog: Option<PathBuf>,
}

impl ForgeConfig {
    pub fn from_yaml_str(yaml: &str) -> ForgeResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ForgeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. Relative palette paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> ForgeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ForgeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml_str(&content)?;
        if let (Some(catalog), Some(dir)) = (config.palette.catalog.as_mut(), path.parent()) {
            if catalog.is_relative() {
                *catalog = dir.join(&*catalog);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> ForgeResult<()> {
        if self.oracle.timeout_ms == 0 {
            return Err(ForgeError::Config(
                "oracle.timeoutMs must be greater than 0".to_string(),
            ));
        }
        if self.limits.max_depth == 0 || self.limits.max_elements == 0 {
            return Err(ForgeError::Config(
                "limits.maxDepth and limits.maxElements must be greater than 0".to_string(),
            ));
        }
        if self.output.dir.trim().is_empty() {
            return Err(ForgeError::Config("output.dir must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ForgeConfig::from_yaml_str("").unwrap();
        assert_eq!(config, ForgeConfig::default());
        assert_eq!(config.oracle.timeout(), Duration::from_secs(8));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ForgeConfig::from_yaml_str("limits:\n  maxDepth: 12\n").unwrap();
        assert_eq!(config.limits.max_depth, 12);
        assert_eq!(config.limits.max_elements, 10_000);
        assert_eq!(config.output.dir, "src/components/generated");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ForgeConfig::from_yaml_str("oracle:\n  timeoutMs: 0\n");
        assert!(matches!(result, Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_unknown_shape_is_yaml_error() {
        let result = ForgeConfig::from_yaml_str("limits: [1, 2]");
        assert!(matches!(result, Err(ForgeError::Yaml(_))));
    }
}
