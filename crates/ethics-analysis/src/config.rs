//! 分析設定（TOML）

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::discovery::DiscoveryOptions;
use crate::error::{AnalysisError, Result};
use crate::group::GroupKey;

/// 分析設定。全項目に既定値があり、TOML では必要な項目だけ書けばよい。
///
/// ```toml
/// extensions = ["json"]
/// max_depth = 8
/// output_dir = "results/csv"
/// group_by = "model"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub extensions: Vec<String>,
    pub max_depth: usize,
    pub follow_links: bool,
    /// CSV の出力先ディレクトリ（ファイル名未指定時）
    pub output_dir: PathBuf,
    pub group_by: GroupKey,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let discovery = DiscoveryOptions::default();
        Self {
            extensions: discovery.extensions,
            max_depth: discovery.max_depth,
            follow_links: discovery.follow_links,
            output_dir: PathBuf::from("results"),
            group_by: GroupKey::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config_err = |reason: String| AnalysisError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        Self::from_toml_str(&content).map_err(|e| config_err(e.to_string()))
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            extensions: self.extensions.clone(),
            max_depth: self.max_depth,
            follow_links: self.follow_links,
        }
    }
}
