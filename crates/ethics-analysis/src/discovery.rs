//! 結果ファイルの探索

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AnalysisError, Result};

/// 探索設定
#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    /// 対象とする拡張子（先頭の `.` は不要、`json.gz` のような複合拡張子も可）
    pub extensions: Vec<String>,
    /// ルートからの最大深さ
    pub max_depth: usize,
    /// シンボリックリンクを辿るか（ループは walkdir が検出する）
    pub follow_links: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["json".to_string(), "json.gz".to_string()],
            max_depth: 32,
            follow_links: true,
        }
    }
}

impl DiscoveryOptions {
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            name.len() > ext.len() + 1 && name.ends_with(&format!(".{ext}"))
        })
    }
}

/// `root` 以下を再帰的に探索し、対象拡張子のファイルをパス順で返す。
///
/// 探索時点のスナップショットを返すだけで、以後の追加・削除は反映しない。
pub fn discover_run_files(root: &Path, options: &DiscoveryOptions) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(AnalysisError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .max_depth(options.max_depth)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if let Some(ancestor) = err.loop_ancestor() {
                    log::warn!(
                        "symlink loop skipped: {} -> {}",
                        err.path().map(|p| p.display().to_string()).unwrap_or_default(),
                        ancestor.display()
                    );
                } else {
                    log::warn!("skipping unreadable entry: {err}");
                }
                continue;
            }
        };
        if entry.file_type().is_file() && options.matches(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    log::info!("discovered {} result file(s) under {}", files.len(), root.display());
    Ok(files)
}
