//! 探索 → 検証 → 正規化 → 集計 の一連の処理

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::discovery::discover_run_files;
use crate::error::{AnalysisError, Result};
use crate::group::{
    GroupKey, GroupSummary, VerdictCount, VerdictMismatch, compare_groups, compare_models,
    compare_player_types, scenario_difficulty, verdict_distribution, verdict_mismatches,
};
use crate::normalize::{SkippedFile, load_runs};
use crate::rank::{RankFrequency, rank_frequency};
use crate::record::RunRecord;
use crate::stats::{AxisCorrelation, AxisStats, compute_axis_stats, correlation_matrix};

/// 分析結果一式
#[derive(Debug, Serialize)]
pub struct Analysis {
    #[serde(skip)]
    pub records: Vec<RunRecord>,
    pub runs: usize,
    pub files_discovered: usize,
    pub skipped: Vec<SkippedFile>,
    pub axis_stats: Vec<AxisStats>,
    pub rank_frequency: RankFrequency,
    pub group_key: GroupKey,
    pub groups: Vec<GroupSummary>,
    pub player_type_comparison: Option<Vec<GroupSummary>>,
    pub model_comparison: Option<Vec<GroupSummary>>,
    pub scenario_difficulty: Vec<(String, f64)>,
    pub verdict_distribution: Vec<VerdictCount>,
    pub verdict_mismatches: Vec<VerdictMismatch>,
    pub correlations: Vec<AxisCorrelation>,
}

impl Analysis {
    /// 正規化済みのプレイ列から全集計を行う。`records` の順序がタイブレークに使われる。
    pub fn from_records(records: Vec<RunRecord>, group_key: GroupKey) -> Self {
        Self {
            runs: records.len(),
            files_discovered: 0,
            skipped: Vec::new(),
            axis_stats: compute_axis_stats(&records),
            rank_frequency: rank_frequency(&records),
            group_key,
            groups: compare_groups(&records, group_key),
            player_type_comparison: compare_player_types(&records),
            model_comparison: compare_models(&records),
            scenario_difficulty: scenario_difficulty(&records),
            verdict_distribution: verdict_distribution(&records),
            verdict_mismatches: verdict_mismatches(&records),
            correlations: correlation_matrix(&records),
            records,
        }
    }
}

/// 記録に埋め込む既定タイムスタンプ（RFC 3339, UTC）
pub fn normalization_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `root` 以下の結果ファイルを分析する。
///
/// 壊れたファイルはスキップして続行する。有効なプレイが 1 件も無ければ
/// `AnalysisError::EmptyInput` を返す。
pub fn run_analysis(root: &Path, config: &AnalysisConfig) -> Result<Analysis> {
    let files = discover_run_files(root, &config.discovery_options())?;
    let report = load_runs(&files, &normalization_timestamp());

    if report.records.is_empty() {
        return Err(AnalysisError::EmptyInput {
            skipped: report.skipped,
        });
    }

    let mut analysis = Analysis::from_records(report.records, config.group_by);
    analysis.files_discovered = files.len();
    analysis.skipped = report.skipped;

    for mismatch in &analysis.verdict_mismatches {
        log::warn!(
            "{}: verdict {} does not match average {:.2} (expected {})",
            mismatch.run_id,
            mismatch.stored,
            mismatch.average,
            mismatch.expected
        );
    }
    Ok(analysis)
}
