//! # ethics-analysis
//!
//! 倫理ジレンマ物語のプレイ結果（人間・モデル双方）を集計し、比較可能な統計にする。
//!
//! ## 処理の流れ
//!
//! - **discovery**: 結果ファイルの再帰探索
//! - **payload**: 単発プレイ形式 / バッチ形式の判定
//! - **normalize**: `RunRecord` への平坦化（壊れたファイルはスキップして報告）
//! - **stats** / **rank** / **group**: 記述統計・軸の順位分布・グループ比較
//! - **csv_export** / **report**: CSV 出力とコンソール表示用の表

pub mod analysis;
pub mod axis;
pub mod config;
pub mod csv_export;
pub mod discovery;
pub mod error;
pub mod group;
pub mod io;
pub mod normalize;
pub mod payload;
pub mod rank;
pub mod record;
pub mod report;
pub mod stats;
pub mod verdict;

pub use analysis::{Analysis, run_analysis};
pub use axis::{AXES, Axis, SCORE_FIELDS, ScoreField};
pub use config::AnalysisConfig;
pub use csv_export::{default_output_path, export_csv, write_csv};
pub use discovery::{DiscoveryOptions, discover_run_files};
pub use error::{AnalysisError, Result};
pub use group::{GroupKey, GroupSummary, compare_groups, compare_models, compare_player_types};
pub use normalize::{LoadReport, SkipKind, SkippedFile, load_runs};
pub use payload::{RunPayload, validate_payload};
pub use rank::{RankFrequency, rank_axes, rank_frequency};
pub use record::{PlayerType, RunRecord, ScoreSet, normalized_player};
pub use stats::{AxisStats, compute_axis_stats};
pub use verdict::{VerdictLabel, classify_verdict};
