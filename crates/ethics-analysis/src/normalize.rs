//! ペイロードを `RunRecord` に平坦化する

use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::axis::ScoreField;
use crate::error::{AnalysisError, Result};
use crate::io::read_to_string;
use crate::payload::{BatchRunPayload, RunPayload, SingleRunPayload, validate_payload};
use crate::record::{PlayerType, RunRecord, ScoreSet, is_human_sentinel};

const UNKNOWN: &str = "unknown";
const HUMAN_MODEL: &str = "human";

/// スキップ理由の分類
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    Read,
    Parse,
    Shape,
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipKind::Read => "read",
            SkipKind::Parse => "parse",
            SkipKind::Shape => "shape",
        };
        f.write_str(s)
    }
}

/// 読み込みをスキップしたファイル
#[derive(Clone, Debug, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub kind: SkipKind,
    pub detail: String,
}

impl SkippedFile {
    fn from_error(path: &Path, err: AnalysisError) -> Self {
        let (kind, detail) = match err {
            AnalysisError::Parse { source, .. } => (SkipKind::Parse, source.to_string()),
            AnalysisError::Shape { reason, .. } => (SkipKind::Shape, reason),
            other => (SkipKind::Read, other.to_string()),
        };
        Self {
            path: path.to_path_buf(),
            kind,
            detail,
        }
    }
}

/// 読み込み結果。`records` は入力ファイル順（= 探索順）を保つ。
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<RunRecord>,
    pub skipped: Vec<SkippedFile>,
    pub files_loaded: usize,
}

/// 1 ファイルを読み、パースと形状判定を行う。
pub fn load_payload(path: &Path) -> Result<RunPayload> {
    let content = read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|source| AnalysisError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_payload(path, value)
}

/// 複数ファイルを読み込んで正規化する。
///
/// パースは並列に行うが、結果は `paths` の順に並べ直してから正規化するため
/// 後段のタイブレークは入力順に対して決定的になる。
pub fn load_runs(paths: &[PathBuf], now: &str) -> LoadReport {
    let parsed: Vec<Result<RunPayload>> = paths.par_iter().map(|p| load_payload(p)).collect();

    let mut report = LoadReport::default();
    for (path, result) in paths.iter().zip(parsed) {
        match result {
            Ok(payload) => {
                let records = normalize_payload(payload, path, now);
                log::debug!("{}: {} run(s)", path.display(), records.len());
                report.records.extend(records);
                report.files_loaded += 1;
            }
            Err(err) => {
                let skipped = SkippedFile::from_error(path, err);
                log::warn!("skipping {} ({}): {}", path.display(), skipped.kind, skipped.detail);
                report.skipped.push(skipped);
            }
        }
    }

    log::info!(
        "normalized {} run(s) from {} file(s), skipped {} file(s)",
        report.records.len(),
        report.files_loaded,
        report.skipped.len()
    );
    report
}

/// ペイロードを `RunRecord` の列に変換する。
pub fn normalize_payload(payload: RunPayload, source: &Path, now: &str) -> Vec<RunRecord> {
    match payload {
        RunPayload::Single(single) => vec![normalize_single(single, source, now)],
        RunPayload::Batch(batch) => normalize_batch(batch, source, now),
    }
}

fn normalize_single(payload: SingleRunPayload, source: &Path, now: &str) -> RunRecord {
    let (model, player_type) =
        resolve_player(payload.model.as_deref(), payload.player.as_deref(), HUMAN_MODEL);
    RunRecord {
        run_id: payload.run_id.unwrap_or_else(|| file_stem(source)),
        scenario: resolve_scenario(payload.scenario, source),
        model,
        player_type,
        system_prompt: payload.system_prompt.unwrap_or_default(),
        timestamp: payload.timestamp.unwrap_or_else(|| now.to_string()),
        choice_count: payload.choices.len(),
        scores: extract_scores(&payload.scores),
        verdict: payload.verdict.unwrap_or_default(),
    }
}

fn normalize_batch(payload: BatchRunPayload, source: &Path, now: &str) -> Vec<RunRecord> {
    let (model, player_type) =
        resolve_player(payload.model.as_deref(), payload.player.as_deref(), UNKNOWN);
    let scenario = resolve_scenario(payload.scenario, source);
    let system_prompt = payload.system_prompt.unwrap_or_default();
    let timestamp = payload.timestamp.unwrap_or_else(|| now.to_string());
    let base_id = payload.run_id.unwrap_or_else(|| file_stem(source));

    payload
        .runs
        .into_iter()
        .enumerate()
        .map(|(idx, run)| RunRecord {
            run_id: format!("{base_id}-{idx}"),
            scenario: scenario.clone(),
            model: model.clone(),
            player_type,
            system_prompt: system_prompt.clone(),
            timestamp: timestamp.clone(),
            choice_count: run.choices.as_ref().map_or(0, Vec::len),
            scores: extract_scores(&run.scores),
            verdict: run.verdict.unwrap_or_default(),
        })
        .collect()
}

/// model / player フィールドからプレイヤー種別を決める。
///
/// - `player` または `model` が human/manual なら manual
/// - それ以外で `model` があれば model
/// - どちらも無ければ `missing_model` を model 名とし、human なら manual 扱い
fn resolve_player(model: Option<&str>, player: Option<&str>, missing_model: &str) -> (String, PlayerType) {
    let model = model.map(str::trim).filter(|m| !m.is_empty());
    let explicit_human = player.is_some_and(is_human_sentinel) || model.is_some_and(is_human_sentinel);
    match model {
        Some(m) if !explicit_human => (m.to_string(), PlayerType::Model),
        Some(m) => (m.to_string(), PlayerType::Manual),
        None if explicit_human || missing_model == HUMAN_MODEL => {
            (HUMAN_MODEL.to_string(), PlayerType::Manual)
        }
        None => (missing_model.to_string(), PlayerType::Model),
    }
}

/// scenario が無ければ親ディレクトリ名を使う。
fn resolve_scenario(scenario: Option<String>, source: &Path) -> String {
    scenario.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
        source
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or(UNKNOWN)
            .to_string()
    })
}

/// 最後の拡張子だけを落とす。`.gz` は二重拡張子として扱う（`run.1.json.gz` → `run.1`）。
fn file_stem(source: &Path) -> String {
    let stem = match source.extension().and_then(|e| e.to_str()) {
        Some("gz") => source.file_stem().map(Path::new).and_then(Path::file_stem),
        _ => source.file_stem(),
    };
    stem.and_then(|s| s.to_str()).unwrap_or(UNKNOWN).to_string()
}

fn extract_scores(raw: &Map<String, Value>) -> ScoreSet {
    let mut scores = ScoreSet::new();
    for (key, value) in raw {
        let Some(field) = ScoreField::from_code(key) else {
            log::debug!("ignoring unknown score key: {key}");
            continue;
        };
        if let Some(v) = value.as_f64() {
            scores.set(field, v);
        }
    }
    scores.fill_derived();
    scores
}
