//! 結果ファイルの形状判定
//!
//! JSON をパースした後、単発プレイ形式かバッチ形式かを判定し、
//! それぞれの型付きペイロードに変換する。どちらにも当てはまらなければ
//! `AnalysisError::Shape` を返す（呼び出し側でスキップ扱いにする）。

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{AnalysisError, Result};

/// 単発プレイ形式
#[derive(Debug, Deserialize)]
pub struct SingleRunPayload {
    pub scenario: Option<String>,
    pub model: Option<String>,
    pub player: Option<String>,
    #[serde(rename = "systemPrompt", alias = "system_prompt")]
    pub system_prompt: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default, alias = "runId", deserialize_with = "string_or_number")]
    pub run_id: Option<String>,
    pub choices: Vec<Value>,
    pub scores: Map<String, Value>,
    pub verdict: Option<String>,
}

/// バッチ形式（共通メタデータ + 複数プレイ）
#[derive(Debug, Deserialize)]
pub struct BatchRunPayload {
    pub scenario: Option<String>,
    pub model: Option<String>,
    pub player: Option<String>,
    #[serde(rename = "systemPrompt", alias = "system_prompt")]
    pub system_prompt: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default, alias = "runId", deserialize_with = "string_or_number")]
    pub run_id: Option<String>,
    pub runs: Vec<NestedRun>,
}

/// バッチ内の 1 プレイ
#[derive(Debug, Deserialize)]
pub struct NestedRun {
    pub choices: Option<Vec<Value>>,
    pub scores: Map<String, Value>,
    pub verdict: Option<String>,
}

#[derive(Debug)]
pub enum RunPayload {
    Single(SingleRunPayload),
    Batch(BatchRunPayload),
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn is_single_shape(obj: &Map<String, Value>) -> bool {
    let has_choices = obj.get("choices").and_then(Value::as_array).is_some_and(|c| !c.is_empty());
    has_choices && obj.get("scores").is_some_and(Value::is_object)
}

fn batch_shape_error(obj: &Map<String, Value>) -> Option<String> {
    let runs = match obj.get("runs").and_then(Value::as_array) {
        Some(runs) if !runs.is_empty() => runs,
        _ => return Some("missing non-empty `choices`+`scores` or `runs`".to_string()),
    };
    runs.iter().enumerate().find_map(|(idx, run)| {
        let has_scores = run.get("scores").is_some_and(Value::is_object);
        (!has_scores).then(|| format!("runs[{idx}] has no `scores` mapping"))
    })
}

/// パース済み JSON の形状を判定して型付きペイロードに変換する。
pub fn validate_payload(path: &Path, value: Value) -> Result<RunPayload> {
    let shape_err = |reason: String| AnalysisError::Shape {
        path: path.to_path_buf(),
        reason,
    };

    let Value::Object(obj) = &value else {
        return Err(shape_err("top-level value is not an object".to_string()));
    };

    if is_single_shape(obj) {
        let payload: SingleRunPayload =
            serde_json::from_value(value).map_err(|e| shape_err(e.to_string()))?;
        return Ok(RunPayload::Single(payload));
    }

    if let Some(reason) = batch_shape_error(obj) {
        return Err(shape_err(reason));
    }
    let payload: BatchRunPayload =
        serde_json::from_value(value).map_err(|e| shape_err(e.to_string()))?;
    Ok(RunPayload::Batch(payload))
}
