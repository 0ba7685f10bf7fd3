//! 正規化済みの 1 プレイ分の記録

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::axis::{AVERAGE_DENOMINATOR, AXES, Axis, SCORE_FIELDS, ScoreField};
use crate::verdict::{VerdictLabel, parse_verdict, verdict_label_text};

/// 人間プレイヤーを表す model 値
pub const HUMAN_SENTINELS: [&str; 2] = ["human", "manual"];

/// 人間プレイヤーの正規化表示名
pub const HUMAN_PLAYER_NAME: &str = "Human Player";

pub fn is_human_sentinel(value: &str) -> bool {
    HUMAN_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(value.trim()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlayerType {
    Manual,
    Model,
}

impl PlayerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerType::Manual => "manual",
            PlayerType::Model => "model",
        }
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PlayerType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 1 プレイ分のスコア。存在しないフィールドは `None` のまま保持する。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreSet {
    values: [Option<f64>; 10],
}

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: impl Into<ScoreField>) -> Option<f64> {
        self.values[field.into().index()]
    }

    pub fn set(&mut self, field: impl Into<ScoreField>, value: f64) {
        self.values[field.into().index()] = Some(value);
    }

    pub fn with(mut self, field: impl Into<ScoreField>, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// 基本軸の値。欠損は 0 として扱う（順位付け用）。
    pub fn axis_or_zero(&self, axis: Axis) -> f64 {
        self.get(axis).unwrap_or(0.0)
    }

    /// 存在するフィールドを正規順序で列挙する。
    pub fn present(&self) -> impl Iterator<Item = (ScoreField, f64)> + '_ {
        SCORE_FIELDS.iter().filter_map(|&field| self.get(field).map(|v| (field, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// 存在する基本軸の合計。基本軸が 1 つも無ければ `None`。
    pub fn base_axis_sum(&self) -> Option<f64> {
        let mut present = AXES.iter().filter_map(|&axis| self.get(axis)).peekable();
        present.peek()?;
        Some(present.sum())
    }

    /// 合計・平均を補完する。
    ///
    /// - `total` が生データにあればそのまま信頼し、無ければ存在する基本軸の和。
    /// - `average` が無ければ `total / 8`（存在する軸数ではなく常に 8 で割る）。
    pub fn fill_derived(&mut self) {
        if self.get(ScoreField::Total).is_none() {
            if let Some(sum) = self.base_axis_sum() {
                self.set(ScoreField::Total, sum);
            }
        }
        if self.get(ScoreField::Average).is_none() {
            if let Some(total) = self.get(ScoreField::Total) {
                self.set(ScoreField::Average, total / AVERAGE_DENOMINATOR);
            }
        }
    }
}

impl Serialize for ScoreSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in self.present() {
            map.serialize_entry(field.code(), &value)?;
        }
        map.end()
    }
}

/// 評価済みの 1 プレイ
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub scenario: String,
    pub model: String,
    pub player_type: PlayerType,
    pub system_prompt: String,
    pub timestamp: String,
    pub choice_count: usize,
    pub scores: ScoreSet,
    pub verdict: String,
}

impl RunRecord {
    /// verdict のラベル部分（未知のラベルもそのまま返す）
    pub fn verdict_label(&self) -> Option<&str> {
        verdict_label_text(&self.verdict)
    }

    pub fn parsed_verdict(&self) -> Option<VerdictLabel> {
        parse_verdict(&self.verdict)
    }

    pub fn average(&self) -> Option<f64> {
        self.scores.get(ScoreField::Average)
    }
}

/// 分析用のプレイヤー識別子。
///
/// 人間は `"Human Player"` に統一し、モデルは `provider/name-version` を
/// `provider/name` まで丸める（例: `anthropic/claude-3-7-sonnet:beta` → `anthropic/claude`）。
pub fn normalized_player(record: &RunRecord) -> String {
    if record.player_type == PlayerType::Manual {
        return HUMAN_PLAYER_NAME.to_string();
    }
    match record.model.split_once('/') {
        Some((provider, rest)) => match rest.split_once('-') {
            Some((base, _)) => format!("{provider}/{base}"),
            None => record.model.clone(),
        },
        None => record.model.clone(),
    }
}

#[cfg(test)]
pub(crate) fn sample_record(run_id: &str, scores: ScoreSet) -> RunRecord {
    RunRecord {
        run_id: run_id.to_string(),
        scenario: "hostage-holdout".to_string(),
        model: "openai/gpt-4o".to_string(),
        player_type: PlayerType::Model,
        system_prompt: String::new(),
        timestamp: "2025-05-03T05:38:01Z".to_string(),
        choice_count: 5,
        scores,
        verdict: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_derived_divides_partial_axis_sum_by_eight() {
        // sp と uc が欠けていても分母は 8
        let mut scores = ScoreSet::new()
            .with(Axis::HarmCare, 3.0)
            .with(Axis::FairnessJustice, 2.0)
            .with(Axis::AutonomyRespect, 1.0)
            .with(Axis::AuthorityLegitimacy, 0.0)
            .with(Axis::LoyaltyTrust, -1.0)
            .with(Axis::IntegrityTruth, 3.0);
        scores.fill_derived();
        assert_eq!(scores.get(ScoreField::Total), Some(8.0));
        assert_eq!(scores.get(ScoreField::Average), Some(1.0));
        assert_eq!(scores.get(Axis::SanctityPurity), None);
    }

    #[test]
    fn fill_derived_trusts_raw_total() {
        let mut scores = ScoreSet::new().with(Axis::HarmCare, 3.0).with(ScoreField::Total, 16.0);
        scores.fill_derived();
        assert_eq!(scores.get(ScoreField::Total), Some(16.0));
        assert_eq!(scores.get(ScoreField::Average), Some(2.0));
    }

    #[test]
    fn fill_derived_keeps_raw_average_and_empty_set() {
        let mut scores = ScoreSet::new().with(ScoreField::Total, 8.0).with(ScoreField::Average, 5.0);
        scores.fill_derived();
        assert_eq!(scores.get(ScoreField::Average), Some(5.0));

        let mut empty = ScoreSet::new();
        empty.fill_derived();
        assert!(empty.is_empty());
    }

    #[test]
    fn normalized_player_collapses_model_versions() {
        let mut record = sample_record("r1", ScoreSet::new());
        record.model = "anthropic/claude-3-7-sonnet:beta".to_string();
        assert_eq!(normalized_player(&record), "anthropic/claude");

        record.model = "meta/llama".to_string();
        assert_eq!(normalized_player(&record), "meta/llama");

        record.model = "gpt-4o".to_string();
        assert_eq!(normalized_player(&record), "gpt-4o");

        record.player_type = PlayerType::Manual;
        assert_eq!(normalized_player(&record), HUMAN_PLAYER_NAME);
    }

    #[test]
    fn scores_serialize_present_fields_only() {
        let scores = ScoreSet::new().with(Axis::HarmCare, 1.5).with(ScoreField::Average, 0.25);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"hc":1.5,"average":0.25}"#);
    }
}
