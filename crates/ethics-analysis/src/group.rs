//! グループ別比較
//!
//! シナリオ・モデル・プレイヤー種別などのキーでプレイを分割し、
//! フィールドごとの平均と最頻 verdict を求める。

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::axis::{SCORE_FIELDS, ScoreField};
use crate::record::{PlayerType, RunRecord, ScoreSet, normalized_player};
use crate::verdict::{VerdictLabel, classify_verdict};

/// グループ分けのキー
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    #[default]
    Scenario,
    Model,
    PlayerType,
    /// `normalized_player` による正規化済みプレイヤー名
    Player,
}

impl GroupKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            GroupKey::Scenario => "scenario",
            GroupKey::Model => "model",
            GroupKey::PlayerType => "player-type",
            GroupKey::Player => "player",
        }
    }

    pub fn value_of(self, record: &RunRecord) -> String {
        match self {
            GroupKey::Scenario => record.scenario.clone(),
            GroupKey::Model => record.model.clone(),
            GroupKey::PlayerType => record.player_type.as_str().to_string(),
            GroupKey::Player => normalized_player(record),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "scenario" => Ok(GroupKey::Scenario),
            "model" => Ok(GroupKey::Model),
            "player-type" => Ok(GroupKey::PlayerType),
            "player" => Ok(GroupKey::Player),
            other => Err(format!("unknown group key: {other}")),
        }
    }
}

/// ラベルごとの出現回数
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerdictCount {
    pub label: String,
    pub count: usize,
}

/// verdict ラベルの集計。初出順を保持する。
#[derive(Clone, Debug, Default)]
pub struct VerdictTally {
    entries: Vec<VerdictCount>,
}

impl VerdictTally {
    pub fn add(&mut self, label: &str) {
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.count += 1,
            None => self.entries.push(VerdictCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }

    pub fn add_record(&mut self, record: &RunRecord) {
        if let Some(label) = record.verdict_label() {
            self.add(label);
        }
    }

    /// 最多ラベル。同数なら先に出現した方。
    pub fn top(&self) -> Option<&str> {
        let mut best: Option<&VerdictCount> = None;
        for entry in &self.entries {
            if best.is_none_or(|b| entry.count > b.count) {
                best = Some(entry);
            }
        }
        best.map(|b| b.label.as_str())
    }

    pub fn into_entries(self) -> Vec<VerdictCount> {
        self.entries
    }
}

/// 1 グループの集計結果
#[derive(Clone, Debug, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    /// フィールドごとの平均（欠損値は除外、観測が無ければ欠損）
    pub means: ScoreSet,
    pub verdicts: Vec<VerdictCount>,
    pub top_verdict: Option<String>,
    /// average の 平均 / 標本標準偏差
    pub consistency: Option<f64>,
}

impl GroupSummary {
    fn from_records(key: String, records: &[&RunRecord]) -> Self {
        let mut sums = [0.0_f64; 10];
        let mut counts = [0_usize; 10];
        let mut tally = VerdictTally::default();
        for record in records {
            for (field, value) in record.scores.present() {
                sums[field.index()] += value;
                counts[field.index()] += 1;
            }
            tally.add_record(record);
        }

        let mut means = ScoreSet::new();
        for field in SCORE_FIELDS {
            let idx = field.index();
            if counts[idx] > 0 {
                means.set(field, sums[idx] / counts[idx] as f64);
            }
        }

        let averages: Vec<f64> = records.iter().filter_map(|r| r.average()).collect();
        Self {
            key,
            count: records.len(),
            means,
            top_verdict: tally.top().map(str::to_string),
            verdicts: tally.into_entries(),
            consistency: consistency_score(&averages),
        }
    }

    pub fn mean(&self, field: impl Into<ScoreField>) -> Option<f64> {
        self.means.get(field)
    }
}

/// 一貫性スコア: 平均 / 標本標準偏差。
/// 1 件のみ、または標準偏差が 0.001 以下なら `平均 × 10`。
pub fn consistency_score(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() == 1 {
        return Some(mean * 10.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    if std <= 0.001 {
        Some(mean * 10.0)
    } else {
        Some(mean / std)
    }
}

/// 入力順を保ったままキーごとにプレイを分ける（空のキーも 1 グループ）。
fn partition<'a, F>(records: &'a [RunRecord], key_of: F) -> BTreeMap<String, Vec<&'a RunRecord>>
where
    F: Fn(&RunRecord) -> String,
{
    let mut groups: BTreeMap<String, Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key_of(record)).or_default().push(record);
    }
    groups
}

/// キーでグループ分けし、キー昇順で集計結果を返す。
pub fn compare_groups(records: &[RunRecord], key: GroupKey) -> Vec<GroupSummary> {
    partition(records, |r| key.value_of(r))
        .into_iter()
        .map(|(k, members)| GroupSummary::from_records(k, &members))
        .collect()
}

/// manual と model の 2 者比較。どちらかが 0 件なら `None`。
pub fn compare_player_types(records: &[RunRecord]) -> Option<Vec<GroupSummary>> {
    let has = |t: PlayerType| records.iter().any(|r| r.player_type == t);
    if !has(PlayerType::Manual) || !has(PlayerType::Model) {
        return None;
    }
    Some(compare_groups(records, GroupKey::PlayerType))
}

/// model 種別のプレイをモデル名で比較する。モデルが 2 種類未満なら `None`。
pub fn compare_models(records: &[RunRecord]) -> Option<Vec<GroupSummary>> {
    let model_runs: Vec<&RunRecord> =
        records.iter().filter(|r| r.player_type == PlayerType::Model).collect();
    let mut groups: BTreeMap<String, Vec<&RunRecord>> = BTreeMap::new();
    for record in model_runs {
        groups.entry(record.model.clone()).or_default().push(record);
    }
    if groups.len() < 2 {
        return None;
    }
    Some(
        groups
            .into_iter()
            .map(|(k, members)| GroupSummary::from_records(k, &members))
            .collect(),
    )
}

/// シナリオを平均スコア（average の平均）の昇順に並べる。低いほど難しい。
/// average を持つプレイが無いシナリオは除外。
pub fn scenario_difficulty(records: &[RunRecord]) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = partition(records, |r| r.scenario.clone())
        .into_iter()
        .filter_map(|(scenario, members)| {
            let averages: Vec<f64> = members.iter().filter_map(|r| r.average()).collect();
            if averages.is_empty() {
                return None;
            }
            let mean = averages.iter().sum::<f64>() / averages.len() as f64;
            Some((scenario, mean))
        })
        .collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    rows
}

/// 全体の verdict ラベル分布（初出順）
pub fn verdict_distribution(records: &[RunRecord]) -> Vec<VerdictCount> {
    let mut tally = VerdictTally::default();
    for record in records {
        tally.add_record(record);
    }
    tally.into_entries()
}

/// 記録された verdict と average から導いた帯域の食い違い
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerdictMismatch {
    pub run_id: String,
    pub stored: VerdictLabel,
    pub expected: VerdictLabel,
    pub average: f64,
}

/// 既知ラベルと average の両方を持つプレイについて帯域を突き合わせる。
pub fn verdict_mismatches(records: &[RunRecord]) -> Vec<VerdictMismatch> {
    records
        .iter()
        .filter_map(|r| {
            let stored = r.parsed_verdict()?;
            let average = r.average()?;
            let expected = classify_verdict(average);
            (stored != expected).then(|| VerdictMismatch {
                run_id: r.run_id.clone(),
                stored,
                expected,
                average,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::record::sample_record;

    fn record(id: &str, scenario: &str, model: &str, player_type: PlayerType, hc: f64, verdict: &str) -> RunRecord {
        let mut scores = ScoreSet::new().with(Axis::HarmCare, hc);
        scores.fill_derived();
        let mut r = sample_record(id, scores);
        r.scenario = scenario.to_string();
        r.model = model.to_string();
        r.player_type = player_type;
        r.verdict = verdict.to_string();
        r
    }

    #[test]
    fn top_verdict_ties_break_by_first_occurrence() {
        let a = record("1", "s", "m", PlayerType::Model, 1.0, "HARMFUL - x");
        let b = record("2", "s", "m", PlayerType::Model, 1.0, "EXEMPLARY - y");
        let c = record("3", "s", "m", PlayerType::Model, 1.0, "EXEMPLARY - y");
        let d = record("4", "s", "m", PlayerType::Model, 1.0, "HARMFUL - x");

        let forward = compare_groups(&[a.clone(), b.clone(), c.clone(), d.clone()], GroupKey::Scenario);
        assert_eq!(forward[0].top_verdict.as_deref(), Some("HARMFUL"));

        let reversed = compare_groups(&[b, a, d, c], GroupKey::Scenario);
        assert_eq!(reversed[0].top_verdict.as_deref(), Some("EXEMPLARY"));
    }

    #[test]
    fn groups_keep_empty_keys_and_ignore_missing_values() {
        let mut with_lt = record("1", "alpha", "m", PlayerType::Model, 4.0, "");
        with_lt.scores.set(Axis::LoyaltyTrust, 2.0);
        let records = vec![
            with_lt,
            record("2", "alpha", "m", PlayerType::Model, 2.0, ""),
            record("3", "", "m", PlayerType::Model, -8.0, ""),
        ];
        let groups = compare_groups(&records, GroupKey::Scenario);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "");
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[1].key, "alpha");
        assert_eq!(groups[1].count, 2);
        assert_eq!(groups[1].mean(Axis::HarmCare), Some(3.0));
        assert_eq!(groups[1].mean(Axis::LoyaltyTrust), Some(2.0));
        assert_eq!(groups[1].mean(Axis::SanctityPurity), None);
        assert_eq!(groups[1].top_verdict, None);
    }

    #[test]
    fn two_way_and_multi_model_need_both_classes() {
        let only_models = vec![
            record("1", "s", "openai/gpt-4o", PlayerType::Model, 1.0, ""),
            record("2", "s", "openai/gpt-4o", PlayerType::Model, 1.0, ""),
        ];
        assert!(compare_player_types(&only_models).is_none());
        assert!(compare_models(&only_models).is_none());

        let mut mixed = only_models.clone();
        mixed.push(record("3", "s", "human", PlayerType::Manual, 2.0, ""));
        mixed.push(record("4", "s", "meta/llama-4", PlayerType::Model, 3.0, ""));
        let two_way = compare_player_types(&mixed).unwrap();
        let keys: Vec<&str> = two_way.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["manual", "model"]);

        let models = compare_models(&mixed).unwrap();
        let keys: Vec<&str> = models.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["meta/llama-4", "openai/gpt-4o"]);
    }

    #[test]
    fn consistency_score_handles_single_and_flat_groups() {
        assert_eq!(consistency_score(&[]), None);
        assert_eq!(consistency_score(&[0.5]), Some(5.0));
        assert_eq!(consistency_score(&[1.0, 1.0]), Some(10.0));
        // mean 2, sample std 1
        let score = consistency_score(&[1.0, 2.0, 3.0]).unwrap();
        assert!((score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn scenario_difficulty_orders_hardest_first() {
        let records = vec![
            record("1", "easy", "m", PlayerType::Model, 24.0, ""),
            record("2", "hard", "m", PlayerType::Model, -16.0, ""),
            record("3", "mid", "m", PlayerType::Model, 8.0, ""),
        ];
        let ranked = scenario_difficulty(&records);
        let order: Vec<&str> = ranked.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["hard", "mid", "easy"]);
        assert_eq!(ranked[0].1, -2.0);
    }

    #[test]
    fn verdict_mismatches_flag_wrong_bands_only() {
        let records = vec![
            // average 3.0 → RESPONSIBLE
            record("ok", "s", "m", PlayerType::Model, 24.0, "RESPONSIBLE - fine"),
            record("bad", "s", "m", PlayerType::Model, 24.0, "AMBIGUOUS - wrong"),
            record("custom", "s", "m", PlayerType::Model, 24.0, "CUSTOM - ignored"),
        ];
        let mismatches = verdict_mismatches(&records);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].run_id, "bad");
        assert_eq!(mismatches[0].stored, VerdictLabel::Ambiguous);
        assert_eq!(mismatches[0].expected, VerdictLabel::Responsible);
    }

    #[test]
    fn distribution_counts_labels_outside_the_known_bands() {
        let records = vec![
            record("1", "s", "m", PlayerType::Model, 1.0, "NOT_RATED - pending"),
            record("2", "s", "m", PlayerType::Model, 1.0, "N/A - skipped"),
            record("3", "s", "m", PlayerType::Model, 1.0, "RESPONSIBLE - ok"),
            record("4", "s", "m", PlayerType::Model, 1.0, "NOT_RATED - later"),
        ];
        let counts = verdict_distribution(&records);
        let distribution: Vec<(&str, usize)> =
            counts.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(distribution, vec![("NOT_RATED", 2), ("N/A", 1), ("RESPONSIBLE", 1)]);

        let groups = compare_groups(&records, GroupKey::Scenario);
        assert_eq!(groups[0].top_verdict.as_deref(), Some("NOT_RATED"));
        assert_eq!(groups[0].verdicts.iter().map(|c| c.count).sum::<usize>(), 4);
    }

    #[test]
    fn group_key_parses_cli_spellings() {
        assert_eq!("player_type".parse::<GroupKey>(), Ok(GroupKey::PlayerType));
        assert_eq!("Model".parse::<GroupKey>(), Ok(GroupKey::Model));
        assert!("colour".parse::<GroupKey>().is_err());
    }
}
