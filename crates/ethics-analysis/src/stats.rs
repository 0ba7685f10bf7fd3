//! 軸ごとの記述統計と軸間相関

use serde::Serialize;

use crate::axis::{AXES, Axis, SCORE_FIELDS, ScoreField};
use crate::record::RunRecord;

/// 1 軸分の記述統計
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisStats {
    pub field: ScoreField,
    pub count: usize,
    pub mean: f64,
    /// 昇順ソート後の `n / 2` 番目（偶数個のときは上側の中央値を採る）
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// 母標準偏差（`n` で割る）
    pub std_dev: f64,
}

impl AxisStats {
    /// 値が 1 つも無ければ `None`
    pub fn from_values(field: ScoreField, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = sorted[sorted.len() / 2];

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            field,
            count: values.len(),
            mean,
            median,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            std_dev: variance.sqrt(),
        })
    }
}

/// 各フィールドについて、存在する値だけを標本として統計を計算する。
///
/// 欠損値は 0 として扱わず標本から除外する。観測が無いフィールドは結果に含めない。
/// 結果は正規順序（8 軸 → total → average）で並ぶ。
pub fn compute_axis_stats(records: &[RunRecord]) -> Vec<AxisStats> {
    SCORE_FIELDS
        .iter()
        .filter_map(|&field| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.scores.get(field)).collect();
            AxisStats::from_values(field, &values)
        })
        .collect()
}

/// 基本軸ペアの相関係数
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisCorrelation {
    pub a: Axis,
    pub b: Axis,
    /// 両方の値が揃っているプレイ数
    pub pairs: usize,
    pub pearson: Option<f64>,
}

/// 両軸とも存在するプレイだけを使う Pearson 相関。
/// 観測 2 未満、またはどちらかの分散が 0 なら `None`。
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// 全基本軸ペア（対角を含む上三角）の相関を正規順序で返す。
pub fn correlation_matrix(records: &[RunRecord]) -> Vec<AxisCorrelation> {
    let mut out = Vec::with_capacity(AXES.len() * (AXES.len() + 1) / 2);
    for (i, &a) in AXES.iter().enumerate() {
        for &b in &AXES[i..] {
            let pairs: Vec<(f64, f64)> = records
                .iter()
                .filter_map(|r| Some((r.scores.get(a)?, r.scores.get(b)?)))
                .collect();
            out.push(AxisCorrelation {
                a,
                b,
                pairs: pairs.len(),
                pearson: pearson(&pairs),
            });
        }
    }
    out
}
