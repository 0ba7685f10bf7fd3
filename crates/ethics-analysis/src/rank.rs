//! 軸の順位分布
//!
//! 各プレイで 8 軸をスコア降順に並べ、順位ごとにどの軸が来たかを数える。
//! 同点は正規順序 (hc, fj, ar, al, lt, it, sp, uc) で並べる（安定ソート）。

use std::cmp::Ordering;

use serde::Serialize;

use crate::axis::{AXES, Axis};
use crate::record::{RunRecord, ScoreSet};

pub const RANK_COUNT: usize = AXES.len();

/// 1 プレイ分の軸の並び（先頭が 1 位）。欠損軸は 0 として扱う。
pub fn rank_axes(scores: &ScoreSet) -> [Axis; RANK_COUNT] {
    let mut scored: Vec<(Axis, f64)> = AXES.iter().map(|&axis| (axis, scores.axis_or_zero(axis))).collect();
    // sort_by は安定ソートなので同点は AXES の順序が保たれる。
    // total_cmp は -0.0 < 0.0 とするので partial_cmp で比較する
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut ranked = AXES;
    for (slot, (axis, _)) in ranked.iter_mut().zip(scored) {
        *slot = axis;
    }
    ranked
}

/// `counts[rank][axis]`: 順位 `rank + 1` に `axis` が来た回数
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RankFrequency {
    pub runs: usize,
    pub counts: [[usize; RANK_COUNT]; RANK_COUNT],
}

impl RankFrequency {
    pub fn add(&mut self, scores: &ScoreSet) {
        for (rank, axis) in rank_axes(scores).iter().enumerate() {
            self.counts[rank][axis.index()] += 1;
        }
        self.runs += 1;
    }

    /// 順位（1 始まり）と軸を指定して回数を返す。
    pub fn count(&self, rank: usize, axis: Axis) -> usize {
        rank.checked_sub(1)
            .and_then(|r| self.counts.get(r))
            .map_or(0, |row| row[axis.index()])
    }

    /// 軸ごとの順位分布（1 位 .. 8 位）
    pub fn distribution(&self, axis: Axis) -> [usize; RANK_COUNT] {
        let mut out = [0; RANK_COUNT];
        for (rank, row) in self.counts.iter().enumerate() {
            out[rank] = row[axis.index()];
        }
        out
    }

    /// 軸の平均順位。プレイが無ければ `None`。
    pub fn mean_rank(&self, axis: Axis) -> Option<f64> {
        if self.runs == 0 {
            return None;
        }
        let weighted: usize = self
            .distribution(axis)
            .iter()
            .enumerate()
            .map(|(rank, count)| (rank + 1) * count)
            .sum();
        Some(weighted as f64 / self.runs as f64)
    }
}

pub fn rank_frequency(records: &[RunRecord]) -> RankFrequency {
    let mut freq = RankFrequency::default();
    for record in records {
        freq.add(&record.scores);
    }
    freq
}
