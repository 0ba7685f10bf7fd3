//! コンソール表示用の表
//!
//! 数値はすべて小数点以下 2 桁で表示する。欠損は `-`。
//! 各表は `fmt::Write` に直接書き出し、[`Report`] がそれらをまとめる。

use std::fmt::{self, Write};

use crate::analysis::Analysis;
use crate::axis::{AXES, SCORE_FIELDS};
use crate::group::{GroupSummary, VerdictCount};
use crate::normalize::SkippedFile;
use crate::rank::{RANK_COUNT, RankFrequency};
use crate::stats::{AxisCorrelation, AxisStats};

const RULE_WIDTH: usize = 100;

pub fn fmt2(value: f64) -> String {
    format!("{value:.2}")
}

fn fmt_opt2(value: Option<f64>) -> String {
    value.map(fmt2).unwrap_or_else(|| "-".to_string())
}

fn display_key(key: &str) -> &str {
    if key.is_empty() { "(none)" } else { key }
}

fn write_title(out: &mut impl Write, title: &str) -> fmt::Result {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// 軸ごとの記述統計表
pub fn write_axis_stats(out: &mut impl Write, stats: &[AxisStats]) -> fmt::Result {
    write_title(out, "軸別統計")?;
    writeln!(
        out,
        "  {:22} | {:>5} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8}",
        "Axis", "n", "Mean", "Median", "Min", "Max", "StdDev"
    )?;
    for s in stats {
        writeln!(
            out,
            "  {:22} | {:>5} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8}",
            s.field.display_name(),
            s.count,
            fmt2(s.mean),
            fmt2(s.median),
            fmt2(s.min),
            fmt2(s.max),
            fmt2(s.std_dev)
        )?;
    }
    Ok(())
}

/// 軸 × 順位 の出現回数表
pub fn write_rank_frequency(out: &mut impl Write, freq: &RankFrequency) -> fmt::Result {
    write_title(out, &format!("軸の順位分布（{} プレイ, 1 = 最優先）", freq.runs))?;
    write!(out, "  {:22}", "Axis")?;
    for rank in 1..=RANK_COUNT {
        write!(out, " | {:>5}", format!("#{rank}"))?;
    }
    writeln!(out, " | {:>8}", "MeanRank")?;
    for axis in AXES {
        write!(out, "  {:22}", axis.display_name())?;
        for count in freq.distribution(axis) {
            write!(out, " | {count:>5}")?;
        }
        writeln!(out, " | {:>8}", fmt_opt2(freq.mean_rank(axis)))?;
    }
    Ok(())
}

/// グループ × フィールド平均の表
pub fn write_group_table(out: &mut impl Write, title: &str, groups: &[GroupSummary]) -> fmt::Result {
    write_title(out, title)?;
    write!(out, "  {:28} | {:>4}", "Group", "n")?;
    for field in SCORE_FIELDS {
        write!(out, " | {:>7}", field.code())?;
    }
    writeln!(out, " | {:>7} | Top verdict", "Consist")?;
    for g in groups {
        write!(out, "  {:28} | {:>4}", display_key(&g.key), g.count)?;
        for field in SCORE_FIELDS {
            write!(out, " | {:>7}", fmt_opt2(g.mean(field)))?;
        }
        writeln!(
            out,
            " | {:>7} | {}",
            fmt_opt2(g.consistency),
            g.top_verdict.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

/// 2 グループの平均差（`right - left`）を軸ごとに示す比較表
pub fn write_two_way(
    out: &mut impl Write,
    title: &str,
    left: &GroupSummary,
    right: &GroupSummary,
) -> fmt::Result {
    write_title(out, title)?;
    writeln!(
        out,
        "  {:22} | {:>10} | {:>10} | {:>8}",
        "Axis",
        display_key(&left.key),
        display_key(&right.key),
        "Diff"
    )?;
    for field in SCORE_FIELDS {
        let (l, r) = (left.mean(field), right.mean(field));
        let diff = l.zip(r).map(|(l, r)| r - l);
        writeln!(
            out,
            "  {:22} | {:>10} | {:>10} | {:>8}",
            field.display_name(),
            fmt_opt2(l),
            fmt_opt2(r),
            fmt_opt2(diff)
        )?;
    }
    Ok(())
}

/// verdict 分布
pub fn write_verdicts(out: &mut impl Write, counts: &[VerdictCount], runs: usize) -> fmt::Result {
    write_title(out, "判定分布")?;
    for c in counts {
        let pct = if runs > 0 {
            c.count as f64 / runs as f64 * 100.0
        } else {
            0.0
        };
        writeln!(out, "  {:14} | {:>5} | {:>6}%", c.label, c.count, fmt2(pct))?;
    }
    Ok(())
}

/// シナリオ難易度（平均スコア昇順）
pub fn write_scenario_difficulty(out: &mut impl Write, rows: &[(String, f64)]) -> fmt::Result {
    write_title(out, "シナリオ難易度（平均スコアの低い順）")?;
    for (scenario, mean) in rows {
        writeln!(out, "  {:28} | {:>8}", display_key(scenario), fmt2(*mean))?;
    }
    Ok(())
}

/// 軸間相関（Pearson, 上三角）
pub fn write_correlations(out: &mut impl Write, correlations: &[AxisCorrelation]) -> fmt::Result {
    write_title(out, "軸間相関（Pearson）")?;
    write!(out, "  {:4}", "")?;
    for axis in AXES {
        write!(out, " | {:>6}", axis.code())?;
    }
    writeln!(out)?;
    for a in AXES {
        write!(out, "  {:4}", a.code())?;
        for b in AXES {
            let cell = correlations
                .iter()
                .find(|c| (c.a == a && c.b == b) || (c.a == b && c.b == a))
                .and_then(|c| c.pearson);
            write!(out, " | {:>6}", fmt_opt2(cell))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_skipped(out: &mut impl Write, skipped: &[SkippedFile]) -> fmt::Result {
    writeln!(out, "スキップしたファイル: {}", skipped.len())?;
    for s in skipped {
        writeln!(out, "  [{}] {}: {}", s.kind, s.path.display(), s.detail)?;
    }
    Ok(())
}

/// スキップ一覧の表示用ラッパ
pub struct SkippedList<'a>(pub &'a [SkippedFile]);

impl fmt::Display for SkippedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_skipped(f, self.0)
    }
}

/// 全表をまとめたテキストレポート
pub struct Report<'a>(pub &'a Analysis);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        writeln!(
            f,
            "ファイル数: {}  プレイ数: {}  スキップ: {}",
            analysis.files_discovered,
            analysis.runs,
            analysis.skipped.len()
        )?;
        writeln!(f)?;
        write_axis_stats(f, &analysis.axis_stats)?;
        writeln!(f)?;
        write_rank_frequency(f, &analysis.rank_frequency)?;
        writeln!(f)?;
        write_group_table(
            f,
            &format!("グループ別比較（{}）", analysis.group_key),
            &analysis.groups,
        )?;
        if let Some([left, right]) = analysis.player_type_comparison.as_deref() {
            writeln!(f)?;
            write_two_way(f, "人間 vs モデル", left, right)?;
        }
        if let Some(groups) = &analysis.model_comparison {
            writeln!(f)?;
            write_group_table(f, "モデル別比較", groups)?;
        }
        writeln!(f)?;
        write_scenario_difficulty(f, &analysis.scenario_difficulty)?;
        writeln!(f)?;
        write_verdicts(f, &analysis.verdict_distribution, analysis.runs)?;
        writeln!(f)?;
        write_correlations(f, &analysis.correlations)?;
        if !analysis.verdict_mismatches.is_empty() {
            writeln!(f)?;
            writeln!(f, "判定の不一致: {}", analysis.verdict_mismatches.len())?;
            for m in &analysis.verdict_mismatches {
                writeln!(
                    f,
                    "  {}: {} (average {} → {})",
                    m.run_id,
                    m.stored,
                    fmt2(m.average),
                    m.expected
                )?;
            }
        }
        if !analysis.skipped.is_empty() {
            writeln!(f)?;
            write_skipped(f, &analysis.skipped)?;
        }
        Ok(())
    }
}
