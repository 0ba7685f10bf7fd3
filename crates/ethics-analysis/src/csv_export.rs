//! 正規化済みプレイの CSV 出力

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::axis::SCORE_FIELDS;
use crate::error::{AnalysisError, Result};
use crate::io::open_writer;
use crate::record::RunRecord;

/// 識別列（この後に 8 軸、Total Score、Average Score が続く）
pub const IDENTITY_HEADERS: [&str; 8] = [
    "Run ID",
    "Scenario",
    "Model",
    "Player Type",
    "System Prompt",
    "Timestamp",
    "Choice Count",
    "Verdict",
];

/// 全列のヘッダ
pub fn csv_headers() -> Vec<&'static str> {
    IDENTITY_HEADERS
        .iter()
        .copied()
        .chain(SCORE_FIELDS.iter().map(|f| f.display_name()))
        .collect()
}

/// 1 プレイを CSV の 1 行分のフィールドにする。欠損スコアは空文字。
pub fn record_fields(record: &RunRecord) -> Vec<String> {
    let mut fields = vec![
        record.run_id.clone(),
        record.scenario.clone(),
        record.model.clone(),
        record.player_type.as_str().to_string(),
        record.system_prompt.clone(),
        record.timestamp.clone(),
        record.choice_count.to_string(),
        record.verdict.clone(),
    ];
    fields.extend(SCORE_FIELDS.iter().map(|&f| fmt_opt_float(record.scores.get(f))));
    fields
}

fn fmt_opt_float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// ヘッダ + 入力順の全行を書き出す。
pub fn write_csv<W: Write>(writer: &mut W, records: &[RunRecord]) -> io::Result<()> {
    write_csv_row(writer, &csv_headers())?;
    for record in records {
        write_csv_row(writer, &record_fields(record))?;
    }
    writer.flush()
}

/// `path` に CSV を書き出す（`.gz` は圧縮、`-` は標準出力）。
pub fn export_csv(records: &[RunRecord], path: &Path) -> Result<()> {
    let write_err = |source: io::Error| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = open_writer(path).map_err(write_err)?;
    write_csv(&mut writer, records).map_err(write_err)?;
    writer.close().map_err(write_err)?;
    log::info!("wrote {} row(s) to {}", records.len(), path.display());
    Ok(())
}

/// 出力ファイル名の接頭辞。プレイヤー種別が 1 種類ならその名前、複数なら `combined`。
pub fn output_prefix(records: &[RunRecord]) -> &'static str {
    let types: BTreeSet<_> = records.iter().map(|r| r.player_type).collect();
    match types.iter().next() {
        Some(only) if types.len() == 1 => only.as_str(),
        _ => "combined",
    }
}

/// 既定の出力パス: `<dir>/analysis_<prefix>_<%Y-%m-%dT%H-%M-%S>.csv`
pub fn default_output_path<Tz>(dir: &Path, records: &[RunRecord], timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let name = format!(
        "analysis_{}_{}.csv",
        output_prefix(records),
        timestamp.format("%Y-%m-%dT%H-%M-%S")
    );
    dir.join(name)
}

fn write_csv_row<W: Write>(writer: &mut W, row: &[impl AsRef<str>]) -> io::Result<()> {
    for (idx, value) in row.iter().enumerate() {
        if idx > 0 {
            writer.write_all(b",")?;
        }
        write_csv_value(writer, value.as_ref())?;
    }
    writer.write_all(b"\n")
}

fn write_csv_value<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let needs_quote =
        value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r');
    if !needs_quote {
        return writer.write_all(value.as_bytes());
    }
    writer.write_all(b"\"")?;
    writer.write_all(value.replace('"', "\"\"").as_bytes())?;
    writer.write_all(b"\"")
}
