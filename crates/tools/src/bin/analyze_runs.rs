/// プレイ結果の集計ツール
///
/// 使い方:
///   # results/runs 以下を集計して表示し、results/ に CSV を書き出す
///   analyze_runs results/runs
///
///   # モデル別に比較し、CSV を明示的なパスへ
///   analyze_runs results/runs --group-by model --output-csv out/analysis.csv
///
///   # JSON出力モード（CSV なし）
///   analyze_runs results/runs --json --no-csv
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use ethics_analysis::report::{Report, SkippedList};
use ethics_analysis::{
    AnalysisConfig, AnalysisError, GroupKey, default_output_path, export_csv, run_analysis,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(author, version, about = "Aggregate ethical-dilemma run results into statistics and CSV")]
struct Cli {
    /// 結果ファイルを探索するルートディレクトリ
    #[arg(default_value = "results/runs")]
    root: PathBuf,

    /// 設定ファイル（TOML）。CLI 引数が優先される
    #[arg(long)]
    config: Option<PathBuf>,

    /// グループ比較のキー（scenario, model, player-type, player）
    #[arg(long)]
    group_by: Option<GroupKey>,

    /// 出力CSV（省略時: <output-dir>/analysis_<type>_<timestamp>.csv、`-` で標準出力）
    #[arg(long)]
    output_csv: Option<PathBuf>,

    /// 既定CSVの出力ディレクトリ
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// CSV を書き出さない
    #[arg(long)]
    no_csv: bool,

    /// JSON出力モード（CSV を標準出力へ書く場合とは併用不可）
    #[arg(long)]
    json: bool,

    /// 探索の最大深さ
    #[arg(long)]
    max_depth: Option<usize>,
}

fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(key) = cli.group_by {
        config.group_by = key;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    }
    Ok(config)
}

fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// CSV を標準出力へ書くかどうか。JSON と同じストリームには混ぜない。
fn csv_to_stdout(cli: &Cli) -> Result<bool> {
    let to_stdout = !cli.no_csv && cli.output_csv.as_deref().is_some_and(is_stdout);
    if to_stdout && cli.json {
        bail!("--json cannot be combined with --output-csv - (both write to stdout)");
    }
    Ok(to_stdout)
}

// ---------------------------------------------------------------------------
// メイン処理
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let stdout_csv = csv_to_stdout(&cli)?;
    let config = resolve_config(&cli)?;
    log::info!("analyzing {} (group by {})", cli.root.display(), config.group_by);

    let analysis = match run_analysis(&cli.root, &config) {
        Ok(analysis) => analysis,
        Err(AnalysisError::EmptyInput { skipped }) => {
            // 集計対象なし: 表も CSV も出さずに正常終了する
            eprintln!("有効なプレイがありません: {}", cli.root.display());
            eprint!("{}", SkippedList(&skipped));
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to analyze {}", cli.root.display()));
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else if stdout_csv {
        // 標準出力は CSV 専用
        eprint!("{}", Report(&analysis));
    } else {
        print!("{}", Report(&analysis));
    }

    if !cli.no_csv {
        let output_csv = cli.output_csv.clone().unwrap_or_else(|| {
            default_output_path(&config.output_dir, &analysis.records, &Local::now())
        });
        export_csv(&analysis.records, &output_csv)
            .with_context(|| format!("failed to export CSV to {}", output_csv.display()))?;
        if !cli.json && !stdout_csv {
            println!();
            println!("wrote CSV: {}", output_csv.display());
        }
    }

    Ok(())
}
