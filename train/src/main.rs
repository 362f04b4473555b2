//! セグメンテーションを学習するユーティリティ
//!
//! このバイナリは、「頻度 単語」形式のコーパスファイルからモルフ辞書を
//! 学習し、指定された出力形式（plain、dot）で結果を出力します。

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use kireme::{AlgorithmMode, Corpus, SegmentationTree, Trainer, TrainerConfig};

use clap::Parser;

/// 出力形式
#[derive(Clone, Debug)]
enum OutputFormat {
    Plain,
    Dot,
}

/// `OutputFormat` の `FromStr` 実装
impl FromStr for OutputFormat {
    type Err = &'static str;

    /// 文字列から出力形式をパースする
    ///
    /// # 引数
    ///
    /// * `format` - パース対象の文字列（"plain"、"dot"のいずれか）
    ///
    /// # 戻り値
    ///
    /// パースに成功した場合は対応する `OutputFormat`、失敗した場合はエラーメッセージ
    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format {
            "plain" => Ok(Self::Plain),
            "dot" => Ok(Self::Dot),
            _ => Err("Could not parse a format"),
        }
    }
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "train", about = "Learns a morph lexicon")]
struct Args {
    /// Training corpus with lines of `<frequency> <word>`.
    #[clap(short = 'i', long)]
    corpus: PathBuf,

    /// Output file. Prints to stdout if not specified.
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// Algorithm mode. Choices are baseline, baseline-freq,
    /// baseline-length, and baseline-freq-length.
    #[clap(short = 'm', long, default_value = "baseline")]
    mode: AlgorithmMode,

    /// Convergence threshold in bits per unique morph.
    #[clap(short = 't', long, default_value = "0.005")]
    threshold: f64,

    /// Hapax legomena prior for the explicit frequency cost.
    #[clap(long, default_value = "0.5")]
    hapax_prior: f64,

    /// Gamma prior for the explicit length cost.
    #[clap(long, default_value = "5.0")]
    length_prior: f64,

    /// Gamma scale for the explicit length cost.
    #[clap(long, default_value = "1.0")]
    length_beta: f64,

    /// Random seed for the optimizer shuffles. Seeded from the OS
    /// entropy if not specified.
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// Output format. Choices are plain and dot.
    #[clap(short = 'O', long, default_value = "plain")]
    output_format: OutputFormat,
}

/// 出力形式に応じて学習結果を書き出します
fn write_output<W>(tree: &SegmentationTree, wtr: W, format: &OutputFormat) -> kireme::Result<()>
where
    W: Write,
{
    match format {
        OutputFormat::Plain => kireme::write_plain(tree, wtr),
        OutputFormat::Dot => kireme::write_dot(tree, wtr),
    }
}

/// メイン関数
///
/// コーパスを読み込み、モルフ辞書を学習して、指定された形式で
/// 結果を出力します。
///
/// # 戻り値
///
/// 実行が成功した場合は `Ok(())`、エラーが発生した場合はエラー情報
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the corpus...");
    let corpus = Corpus::from_reader(File::open(&args.corpus)?)?;
    eprintln!("Training on {} words", corpus.len());

    let mut config = TrainerConfig::new(args.mode)
        .convergence_threshold(args.threshold)?
        .hapax_legomena_prior(args.hapax_prior)?
        .length_prior(args.length_prior)?
        .length_beta(args.length_beta)?;
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    let tree = Trainer::new(config).train(&corpus)?;
    eprintln!(
        "Learned {} unique morphs ({} tokens), overall cost {:.5}",
        tree.model().unique_morph_types(),
        tree.model().total_morph_tokens(),
        tree.model().overall_cost(),
    );

    match args.output {
        Some(path) => {
            write_output(&tree, File::create(path)?, &args.output_format)?;
        }
        None => {
            let out = std::io::stdout();
            write_output(&tree, out.lock(), &args.output_format)?;
        }
    }

    Ok(())
}
