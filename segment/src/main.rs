//! 学習済み辞書で単語を分割するユーティリティ
//!
//! このバイナリは、標準入力から読み込んだ単語（1行1単語）を学習済みの
//! モルフ辞書で分割し、モルフを半角スペースで区切って出力します。

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;

use kireme::Segmenter;

use clap::Parser;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "segment", about = "Segments words with a learned morph lexicon")]
struct Args {
    /// Learned morph lexicon (the plain training output).
    #[clap(short = 'i', long)]
    lexicon: PathBuf,
}

/// メイン関数
///
/// 辞書をロードし、標準入力から読み込んだ単語を分割して、
/// 結果を標準出力に出力します。
///
/// # 戻り値
///
/// 実行が成功した場合は `Ok(())`、エラーが発生した場合はエラー情報
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the lexicon...");
    let segmenter = Segmenter::from_reader(File::open(&args.lexicon)?)?;
    let mut worker = segmenter.new_worker();

    eprintln!("Ready to segment");

    let is_tty = atty::is(atty::Stream::Stdout);

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    let lines = std::io::stdin().lock().lines();
    for line in lines {
        let line = line?;
        worker.reset_word(line.trim());
        worker.segment();
        for i in 0..worker.num_morphs() {
            if i != 0 {
                out.write_all(b" ")?;
            }
            out.write_all(worker.morph(i).as_bytes())?;
        }
        out.write_all(b"\n")?;
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
