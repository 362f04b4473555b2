//! # Kireme
//!
//! Kiremeは、最小記述長（MDL）原理に基づく教師なし形態素分割の実装です。
//!
//! ## 概要
//!
//! このライブラリは、(単語, 頻度) ペアの学習コーパスからサブワード単位
//! （モルフ）の辞書と各単語の再帰的な2分割を学習します。学習は、辞書の
//! 記述長とモデルの下でのコーパスの記述長の和を貪欲な再分割探索で
//! 最小化することで行われます。学習済みの辞書に対しては、Viterbi
//! アルゴリズムに基づくデコーダーで未知の単語を分割できます。
//!
//! ## 主な機能
//!
//! - **4種類のコストモデル**: 頻度と長さのそれぞれについて暗黙・明示の
//!   定式化を選択可能
//! - **増分的なコスト管理**: 分割仮説の適用と取り消しを対になった
//!   カウント調整で行い、テーブル全体の複製を回避
//! - **再現可能な学習**: 乱数シードの固定により学習結果を再現可能
//! - **バッファを再利用するデコーダー**: ワーカーが動的計画法の
//!   テーブルを保持し、単語ごとの割り当てを回避
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), kireme::KiremeError> {
//! use kireme::{AlgorithmMode, Corpus, Segmenter, Trainer, TrainerConfig};
//!
//! let corpus_data = "\
//! 1 reopen
//! 1 reorder
//! 1 retry
//! 1 redo
//! 5 open
//! 5 order
//! 5 try
//! 5 do";
//! let corpus = Corpus::from_reader(corpus_data.as_bytes())?;
//!
//! let config = TrainerConfig::new(AlgorithmMode::BaselineFreqLength).seed(42);
//! let tree = Trainer::new(config).train(&corpus)?;
//! assert!(tree.contains("re"));
//!
//! let segmenter = Segmenter::from_tree(&tree);
//! let mut worker = segmenter.new_worker();
//!
//! worker.reset_word("reorder");
//! worker.segment();
//!
//! let morphs: Vec<&str> = worker.morphs().collect();
//! assert_eq!(vec!["re", "order"], morphs);
//! # Ok(())
//! # }
//! ```

/// 共通の定数と補助関数
pub mod common;

/// 学習コーパスのデータ構造
pub mod corpus;

/// エラー型の定義
pub mod errors;

/// 対数領域の特殊関数
mod math;

/// MDLコストモデル
pub mod model;

/// 学習結果の書き出し
pub mod output;

/// セグメンテーション木
pub mod segmentation;

/// Viterbiセグメンター
pub mod segmenter;

/// 学習設定と最適化ループ
pub mod trainer;

// Re-exports
pub use corpus::{Corpus, Word};
pub use errors::{KiremeError, Result};
pub use model::{AlgorithmMode, Model};
pub use output::{write_dot, write_plain};
pub use segmentation::{MorphNode, SegmentationTree};
pub use segmenter::{SegmentWorker, Segmenter};
pub use trainer::{Trainer, TrainerConfig};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
