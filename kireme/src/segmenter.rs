//! Viterbiアルゴリズムに基づくセグメンターの実装モジュール。
//!
//! このモジュールは、学習済みのリーフ集合（モルフ辞書）を使って
//! 未知の単語を最小コストのモルフ列に分割するデコーダーを提供します。
//! デコーダーは確定したリーフ集合のスナップショットのみを読み取り、
//! それぞれが独自のスナップショットを持つ限り、複数の呼び出し側から
//! 同時に使用できます。
//!
//! # 主要な構造体
//!
//! - [`Segmenter`]: 凍結されたモルフ辞書を保持するセグメンター本体
//! - [`SegmentWorker`]: セグメンターのワーカー。実際の分割処理を行う
//!
//! # 例
//!
//! ```
//! use kireme::Segmenter;
//!
//! let segmenter = Segmenter::from_lexicon([
//!     ("re", 100),
//!     ("open", 100),
//!     ("reopen", 1),
//! ])?;
//! let mut worker = segmenter.new_worker();
//!
//! worker.reset_word("reopen");
//! worker.segment();
//!
//! let morphs: Vec<&str> = worker.morphs().collect();
//! assert_eq!(vec!["re", "open"], morphs);
//! # Ok::<(), kireme::KiremeError>(())
//! ```

use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use crate::errors::{KiremeError, Result};
use crate::segmentation::SegmentationTree;

/// 凍結されたモルフ辞書に対するViterbiセグメンター。
///
/// リーフモルフとその頻度のスナップショット、および総モルフトークン数
/// を保持します。デコードには自然対数を使用します（候補間の相対順序は
/// 対数の底に依存しません）。
pub struct Segmenter {
    counts: HashMap<String, usize>,
    total_morph_tokens: usize,
    // ln M, fixed at construction time.
    log_total_tokens: f64,
}

impl Segmenter {
    /// 学習済みのセグメンテーション木からセグメンターを作成します。
    ///
    /// 木の現在のリーフ集合のスナップショットを取得します。
    /// 以降の木の変更はセグメンターに影響しません。
    ///
    /// # 引数
    ///
    /// * `tree` - 学習済みのセグメンテーション木
    ///
    /// # 戻り値
    ///
    /// 新しい `Segmenter` インスタンス
    pub fn from_tree(tree: &SegmentationTree) -> Self {
        let counts: HashMap<String, usize> = tree
            .leaves()
            .map(|(morph, count)| (morph.to_string(), count))
            .collect();
        Self::from_counts(counts)
    }

    /// (モルフ, 頻度) ペアの列からセグメンターを作成します。
    ///
    /// 重複するモルフの頻度は合算されます。
    ///
    /// # 引数
    ///
    /// * `entries` - (モルフ, 頻度) ペアのイテレータ
    ///
    /// # 戻り値
    ///
    /// 新しい `Segmenter` インスタンス
    ///
    /// # エラー
    ///
    /// モルフが空、または頻度が0の場合、[`KiremeError`] が返されます。
    pub fn from_lexicon<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for (morph, count) in entries {
            let morph = morph.into();
            if morph.is_empty() {
                return Err(KiremeError::invalid_corpus(0, "morph must be non-empty"));
            }
            if count == 0 {
                return Err(KiremeError::invalid_corpus(
                    0,
                    format!("morph {morph:?} must have a positive count"),
                ));
            }
            *counts.entry(morph).or_insert(0) += count;
        }
        Ok(Self::from_counts(counts))
    }

    /// 指定されたリーダーからモルフ辞書を読み込みます。
    ///
    /// 各行が「頻度 モルフ」の形式を想定しています。学習結果の
    /// プレーン出力をそのまま受け付けるため、`Overall cost:` で始まる
    /// ヘッダー行と空行は無視されます。
    ///
    /// # 引数
    ///
    /// * `rdr` - モルフ辞書のリーダー
    ///
    /// # 戻り値
    ///
    /// 新しい `Segmenter` インスタンス
    ///
    /// # エラー
    ///
    /// 入力形式が不正な場合、[`KiremeError`] が返されます。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let buf = BufReader::new(rdr);

        let mut entries = vec![];
        for (i, line) in buf.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with("Overall cost:") {
                continue;
            }
            let line_no = i + 1;
            let mut spl = line.split_ascii_whitespace();
            let count = spl.next();
            let morph = spl.next();
            let rest = spl.next();
            match (count, morph, rest) {
                (Some(count), Some(morph), None) => {
                    let count: usize = count.parse().map_err(|e| {
                        KiremeError::invalid_corpus(
                            line_no,
                            format!("count must be a positive integer ({e})"),
                        )
                    })?;
                    if count == 0 {
                        return Err(KiremeError::invalid_corpus(
                            line_no,
                            "count must be positive",
                        ));
                    }
                    entries.push((morph.to_string(), count));
                }
                _ => {
                    return Err(KiremeError::invalid_corpus(
                        line_no,
                        "each line must be a pair of a count and a morph",
                    ))
                }
            }
        }

        Self::from_lexicon(entries)
    }

    fn from_counts(counts: HashMap<String, usize>) -> Self {
        let total_morph_tokens: usize = counts.values().sum();
        let log_total_tokens = if total_morph_tokens > 0 {
            (total_morph_tokens as f64).ln()
        } else {
            0.0
        };
        Self {
            counts,
            total_morph_tokens,
            log_total_tokens,
        }
    }

    /// 辞書に含まれるモルフの総トークン数を返します。
    pub fn total_morph_tokens(&self) -> usize {
        self.total_morph_tokens
    }

    /// 辞書に含まれるユニークモルフ数を返します。
    pub fn num_morphs(&self) -> usize {
        self.counts.len()
    }

    /// 指定されたモルフが辞書に存在するかどうかを返します。
    pub fn contains(&self, morph: &str) -> bool {
        self.counts.contains_key(morph)
    }

    /// 新しいワーカーを作成します。
    ///
    /// ワーカーはデコード用の内部バッファを保持し、再利用することで
    /// 単語ごとのメモリ割り当てを避けます。
    ///
    /// # 戻り値
    ///
    /// 新しい [`SegmentWorker`] インスタンス
    pub fn new_worker(&self) -> SegmentWorker<'_> {
        SegmentWorker::new(self)
    }
}

/// 単語分割処理のためのルーチンを提供する構造体。
///
/// デコードに使用される内部データ構造（動的計画法のテーブルと
/// 文字・バイト位置のマッピング）を保持し、それらを再利用することで
/// 不要なメモリ再割り当てを回避します。
pub struct SegmentWorker<'a> {
    segmenter: &'a Segmenter,
    input: String,
    // char position → byte offset; one extra entry for the input end.
    c2b: Vec<usize>,
    delta: Vec<f64>,
    psi: Vec<usize>,
    // Byte ranges of the decoded morphs, in input order.
    ranges: Vec<(usize, usize)>,
}

impl<'a> SegmentWorker<'a> {
    /// 新しいインスタンスを作成します。
    ///
    /// # 引数
    ///
    /// * `segmenter` - 使用するセグメンター
    fn new(segmenter: &'a Segmenter) -> Self {
        Self {
            segmenter,
            input: String::new(),
            c2b: vec![],
            delta: vec![],
            psi: vec![],
            ranges: vec![],
        }
    }

    /// 分割する入力単語をリセットします。
    ///
    /// 新しい単語を設定し、以前の分割結果をクリアします。
    ///
    /// # 引数
    ///
    /// * `input` - 分割する単語
    pub fn reset_word<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.input.clear();
        self.input.push_str(input.as_ref());
        self.c2b.clear();
        self.c2b.extend(self.input.char_indices().map(|(i, _)| i));
        self.c2b.push(self.input.len());
        self.ranges.clear();
    }

    /// 設定された単語を最小コストのモルフ列に分割します。
    ///
    /// 分割結果は内部状態に保存され、[`SegmentWorker::morphs`] や
    /// [`SegmentWorker::morph`] でアクセスできます。辞書にあるモルフの
    /// コストはトークン頻度の負の対数尤度、未知の1文字は大きな
    /// ペナルティ付きで許容されます。許容可能な分割が存在しない単語は
    /// 分割されないまま1つのモルフとして残ります。
    pub fn segment(&mut self) {
        self.ranges.clear();
        let n = self.c2b.len() - 1;
        if n == 0 {
            return;
        }
        if self.segmenter.total_morph_tokens == 0 {
            // Nothing to decode against.
            self.ranges.push((0, self.input.len()));
            return;
        }

        let log_tokens = self.segmenter.log_total_tokens;
        let bad_likelihood = (n + 1) as f64 * log_tokens;
        let pseudo_infinite = (n + 1) as f64 * bad_likelihood;

        self.delta.clear();
        self.delta.resize(n + 1, 0.0);
        self.psi.clear();
        self.psi.resize(n + 1, 0);

        for end in 1..=n {
            let mut best_cost = pseudo_infinite;
            let mut best_len = 0;

            for len in 1..=end {
                let sub = &self.input[self.c2b[end - len]..self.c2b[end]];
                let cost = if let Some(&count) = self.segmenter.counts.get(sub) {
                    log_tokens - (count as f64).ln()
                } else if len == 1 {
                    // The morph is unknown and only one letter long.
                    // Accept it with a bad likelihood.
                    bad_likelihood
                } else {
                    // The morph is unknown. Keep looking elsewhere.
                    continue;
                };

                let current = self.delta[end - len] + cost;
                if current < best_cost {
                    best_cost = current;
                    best_len = len;
                }
            }

            self.delta[end] = best_cost;
            self.psi[end] = best_len;
        }

        let mut end = n;
        while end > 0 && self.psi[end] != 0 {
            let len = self.psi[end];
            self.ranges.push((self.c2b[end - len], self.c2b[end]));
            end -= len;
        }
        if end != 0 {
            // No admissible segmentation; emit the word unsegmented.
            self.ranges.clear();
            self.ranges.push((0, self.input.len()));
            return;
        }
        self.ranges.reverse();
    }

    /// 分割結果のモルフ数を返します。
    pub fn num_morphs(&self) -> usize {
        self.ranges.len()
    }

    /// 分割結果の `i` 番目のモルフを返します。
    ///
    /// # 引数
    ///
    /// * `i` - モルフの位置（入力順、0始まり）
    pub fn morph(&self, i: usize) -> &str {
        let (start, end) = self.ranges[i];
        &self.input[start..end]
    }

    /// 分割結果のモルフを入力順に走査します。
    ///
    /// # 戻り値
    ///
    /// モルフのイテレータ
    pub fn morphs(&self) -> impl Iterator<Item = &str> + '_ {
        self.ranges
            .iter()
            .map(move |&(start, end)| &self.input[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::corpus::Corpus;
    use crate::trainer::TrainerConfig;

    fn segment_one(segmenter: &Segmenter, word: &str) -> Vec<String> {
        let mut worker = segmenter.new_worker();
        worker.reset_word(word);
        worker.segment();
        worker.morphs().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_frequent_parts_beat_rare_whole() {
        let segmenter =
            Segmenter::from_lexicon([("re", 100), ("open", 100), ("reopen", 1)]).unwrap();
        assert_eq!(vec!["re", "open"], segment_one(&segmenter, "reopen"));
    }

    #[test]
    fn test_known_word_stays_whole() {
        let segmenter = Segmenter::from_lexicon([("reopen", 5), ("redo", 3)]).unwrap();
        assert_eq!(vec!["reopen"], segment_one(&segmenter, "reopen"));
    }

    #[test]
    fn test_unknown_letters_fall_back_to_singles() {
        let segmenter = Segmenter::from_lexicon([("ab", 10)]).unwrap();
        assert_eq!(vec!["x", "y", "z"], segment_one(&segmenter, "xyz"));
    }

    #[test]
    fn test_known_morph_among_unknown_letters() {
        let segmenter = Segmenter::from_lexicon([("open", 50), ("x", 50)]).unwrap();
        assert_eq!(vec!["q", "open"], segment_one(&segmenter, "qopen"));
    }

    #[test]
    fn test_empty_word() {
        let segmenter = Segmenter::from_lexicon([("ab", 10)]).unwrap();
        let mut worker = segmenter.new_worker();
        worker.reset_word("");
        worker.segment();
        assert_eq!(0, worker.num_morphs());
    }

    #[test]
    fn test_empty_lexicon_emits_word_unsegmented() {
        let segmenter = Segmenter::from_lexicon(Vec::<(String, usize)>::new()).unwrap();
        assert_eq!(vec!["reopen"], segment_one(&segmenter, "reopen"));
    }

    #[test]
    fn test_worker_buffers_are_reusable() {
        let segmenter =
            Segmenter::from_lexicon([("re", 100), ("open", 100), ("try", 80)]).unwrap();
        let mut worker = segmenter.new_worker();

        worker.reset_word("reopen");
        worker.segment();
        assert_eq!(2, worker.num_morphs());
        assert_eq!("re", worker.morph(0));
        assert_eq!("open", worker.morph(1));

        worker.reset_word("retry");
        worker.segment();
        assert_eq!(2, worker.num_morphs());
        assert_eq!("re", worker.morph(0));
        assert_eq!("try", worker.morph(1));
    }

    #[test]
    fn test_multibyte_input() {
        let segmenter = Segmenter::from_lexicon([("形", 10), ("態素", 10)]).unwrap();
        assert_eq!(vec!["形", "態素"], segment_one(&segmenter, "形態素"));
    }

    #[test]
    fn test_from_tree_snapshot() {
        let corpus = Corpus::from_pairs([("reopen", 1), ("retry", 2)]).unwrap();
        let mut tree =
            SegmentationTree::from_corpus(&corpus, &TrainerConfig::default()).unwrap();
        tree.split("reopen", 2).unwrap();
        tree.split("retry", 2).unwrap();

        let segmenter = Segmenter::from_tree(&tree);
        assert_eq!(6, segmenter.total_morph_tokens());
        assert_eq!(3, segmenter.num_morphs());
        assert!(segmenter.contains("re"));
        assert!(!segmenter.contains("reopen"));
        assert_eq!(vec!["re", "try"], segment_one(&segmenter, "retry"));
    }

    #[test]
    fn test_from_reader_accepts_plain_output() {
        let lexicon_data = "\
Overall cost: 37.18006
3 re
5 open
2 try
";
        let segmenter = Segmenter::from_reader(lexicon_data.as_bytes()).unwrap();
        assert_eq!(10, segmenter.total_morph_tokens());
        assert_eq!(vec!["re", "open"], segment_one(&segmenter, "reopen"));
    }

    #[test]
    fn test_from_reader_rejects_bad_lines() {
        assert!(Segmenter::from_reader("0 re".as_bytes()).is_err());
        assert!(Segmenter::from_reader("re 3".as_bytes()).is_err());
        assert!(Segmenter::from_reader("3 re open".as_bytes()).is_err());
    }
}
