//! 最小記述長（MDL）コストモデルの実装モジュール。
//!
//! このモジュールは、セグメンテーション全体の記述長を4種類の部分コスト
//! （コーパスコスト、頻度コスト、長さコスト、モルフ文字列コスト）と
//! 辞書順序補正の和として保持します。セグメンテーション木はリーフの
//! 追加・削除のたびに増分調整フックを呼び出し、モデルは集計統計を
//! リーフ集合と常に一致させます。
//!
//! # アルゴリズムモード
//!
//! | モード | 頻度 | 長さ | 文字列 |
//! |---|---|---|---|
//! | [`AlgorithmMode::Baseline`] | 暗黙 | 暗黙 | 終端記号あり |
//! | [`AlgorithmMode::BaselineFreq`] | 明示 | 暗黙 | 終端記号あり |
//! | [`AlgorithmMode::BaselineLength`] | 暗黙 | 明示 | 終端記号なし |
//! | [`AlgorithmMode::BaselineFreqLength`] | 明示 | 明示 | 終端記号なし |

use std::f64::consts::LN_2;
use std::str::FromStr;

use hashbrown::HashMap;

use crate::common::EXACT_BINOMIAL_LIMIT;
use crate::math::{log2_binomial, log2_gamma_pdf};

/// コストモデルのアルゴリズムモード。
///
/// 頻度コストと長さコストのそれぞれについて、暗黙（閉形式）と
/// 明示（事前分布に基づく）のどちらの式を使用するかを選択します。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlgorithmMode {
    /// 暗黙の頻度コストと暗黙の長さコスト。
    Baseline,
    /// 明示的な頻度コストと暗黙の長さコスト。
    BaselineFreq,
    /// 暗黙の頻度コストと明示的な長さコスト。
    BaselineLength,
    /// 明示的な頻度コストと明示的な長さコスト。
    BaselineFreqLength,
}

impl AlgorithmMode {
    /// 明示的な頻度コストを使用するかどうかを返します。
    #[inline(always)]
    pub(crate) fn explicit_frequency(self) -> bool {
        matches!(self, Self::BaselineFreq | Self::BaselineFreqLength)
    }

    /// 明示的な長さコストを使用するかどうかを返します。
    #[inline(always)]
    pub(crate) fn explicit_length(self) -> bool {
        matches!(self, Self::BaselineLength | Self::BaselineFreqLength)
    }

    /// 文字分布にモルフ終端記号を含めるかどうかを返します。
    ///
    /// 終端記号は暗黙の長さコストを使用するモードでのみ数えられます。
    #[inline(always)]
    pub(crate) fn uses_end_sentinel(self) -> bool {
        !self.explicit_length()
    }
}

/// `AlgorithmMode` の `FromStr` 実装
impl FromStr for AlgorithmMode {
    type Err = &'static str;

    /// 文字列からアルゴリズムモードをパースする
    ///
    /// # 引数
    ///
    /// * `mode` - パース対象の文字列（"baseline"、"baseline-freq"、
    ///   "baseline-length"、"baseline-freq-length" のいずれか。
    ///   区切りにアンダースコアも使用できます）
    ///
    /// # 戻り値
    ///
    /// パースに成功した場合は対応する `AlgorithmMode`、失敗した場合はエラーメッセージ
    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode.replace('_', "-").as_str() {
            "baseline" => Ok(Self::Baseline),
            "baseline-freq" => Ok(Self::BaselineFreq),
            "baseline-length" => Ok(Self::BaselineLength),
            "baseline-freq-length" => Ok(Self::BaselineFreqLength),
            _ => Err("Could not parse an algorithm mode"),
        }
    }
}

/// MDLコストモデル。
///
/// 現在のリーフ集合に対する5つのコストスカラーと、その導出に必要な
/// 集計統計を増分的に保持します。文字確率テーブルは最適化パスごとに
/// キャッシュされ、[`Model::refresh_letters`] で再構築されます。
pub struct Model {
    mode: AlgorithmMode,

    // e = log2(1 − P_hapax)
    hapax_exponent: f64,
    gamma_alpha: f64,
    gamma_beta: f64,

    total_morph_tokens: usize,
    unique_morph_types: usize,

    // Σ c·ln(c) over leaves; the corpus cost is derived as
    // (M·ln M − Σ c·ln c) / ln 2, which stays exact under changes of M.
    corpus_logsum: f64,

    // Running sums for the explicit variants (bits).
    frequency_sum: f64,
    length_sum: f64,

    // Morph string cost against the cached letter table (bits).
    string_sum: f64,

    // char → −log₂ P(c), rebuilt once per optimization pass.
    letter_costs: HashMap<char, f64>,
    // −log₂ P(#) under the cached table; 0 when the sentinel is unused.
    end_cost: f64,
}

impl Model {
    /// 新しいコストモデルを作成します。
    ///
    /// # 引数
    ///
    /// * `mode` - アルゴリズムモード
    /// * `hapax_legomena_prior` - ハパックス・レゴメナ事前確率（明示頻度モードのみ使用）
    /// * `length_prior` - モルフ長のガンマ事前分布の平均長
    /// * `length_beta` - モルフ長のガンマ事前分布のスケール
    ///
    /// # 戻り値
    ///
    /// 空のリーフ集合に対応する新しいモデル
    pub(crate) fn new(
        mode: AlgorithmMode,
        hapax_legomena_prior: f64,
        length_prior: f64,
        length_beta: f64,
    ) -> Self {
        Self {
            mode,
            hapax_exponent: (1.0 - hapax_legomena_prior).log2(),
            gamma_alpha: length_prior / length_beta + 1.0,
            gamma_beta: length_beta,
            total_morph_tokens: 0,
            unique_morph_types: 0,
            corpus_logsum: 0.0,
            frequency_sum: 0.0,
            length_sum: 0.0,
            string_sum: 0.0,
            letter_costs: HashMap::new(),
            end_cost: 0.0,
        }
    }

    /// アルゴリズムモードを返します。
    pub fn mode(&self) -> AlgorithmMode {
        self.mode
    }

    /// 総モルフトークン数 M を返します。
    pub fn total_morph_tokens(&self) -> usize {
        self.total_morph_tokens
    }

    /// ユニークモルフ数 U を返します。
    pub fn unique_morph_types(&self) -> usize {
        self.unique_morph_types
    }

    // ------------------------------------------------------------------
    // 増分調整フック
    // ------------------------------------------------------------------

    /// 総モルフトークン数を調整します。
    pub(crate) fn adjust_token_count(&mut self, delta: i64) {
        self.total_morph_tokens = (self.total_morph_tokens as i64 + delta) as usize;
    }

    /// ユニークモルフ数を調整します。
    ///
    /// # 引数
    ///
    /// * `delta` - 変化量（−1 または +1）
    pub(crate) fn adjust_unique_count(&mut self, delta: i64) {
        debug_assert!(delta == 1 || delta == -1);
        self.unique_morph_types = (self.unique_morph_types as i64 + delta) as usize;
    }

    /// リーフのコーパスコストへの寄与を旧頻度から新頻度に付け替えます。
    pub(crate) fn adjust_corpus_cost(&mut self, old_count: usize, new_count: usize) {
        if old_count > 0 {
            let c = old_count as f64;
            self.corpus_logsum -= c * c.ln();
        }
        if new_count > 0 {
            let c = new_count as f64;
            self.corpus_logsum += c * c.ln();
        }
    }

    /// リーフの頻度コストへの寄与を旧頻度から新頻度に付け替えます。
    ///
    /// 暗黙頻度モードではコストが (M, U) から導出されるため何も行いません。
    pub(crate) fn adjust_frequency_cost(&mut self, old_count: usize, new_count: usize) {
        if !self.mode.explicit_frequency() {
            return;
        }
        if old_count > 0 {
            self.frequency_sum -= self.explicit_frequency_term(old_count);
        }
        if new_count > 0 {
            self.frequency_sum += self.explicit_frequency_term(new_count);
        }
    }

    /// リーフの長さコストへの寄与を加算または減算します。
    ///
    /// 暗黙長モードではコストが U とキャッシュ済み終端記号コストから
    /// 導出されるため何も行いません。
    ///
    /// # 引数
    ///
    /// * `len` - モルフの文字数
    /// * `adding` - 追加なら `true`、削除なら `false`
    pub(crate) fn adjust_length_cost(&mut self, len: usize, adding: bool) {
        if !self.mode.explicit_length() {
            return;
        }
        let term = self.explicit_length_term(len);
        if adding {
            self.length_sum += term;
        } else {
            self.length_sum -= term;
        }
    }

    /// リーフのモルフ文字列コストへの寄与を加算または減算します。
    ///
    /// キャッシュ済みの文字確率テーブルに対して計算されます。
    ///
    /// # 引数
    ///
    /// * `morph` - モルフ文字列
    /// * `adding` - 追加なら `true`、削除なら `false`
    pub(crate) fn adjust_string_cost(&mut self, morph: &str, adding: bool) {
        let term = self.string_term(morph);
        if adding {
            self.string_sum += term;
        } else {
            self.string_sum -= term;
        }
    }

    // ------------------------------------------------------------------
    // 文字確率テーブル
    // ------------------------------------------------------------------

    /// 文字確率テーブルを現在のリーフ集合から再構築します。
    ///
    /// 各文字の負の2進対数確率を最尤推定で計算し、モルフ文字列コストを
    /// 新しいテーブルに対してゼロから再計算します。増分的に維持される
    /// 文字列コストは常にこのキャッシュと整合します。
    ///
    /// # 引数
    ///
    /// * `leaves` - 現在のリーフ (モルフ, 頻度) のスライス
    pub(crate) fn refresh_letters(&mut self, leaves: &[(&str, usize)]) {
        let mut letter_freqs: HashMap<char, usize> = HashMap::new();
        let mut total_letters = 0usize;
        let mut total_tokens = 0usize;

        for &(morph, count) in leaves {
            total_tokens += count;
            for c in morph.chars() {
                total_letters += count;
                *letter_freqs.entry(c).or_insert(0) += count;
            }
        }

        debug_assert_eq!(total_tokens, self.total_morph_tokens);
        debug_assert_eq!(leaves.len(), self.unique_morph_types);

        if self.mode.uses_end_sentinel() {
            // The end-of-morph character appears once per morph token.
            total_letters += total_tokens;
        }

        let log_total = if total_letters > 0 {
            (total_letters as f64).log2()
        } else {
            0.0
        };
        self.letter_costs = letter_freqs
            .into_iter()
            .map(|(c, f)| (c, log_total - (f as f64).log2()))
            .collect();
        self.end_cost = if self.mode.uses_end_sentinel() && total_tokens > 0 {
            log_total - (total_tokens as f64).log2()
        } else {
            0.0
        };

        self.string_sum = leaves
            .iter()
            .map(|&(morph, _)| self.string_term(morph))
            .sum();
    }

    // ------------------------------------------------------------------
    // コスト項
    // ------------------------------------------------------------------

    /// 明示頻度コストにおける頻度 `count` のリーフ1つの寄与。
    fn explicit_frequency_term(&self, count: usize) -> f64 {
        let c = count as f64;
        let e = self.hapax_exponent;
        -(c.powf(e) - (c + 1.0).powf(e)).log2()
    }

    /// 明示長コストにおける文字数 `len` のリーフ1つの寄与。
    fn explicit_length_term(&self, len: usize) -> f64 {
        -log2_gamma_pdf(len as f64, self.gamma_alpha, self.gamma_beta)
    }

    /// キャッシュ済みテーブルに対するモルフ1つの文字列コスト。
    fn string_term(&self, morph: &str) -> f64 {
        morph
            .chars()
            .map(|c| self.letter_costs.get(&c).copied().unwrap_or(0.0))
            .sum()
    }

    // ------------------------------------------------------------------
    // コストアクセサ
    // ------------------------------------------------------------------

    /// コーパスコスト（モデルの下でのコーパスの符号長）を返します。
    pub fn corpus_cost(&self) -> f64 {
        let m = self.total_morph_tokens;
        if m == 0 {
            return 0.0;
        }
        let m = m as f64;
        (m * m.ln() - self.corpus_logsum) / LN_2
    }

    /// 頻度コストを返します。
    ///
    /// 明示モードでは増分的に維持された和、暗黙モードでは (M, U) の
    /// 閉形式です。暗黙モードの閉形式は、M が
    /// [`EXACT_BINOMIAL_LIMIT`] 未満のとき厳密な二項係数、それ以外は
    /// スターリング近似に基づく対数近似式を使用します。
    pub fn frequency_cost(&self) -> f64 {
        if self.mode.explicit_frequency() {
            return self.frequency_sum;
        }
        let m = self.total_morph_tokens;
        let u = self.unique_morph_types;
        if m == 0 || u == 0 {
            return 0.0;
        }
        if m < EXACT_BINOMIAL_LIMIT {
            return log2_binomial((m - 1) as u64, (u - 1) as u64);
        }
        let mf = m as f64;
        let uf = u as f64;
        // Degenerate subterms (a log of a non-positive argument) are
        // skipped; their multiplier is zero or the state is unreachable
        // from a real corpus.
        let mut sum = (mf - 1.0) * (mf - 2.0).log2();
        if u > 2 {
            sum -= (uf - 1.0) * (uf - 2.0).log2();
        }
        if m - u > 1 {
            sum -= (mf - uf) * (mf - uf - 1.0).log2();
        }
        sum
    }

    /// 長さコストを返します。
    ///
    /// 明示モードでは増分的に維持された和、暗黙モードでは
    /// `U · P(#)`（終端記号コストのユニークモルフ数倍）です。
    pub fn length_cost(&self) -> f64 {
        if self.mode.explicit_length() {
            return self.length_sum;
        }
        self.unique_morph_types as f64 * self.end_cost
    }

    /// モルフ文字列コストを返します。
    pub fn morph_string_cost(&self) -> f64 {
        self.string_sum
    }

    /// 辞書順序補正を返します。
    ///
    /// `−log₂(U!)` のスターリング近似第1項 `U·(1 − ln U)/ln 2` です。
    pub fn lexicon_order_cost(&self) -> f64 {
        let u = self.unique_morph_types;
        if u == 0 {
            return 0.0;
        }
        let u = u as f64;
        u * (1.0 - u.ln()) / LN_2
    }

    /// 辞書コスト（頻度・長さ・文字列・順序補正の和）を返します。
    pub fn lexicon_cost(&self) -> f64 {
        self.frequency_cost()
            + self.length_cost()
            + self.morph_string_cost()
            + self.lexicon_order_cost()
    }

    /// 全体コスト（辞書コストとコーパスコストの和）を返します。
    pub fn overall_cost(&self) -> f64 {
        self.lexicon_cost() + self.corpus_cost()
    }

    // ------------------------------------------------------------------
    // テスト用のゼロからの再計算
    // ------------------------------------------------------------------

    #[cfg(test)]
    pub(crate) fn recompute_corpus_cost(&self, leaves: &[(&str, usize)]) -> f64 {
        let m: usize = leaves.iter().map(|&(_, c)| c).sum();
        if m == 0 {
            return 0.0;
        }
        let log_m = (m as f64).log2();
        leaves
            .iter()
            .map(|&(_, c)| c as f64 * (log_m - (c as f64).log2()))
            .sum()
    }

    #[cfg(test)]
    pub(crate) fn recompute_frequency_cost(&self, leaves: &[(&str, usize)]) -> f64 {
        if self.mode.explicit_frequency() {
            leaves
                .iter()
                .map(|&(_, c)| self.explicit_frequency_term(c))
                .sum()
        } else {
            self.frequency_cost()
        }
    }

    #[cfg(test)]
    pub(crate) fn recompute_length_cost(&self, leaves: &[(&str, usize)]) -> f64 {
        if self.mode.explicit_length() {
            leaves
                .iter()
                .map(|&(m, _)| self.explicit_length_term(crate::common::char_len(m)))
                .sum()
        } else {
            leaves.len() as f64 * self.end_cost
        }
    }

    #[cfg(test)]
    pub(crate) fn recompute_string_cost(&self, leaves: &[(&str, usize)]) -> f64 {
        leaves.iter().map(|&(m, _)| self.string_term(m)).sum()
    }

    #[cfg(test)]
    pub(crate) fn letter_cost(&self, c: char) -> Option<f64> {
        if c == crate::common::END_OF_MORPH {
            return Some(self.end_cost);
        }
        self.letter_costs.get(&c).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::{
        DEFAULT_HAPAX_LEGOMENA_PRIOR, DEFAULT_LENGTH_BETA, DEFAULT_LENGTH_PRIOR, END_OF_MORPH,
    };

    fn default_model(mode: AlgorithmMode) -> Model {
        Model::new(
            mode,
            DEFAULT_HAPAX_LEGOMENA_PRIOR,
            DEFAULT_LENGTH_PRIOR,
            DEFAULT_LENGTH_BETA,
        )
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            AlgorithmMode::Baseline,
            "baseline".parse::<AlgorithmMode>().unwrap()
        );
        assert_eq!(
            AlgorithmMode::BaselineFreq,
            "baseline-freq".parse::<AlgorithmMode>().unwrap()
        );
        assert_eq!(
            AlgorithmMode::BaselineLength,
            "baseline_length".parse::<AlgorithmMode>().unwrap()
        );
        assert_eq!(
            AlgorithmMode::BaselineFreqLength,
            "baseline_freq_length".parse::<AlgorithmMode>().unwrap()
        );
        assert!("viterbi".parse::<AlgorithmMode>().is_err());
    }

    #[test]
    fn test_mode_predicates() {
        assert!(!AlgorithmMode::Baseline.explicit_frequency());
        assert!(AlgorithmMode::BaselineFreq.explicit_frequency());
        assert!(AlgorithmMode::BaselineLength.explicit_length());
        assert!(AlgorithmMode::BaselineFreqLength.explicit_frequency());
        assert!(AlgorithmMode::Baseline.uses_end_sentinel());
        assert!(AlgorithmMode::BaselineFreq.uses_end_sentinel());
        assert!(!AlgorithmMode::BaselineLength.uses_end_sentinel());
        assert!(!AlgorithmMode::BaselineFreqLength.uses_end_sentinel());
    }

    #[test]
    fn test_explicit_frequency_term() {
        let model = default_model(AlgorithmMode::BaselineFreq);
        // With the default prior 0.5, the term reduces to log₂(c(c+1)).
        assert!((model.explicit_frequency_term(1) - 1.0).abs() < 1e-10);
        assert!((model.explicit_frequency_term(2) - 6.0f64.log2()).abs() < 1e-10);
        assert!((model.explicit_frequency_term(3) - 12.0f64.log2()).abs() < 1e-10);
    }

    #[test]
    fn test_explicit_frequency_term_other_prior() {
        let model = Model::new(AlgorithmMode::BaselineFreq, 0.25, 5.0, 1.0);
        assert!((model.explicit_frequency_term(1) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_explicit_length_term() {
        let model = default_model(AlgorithmMode::BaselineFreqLength);
        assert!((model.explicit_length_term(2) - 4.792281).abs() < 1e-5);
        assert!((model.explicit_length_term(4) - 2.677671).abs() < 1e-5);
        assert!((model.explicit_length_term(6) - 2.638248).abs() < 1e-5);
    }

    #[test]
    fn test_corpus_cost_from_logsum() {
        let mut model = default_model(AlgorithmMode::Baseline);
        // Leaves {ab: 1, cd: 3}.
        model.adjust_token_count(4);
        model.adjust_unique_count(1);
        model.adjust_unique_count(1);
        model.adjust_corpus_cost(0, 1);
        model.adjust_corpus_cost(0, 3);
        assert!((model.corpus_cost() - 3.245112).abs() < 1e-5);
    }

    #[test]
    fn test_implicit_frequency_exact_branch() {
        let mut model = default_model(AlgorithmMode::Baseline);
        // M = 6, U = 3: log₂ C(5, 2) = log₂ 10.
        model.adjust_token_count(6);
        for _ in 0..3 {
            model.adjust_unique_count(1);
        }
        assert!((model.frequency_cost() - 10.0f64.log2()).abs() < 1e-10);
    }

    #[test]
    fn test_implicit_frequency_approximated_branch() {
        let mut model = default_model(AlgorithmMode::Baseline);
        // M = 150, U = 10: the reference approximation.
        model.adjust_token_count(150);
        for _ in 0..10 {
            model.adjust_unique_count(1);
        }
        assert!((model.frequency_cost() - 50.556801).abs() < 1e-5);
    }

    #[test]
    fn test_implicit_frequency_boundary_is_exact() {
        let mut model = default_model(AlgorithmMode::Baseline);
        // M = 99 stays on the exact branch: log₂ C(98, 9).
        model.adjust_token_count(99);
        for _ in 0..10 {
            model.adjust_unique_count(1);
        }
        assert!((model.frequency_cost() - 40.517265).abs() < 1e-5);
    }

    #[test]
    fn test_letter_costs_with_sentinel() {
        let mut model = default_model(AlgorithmMode::Baseline);
        model.adjust_token_count(3);
        model.adjust_unique_count(1);
        model.adjust_unique_count(1);
        model.refresh_letters(&[("reopen", 1), ("redo", 2)]);
        // 14 weighted letters + 3 sentinels = 17 total.
        assert!((model.letter_cost('r').unwrap() - 2.502500).abs() < 1e-5);
        assert!((model.letter_cost('e').unwrap() - 2.087463).abs() < 1e-5);
        assert!((model.letter_cost('n').unwrap() - 4.087463).abs() < 1e-5);
        assert!((model.letter_cost(END_OF_MORPH).unwrap() - 2.502500).abs() < 1e-5);
        assert!((model.morph_string_cost() - 27.534778).abs() < 1e-5);
        assert!((model.length_cost() - 5.005001).abs() < 1e-5);
    }

    #[test]
    fn test_letter_costs_without_sentinel() {
        let mut model = default_model(AlgorithmMode::BaselineFreqLength);
        model.adjust_token_count(3);
        model.adjust_unique_count(1);
        model.adjust_unique_count(1);
        model.refresh_letters(&[("reopen", 1), ("redo", 2)]);
        assert!((model.letter_cost('r').unwrap() - 2.222392).abs() < 1e-5);
        assert!((model.letter_cost('d').unwrap() - 2.807355).abs() < 1e-5);
        assert!((model.morph_string_cost() - 24.733699).abs() < 1e-5);
    }

    #[test]
    fn test_lexicon_order_cost() {
        let mut model = default_model(AlgorithmMode::Baseline);
        assert_eq!(0.0, model.lexicon_order_cost());
        model.adjust_unique_count(1);
        model.adjust_unique_count(1);
        assert!((model.lexicon_order_cost() - 0.885390).abs() < 1e-5);
    }

    #[test]
    fn test_empty_model_costs_are_zero() {
        let model = default_model(AlgorithmMode::BaselineFreqLength);
        assert_eq!(0.0, model.corpus_cost());
        assert_eq!(0.0, model.frequency_cost());
        assert_eq!(0.0, model.length_cost());
        assert_eq!(0.0, model.morph_string_cost());
        assert_eq!(0.0, model.lexicon_order_cost());
        assert_eq!(0.0, model.overall_cost());
    }
}
