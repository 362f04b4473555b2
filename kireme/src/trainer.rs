//! 学習設定と最適化ループのモジュール。
//!
//! このモジュールは、学習のハイパーパラメータを保持する
//! [`TrainerConfig`] と、セグメンテーション木に対して貪欲な再分割を
//! 収束まで繰り返す [`Trainer`] を提供します。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::common::{
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_HAPAX_LEGOMENA_PRIOR, DEFAULT_LENGTH_BETA,
    DEFAULT_LENGTH_PRIOR,
};
use crate::corpus::Corpus;
use crate::errors::{KiremeError, Result};
use crate::model::AlgorithmMode;
use crate::segmentation::SegmentationTree;

/// トレーナーの設定。
///
/// アルゴリズムモードとコストモデルの事前分布パラメータ、収束判定
/// しきい値、乱数シードを保持します。セッター経由でのみ変更できる
/// ため、保持される値は常に検証済みです。
///
/// # 例
///
/// ```
/// use kireme::{AlgorithmMode, TrainerConfig};
///
/// let config = TrainerConfig::new(AlgorithmMode::BaselineFreqLength)
///     .convergence_threshold(0.01)?
///     .seed(42);
/// assert_eq!(AlgorithmMode::BaselineFreqLength, config.algorithm_mode());
/// # Ok::<(), kireme::KiremeError>(())
/// ```
#[derive(Clone, Debug)]
pub struct TrainerConfig {
    algorithm_mode: AlgorithmMode,
    convergence_threshold: f64,
    hapax_legomena_prior: f64,
    length_prior: f64,
    length_beta: f64,
    seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::new(AlgorithmMode::Baseline)
    }
}

impl TrainerConfig {
    /// 指定されたアルゴリズムモードでデフォルト設定を作成します。
    ///
    /// # 引数
    ///
    /// * `algorithm_mode` - コストモデルのアルゴリズムモード
    pub fn new(algorithm_mode: AlgorithmMode) -> Self {
        Self {
            algorithm_mode,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            hapax_legomena_prior: DEFAULT_HAPAX_LEGOMENA_PRIOR,
            length_prior: DEFAULT_LENGTH_PRIOR,
            length_beta: DEFAULT_LENGTH_BETA,
            seed: None,
        }
    }

    /// 収束判定しきい値を設定します。
    ///
    /// 1パスでの全体コストの減少が「しきい値 × ユニークモルフ数」
    /// 以下になったとき、最適化は終了します。
    ///
    /// # 引数
    ///
    /// * `threshold` - 正の実数
    ///
    /// # 戻り値
    ///
    /// 設定が適用された `TrainerConfig`
    ///
    /// # エラー
    ///
    /// しきい値が正の有限値でない場合、[`KiremeError`] が返されます。
    pub fn convergence_threshold(mut self, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(KiremeError::invalid_argument(
                "threshold",
                "convergence threshold must be a positive finite value",
            ));
        }
        self.convergence_threshold = threshold;
        Ok(self)
    }

    /// ハパックス・レゴメナ事前確率を設定します。
    ///
    /// 明示頻度モードでのみ使用されます。
    ///
    /// # 引数
    ///
    /// * `prior` - 開区間 (0, 1) の実数
    ///
    /// # 戻り値
    ///
    /// 設定が適用された `TrainerConfig`
    ///
    /// # エラー
    ///
    /// 値が (0, 1) の範囲外の場合、[`KiremeError`] が返されます。
    pub fn hapax_legomena_prior(mut self, prior: f64) -> Result<Self> {
        if !prior.is_finite() || prior <= 0.0 || prior >= 1.0 {
            return Err(KiremeError::invalid_argument(
                "prior",
                "hapax legomena prior must be in the open interval (0, 1)",
            ));
        }
        self.hapax_legomena_prior = prior;
        Ok(self)
    }

    /// モルフ長のガンマ事前分布の平均長を設定します。
    ///
    /// 明示長モードでのみ使用されます。
    ///
    /// # 引数
    ///
    /// * `prior` - 正の実数
    ///
    /// # 戻り値
    ///
    /// 設定が適用された `TrainerConfig`
    ///
    /// # エラー
    ///
    /// 値が正の有限値でない場合、[`KiremeError`] が返されます。
    pub fn length_prior(mut self, prior: f64) -> Result<Self> {
        if !prior.is_finite() || prior <= 0.0 {
            return Err(KiremeError::invalid_argument(
                "prior",
                "length prior must be a positive finite value",
            ));
        }
        self.length_prior = prior;
        Ok(self)
    }

    /// モルフ長のガンマ事前分布のスケールを設定します。
    ///
    /// # 引数
    ///
    /// * `beta` - 正の実数
    ///
    /// # 戻り値
    ///
    /// 設定が適用された `TrainerConfig`
    ///
    /// # エラー
    ///
    /// 値が正の有限値でない場合、[`KiremeError`] が返されます。
    pub fn length_beta(mut self, beta: f64) -> Result<Self> {
        if !beta.is_finite() || beta <= 0.0 {
            return Err(KiremeError::invalid_argument(
                "beta",
                "length beta must be a positive finite value",
            ));
        }
        self.length_beta = beta;
        Ok(self)
    }

    /// 乱数シードを設定します。
    ///
    /// キーリストのシャッフルが唯一の非決定性であり、シードを
    /// 固定すると学習結果が再現可能になります。未設定の場合は
    /// OSのエントロピーで初期化されます。
    ///
    /// # 引数
    ///
    /// * `seed` - シード値
    ///
    /// # 戻り値
    ///
    /// 設定が適用された `TrainerConfig`
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// アルゴリズムモードを返します。
    pub fn algorithm_mode(&self) -> AlgorithmMode {
        self.algorithm_mode
    }

    pub(crate) fn hapax_legomena_prior_value(&self) -> f64 {
        self.hapax_legomena_prior
    }

    pub(crate) fn length_prior_value(&self) -> f64 {
        self.length_prior
    }

    pub(crate) fn length_beta_value(&self) -> f64 {
        self.length_beta
    }
}

/// セグメンテーションの学習器。
///
/// コーパスからセグメンテーション木を構築し、全体コストが収束する
/// まで貪欲な再分割のパスを繰り返します。
///
/// # 例
///
/// ```
/// use kireme::{AlgorithmMode, Corpus, Trainer, TrainerConfig};
///
/// let corpus = Corpus::from_reader("1 reopen\n2 redo\n".as_bytes())?;
/// let trainer = Trainer::new(TrainerConfig::new(AlgorithmMode::Baseline).seed(42));
/// let tree = trainer.train(&corpus)?;
/// assert!(tree.contains("reopen"));
/// # Ok::<(), kireme::KiremeError>(())
/// ```
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// 新しい学習器を作成します。
    ///
    /// # 引数
    ///
    /// * `config` - 学習設定
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// 学習設定への参照を返します。
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// コーパスからセグメンテーションを学習します。
    ///
    /// すべての単語をリーフとして挿入した後、木のキー集合の
    /// スナップショットをパスごとにシャッフルし、各モルフを
    /// 再分割します。文字確率はパスごとに再計算されます。
    /// 1パスでのコスト減少が「しきい値 × ユニークモルフ数」以下に
    /// なった時点で終了します。
    ///
    /// # 引数
    ///
    /// * `corpus` - 学習コーパス
    ///
    /// # 戻り値
    ///
    /// 学習されたセグメンテーション木
    ///
    /// # エラー
    ///
    /// 内部不変条件の違反が検出された場合、[`KiremeError`] が返されます。
    pub fn train(&self, corpus: &Corpus) -> Result<SegmentationTree> {
        let mut tree = SegmentationTree::from_corpus(corpus, &self.config)?;
        self.optimize(&mut tree)?;
        Ok(tree)
    }

    /// 収束するまで再分割のパスを繰り返します。
    fn optimize(&self, tree: &mut SegmentationTree) -> Result<()> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut keys = tree.sorted_keys();

        let mut new_cost = tree.model().overall_cost();
        let mut pass = 0usize;
        loop {
            keys.shuffle(&mut rng);

            let old_cost = new_cost;
            for key in &keys {
                // A key may have been erased by an earlier resplit in
                // the same pass; resplit skips missing morphs silently.
                tree.resplit(key)?;
            }

            tree.refresh_letter_probabilities();
            new_cost = tree.model().overall_cost();
            pass += 1;
            log::debug!(
                "pass {}: cost {:.5} -> {:.5}, {} unique morphs",
                pass,
                old_cost,
                new_cost,
                tree.model().unique_morph_types()
            );

            if old_cost - new_cost
                <= self.config.convergence_threshold * tree.model().unique_morph_types() as f64
            {
                return Ok(());
            }
        }
    }
}
