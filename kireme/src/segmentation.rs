//! セグメンテーション木の実装モジュール。
//!
//! このモジュールは、モルフ文字列をキーとするセグメンテーション辞書を
//! 提供します。各ノードは参照カウントと、内部で分割されている場合は
//! 2つの子モルフ文字列を保持します。子はポインタではなく検索キーとして
//! 参照されるため、木は実質的にモルフ文字列をキーとするDAGであり、
//! 子は複数の親の間で共有されます（例: "re" が "reopen" と "retry" の
//! 両方の左の子になる）。
//!
//! すべての変更はコストモデルを経由して行われ、集計統計
//! （総トークン数、ユニークモルフ数、各コスト項）はリーフ集合と
//! 常に一致します。

use hashbrown::HashMap;

use crate::common::{char_len, split_at_char};
use crate::corpus::Corpus;
use crate::errors::{KiremeError, Result};
use crate::model::Model;
use crate::trainer::TrainerConfig;

/// セグメンテーション木のノード。
///
/// モルフの参照カウントと、内部で分割されている場合は2つの子モルフを
/// 保持します。子は常に両方存在するか両方存在しないかのいずれかです。
/// 子を持たないノードがリーフであり、リーフだけがコストモデルに
/// 寄与します。
#[derive(Clone, Debug, Default)]
pub struct MorphNode {
    count: usize,
    children: Option<(String, String)>,
}

impl MorphNode {
    /// このノードを経由する単語トークン数を返します。
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    /// このノードが子を持つかどうかを返します。
    #[inline(always)]
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// 左の子モルフを返します。
    ///
    /// # 戻り値
    ///
    /// リーフの場合は `None`
    pub fn left_child(&self) -> Option<&str> {
        self.children.as_ref().map(|(l, _)| l.as_str())
    }

    /// 右の子モルフを返します。
    ///
    /// # 戻り値
    ///
    /// リーフの場合は `None`
    pub fn right_child(&self) -> Option<&str> {
        self.children.as_ref().map(|(_, r)| r.as_str())
    }
}

/// 単語集合の再帰的なセグメンテーションを保持する木。
///
/// # 例
///
/// ```
/// use kireme::{Corpus, SegmentationTree, TrainerConfig};
///
/// let corpus = Corpus::from_pairs([("reopen", 1), ("retry", 2)]).unwrap();
/// let mut tree = SegmentationTree::from_corpus(&corpus, &TrainerConfig::default()).unwrap();
///
/// tree.split("reopen", 2).unwrap();
/// tree.split("retry", 2).unwrap();
///
/// assert_eq!(3, tree.node("re").unwrap().count());
/// ```
pub struct SegmentationTree {
    nodes: HashMap<String, MorphNode>,
    model: Model,
}

impl SegmentationTree {
    /// コーパスからセグメンテーション木を構築します。
    ///
    /// すべての単語がその頻度を持つリーフとして挿入され、
    /// 集計統計とコストが更新されます。
    ///
    /// # 引数
    ///
    /// * `corpus` - 学習コーパス
    /// * `config` - コストモデルのパラメータを与える学習設定
    ///
    /// # 戻り値
    ///
    /// 構築されたセグメンテーション木
    ///
    /// # エラー
    ///
    /// 内部不変条件の違反が検出された場合、[`KiremeError`] が返されます。
    pub fn from_corpus(corpus: &Corpus, config: &TrainerConfig) -> Result<Self> {
        let model = Model::new(
            config.algorithm_mode(),
            config.hapax_legomena_prior_value(),
            config.length_prior_value(),
            config.length_beta_value(),
        );
        let mut tree = Self {
            nodes: HashMap::new(),
            model,
        };
        for word in corpus.iter() {
            tree.adjust_count(word.form(), word.frequency() as i64)?;
        }
        tree.refresh_letter_probabilities();
        Ok(tree)
    }

    /// コストモデルへの参照を返します。
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// 指定されたモルフが木に存在するかどうかを返します。
    pub fn contains(&self, morph: &str) -> bool {
        self.nodes.contains_key(morph)
    }

    /// 指定されたモルフのノードを返します。
    ///
    /// # 戻り値
    ///
    /// モルフが存在しない場合は `None`
    pub fn node(&self, morph: &str) -> Option<&MorphNode> {
        self.nodes.get(morph)
    }

    /// 木に含まれるノード数（内部ノードを含む）を返します。
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 木が空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// すべてのリーフを (モルフ, 頻度) ペアとして走査します。
    ///
    /// # 戻り値
    ///
    /// リーフのイテレータ（順序は不定）
    pub fn leaves(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| !node.has_children())
            .map(|(morph, node)| (morph.as_str(), node.count))
    }

    /// すべてのノードを (モルフ, ノード) ペアとして走査します。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MorphNode)> + '_ {
        self.nodes.iter().map(|(morph, node)| (morph.as_str(), node))
    }

    /// 現在のキー集合を辞書順のリストとして複製します。
    ///
    /// ハッシュテーブルの走査順序はプロセスごとにランダム化されるため、
    /// 固定シードでの再現性にはソート済みのスナップショットが必要です。
    pub(crate) fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.nodes.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// 文字確率テーブルを現在のリーフ集合から再構築します。
    ///
    /// 最適化パスの開始時に一度だけ呼び出されます。変更のたびに
    /// 再計算するとすべての文字列コストの再評価が必要になるため、
    /// パス内では限定的な陳腐化を許容します。
    pub(crate) fn refresh_letter_probabilities(&mut self) {
        let leaves: Vec<(&str, usize)> = self
            .nodes
            .iter()
            .filter(|(_, node)| !node.has_children())
            .map(|(morph, node)| (morph.as_str(), node.count))
            .collect();
        self.model.refresh_letters(&leaves);
    }

    /// モルフのカウントを再帰的に調整する中核プリミティブ。
    ///
    /// ノードをロードまたは作成し、カウントを `delta` だけ変更します。
    /// ノードが子を持つ場合は両方の子に同じ `delta` で再帰します。
    /// リーフの場合は、0→正（モルフの誕生）と正→0（モルフの消滅）の
    /// 遷移に応じてコストモデルの調整フックを呼び出します。
    /// カウントが0になったノードはテーブルから削除されます。
    ///
    /// # エラー
    ///
    /// カウントが負になる調整が要求された場合、
    /// [`KiremeError::InvariantViolation`] が返されます。
    fn adjust_count(&mut self, morph: &str, delta: i64) -> Result<()> {
        debug_assert!(!morph.is_empty());

        let node = self.nodes.entry_ref(morph).or_default();
        let old_count = node.count;
        let new_count = old_count as i64 + delta;
        if new_count < 0 {
            if old_count == 0 && !node.has_children() {
                // Do not leave behind the placeholder we just created.
                self.nodes.remove(morph);
            }
            return Err(KiremeError::invariant_violation(
                morph,
                format!("count {old_count} cannot be adjusted by {delta}"),
            ));
        }
        let new_count = new_count as usize;

        // Child keys are captured by value before recursing; the table
        // may reorganize its storage while nodes are added or removed
        // below, so no reference into it survives the recursion.
        let children = node.children.clone();

        if new_count == 0 {
            self.nodes.remove(morph);
        } else {
            node.count = new_count;
        }

        if let Some((left, right)) = children {
            self.adjust_count(&left, delta)?;
            self.adjust_count(&right, delta)?;
        } else {
            self.model.adjust_token_count(delta);
            self.model.adjust_corpus_cost(old_count, new_count);
            self.model.adjust_frequency_cost(old_count, new_count);
            if old_count == 0 && new_count > 0 {
                // A new unique morph is born.
                self.model.adjust_unique_count(1);
                self.model.adjust_length_cost(char_len(morph), true);
                self.model.adjust_string_cost(morph, true);
            } else if new_count == 0 && old_count > 0 {
                // The morph dies.
                self.model.adjust_unique_count(-1);
                self.model.adjust_length_cost(char_len(morph), false);
                self.model.adjust_string_cost(morph, false);
            }
        }
        Ok(())
    }

    /// リーフを指定位置で2つの子モルフに分割します。
    ///
    /// 分割後、親はテーブルに内部ノードとして残りますが、
    /// コストモデルには寄与しなくなります。親のカウントは
    /// 子のカウント不変条件のために保持されます。
    ///
    /// # 引数
    ///
    /// * `morph` - 分割対象のリーフモルフ
    /// * `left_len` - 左側の子の文字数（`0 < left_len < モルフの文字数`）
    ///
    /// # エラー
    ///
    /// モルフが存在しない、既に分割済み、長さが1、または分割位置が
    /// 範囲外の場合、[`KiremeError::InvalidSplit`] が返されます。
    /// この検査は木を変更する前に行われます。
    pub fn split(&mut self, morph: &str, left_len: usize) -> Result<()> {
        let node = self.nodes.get(morph).ok_or_else(|| {
            KiremeError::invalid_split(morph, "morph is not present in the table")
        })?;
        if node.has_children() {
            return Err(KiremeError::invalid_split(morph, "morph is already split"));
        }
        let len = char_len(morph);
        if len < 2 {
            return Err(KiremeError::invalid_split(
                morph,
                "a single-letter morph cannot be split",
            ));
        }
        if left_len == 0 || left_len >= len {
            return Err(KiremeError::invalid_split(
                morph,
                format!("split index {left_len} is out of range for length {len}"),
            ));
        }
        let count = node.count;

        let (left, right) = split_at_char(morph, left_len);
        let (left, right) = (left.to_string(), right.to_string());

        // Retire the morph as a leaf, re-enter its tokens through the
        // two children, and keep the parent as an internal node.
        self.adjust_count(morph, -(count as i64))?;
        self.nodes.insert(
            morph.to_string(),
            MorphNode {
                count,
                children: Some((left.clone(), right.clone())),
            },
        );
        self.adjust_count(&left, count as i64)?;
        self.adjust_count(&right, count as i64)?;
        Ok(())
    }

    /// モルフとそのすべての子孫への寄与を木から取り除きます。
    ///
    /// カウントが0になった子孫はテーブルから削除されます。
    ///
    /// # 引数
    ///
    /// * `morph` - 削除対象のモルフ
    ///
    /// # エラー
    ///
    /// モルフが存在しない場合、[`KiremeError`] が返されます。
    pub fn remove(&mut self, morph: &str) -> Result<()> {
        let count = self.nodes.get(morph).map(|node| node.count).ok_or_else(|| {
            KiremeError::invalid_argument("morph", format!("{morph:?} is not present in the table"))
        })?;
        self.adjust_count(morph, -(count as i64))
    }

    /// モルフの最適な分割を貪欲に探索し、改善があれば適用します。
    ///
    /// まず現在の表現（分割されている場合は子孫ごと）を取り除いて
    /// 平坦なリーフとして再登録し、その全体コストを基準とします。
    /// 次にすべての分割位置を仮に試し、全体コストを厳密に改善する
    /// 最良の位置があればそれを採用して、2つの子に対して再帰的に
    /// 同じ探索を行います。仮説の適用と取り消しは対になった
    /// カウント調整で行われ、テーブル全体の複製は行いません。
    ///
    /// 存在しないモルフに対しては何も行いません。
    pub(crate) fn resplit(&mut self, morph: &str) -> Result<()> {
        let Some(node) = self.nodes.get(morph) else {
            return Ok(());
        };
        let count = node.count;
        let len = char_len(morph);
        if count == 0 || len < 2 {
            return Ok(());
        }
        let f = count as i64;

        // Recompute the best split from scratch every time the morph is
        // visited; the quality of a split depends on the splits chosen
        // so far, and this makes the search less dependent on the order
        // in which morphs are evaluated.
        self.adjust_count(morph, -f)?;
        self.adjust_count(morph, f)?;

        let mut best_cost = self.model.overall_cost();
        let mut best_split = 0;

        // The model only sees leaves; while trying hypothetical splits
        // the morph itself must be absent from it.
        self.adjust_count(morph, -f)?;

        for k in 1..len {
            let (left, right) = split_at_char(morph, k);
            let (left, right) = (left.to_string(), right.to_string());
            self.adjust_count(&left, f)?;
            self.adjust_count(&right, f)?;

            let cost = self.model.overall_cost();
            if cost < best_cost {
                best_cost = cost;
                best_split = k;
            }

            self.adjust_count(&left, -f)?;
            self.adjust_count(&right, -f)?;
        }

        if best_split == 0 {
            // No split improves the cost; restore the flat leaf.
            self.adjust_count(morph, f)?;
            return Ok(());
        }

        let (left, right) = split_at_char(morph, best_split);
        let (left, right) = (left.to_string(), right.to_string());

        // The parent returns to the table as an internal node; its count
        // satisfies the child-count invariant without feeding the model.
        self.nodes.insert(
            morph.to_string(),
            MorphNode {
                count,
                children: Some((left.clone(), right.clone())),
            },
        );
        self.adjust_count(&left, f)?;
        self.adjust_count(&right, f)?;

        self.resplit(&left)?;
        self.resplit(&right)
    }

    #[cfg(test)]
    pub(crate) fn verify_invariants(&self) {
        let mut total = 0;
        let mut unique = 0;
        for (morph, node) in &self.nodes {
            assert!(!morph.is_empty());
            if let Some((left, right)) = &node.children {
                assert!(char_len(morph) > 1, "single-letter morph {morph:?} is split");
                let left = self.nodes.get(left).unwrap_or_else(|| {
                    panic!("dangling left child of {morph:?}")
                });
                let right = self.nodes.get(right).unwrap_or_else(|| {
                    panic!("dangling right child of {morph:?}")
                });
                assert!(left.count >= node.count);
                assert!(right.count >= node.count);
            } else {
                assert!(node.count > 0, "leaf {morph:?} has count 0");
                total += node.count;
                unique += 1;
            }
        }
        assert_eq!(total, self.model.total_morph_tokens());
        assert_eq!(unique, self.model.unique_morph_types());
    }
}
