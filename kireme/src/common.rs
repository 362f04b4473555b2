//! ライブラリ全体で共有される定数と小さな補助関数

/// モルフ終端記号
///
/// 暗黙の長さコストの計算において、各モルフの末尾に現れるとみなされる
/// 概念上の文字です。入力単語への出現は許可されません。
pub const END_OF_MORPH: char = '#';

/// 収束判定しきい値のデフォルト値（ユニークモルフ1つあたりのビット数）
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.005;

/// ハパックス・レゴメナ事前確率のデフォルト値
pub const DEFAULT_HAPAX_LEGOMENA_PRIOR: f64 = 0.5;

/// モルフ長のガンマ事前分布のデフォルト平均長
pub const DEFAULT_LENGTH_PRIOR: f64 = 5.0;

/// モルフ長のガンマ事前分布のデフォルトスケール
pub const DEFAULT_LENGTH_BETA: f64 = 1.0;

/// 暗黙頻度コストで二項係数を厳密に計算するトークン数の上限
///
/// 総モルフトークン数がこの値以上の場合、スターリング近似に基づく
/// 対数近似式に切り替えます。
pub const EXACT_BINOMIAL_LIMIT: usize = 100;

/// 文字列の文字数を返します。
#[inline(always)]
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 文字列を `k` 文字目の境界で2つに分割します。
///
/// # 引数
///
/// * `s` - 分割対象の文字列
/// * `k` - 左側部分文字列の文字数（`0 < k < char_len(s)` を想定）
#[inline]
pub(crate) fn split_at_char(s: &str, k: usize) -> (&str, &str) {
    let byte = s
        .char_indices()
        .nth(k)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(byte)
}
