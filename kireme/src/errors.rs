//! エラー型の定義
//!
//! このモジュールは、Kiremeライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt;

/// Kireme専用のResult型
///
/// エラー型としてデフォルトで[`KiremeError`]を使用します。
pub type Result<T, E = KiremeError> = std::result::Result<T, E>;

/// Kiremeのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum KiremeError {
    /// 無効な学習コーパスエラー
    ///
    /// [`InvalidCorpusError`]のエラーバリアント。
    #[error(transparent)]
    InvalidCorpus(InvalidCorpusError),

    /// 無効な分割要求エラー
    ///
    /// [`InvalidSplitError`]のエラーバリアント。
    #[error(transparent)]
    InvalidSplit(InvalidSplitError),

    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 内部不変条件の違反
    ///
    /// [`InvariantViolationError`]のエラーバリアント。
    /// 呼び出し側のプログラミングエラーを示し、回復は想定されません。
    #[error(transparent)]
    InvariantViolation(InvariantViolationError),

    /// 整数パースエラー
    ///
    /// [`ParseIntError`](std::num::ParseIntError)のエラーバリアント。
    #[error(transparent)]
    ParseInt(std::num::ParseIntError),

    /// 標準I/Oエラー
    ///
    /// [`std::io::Error`]のエラーバリアント。
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl KiremeError {
    /// 無効なコーパスエラーを生成します
    ///
    /// # 引数
    ///
    /// * `line` - エラーが発生した行番号（1始まり、行情報がない場合は0）
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_corpus<S>(line: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidCorpus(InvalidCorpusError {
            line,
            msg: msg.into(),
        })
    }

    /// 無効な分割要求エラーを生成します
    ///
    /// # 引数
    ///
    /// * `morph` - 分割対象のモルフ
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_split<M, S>(morph: M, msg: S) -> Self
    where
        M: Into<String>,
        S: Into<String>,
    {
        Self::InvalidSplit(InvalidSplitError {
            morph: morph.into(),
            msg: msg.into(),
        })
    }

    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 不変条件違反エラーを生成します
    ///
    /// # 引数
    ///
    /// * `morph` - 違反が検出されたモルフ
    /// * `msg` - 違反内容の説明
    pub(crate) fn invariant_violation<M, S>(morph: M, msg: S) -> Self
    where
        M: Into<String>,
        S: Into<String>,
    {
        Self::InvariantViolation(InvariantViolationError {
            morph: morph.into(),
            msg: msg.into(),
        })
    }
}

/// 学習コーパスが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidCorpusError {
    /// エラーが発生した行番号（1始まり、行情報がない場合は0）
    pub(crate) line: usize,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidCorpusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            write!(f, "InvalidCorpusError: {}", self.msg)
        } else {
            write!(f, "InvalidCorpusError: line {}: {}", self.line, self.msg)
        }
    }
}

impl Error for InvalidCorpusError {}

/// 分割要求が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidSplitError {
    /// 分割対象のモルフ
    pub(crate) morph: String,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidSplitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidSplitError: {:?}: {}", self.morph, self.msg)
    }
}

impl Error for InvalidSplitError {}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 集計統計とリーフ集合の整合性が崩れた場合に使用されるエラー
#[derive(Debug)]
pub struct InvariantViolationError {
    /// 違反が検出されたモルフ
    pub(crate) morph: String,

    /// 違反内容の説明
    pub(crate) msg: String,
}

impl fmt::Display for InvariantViolationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvariantViolationError: {:?}: {}", self.morph, self.msg)
    }
}

impl Error for InvariantViolationError {}

impl From<std::num::ParseIntError> for KiremeError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}
