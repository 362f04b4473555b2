//! 学習コーパスのデータ構造のモジュール。
//!
//! このモジュールは、学習用コーパスの読み込みと管理に必要なデータ構造を提供します。

use std::io::{BufRead, BufReader, Read};
use std::ops::Deref;

use crate::common::END_OF_MORPH;
use crate::errors::{KiremeError, Result};

/// 単語と頻度のペアの表現。
///
/// 学習データの1エントリを表します。
#[derive(Debug, Clone)]
pub struct Word {
    form: String,
    frequency: usize,
}

impl Word {
    /// 新しい単語を作成します。
    ///
    /// # 引数
    ///
    /// * `form` - 単語の表記
    /// * `frequency` - コーパス中の出現頻度
    ///
    /// # 戻り値
    ///
    /// 作成された単語
    ///
    /// # エラー
    ///
    /// 表記が空、空白文字または終端記号 `#` を含む、
    /// もしくは頻度が0の場合、[`KiremeError`] が返されます。
    pub fn new<S>(form: S, frequency: usize) -> Result<Self>
    where
        S: Into<String>,
    {
        let form = form.into();
        validate_form(&form, 0)?;
        if frequency == 0 {
            return Err(KiremeError::invalid_corpus(
                0,
                format!("word {form:?} must have a positive frequency"),
            ));
        }
        Ok(Self { form, frequency })
    }

    /// 単語の表記を返します。
    ///
    /// # 戻り値
    ///
    /// 表記文字列
    pub fn form(&self) -> &str {
        &self.form
    }

    /// 単語の出現頻度を返します。
    ///
    /// # 戻り値
    ///
    /// 出現頻度
    pub fn frequency(&self) -> usize {
        self.frequency
    }
}

/// 表記の妥当性を検査します。
fn validate_form(form: &str, line: usize) -> Result<()> {
    if form.is_empty() {
        return Err(KiremeError::invalid_corpus(line, "word must be non-empty"));
    }
    if form.chars().any(char::is_whitespace) {
        return Err(KiremeError::invalid_corpus(
            line,
            format!("word {form:?} must not contain whitespace"),
        ));
    }
    if form.contains(END_OF_MORPH) {
        return Err(KiremeError::invalid_corpus(
            line,
            format!("word {form:?} must not contain the reserved character {END_OF_MORPH:?}"),
        ));
    }
    Ok(())
}

/// コーパスの表現。
///
/// 学習データの (単語, 頻度) ペアの集合を表します。
pub struct Corpus {
    words: Vec<Word>,
}

impl Corpus {
    /// 指定されたリーダーからコーパスを読み込みます。
    ///
    /// コーパスファイルは、各行が「頻度 単語」の形式を想定しています。
    /// 頻度は正の10進整数、単語は空白と `#` を含まない非空のバイト列です。
    /// 空行は無視されます。
    ///
    /// # 引数
    ///
    /// * `rdr` - コーパスのリーダー
    ///
    /// # 戻り値
    ///
    /// 読み込まれたコーパス
    ///
    /// # エラー
    ///
    /// 入力形式が不正な場合、[`KiremeError`] が返されます。
    ///
    /// # 例
    ///
    /// ```
    /// # use kireme::Corpus;
    /// let data = "1 reopen\n2 redo\n";
    /// let corpus = Corpus::from_reader(data.as_bytes()).unwrap();
    /// assert_eq!(2, corpus.len());
    /// assert_eq!("reopen", corpus[0].form());
    /// assert_eq!(2, corpus[1].frequency());
    /// ```
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let buf = BufReader::new(rdr);

        let mut words = vec![];
        for (i, line) in buf.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let line_no = i + 1;
            let mut spl = line.split_ascii_whitespace();
            let frequency = spl.next();
            let form = spl.next();
            let rest = spl.next();
            match (frequency, form, rest) {
                (Some(frequency), Some(form), None) => {
                    let frequency: usize = frequency.parse().map_err(|e| {
                        KiremeError::invalid_corpus(
                            line_no,
                            format!("frequency must be a positive integer ({e})"),
                        )
                    })?;
                    if frequency == 0 {
                        return Err(KiremeError::invalid_corpus(
                            line_no,
                            "frequency must be positive",
                        ));
                    }
                    validate_form(form, line_no)?;
                    words.push(Word {
                        form: form.to_string(),
                        frequency,
                    });
                }
                _ => {
                    return Err(KiremeError::invalid_corpus(
                        line_no,
                        "each line must be a pair of a frequency and a word",
                    ))
                }
            }
        }

        Ok(Self { words })
    }

    /// (単語, 頻度) ペアの列からコーパスを作成します。
    ///
    /// # 引数
    ///
    /// * `pairs` - (単語, 頻度) ペアのイテレータ
    ///
    /// # 戻り値
    ///
    /// 作成されたコーパス
    ///
    /// # エラー
    ///
    /// いずれかのペアが無効な場合、[`KiremeError`] が返されます。
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut words = vec![];
        for (form, frequency) in pairs {
            words.push(Word::new(form, frequency)?);
        }
        Ok(Self { words })
    }
}

impl Deref for Corpus {
    type Target = [Word];

    fn deref(&self) -> &Self::Target {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_corpus() {
        let corpus_data = "\
1 reopen
2 redo

10 retry
";

        let corpus = Corpus::from_reader(corpus_data.as_bytes()).unwrap();

        assert_eq!(3, corpus.len());
        assert_eq!("reopen", corpus[0].form());
        assert_eq!(1, corpus[0].frequency());
        assert_eq!("redo", corpus[1].form());
        assert_eq!(2, corpus[1].frequency());
        assert_eq!("retry", corpus[2].form());
        assert_eq!(10, corpus[2].frequency());
    }

    #[test]
    fn test_load_corpus_zero_frequency() {
        let result = Corpus::from_reader("0 reopen".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_corpus_negative_frequency() {
        let result = Corpus::from_reader("-3 reopen".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_corpus_missing_word() {
        let result = Corpus::from_reader("42".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_corpus_extra_column() {
        let result = Corpus::from_reader("1 re open".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_corpus_reserved_character() {
        let result = Corpus::from_reader("1 re#open".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_word_validation() {
        assert!(Word::new("reopen", 1).is_ok());
        assert!(Word::new("", 1).is_err());
        assert!(Word::new("reopen", 0).is_err());
        assert!(Word::new("re#open", 1).is_err());
    }
}
