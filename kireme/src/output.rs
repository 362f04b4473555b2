//! 学習結果の書き出しモジュール。
//!
//! このモジュールは、学習済みのセグメンテーション木をプレーン形式
//! （全体コストとリーフの一覧）またはDOT形式（分割グラフ）で
//! 書き出す関数を提供します。

use std::io::{BufWriter, Write};

use crate::errors::Result;
use crate::segmentation::SegmentationTree;

/// セグメンテーション木をプレーン形式で書き出します。
///
/// 1行目は `Overall cost: <小数点以下5桁>`、以降はリーフごとに
/// `<頻度> <モルフ>` の行が続きます。出力を決定的にするため、
/// リーフはモルフ文字列の辞書順に並べられます。
///
/// # 引数
///
/// * `tree` - 書き出すセグメンテーション木
/// * `wtr` - 書き込み先
///
/// # 戻り値
///
/// 書き込み成功時は `Ok(())`
///
/// # エラー
///
/// 書き込みに失敗した場合、I/Oエラーが返されます。
pub fn write_plain<W>(tree: &SegmentationTree, wtr: W) -> Result<()>
where
    W: Write,
{
    let mut wtr = BufWriter::new(wtr);
    writeln!(&mut wtr, "Overall cost: {:.5}", tree.model().overall_cost())?;
    let mut leaves: Vec<(&str, usize)> = tree.leaves().collect();
    leaves.sort_unstable();
    for (morph, count) in leaves {
        writeln!(&mut wtr, "{count} {morph}")?;
    }
    Ok(())
}

/// セグメンテーション木をDOT形式の有向グラフとして書き出します。
///
/// 各モルフは `"<モルフ>| <頻度>"` というラベルを持つレコードノードに
/// なり、内部ノードからは2つの子モルフへの辺が出力されます。
///
/// # 引数
///
/// * `tree` - 書き出すセグメンテーション木
/// * `wtr` - 書き込み先
///
/// # 戻り値
///
/// 書き込み成功時は `Ok(())`
///
/// # エラー
///
/// 書き込みに失敗した場合、I/Oエラーが返されます。
pub fn write_dot<W>(tree: &SegmentationTree, wtr: W) -> Result<()>
where
    W: Write,
{
    let mut wtr = BufWriter::new(wtr);
    writeln!(&mut wtr, "digraph segmentation_tree {{")?;
    writeln!(&mut wtr, "node [shape=record, fontname=\"Arial\"]")?;
    let mut nodes: Vec<_> = tree.iter().collect();
    nodes.sort_unstable_by_key(|&(morph, _)| morph);
    for (morph, node) in nodes {
        writeln!(&mut wtr, "\"{}\" [label=\"{}| {}\"]", morph, morph, node.count())?;
        if let Some(left) = node.left_child() {
            writeln!(&mut wtr, "\"{morph}\" -> \"{left}\"")?;
        }
        if let Some(right) = node.right_child() {
            writeln!(&mut wtr, "\"{morph}\" -> \"{right}\"")?;
        }
    }
    writeln!(&mut wtr, "}}")?;
    Ok(())
}
