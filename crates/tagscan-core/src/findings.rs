//! 违规记录

use serde::Serialize;

/// 一个违规单元格：坐标从 1 开始，content 为原始文本
/// 同一单元格含多个违规标签时只产生一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub row: usize,
    pub column: usize,
    pub content: String,
}

impl Issue {
    /// 由内部 0 起的行列下标构造
    pub(crate) fn at(row_idx: usize, col_idx: usize, content: &str) -> Self {
        Self { row: row_idx + 1, column: col_idx + 1, content: content.to_owned() }
    }
}
