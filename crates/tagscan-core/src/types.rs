//! 公共类型（对外暴露）
use serde::Serialize;

/// 单元格取值：解码器产出的标量，封闭枚举
/// - 只有 `Text` 会参与标签校验，其余类型恒为“无违规”
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// 文本内容；非文本返回 None
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self { CellValue::Text(s.to_owned()) }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self { CellValue::Text(s) }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self { CellValue::Number(n) }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self { CellValue::Number(n as f64) }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self { CellValue::Bool(b) }
}

/// 一行单元格（允许短行，缺失的尾部单元格视为不存在）
pub type Row = Vec<CellValue>;

/// 表格：行的有序序列，不要求矩形
pub type Grid = Vec<Row>;

/// 输出项结构（对应报告 JSON 数组的单个元素）
#[derive(Debug, Clone, Serialize)]
pub struct OutputItem<'a> {
    pub file: &'a str,
    pub row: usize,
    pub column: usize,
    pub content: &'a str,
}
