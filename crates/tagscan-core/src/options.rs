//! 扫描选项与进度/统计信息（模块）
use serde::Serialize;

use crate::classify::{Whitelist, DEFAULT_ALLOWED_TAGS};
use crate::decode::DecodeOptions;
use crate::error::ConfigError;

/// 默认分块行数
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// 扫描选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// 每个分块的行数，必须为正
    pub chunk_size: usize,
    /// 允许的标签（大小写不敏感）
    pub allowed_tags: Vec<String>,
    /// 工作簿中要扫描的工作表；None 表示第一个
    pub sheet: Option<String>,
    /// 分隔文本的分隔符；None 表示按扩展名推断（tsv 为制表符，其余为逗号）
    pub delimiter: Option<u8>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| (*t).to_owned()).collect(),
            sheet: None,
            delimiter: None,
        }
    }
}

impl ScanOptions {
    pub fn whitelist(&self) -> Result<Whitelist, ConfigError> {
        Whitelist::new(&self.allowed_tags)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions { delimiter: self.delimiter, sheet: self.sheet.clone() }
    }
}

/// 解析分隔符参数：单个 ASCII 字符，或 "tab" / "\t"
pub fn parse_delimiter(s: &str) -> Result<u8, ConfigError> {
    if s.eq_ignore_ascii_case("tab") || s == "\\t" {
        return Ok(b'\t');
    }
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::InvalidDelimiter(s.to_owned())),
    }
}

/// 扫描进度快照，每个分块结束时更新一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub rows_processed: usize,
    pub rows_total: usize,
    pub percent_complete: u8,
}

impl ScanProgress {
    /// percent = min(100, round(processed / total * 100))，四舍五入取半向上
    pub(crate) fn new(rows_processed: usize, rows_total: usize) -> Self {
        let percent_complete = if rows_total == 0 {
            100
        } else {
            let p = (rows_processed as u128 * 100 + rows_total as u128 / 2) / rows_total as u128;
            p.min(100) as u8
        };
        Self { rows_processed, rows_total, percent_complete }
    }

    pub fn is_finished(&self) -> bool {
        self.percent_complete == 100 && self.rows_processed == self.rows_total
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub files_cancelled: usize,
    pub rows_scanned: usize,
    pub outputs_written: usize,
}
