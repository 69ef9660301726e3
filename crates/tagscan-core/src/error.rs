//! 错误类型：配置错误与解码错误相互独立
use std::path::PathBuf;
use thiserror::Error;

/// 配置错误：在扫描开始前即失败，不产生任何进度
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk size must be a positive number of rows, got {0}")]
    InvalidChunkSize(usize),
    #[error("malformed whitelist entry {0:?}: expected a single `<...>` tag")]
    InvalidWhitelistEntry(String),
    #[error("delimiter must be a single ASCII character or \"tab\", got {0:?}")]
    InvalidDelimiter(String),
}

/// 解码错误：文件级失败，扫描器不会在残缺的表格上运行
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("sheet {0:?} not found in workbook")]
    SheetNotFound(String),
}
