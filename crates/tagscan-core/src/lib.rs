//! 表格 HTML 标签白名单校验（核心库）
//!
//! 设计要点：
//! - 解码与扫描分离：先把文件物化为 `Grid`，解码失败时扫描器不会启动。
//! - 扫描按分块推进，分块之间上报进度并让出线程；结果严格按行优先排列，与分块大小无关。
//! - 单元格只有文本类型参与校验；标签按 `<[^>]+>` 提取，大小写不敏感地与白名单比较。

mod classify;
mod config;
mod decode;
mod error;
mod findings;
mod options;
mod report;
mod scan;
mod types;

pub use classify::{TagClassifier, Whitelist, DEFAULT_ALLOWED_TAGS};
pub use config::{load_options, parse_options};
pub use decode::{decode_delimited, decode_path, decode_workbook, is_supported, DecodeOptions, SUPPORTED_EXTENSIONS};
pub use error::{ConfigError, DecodeError};
pub use findings::Issue;
pub use options::{parse_delimiter, ScanOptions, ScanProgress, ScanStats, DEFAULT_CHUNK_SIZE};
pub use report::{collect_inputs, scan_and_write};
pub use scan::{CancelToken, ChunkedScanner, ScanEvent, ScanHandle, ScanResult, ScanStatus};
pub use types::{CellValue, Grid, OutputItem, Row};
