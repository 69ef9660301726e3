//! 文件级扫描：收集输入、逐个解码并扫描、以 JSON 数组流式写出报告
use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::decode::{decode_path, is_supported};
use crate::options::{ScanOptions, ScanProgress, ScanStats};
use crate::scan::{CancelToken, ChunkedScanner};
use crate::types::OutputItem;

/// 收集待扫描文件
/// - 输入为文件：原样返回（即使扩展名不受支持，交由解码阶段报错）
/// - 输入为目录：仅取第一层中受支持的文件，按文件名排序保证输出顺序可复现
pub fn collect_inputs(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = vec![];
    for entry in WalkDir::new(input).min_depth(1).max_depth(1) {
        let entry = match entry { Ok(e) => e, Err(_) => continue };
        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// 扫描输入并将违规项以 JSON 数组流式写入 `out`
/// - 配置错误在任何文件被读取之前返回
/// - 单个文件解码失败只记录日志并计入 `files_failed`，不影响其他文件
/// - `on_progress` 在每个分块结束时以（文件名，进度）回调
/// - `cancel` 在分块边界生效：当前文件写出已完成分块的结果并计入 `files_cancelled`，其余文件不再扫描
pub fn scan_and_write(
    input: &Path,
    out: &mut dyn Write,
    opts: &ScanOptions,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(&str, ScanProgress),
) -> Result<ScanStats> {
    let scanner = ChunkedScanner::from_options(opts)?;
    let decode_opts = opts.decode_options();
    let whitelist = scanner.classifier().whitelist();
    info!(
        chunk_size = scanner.chunk_size(),
        whitelist_len = whitelist.len(),
        whitelist = ?whitelist.sorted(),
        "scanner configured"
    );
    if whitelist.is_empty() {
        warn!("whitelist is empty, every tag will be reported");
    }

    let files = collect_inputs(input);
    if files.is_empty() {
        warn!(input = %input.display(), "no supported files found");
    }

    let mut stats = ScanStats::default();
    write!(out, "[")?;
    let mut first = true;

    for path in files {
        if cancel.is_cancelled() {
            warn!(file = %path.display(), "scan cancelled, skipping remaining files");
            break;
        }
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let grid = match decode_path(&path, &decode_opts) {
            Ok(g) => g,
            Err(e) => {
                error!(file = %file_name, error = %e, "failed to decode file");
                stats.files_failed += 1;
                continue;
            }
        };

        // 扫描在后台线程执行，当前线程负责转发进度与写出结果
        let handle = scanner.spawn_with_cancel(Arc::new(grid), cancel.clone());
        let result = handle.wait(|p| on_progress(&file_name, p))?;

        if result.is_complete() {
            stats.files_scanned += 1;
        } else {
            stats.files_cancelled += 1;
        }
        stats.rows_scanned += result.rows_scanned;

        for issue in &result.issues {
            stats.outputs_written += 1;
            if !first { write!(out, ",")?; } else { first = false; }
            let item = OutputItem { file: &file_name, row: issue.row, column: issue.column, content: &issue.content };
            serde_json::to_writer(&mut *out, &item)?;
        }
        info!(file = %file_name, rows = result.rows_scanned, issues = result.issues.len(), "file scanned");
    }

    write!(out, "]")?;
    Ok(stats)
}
