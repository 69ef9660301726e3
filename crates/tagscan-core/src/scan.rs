//! 分块扫描主流程与后台调度
//!
//! 调度模型：
//! - 单次扫描按分块顺序推进，一个分块是不可中断的最小工作单元，从不并行处理两个分块。
//! - 每个分块结束后先上报进度，再主动让出线程（`yield_now`），然后才开始下一个分块。
//! - 取消标志只在分块边界检查；被取消时返回带 `Cancelled` 标记的部分结果。
use anyhow::{anyhow, Result};
use crossbeam_channel as channel;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use crate::classify::{TagClassifier, Whitelist};
use crate::error::ConfigError;
use crate::findings::Issue;
use crate::options::{ScanOptions, ScanProgress};
use crate::types::{Grid, Row};

/// 取消令牌（可跨线程共享）
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }

    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// 扫描结束状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Complete,
    Cancelled,
}

/// 扫描结果：按行优先顺序排列的违规记录，扫描结束后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub issues: Vec<Issue>,
    pub status: ScanStatus,
    /// 实际完成扫描的行数（被取消时小于总行数）
    pub rows_scanned: usize,
}

impl ScanResult {
    pub fn is_complete(&self) -> bool { self.status == ScanStatus::Complete }
}

/// 分块扫描器
#[derive(Debug, Clone)]
pub struct ChunkedScanner {
    classifier: TagClassifier,
    chunk_size: usize,
}

impl ChunkedScanner {
    /// 分块行数为 0 属于编程错误，直接失败而不是悄悄改成 1
    pub fn new(whitelist: Whitelist, chunk_size: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(chunk_size));
        }
        Ok(Self { classifier: TagClassifier::new(whitelist), chunk_size })
    }

    /// 从扫描选项构建（白名单与分块大小均在此校验）
    pub fn from_options(opts: &ScanOptions) -> Result<Self, ConfigError> {
        Self::new(opts.whitelist()?, opts.chunk_size)
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn classifier(&self) -> &TagClassifier { &self.classifier }

    /// 扫描整张表格；每个分块结束后调用一次 `on_progress`
    pub fn scan<F>(&self, grid: &[Row], on_progress: F) -> ScanResult
    where
        F: FnMut(ScanProgress),
    {
        self.run(grid, None, on_progress)
    }

    /// 同 `scan`，但在每个分块开始前检查取消令牌
    pub fn scan_cancellable<F>(&self, grid: &[Row], cancel: &CancelToken, on_progress: F) -> ScanResult
    where
        F: FnMut(ScanProgress),
    {
        self.run(grid, Some(cancel), on_progress)
    }

    fn run<F>(&self, grid: &[Row], cancel: Option<&CancelToken>, mut on_progress: F) -> ScanResult
    where
        F: FnMut(ScanProgress),
    {
        let rows_total = grid.len();
        info!(rows_total, chunk_size = self.chunk_size, "starting grid scan");

        // 空表：直接完成，只上报一次 100%
        if rows_total == 0 {
            on_progress(ScanProgress::new(0, 0));
            return ScanResult { issues: Vec::new(), status: ScanStatus::Complete, rows_scanned: 0 };
        }

        let mut issues: Vec<Issue> = Vec::new();
        let mut rows_processed = 0usize;

        for (chunk_idx, chunk) in grid.chunks(self.chunk_size).enumerate() {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                warn!(rows_processed, rows_total, issues = issues.len(), "scan cancelled");
                return ScanResult { issues, status: ScanStatus::Cancelled, rows_scanned: rows_processed };
            }

            // 分块内同步处理：行号 = 分块起始偏移 + 块内下标
            let start = rows_processed;
            for (offset, row) in chunk.iter().enumerate() {
                for (col_idx, cell) in row.iter().enumerate() {
                    if let Some(text) = cell.as_text() {
                        if self.classifier.text_violates(text) {
                            issues.push(Issue::at(start + offset, col_idx, text));
                        }
                    }
                }
            }
            rows_processed += chunk.len();

            let progress = ScanProgress::new(rows_processed, rows_total);
            debug!(chunk = chunk_idx, rows_processed, percent = progress.percent_complete, "chunk scanned");
            on_progress(progress);

            // 分块边界：让出线程，保持宿主响应
            if rows_processed < rows_total {
                std::thread::yield_now();
            }
        }

        info!(rows_total, issues = issues.len(), "grid scan finished");
        ScanResult { issues, status: ScanStatus::Complete, rows_scanned: rows_processed }
    }

    /// 在后台线程执行扫描，进度与结果通过通道按序投递
    pub fn spawn(&self, grid: Arc<Grid>) -> ScanHandle {
        self.spawn_with_cancel(grid, CancelToken::new())
    }

    /// 同 `spawn`，使用调用方提供的取消令牌（可跨多次扫描共享）
    pub fn spawn_with_cancel(&self, grid: Arc<Grid>, cancel: CancelToken) -> ScanHandle {
        let (tx, rx) = channel::bounded::<ScanEvent>(256);
        let scanner = self.clone();
        let token = cancel.clone();

        let worker = std::thread::spawn(move || {
            let result = scanner.scan_cancellable(&grid, &token, |p| {
                // 接收端已丢弃时忽略发送失败
                let _ = tx.send(ScanEvent::Progress(p));
            });
            let _ = tx.send(ScanEvent::Finished(result));
            // tx 在此被丢弃，接收端随之收到关闭信号
        });

        ScanHandle { events: rx, cancel, worker }
    }
}

/// 后台扫描事件：若干 Progress 之后恰好一个 Finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Progress(ScanProgress),
    Finished(ScanResult),
}

/// 后台扫描句柄
#[derive(Debug)]
pub struct ScanHandle {
    events: channel::Receiver<ScanEvent>,
    cancel: CancelToken,
    worker: JoinHandle<()>,
}

impl ScanHandle {
    /// 事件接收端，宿主可自行驱动
    pub fn events(&self) -> &channel::Receiver<ScanEvent> { &self.events }

    /// 请求取消；在下一个分块边界生效
    pub fn cancel(&self) { self.cancel.cancel(); }

    pub fn cancel_token(&self) -> CancelToken { self.cancel.clone() }

    /// 排空事件直到扫描结束，返回最终结果
    pub fn wait<F>(self, mut on_progress: F) -> Result<ScanResult>
    where
        F: FnMut(ScanProgress),
    {
        let mut result = None;
        for event in self.events.iter() {
            match event {
                ScanEvent::Progress(p) => on_progress(p),
                ScanEvent::Finished(r) => result = Some(r),
            }
        }
        self.worker.join().map_err(|_| anyhow!("scan worker panicked"))?;
        result.ok_or_else(|| anyhow!("scan worker exited without a result"))
    }
}
