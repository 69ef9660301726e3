use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tagscan_core::{
    load_options, parse_delimiter, scan_and_write, CancelToken, ScanOptions, ScanProgress, TagClassifier,
};
use tracing::{error, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "tagscan", version, about = "表格 HTML 标签白名单校验")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 白名单与配置相关的公共参数
#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// 配置文件路径（TOML）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 允许的标签，可重复指定；指定后替换配置中的白名单
    #[arg(long = "allow", value_name = "TAG")]
    allow: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描表格文件（或目录下的表格文件）并生成 JSON 报告
    Scan {
        /// 输入文件或目录（csv/tsv/txt/xlsx/xlsm/xlsb/xls/ods）
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组）；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,

        /// 每个分块的行数（默认 1000）
        #[arg(long)]
        chunk_size: Option<usize>,

        /// 工作表名（默认第一个）
        #[arg(long)]
        sheet: Option<String>,

        /// 分隔符（单个字符或 "tab"）
        #[arg(long)]
        delimiter: Option<String>,

        /// 不在 stderr 上打印进度
        #[arg(long)]
        quiet: bool,
    },
    /// 检查一段文本，列出不在白名单中的标签
    CheckText {
        text: String,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { input, output, config, chunk_size, sheet, delimiter, quiet } => {
            info!(?input, ?output, "starting scan");
            if !input.exists() {
                bail!("input path does not exist: {}", input.display());
            }

            let mut opts = base_options(&config)?;
            if let Some(n) = chunk_size { opts.chunk_size = n; }
            if sheet.is_some() { opts.sheet = sheet; }
            if let Some(d) = delimiter { opts.delimiter = Some(parse_delimiter(&d)?); }

            // 输出缺省为标准输出，以缓冲方式按 JSON 数组流式写入
            let mut out: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path).context("create output file")?)),
                None => Box::new(BufWriter::new(io::stdout().lock())),
            };

            let mut on_progress = |file: &str, p: ScanProgress| {
                if quiet { return; }
                eprint!("\r{file}: {:>3}% ({}/{} rows)", p.percent_complete, p.rows_processed, p.rows_total);
                if p.is_finished() { eprintln!(); }
            };

            let cancel = CancelToken::new();
            let stats = scan_and_write(&input, &mut out, &opts, &cancel, &mut on_progress)
                .context("scan and write failed")?;
            writeln!(out)?;
            out.flush()?;

            info!(
                files_scanned = stats.files_scanned,
                files_failed = stats.files_failed,
                rows_scanned = stats.rows_scanned,
                files_cancelled = stats.files_cancelled,
                outputs_written = stats.outputs_written,
                "scan finished"
            );
            if stats.outputs_written == 0 {
                info!("No illegal HTML tags found!");
            } else {
                info!("Found {} issues", stats.outputs_written);
            }
            if stats.files_failed > 0 {
                error!(files_failed = stats.files_failed, "some files could not be decoded");
                bail!("{} file(s) could not be decoded", stats.files_failed);
            }
        }
        Commands::CheckText { text, config } => {
            let opts = base_options(&config)?;
            let classifier = TagClassifier::new(opts.whitelist()?);
            let bad = classifier.disallowed_tags(&text);
            if bad.is_empty() {
                println!("ok");
            } else {
                for tag in bad { println!("{tag}"); }
            }
        }
    }

    Ok(())
}

/// 配置文件（若有）+ 命令行白名单覆盖
fn base_options(args: &ConfigArgs) -> Result<ScanOptions> {
    let mut opts = match &args.config {
        Some(path) => load_options(path)?,
        None => ScanOptions::default(),
    };
    if !args.allow.is_empty() {
        opts.allowed_tags = args.allow.clone();
    }
    Ok(opts)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，避免污染标准输出上的 JSON 报告
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
