//! 配置文件加载（TOML）
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::classify::Whitelist;
use crate::options::{parse_delimiter, ScanOptions};

/// 顶层配置文件结构；缺省字段回落到默认值
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    whitelist: Option<Vec<String>>,
    #[serde(default)]
    delimiter: Option<String>,
    #[serde(default)]
    sheet: Option<String>,
}

/// 从 TOML 配置文件加载扫描选项
pub fn load_options(path: &Path) -> Result<ScanOptions> {
    let txt = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    parse_options(&txt).with_context(|| format!("invalid config file {}", path.display()))
}

/// 解析配置文本；白名单与分隔符在此即校验，尽早失败
pub fn parse_options(txt: &str) -> Result<ScanOptions> {
    let parsed: ConfigFile = toml::from_str(txt)?;
    let mut opts = ScanOptions::default();

    if let Some(n) = parsed.chunk_size {
        opts.chunk_size = n;
    }
    if let Some(tags) = parsed.whitelist {
        Whitelist::new(&tags)?;
        opts.allowed_tags = tags;
    }
    if let Some(d) = parsed.delimiter {
        opts.delimiter = Some(parse_delimiter(&d)?);
    }
    opts.sheet = parsed.sheet;

    Ok(opts)
}
