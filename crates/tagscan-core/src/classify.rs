//! 标签分类器：判断单个单元格是否含有白名单以外的标签
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::ConfigError;
use crate::types::CellValue;

/// 默认允许的标签
pub const DEFAULT_ALLOWED_TAGS: [&str; 6] = ["<b>", "</b>", "<i>", "</i>", "<br>", "</br>"];

/// 通用标签语法：`<` + 至少一个非 `>` 字符 + `>`，遇到第一个 `>` 即结束
fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern compiles"))
}

/// 允许的标签集合（内部统一存小写，大小写不敏感匹配）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    tags: HashSet<String>,
}

impl Whitelist {
    /// 从标签列表构建白名单；每一项必须恰好是一个完整标签
    pub fn new<I, S>(tags: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for tag in tags {
            let tag = tag.as_ref();
            let whole = tag_regex()
                .find(tag)
                .is_some_and(|m| m.start() == 0 && m.end() == tag.len());
            if !whole {
                return Err(ConfigError::InvalidWhitelistEntry(tag.to_owned()));
            }
            set.insert(tag.to_lowercase());
        }
        Ok(Self { tags: set })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_lowercase())
    }

    pub fn len(&self) -> usize { self.tags.len() }

    pub fn is_empty(&self) -> bool { self.tags.is_empty() }

    /// 按字典序返回白名单内容（便于日志输出稳定）
    pub fn sorted(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self { tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| (*t).to_owned()).collect() }
    }
}

/// 标签分类器（纯函数，无副作用）
#[derive(Debug, Clone, Default)]
pub struct TagClassifier {
    whitelist: Whitelist,
}

impl TagClassifier {
    pub fn new(whitelist: Whitelist) -> Self {
        Self { whitelist }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// 单元格是否违规；非文本类型从不检查
    pub fn violates(&self, cell: &CellValue) -> bool {
        cell.as_text().is_some_and(|text| self.text_violates(text))
    }

    /// 文本中任一标签（转小写后）不在白名单即违规
    pub fn text_violates(&self, text: &str) -> bool {
        // 快速路径：不含 `<` 不可能出现标签
        if !text.contains('<') {
            return false;
        }
        tag_regex().find_iter(text).any(|m| !self.whitelist.contains(m.as_str()))
    }

    /// 按出现顺序列出不允许的标签（保留原始大小写）
    pub fn disallowed_tags<'t>(&self, text: &'t str) -> Vec<&'t str> {
        tag_regex()
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|tag| !self.whitelist.contains(tag))
            .collect()
    }
}
