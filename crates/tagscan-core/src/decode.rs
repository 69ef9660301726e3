//! 表格解码：把文件内容物化为 `Grid`，再交给扫描器
//!
//! - 分隔文本（csv/tsv/txt）走 `csv` crate，不把首行当表头，允许行长不一
//! - 工作簿（xlsx/xlsm/xlsb/xls/ods）走 `calamine`，默认取第一个工作表
//! - 任何失败都返回 `DecodeError`，不会返回解了一半的表格
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::error::DecodeError;
use crate::types::{CellValue, Grid};

/// 支持的扩展名（小写）
pub const SUPPORTED_EXTENSIONS: [&str; 8] = ["csv", "tsv", "txt", "xlsx", "xlsm", "xlsb", "xls", "ods"];

/// 解码参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// 分隔符；None 时 tsv 用制表符，其余用逗号
    pub delimiter: Option<u8>,
    /// 工作表名；None 时取第一个
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Delimited(u8),
    Workbook,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
}

/// 按扩展名判断是否为可解码文件
pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn source_format(path: &Path, opts: &DecodeOptions) -> Result<SourceFormat, DecodeError> {
    match extension_of(path).as_deref() {
        Some("tsv") => Ok(SourceFormat::Delimited(opts.delimiter.unwrap_or(b'\t'))),
        Some("csv") | Some("txt") => Ok(SourceFormat::Delimited(opts.delimiter.unwrap_or(b','))),
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => Ok(SourceFormat::Workbook),
        _ => Err(DecodeError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// 解码单个文件
pub fn decode_path(path: &Path, opts: &DecodeOptions) -> Result<Grid, DecodeError> {
    let grid = match source_format(path, opts)? {
        SourceFormat::Delimited(delimiter) => {
            let file = File::open(path).map_err(|source| DecodeError::Io { path: path.to_path_buf(), source })?;
            decode_delimited(BufReader::new(file), delimiter)?
        }
        SourceFormat::Workbook => decode_workbook(path, opts.sheet.as_deref())?,
    };
    debug!(path = %path.display(), rows = grid.len(), "decoded grid");
    Ok(grid)
}

/// 解码分隔文本；每个字段按值推断类型
pub fn decode_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Grid, DecodeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut grid = Grid::new();
    for record in rdr.records() {
        let record = record?;
        grid.push(record.iter().map(parse_field).collect());
    }
    Ok(grid)
}

/// 字段类型推断：空 → Empty，true/false → Bool，有限数字 → Number，其余为文本
fn parse_field(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    if field.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if field.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    match field.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(field.to_owned()),
    }
}

/// 解码工作簿中的一个工作表
pub fn decode_workbook(path: &Path, sheet: Option<&str>) -> Result<Grid, DecodeError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| DecodeError::SheetNotFound(wanted.to_owned()))?,
        None => names.first().cloned().ok_or(DecodeError::NoSheets)?,
    };
    let range = workbook.worksheet_range(&name)?;
    Ok(range_to_grid(&range))
}

/// 以 A1 为原点展开区域，使输出坐标与表格软件中看到的一致
fn range_to_grid(range: &Range<Data>) -> Grid {
    let Some((first_row, first_col)) = range.start() else {
        return Grid::new();
    };
    let lead_cols = first_col as usize;
    let mut grid: Grid = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = Vec::with_capacity(lead_cols + row.len());
        cells.resize(lead_cols, CellValue::Empty);
        cells.extend(row.iter().map(data_to_cell));
        grid.push(cells);
    }
    grid
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_fields_are_typed() {
        let input = "<b>x</b>,42,true,,-1.5\nFALSE,NaN, 7 \n";
        let grid = decode_delimited(input.as_bytes(), b',').unwrap();
        assert_eq!(
            grid,
            vec![
                vec![
                    CellValue::Text("<b>x</b>".to_owned()),
                    CellValue::Number(42.0),
                    CellValue::Bool(true),
                    CellValue::Empty,
                    CellValue::Number(-1.5),
                ],
                vec![CellValue::Bool(false), CellValue::Text("NaN".to_owned()), CellValue::Number(7.0)],
            ]
        );
    }

    #[test]
    fn ragged_rows_and_quoted_fields() {
        let input = "a\n\"<p>, quoted\",b,c\n";
        let grid = decode_delimited(input.as_bytes(), b',').unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].len(), 1);
        assert_eq!(grid[1][0], CellValue::Text("<p>, quoted".to_owned()));
        assert_eq!(grid[1].len(), 3);
    }

    #[test]
    fn custom_delimiter() {
        let grid = decode_delimited("a;<u>b</u>".as_bytes(), b';').unwrap();
        assert_eq!(grid[0][1], CellValue::Text("<u>b</u>".to_owned()));
    }

    #[test]
    fn format_dispatch_by_extension() {
        let opts = DecodeOptions::default();
        assert_eq!(source_format(Path::new("a.CSV"), &opts).unwrap(), SourceFormat::Delimited(b','));
        assert_eq!(source_format(Path::new("a.tsv"), &opts).unwrap(), SourceFormat::Delimited(b'\t'));
        assert_eq!(source_format(Path::new("a.xlsx"), &opts).unwrap(), SourceFormat::Workbook);
        assert!(matches!(
            source_format(Path::new("a.pdf"), &opts),
            Err(DecodeError::UnsupportedFormat(_))
        ));
        assert!(source_format(Path::new("noext"), &opts).is_err());

        let semi = DecodeOptions { delimiter: Some(b';'), sheet: None };
        assert_eq!(source_format(Path::new("a.tsv"), &semi).unwrap(), SourceFormat::Delimited(b';'));
    }

    #[test]
    fn supported_extensions() {
        assert!(is_supported(Path::new("report.XLSX")));
        assert!(is_supported(Path::new("data.csv")));
        assert!(!is_supported(Path::new("notes.md")));
    }

    #[test]
    fn range_not_starting_at_a1_is_padded() {
        // 首个已用单元格为 B3（0 起为 (2, 1)）
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("<b>ok</b>".to_owned()));
        range.set_value((3, 2), Data::String("<u>bad</u>".to_owned()));

        let grid = range_to_grid(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty() && grid[1].is_empty());
        assert_eq!(grid[2], vec![CellValue::Empty, CellValue::Text("<b>ok</b>".to_owned()), CellValue::Empty]);
        assert_eq!(grid[3][2], CellValue::Text("<u>bad</u>".to_owned()));
        assert_eq!(grid[3].len(), 3);
    }

    #[test]
    fn empty_range_yields_empty_grid() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_grid(&range).is_empty());
    }

    #[test]
    fn data_mapping() {
        assert_eq!(data_to_cell(&Data::String("<i>".to_owned())), CellValue::Text("<i>".to_owned()));
        assert_eq!(data_to_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(data_to_cell(&Data::Bool(false)), CellValue::Bool(false));
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Empty);
    }
}
