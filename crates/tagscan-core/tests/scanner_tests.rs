use tagscan_core::{CellValue, ChunkedScanner, Grid, Issue, ScanProgress, TagClassifier, Whitelist};

/// 构造一个含多种类型、短行与违规标签的较大表格
fn sample_grid(rows: usize) -> Grid {
    (0..rows)
        .map(|r| {
            let width = 1 + r % 5;
            (0..width)
                .map(|c| match (r * 31 + c * 7) % 9 {
                    0 => CellValue::from("<script>alert(1)</script>"),
                    1 => CellValue::from("<b>bold</b> and <I>italic</I>"),
                    2 => CellValue::Number((r * c) as f64),
                    3 => CellValue::Bool(r % 2 == 0),
                    4 => CellValue::Empty,
                    5 => CellValue::from("<div class=\"x\">"),
                    6 => CellValue::from("a < b > c"),
                    7 => CellValue::from("<br>line</br>"),
                    _ => CellValue::from(format!("plain {r}")),
                })
                .collect()
        })
        .collect()
}

/// 逐格枚举的参照实现
fn row_major_reference(grid: &Grid, classifier: &TagClassifier) -> Vec<Issue> {
    let mut out = Vec::new();
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if classifier.violates(cell) {
                out.push(Issue { row: r + 1, column: c + 1, content: cell.as_text().unwrap().to_owned() });
            }
        }
    }
    out
}

fn scan(grid: &Grid, chunk_size: usize) -> (Vec<Issue>, Vec<ScanProgress>) {
    let scanner = ChunkedScanner::new(Whitelist::default(), chunk_size).unwrap();
    let mut updates = Vec::new();
    let result = scanner.scan(grid, |p| updates.push(p));
    assert!(result.is_complete());
    assert_eq!(result.rows_scanned, grid.len());
    (result.issues, updates)
}

#[test]
fn result_is_row_major_for_any_chunk_size() {
    let grid = sample_grid(123);
    let expected = row_major_reference(&grid, &TagClassifier::default());
    assert!(!expected.is_empty());
    for chunk_size in [1, 2, 17, 64, 122, 123, 1000] {
        let (issues, _) = scan(&grid, chunk_size);
        assert_eq!(issues, expected, "chunk_size = {chunk_size}");
    }
}

#[test]
fn chunk_size_invariance() {
    let grid = sample_grid(200);
    let (one, _) = scan(&grid, 1);
    let (seventeen, _) = scan(&grid, 17);
    let (whole, _) = scan(&grid, grid.len());
    assert_eq!(one, seventeen);
    assert_eq!(one, whole);
}

#[test]
fn progress_is_monotonic_and_ends_at_total() {
    let grid = sample_grid(100);
    for chunk_size in [1, 7, 17, 33, 100, 500] {
        let (_, updates) = scan(&grid, chunk_size);
        assert_eq!(updates.len(), grid.len().div_ceil(chunk_size));
        for pair in updates.windows(2) {
            assert!(pair[0].rows_processed < pair[1].rows_processed);
            assert!(pair[0].percent_complete <= pair[1].percent_complete);
        }
        let last = updates.last().unwrap();
        assert_eq!(last.rows_processed, grid.len());
        assert_eq!(last.percent_complete, 100);
        assert!(updates.iter().all(|p| p.rows_total == grid.len()));
    }
}

#[test]
fn scanning_is_deterministic_and_leaves_input_untouched() {
    let grid = sample_grid(50);
    let before = grid.clone();
    let scanner = ChunkedScanner::new(Whitelist::default(), 9).unwrap();
    let a = scanner.scan(&grid, |_| {});
    let b = scanner.scan(&grid, |_| {});
    assert_eq!(a, b);
    assert_eq!(grid, before);
}

#[test]
fn non_text_cells_never_violate_whatever_they_print_as() {
    let grid: Grid = vec![vec![CellValue::Number(1.0), CellValue::Bool(false), CellValue::Empty]; 10];
    let (issues, _) = scan(&grid, 3);
    assert!(issues.is_empty());
}

#[test]
fn custom_whitelist_changes_verdicts() {
    let grid: Grid = vec![vec!["<p>para</p>".into(), "<b>x</b>".into()]];
    let scanner = ChunkedScanner::new(Whitelist::new(["<p>", "</p>"]).unwrap(), 10).unwrap();
    let result = scanner.scan(&grid, |_| {});
    assert_eq!(result.issues, vec![Issue { row: 1, column: 2, content: "<b>x</b>".to_owned() }]);
}
