// ==========================================
// 批量消息群发助手 - 解析层
// ==========================================
// 职责: 把单个原始文件解析为统一的 表头+数据行 模型
// 支持: CSV / TXT / XLS / XLSX
// ==========================================

pub mod delimited;
pub mod error;
pub mod spreadsheet;

pub use delimited::parse_delimited_text;
pub use error::{ParseError, ParseResult};
pub use spreadsheet::parse_spreadsheet;

use crate::domain::{ParsedTable, Row};
use std::path::Path;

// ==========================================
// 通用文件解析入口(按扩展名分发)
// ==========================================

/// 解析单个收件人数据文件
///
/// 扩展名决定解析器: csv/txt → 分隔文本, xls/xlsx → 电子表格;
/// 其余扩展名拒绝。文本按 UTF-8 宽松解码。
pub fn parse_path<P: AsRef<Path>>(path: P) -> ParseResult<ParsedTable> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ParseError::FileNotFound(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let (headers, rows) = match ext.as_str() {
        "csv" | "txt" => {
            let bytes = std::fs::read(path)?;
            let text = String::from_utf8_lossy(&bytes);
            parse_delimited_text(&text)
        }
        "xls" | "xlsx" => parse_spreadsheet(path)?,
        _ => return Err(ParseError::UnsupportedFormat(ext)),
    };

    tracing::debug!(
        file = %file_name,
        columns = headers.len(),
        rows = rows.len(),
        "文件解析完成"
    );

    Ok(ParsedTable::new(file_name, headers, rows))
}

// ==========================================
// 共享辅助: 表头检测与行对齐
// ==========================================

/// 表头行检测: 第一个列数 ≥2 且各列均非空的行
///
/// 这是唯一的表头判据, 不可放宽(全列非空), 否则带空列的
/// 残缺首行会被误认为表头。
pub(crate) fn detect_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter()
        .position(|cells| cells.len() >= 2 && cells.iter().all(|c| !c.is_empty()))
}

/// 把切分后的数据行按表头名对齐为 Row
///
/// 短行缺失的列补空串, 超出表头数的多余列丢弃。
pub(crate) fn zip_rows(headers: &[String], data: &[Vec<String>]) -> Vec<Row> {
    data.iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), cells.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_path_csv() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "Nome,Telefone").unwrap();
        writeln!(temp_file, "Ana,111").unwrap();
        writeln!(temp_file, "Bia,222").unwrap();

        let parsed = parse_path(temp_file.path()).unwrap();
        assert_eq!(parsed.headers, vec!["Nome", "Telefone"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("Nome").unwrap(), "Ana");
    }

    #[test]
    fn test_parse_path_unsupported_extension() {
        let temp_file = Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = parse_path(temp_file.path());
        assert!(matches!(result, Err(ParseError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_path_file_not_found() {
        let result = parse_path("nao_existe.csv");
        assert!(matches!(result, Err(ParseError::FileNotFound(_))));
    }

    #[test]
    fn test_detect_header_row_predicate() {
        let rows = vec![
            vec!["a".to_string(), "".to_string()],
            vec!["x".to_string()],
            vec!["Nome".to_string(), "Tel".to_string()],
        ];
        assert_eq!(detect_header_row(&rows), Some(2));

        let none = vec![vec!["solo".to_string()]];
        assert_eq!(detect_header_row(&none), None);
    }

    #[test]
    fn test_zip_rows_alignment() {
        let headers = vec!["a".to_string(), "b".to_string()];
        let data = vec![
            vec!["1".to_string()],
            vec!["2".to_string(), "3".to_string(), "extra".to_string()],
        ];
        let rows = zip_rows(&headers, &data);
        assert_eq!(rows[0].get("b").unwrap(), "");
        assert_eq!(rows[1].get("b").unwrap(), "3");
        assert_eq!(rows[1].len(), 2);
    }
}
