// ==========================================
// 批量消息群发助手 - 电子表格解析器
// ==========================================
// 支持: Excel (.xlsx/.xls), 仅读取第一个工作表
// 表头检测与补齐规则同分隔文本解析器
// ==========================================

use crate::domain::Row;
use crate::parser::error::ParseError;
use crate::parser::{detect_header_row, zip_rows};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;

/// 解析电子表格第一个工作表为表头 + 数据行
///
/// 单元格统一转为字符串并 trim, 空单元格为空串;
/// 全空的数据行在补齐之前丢弃。
pub fn parse_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<Row>), ParseError> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(ParseError::SpreadsheetError("文件无工作表".to_string()));
    }
    let sheet_name = sheet_names[0].clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ParseError::SpreadsheetError(e.to_string()))?;

    // 按行展开为字符串矩阵
    let matrix: Vec<Vec<String>> = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect()
        })
        .collect();

    Ok(matrix_to_table(matrix))
}

/// 把字符串矩阵规整为表头 + 数据行
///
/// 表头检测同分隔文本解析器; 全空的数据行在补齐之前丢弃。
pub(crate) fn matrix_to_table(matrix: Vec<Vec<String>>) -> (Vec<String>, Vec<Row>) {
    if matrix.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let header_idx = detect_header_row(&matrix).unwrap_or(0);
    let headers = matrix[header_idx].clone();

    // 丢弃全空行后再按表头补齐
    let data: Vec<Vec<String>> = matrix[header_idx + 1..]
        .iter()
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .cloned()
        .collect();

    let rows = zip_rows(&headers, &data);
    (headers, rows)
}
