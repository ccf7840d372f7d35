// ==========================================
// 批量消息群发助手 - 多文件导入合并
// ==========================================
// 职责: 校验同批文件表头兼容性, 决定 采纳/追加/冲突
// 表头比较: 忽略大小写与首尾空白的逐位置相等
// ==========================================

use crate::domain::{ParsedTable, Row};
use crate::engine::error::ReconcileError;

// ==========================================
// 表头比较
// ==========================================

/// 表头兼容判定: 长度相同且逐位置 trim+小写后相等
///
/// 注意是位置比较: 列顺序不同即不兼容, 即使列集合相同。
pub fn headers_equal(a: &[String], b: &[String]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.trim().to_lowercase() == y.trim().to_lowercase())
}

// ==========================================
// 合并计划
// ==========================================

/// 合并决定, 由 ColumnRegistry 原子地应用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// 没有文件, 无操作
    NoOp,
    /// 当前表无表头(或无数据且表头不同): 采纳新表头与数据
    Adopt {
        headers: Vec<String>,
        rows: Vec<Row>,
    },
    /// 表头兼容: 追加数据行
    Append { rows: Vec<Row> },
    /// 与现有数据的表头冲突: 需要用户明确选择 替换/中止 (默认中止)
    Conflict {
        headers: Vec<String>,
        rows: Vec<Row>,
    },
}

// ==========================================
// 合并决策
// ==========================================

/// 把一批解析结果与当前表格状态合并为一个计划
///
/// 1. 空批 → NoOp
/// 2. 批内任意文件与首个文件表头不兼容 → IncompatibleHeaders, 无任何变更
/// 3. 当前表已有数据且表头不兼容 → Conflict, 等待用户决定
/// 4. 其余情况: 无表头则采纳, 否则追加(保持文件顺序与行顺序)
pub fn combine(
    files: &[ParsedTable],
    current_headers: &[String],
    current_row_count: usize,
) -> Result<MergePlan, ReconcileError> {
    let Some(first) = files.first() else {
        return Ok(MergePlan::NoOp);
    };

    for other in &files[1..] {
        if !headers_equal(&other.headers, &first.headers) {
            return Err(ReconcileError::IncompatibleHeaders {
                first: first.name.clone(),
                other: other.name.clone(),
            });
        }
    }

    let incoming_headers = first.headers.clone();
    let incoming_rows: Vec<Row> = files.iter().flat_map(|f| f.rows.iter().cloned()).collect();

    if current_headers.is_empty() {
        return Ok(MergePlan::Adopt {
            headers: incoming_headers,
            rows: incoming_rows,
        });
    }

    if !headers_equal(current_headers, &incoming_headers) {
        // 没有数据行时替换表头不丢失任何内容, 直接采纳
        if current_row_count == 0 {
            return Ok(MergePlan::Adopt {
                headers: incoming_headers,
                rows: incoming_rows,
            });
        }
        return Ok(MergePlan::Conflict {
            headers: incoming_headers,
            rows: incoming_rows,
        });
    }

    Ok(MergePlan::Append {
        rows: incoming_rows,
    })
}
