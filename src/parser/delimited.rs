// ==========================================
// 批量消息群发助手 - 分隔文本解析器
// ==========================================
// 支持: CSV / TXT (分隔符 ; TAB , 自动嗅探)
// 分隔符对整个文件只嗅探一次, 不逐行判断
// 字段切分为显式状态机, 支持标准 CSV 引号
// ==========================================

use crate::domain::Row;
use crate::parser::{detect_header_row, zip_rows};

/// 嗅探采样行数
const SNIFF_SAMPLE_LINES: usize = 5;

// ==========================================
// 分隔符嗅探
// ==========================================

/// 从前 5 个非空行嗅探分隔符: 优先 `;`, 其次 TAB, 默认 `,`
fn sniff_delimiter(lines: &[&str]) -> char {
    let sample = &lines[..lines.len().min(SNIFF_SAMPLE_LINES)];
    if sample.iter().any(|l| l.contains(';')) {
        ';'
    } else if sample.iter().any(|l| l.contains('\t')) {
        '\t'
    } else {
        ','
    }
}

// ==========================================
// 行切分状态机
// ==========================================

/// 按分隔符切分一行, 引号内的分隔符不切分
///
/// 双引号包裹的字段去掉外层引号, 内部的 `""` 还原为 `"`。
/// 每个字段切分后做 trim。
fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // 转义引号 ""
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            c => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

// ==========================================
// 分隔文本解析
// ==========================================

/// 解析分隔文本为表头 + 数据行
///
/// 1. 按 CR/LF 切行, 逐行 trim, 丢弃空行
/// 2. 嗅探分隔符(整个文件一个)
/// 3. 表头行 = 第一个列数 ≥2 且各列 trim 后均非空的行, 否则第 0 行
/// 4. 表头行之后的所有行为数据行, 短行按空串补齐
pub fn parse_delimited_text(text: &str) -> (Vec<String>, Vec<Row>) {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let delimiter = sniff_delimiter(&lines);

    let split: Vec<Vec<String>> = lines.iter().map(|l| split_line(l, delimiter)).collect();
    let header_idx = detect_header_row(&split).unwrap_or(0);

    let headers = split[header_idx].clone();
    let rows = zip_rows(&headers, &split[header_idx + 1..]);
    (headers, rows)
}
