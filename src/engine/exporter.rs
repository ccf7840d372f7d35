// ==========================================
// 批量消息群发助手 - 收件人 CSV 导出
// ==========================================
// 格式: 逗号连接的表头行 + 每行全字段双引号包裹
// (内部引号加倍), 以 \n 连接
// ==========================================

use crate::domain::Row;
use anyhow::Context;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// 把表头与数据行导出为 CSV 文本
///
/// 数据字段一律加引号; 表头行按原样逗号连接。
/// 重新解析导出结果可还原 (headers, rows)。
pub fn export_csv(headers: &[String], rows: &[Row]) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(
                headers
                    .iter()
                    .map(|h| row.get(h).map(String::as_str).unwrap_or("")),
            )
            .context("写入 CSV 行失败")?;
    }

    let body = writer.into_inner().context("CSV 缓冲回收失败")?;
    let body = String::from_utf8(body).context("CSV 内容不是合法 UTF-8")?;

    let mut out = headers.join(",");
    let body = body.trim_end_matches('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
    }
    Ok(out)
}
