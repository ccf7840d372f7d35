// ==========================================
// 批量消息群发助手 - 附件匹配引擎
// ==========================================
// 职责: 把每一行的文件引用值与已上传附件名对账
// 归一化: trim → 去前导标记符 → trim → 去一个已知扩展名 → 小写
// ==========================================

use crate::domain::{MatchPolicy, Row};
use serde::Serialize;

/// 归一化时剥离的已知扩展名(只剥离一次, 不区分大小写)
const KNOWN_EXTENSIONS: [&str; 11] = [
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".docx", ".doc", ".xlsx", ".xls", ".zip", ".txt",
];

/// 列表项前导标记字符(与空白一起作为前导串剥离)
const LEADING_MARKERS: [char; 5] = ['-', '→', '>', '»', '•'];

// ==========================================
// 文件名归一化
// ==========================================

/// 归一化文件引用值/附件名, 用于所有匹配比较
pub fn normalize_file_reference(name: &str) -> String {
    let s = name.trim();
    let s = s.trim_start_matches(|c: char| c.is_whitespace() || LEADING_MARKERS.contains(&c));
    let mut s = s.trim().to_lowercase();
    for ext in KNOWN_EXTENSIONS {
        if let Some(stripped) = s.strip_suffix(ext) {
            s = stripped.to_string();
            break;
        }
    }
    s
}

// ==========================================
// 匹配模式应用
// ==========================================

/// 在归一化后的值与文件名之间应用匹配模式
fn policy_matches(policy: MatchPolicy, norm_value: &str, norm_file: &str) -> bool {
    match policy {
        MatchPolicy::Equal => norm_value == norm_file,
        MatchPolicy::Contains => norm_file.contains(norm_value),
        MatchPolicy::StartsWith => norm_file.starts_with(norm_value),
        MatchPolicy::EndsWith => norm_file.ends_with(norm_value),
    }
}

// ==========================================
// 逐行匹配
// ==========================================

/// 单行的匹配结果
#[derive(Debug, Clone, Serialize)]
pub struct RowMatch {
    /// 行索引(0 起)
    pub row_index: usize,
    /// 联系标签: 联系列的值, 为空时合成 "第N行"
    pub contact: String,
    /// 文件引用原始值(trim 后); 全员附件模式下为 None
    pub file_reference: Option<String>,
    /// 满足匹配模式的附件名(零/一/多个)
    pub matched: Vec<String>,
}

/// 计算每一行匹配到的附件集合
///
/// `file_column` 为 None 时进入全员附件模式: 每行匹配全部附件,
/// 不做归一化也不应用匹配模式。
pub fn match_rows(
    rows: &[Row],
    contact_column: &str,
    file_column: Option<&str>,
    attachment_names: &[String],
    policy: MatchPolicy,
) -> Vec<RowMatch> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let contact = row
                .get(contact_column)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("第{}行", index + 1));

            let Some(file_column) = file_column else {
                return RowMatch {
                    row_index: index,
                    contact,
                    file_reference: None,
                    matched: attachment_names.to_vec(),
                };
            };

            let reference = row
                .get(file_column)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();

            let matched = if reference.is_empty() {
                Vec::new()
            } else {
                let norm_value = normalize_file_reference(&reference);
                attachment_names
                    .iter()
                    .filter(|name| {
                        policy_matches(policy, &norm_value, &normalize_file_reference(name))
                    })
                    .cloned()
                    .collect()
            };

            RowMatch {
                row_index: index,
                contact,
                file_reference: Some(reference),
                matched,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_strips_markers_extension_and_case() {
        assert_eq!(normalize_file_reference("  Fatura.PDF "), "fatura");
        assert_eq!(normalize_file_reference("- fatura_2.pdf"), "fatura_2");
        assert_eq!(normalize_file_reference("→ » Nota.XLSX"), "nota");
        assert_eq!(normalize_file_reference("• contrato"), "contrato");
        // 只剥离一个扩展名
        assert_eq!(normalize_file_reference("backup.zip.zip"), "backup.zip");
        // 未知扩展名保留
        assert_eq!(normalize_file_reference("video.mp4"), "video.mp4");
    }

    #[test]
    fn test_contains_policy_matches_prefixed_files() {
        let rows = vec![row(&[("Nome", "Ana"), ("Arquivo", "fatura")])];
        let atts = names(&["fatura.pdf", "fatura_2.pdf", "nota.pdf"]);
        let matches = match_rows(&rows, "Nome", Some("Arquivo"), &atts, MatchPolicy::Contains);
        assert_eq!(matches[0].matched, vec!["fatura.pdf", "fatura_2.pdf"]);
    }

    #[test]
    fn test_equal_policy_is_case_and_extension_insensitive() {
        let rows = vec![row(&[("Nome", "Ana"), ("Arquivo", "Fatura.PDF")])];
        let atts = names(&["fatura.pdf"]);
        let matches = match_rows(&rows, "Nome", Some("Arquivo"), &atts, MatchPolicy::Equal);
        assert_eq!(matches[0].matched, vec!["fatura.pdf"]);
    }

    #[test]
    fn test_starts_with_and_ends_with() {
        let rows = vec![row(&[("Nome", "Ana"), ("Arquivo", "fatura")])];
        let atts = names(&["fatura_jan.pdf", "resumo_fatura.pdf"]);
        let starts = match_rows(
            &rows,
            "Nome",
            Some("Arquivo"),
            &atts,
            MatchPolicy::StartsWith,
        );
        assert_eq!(starts[0].matched, vec!["fatura_jan.pdf"]);
        let ends = match_rows(&rows, "Nome", Some("Arquivo"), &atts, MatchPolicy::EndsWith);
        assert_eq!(ends[0].matched, vec!["resumo_fatura.pdf"]);
    }

    #[test]
    fn test_empty_reference_matches_nothing() {
        let rows = vec![row(&[("Nome", "Ana"), ("Arquivo", "  ")])];
        let atts = names(&["fatura.pdf"]);
        let matches = match_rows(&rows, "Nome", Some("Arquivo"), &atts, MatchPolicy::Contains);
        assert!(matches[0].matched.is_empty());
        assert_eq!(matches[0].file_reference.as_deref(), Some(""));
    }

    #[test]
    fn test_attach_to_all_matches_everything() {
        let rows = vec![
            row(&[("Nome", "Ana")]),
            row(&[("Nome", "")]),
        ];
        let atts = names(&["a.pdf", "b.pdf"]);
        let matches = match_rows(&rows, "Nome", None, &atts, MatchPolicy::Contains);
        assert_eq!(matches[0].matched, atts);
        assert_eq!(matches[1].matched, atts);
        assert_eq!(matches[0].file_reference, None);
        // 联系值为空 → 合成标签
        assert_eq!(matches[1].contact, "第2行");
    }
}
