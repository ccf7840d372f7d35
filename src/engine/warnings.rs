// ==========================================
// 批量消息群发助手 - 发送前差异报告
// ==========================================
// 职责: 从逐行匹配结果派生警告/预览报告
// 报告是只读快照: 每次发送前全量重算, 从不增量修补
// ==========================================

use crate::engine::matcher::{normalize_file_reference, RowMatch};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// 全员附件模式的批量预警阈值: 行数超过该值且附件多于一个
const BULK_ROW_THRESHOLD: usize = 10;

// ==========================================
// 报告条目
// ==========================================

/// 收件人引用(行索引 + 联系标签)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientRef {
    pub index: usize,
    pub contact: String,
}

/// 引用了文件但一个附件都没匹配到的行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFileRef {
    pub index: usize,
    /// 该行的文件引用原始值
    pub file_reference: String,
}

/// 匹配到多个附件的收件人
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiAttachmentRecipient {
    pub index: usize,
    pub contact: String,
    pub attachments: Vec<String>,
}

/// 被多个收件人匹配到的附件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedAttachment {
    pub file_name: String,
    pub recipients: Vec<RecipientRef>,
}

/// 每行的附件预览条目(无论是否有警告都完整列出)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewEntry {
    pub index: usize,
    pub contact: String,
    pub attachments: Vec<String>,
}

// ==========================================
// 差异报告
// ==========================================

/// 发送前差异/预览报告(派生快照, 非权威状态)
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarningReport {
    /// 没有被任何行匹配到的附件(全员附件模式下恒为空)
    pub unused_files: Vec<String>,
    /// 文件引用值为空的行
    pub recipients_without_file: Vec<RecipientRef>,
    /// 引用了文件但匹配结果为空的行 —— 唯一的发送阻断条件
    pub missing_files_for_recipients: Vec<MissingFileRef>,
    /// 匹配到多个附件的行
    pub recipients_with_multiple_attachments: Vec<MultiAttachmentRecipient>,
    /// 被多行共享的附件
    pub attachments_sent_to_multiple: Vec<SharedAttachment>,
    /// 全量预览
    pub attachment_preview: Vec<PreviewEntry>,
    /// 全员附件模式的大流量预警
    pub bulk_warning: bool,
}

impl WarningReport {
    /// 发送是否被阻断: 存在未解决的文件引用时必须拒绝继续
    pub fn blocks_send(&self) -> bool {
        !self.missing_files_for_recipients.is_empty()
    }
}

// ==========================================
// 报告派生
// ==========================================

/// 从逐行匹配结果派生差异报告
pub fn analyze(matches: &[RowMatch], attachment_names: &[String], attach_to_all: bool) -> WarningReport {
    let mut report = WarningReport {
        attachment_preview: matches
            .iter()
            .map(|m| PreviewEntry {
                index: m.row_index,
                contact: m.contact.clone(),
                attachments: m.matched.clone(),
            })
            .collect(),
        ..WarningReport::default()
    };

    if attach_to_all {
        report.bulk_warning =
            attachment_names.len() > 1 && matches.len() > BULK_ROW_THRESHOLD;
        return report;
    }

    // 被至少一行匹配到的附件(归一化名)
    let mut used: HashSet<String> = HashSet::new();
    // 附件名 → 匹配到它的收件人
    let mut per_attachment: HashMap<&str, Vec<RecipientRef>> = HashMap::new();

    for m in matches {
        let reference = m.file_reference.as_deref().unwrap_or("");
        if reference.is_empty() {
            report.recipients_without_file.push(RecipientRef {
                index: m.row_index,
                contact: m.contact.clone(),
            });
            continue;
        }

        if m.matched.is_empty() {
            report.missing_files_for_recipients.push(MissingFileRef {
                index: m.row_index,
                file_reference: reference.to_string(),
            });
            continue;
        }

        if m.matched.len() > 1 {
            report
                .recipients_with_multiple_attachments
                .push(MultiAttachmentRecipient {
                    index: m.row_index,
                    contact: m.contact.clone(),
                    attachments: m.matched.clone(),
                });
        }

        for name in &m.matched {
            used.insert(normalize_file_reference(name));
            per_attachment
                .entry(name.as_str())
                .or_default()
                .push(RecipientRef {
                    index: m.row_index,
                    contact: m.contact.clone(),
                });
        }
    }

    report.unused_files = attachment_names
        .iter()
        .filter(|name| !used.contains(&normalize_file_reference(name)))
        .cloned()
        .collect();

    // 按附件集合的原始顺序输出, 保证报告稳定
    report.attachments_sent_to_multiple = attachment_names
        .iter()
        .filter_map(|name| {
            per_attachment
                .get(name.as_str())
                .filter(|recipients| recipients.len() > 1)
                .map(|recipients| SharedAttachment {
                    file_name: name.clone(),
                    recipients: recipients.clone(),
                })
        })
        .collect();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchPolicy;
    use crate::engine::matcher::match_rows;
    use crate::domain::Row;
    use std::collections::HashMap as Map;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Map<_, _>>()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn report_for(rows: &[Row], atts: &[&str], policy: MatchPolicy) -> WarningReport {
        let atts = names(atts);
        let matches = match_rows(rows, "Nome", Some("Arquivo"), &atts, policy);
        analyze(&matches, &atts, false)
    }

    #[test]
    fn test_empty_reference_lands_in_without_file_never_missing() {
        let rows = vec![
            row(&[("Nome", "Ana"), ("Arquivo", "")]),
            row(&[("Nome", "Bia"), ("Arquivo", "inexistente")]),
        ];
        let report = report_for(&rows, &["fatura.pdf"], MatchPolicy::Contains);
        assert_eq!(report.recipients_without_file.len(), 1);
        assert_eq!(report.recipients_without_file[0].index, 0);
        assert_eq!(report.missing_files_for_recipients.len(), 1);
        assert_eq!(report.missing_files_for_recipients[0].index, 1);
        assert_eq!(
            report.missing_files_for_recipients[0].file_reference,
            "inexistente"
        );
        assert!(report.blocks_send());
    }

    #[test]
    fn test_unused_files_by_normalized_name() {
        let rows = vec![row(&[("Nome", "Ana"), ("Arquivo", "fatura")])];
        let report = report_for(&rows, &["Fatura.PDF", "nota.pdf"], MatchPolicy::Equal);
        assert_eq!(report.unused_files, vec!["nota.pdf"]);
        assert!(!report.blocks_send());
    }

    #[test]
    fn test_multi_attachment_recipient_reported() {
        let rows = vec![row(&[("Nome", "Ana"), ("Arquivo", "fatura")])];
        let report = report_for(
            &rows,
            &["fatura.pdf", "fatura_2.pdf"],
            MatchPolicy::Contains,
        );
        assert_eq!(report.recipients_with_multiple_attachments.len(), 1);
        assert_eq!(
            report.recipients_with_multiple_attachments[0].attachments,
            vec!["fatura.pdf", "fatura_2.pdf"]
        );
    }

    #[test]
    fn test_shared_attachment_lists_all_recipients() {
        let rows = vec![
            row(&[("Nome", "Ana"), ("Arquivo", "fatura")]),
            row(&[("Nome", "Bia"), ("Arquivo", "fatura")]),
        ];
        let report = report_for(&rows, &["fatura.pdf"], MatchPolicy::Contains);
        assert_eq!(report.attachments_sent_to_multiple.len(), 1);
        let shared = &report.attachments_sent_to_multiple[0];
        assert_eq!(shared.file_name, "fatura.pdf");
        assert_eq!(shared.recipients.len(), 2);
        assert_eq!(shared.recipients[0].contact, "Ana");
        assert_eq!(shared.recipients[1].contact, "Bia");
    }

    #[test]
    fn test_preview_covers_every_row() {
        let rows = vec![
            row(&[("Nome", "Ana"), ("Arquivo", "")]),
            row(&[("Nome", "Bia"), ("Arquivo", "fatura")]),
        ];
        let report = report_for(&rows, &["fatura.pdf"], MatchPolicy::Contains);
        assert_eq!(report.attachment_preview.len(), 2);
        assert!(report.attachment_preview[0].attachments.is_empty());
        assert_eq!(report.attachment_preview[1].attachments, vec!["fatura.pdf"]);
    }

    // ==========================================
    // 批量预警边界 (严格大于)
    // ==========================================

    fn attach_to_all_report(n_rows: usize, n_atts: usize) -> WarningReport {
        let rows: Vec<Row> = (0..n_rows)
            .map(|i| row(&[("Nome", format!("p{}", i).as_str())]))
            .collect();
        let atts: Vec<String> = (0..n_atts).map(|i| format!("a{}.pdf", i)).collect();
        let matches = match_rows(&rows, "Nome", None, &atts, MatchPolicy::Contains);
        analyze(&matches, &atts, true)
    }

    #[test]
    fn test_bulk_warning_boundaries() {
        assert!(attach_to_all_report(11, 2).bulk_warning);
        assert!(!attach_to_all_report(100, 1).bulk_warning);
        assert!(!attach_to_all_report(10, 2).bulk_warning);
    }

    #[test]
    fn test_attach_to_all_has_no_file_warnings() {
        let report = attach_to_all_report(11, 2);
        assert!(report.unused_files.is_empty());
        assert!(report.recipients_without_file.is_empty());
        assert!(report.missing_files_for_recipients.is_empty());
        assert!(!report.blocks_send());
        assert_eq!(report.attachment_preview.len(), 11);
        assert_eq!(report.attachment_preview[0].attachments.len(), 2);
    }
}
