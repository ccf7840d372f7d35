// ==========================================
// 批量消息群发助手 - 发送前置校验与 payload 组装
// ==========================================
// 职责: 硬性前置校验 → 差异报告 → 任务 payload
// 报告每次发送尝试都从当前状态全量重算
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::payload::JobPayload;
use crate::domain::{Attachment, Channel, MatchPolicy};
use crate::engine::registry::ColumnRegistry;
use crate::engine::warnings::WarningReport;
use crate::engine::{analyze, match_rows};
use serde::Serialize;

// ==========================================
// 发送预览
// ==========================================

/// 发送前预览: 差异报告 + 需用户确认的软性提醒
#[derive(Debug, Clone, Serialize)]
pub struct SendPreview {
    /// 本次使用的联系列
    pub contact_column: String,
    /// 联系值为空的行数(软性提醒, 用户可选择继续)
    pub rows_missing_contact: usize,
    /// 邮件通道下主题为空(软性提醒)
    pub subject_empty: bool,
    /// 附件差异报告
    pub report: WarningReport,
}

impl SendPreview {
    /// 是否允许继续发送: 仅 missing_files_for_recipients 非空时拒绝
    pub fn can_continue(&self) -> bool {
        !self.report.blocks_send()
    }
}

// ==========================================
// 发送人/凭据输入
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SenderProfile {
    /// WhatsApp 号码或发件人邮箱(随通道而定)
    pub sender_id: String,
    /// 邮箱应用专用密码(仅 Email 通道)
    pub app_password: String,
    /// 邮件主题(仅 Email 通道)
    pub subject: String,
}

// ==========================================
// 前置校验 + 报告派生
// ==========================================

/// 发送前置校验, 通过后派生完整差异报告
///
/// 硬性校验(任一失败立即拒绝): 有收件人 / 联系列已选 /
/// 发送人已填 / Email 通道已填应用密码。
/// 软性提醒(进入预览由用户确认): 缺联系值的行数、空主题。
pub fn prepare_send(
    registry: &ColumnRegistry,
    attachments: &[Attachment],
    channel: Channel,
    policy: MatchPolicy,
    sender: &SenderProfile,
) -> ApiResult<SendPreview> {
    if registry.rows().is_empty() {
        return Err(ApiError::NoRecipients);
    }

    let contact_column = registry
        .binding()
        .contact_column(channel)
        .ok_or(ApiError::MissingContactColumn(channel))?
        .to_string();

    if sender.sender_id.trim().is_empty() {
        return Err(ApiError::MissingSender(channel));
    }
    if channel == Channel::Email && sender.app_password.trim().is_empty() {
        return Err(ApiError::MissingAppPassword);
    }

    let rows_missing_contact = registry
        .rows()
        .iter()
        .filter(|row| {
            row.get(&contact_column)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .count();

    let attachment_names: Vec<String> = attachments.iter().map(|a| a.name.clone()).collect();
    let file_column = registry.binding().file_column.clone();
    let matches = match_rows(
        registry.rows(),
        &contact_column,
        file_column.as_deref(),
        &attachment_names,
        policy,
    );
    let report = analyze(&matches, &attachment_names, file_column.is_none());

    tracing::info!(
        rows = registry.rows().len(),
        attachments = attachment_names.len(),
        missing = report.missing_files_for_recipients.len(),
        unused = report.unused_files.len(),
        bulk_warning = report.bulk_warning,
        "发送差异报告已生成"
    );

    Ok(SendPreview {
        contact_column,
        rows_missing_contact,
        subject_empty: channel == Channel::Email && sender.subject.trim().is_empty(),
        report,
    })
}

// ==========================================
// payload 组装
// ==========================================

/// 组装任务提交 payload
///
/// 差异报告阻断时拒绝组装(调用方应先让用户解决缺失引用)。
pub fn build_payload(
    registry: &ColumnRegistry,
    attachments: &[Attachment],
    channel: Channel,
    policy: MatchPolicy,
    message: &str,
    sender: &SenderProfile,
    preview: &SendPreview,
) -> ApiResult<JobPayload> {
    if !preview.can_continue() {
        return Err(ApiError::SendBlocked(
            preview.report.missing_files_for_recipients.len(),
        ));
    }

    let file_column = registry.binding().file_column.clone();
    let attachment_names: Option<Vec<String>> = if attachments.is_empty() {
        None
    } else {
        Some(attachments.iter().map(|a| a.name.clone()).collect())
    };

    let (subject, email_sender, app_password, phone_number) = match channel {
        Channel::Email => (
            Some(sender.subject.clone()),
            Some(sender.sender_id.clone()),
            Some(sender.app_password.clone()),
            None,
        ),
        Channel::Whatsapp => (None, None, None, Some(sender.sender_id.clone())),
    };

    Ok(JobPayload {
        channel,
        message: message.to_string(),
        rows: registry.rows().to_vec(),
        contact_column: preview.contact_column.clone(),
        attach_to_all: file_column.is_none(),
        file_column,
        match_mode: policy,
        subject,
        email_sender,
        app_password,
        phone_number,
        attachment_names,
    })
}
