// ==========================================
// 批量消息群发助手 - 后端接口数据结构
// ==========================================
// 任务提交 payload 与轮询状态的线格式
// 后端本身是外部协作方, items 内容不在本系统约定范围内
// ==========================================

use crate::domain::{Channel, JobState, MatchPolicy, Row};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// 任务提交 payload (multipart 的 JSON 字段)
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct JobPayload {
    pub channel: Channel,
    pub message: String,
    pub rows: Vec<Row>,
    pub contact_column: String,
    /// 未指定文件列时为 null(全员附件模式)
    pub file_column: Option<String>,
    pub attach_to_all: bool,
    pub match_mode: MatchPolicy,

    // 通道相关的可选字段, 缺省时不出现在 JSON 中
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_names: Option<Vec<String>>,
}

// ==========================================
// 任务提交响应
// ==========================================
#[derive(Debug, Clone, Deserialize)]
pub struct JobSubmitResponse {
    pub job_id: String,
}

// ==========================================
// 任务轮询状态
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failed: u64,
    /// 每个收件人的发送明细, 结构由后端定义
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 带拉取时间的状态快照(供进度界面展示)
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub status: JobStatus,
}

impl JobSnapshot {
    pub fn now(status: JobStatus) -> Self {
        Self {
            fetched_at: Utc::now(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_payload_omits_absent_optional_fields() {
        let payload = JobPayload {
            channel: Channel::Whatsapp,
            message: "oi {Nome}".to_string(),
            rows: vec![HashMap::from([("Nome".to_string(), "Ana".to_string())])],
            contact_column: "Telefone".to_string(),
            file_column: None,
            attach_to_all: true,
            match_mode: MatchPolicy::Contains,
            subject: None,
            email_sender: None,
            app_password: None,
            phone_number: Some("+5511999".to_string()),
            attachment_names: None,
        };
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["channel"], "whatsapp");
        assert_eq!(json["attach_to_all"], true);
        // file_column 总是出现(null), 其余可选字段缺省时不出现
        assert!(json["file_column"].is_null());
        assert!(json.get("subject").is_none());
        assert!(json.get("email_sender").is_none());
        assert_eq!(json["phone_number"], "+5511999");
        assert_eq!(json["match_mode"], "contains");
    }

    #[test]
    fn test_job_status_tolerates_missing_counters() {
        let status: JobStatus = serde_json::from_str(r#"{"state":"running"}"#).unwrap();
        assert_eq!(status.state, JobState::Running);
        assert_eq!(status.total, 0);
        assert!(status.items.is_empty());
        assert_eq!(status.error, None);
    }
}
