// ==========================================
// 批量消息群发助手 - 领域类型定义
// ==========================================
// 发送通道 / 附件匹配模式 / 任务状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 发送通道 (Channel)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Whatsapp, // WhatsApp 消息
    Email,    // 电子邮件
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Whatsapp => write!(f, "whatsapp"),
            Channel::Email => write!(f, "email"),
        }
    }
}

// ==========================================
// 附件匹配模式 (Match Policy)
// ==========================================
// 规则: 先对列值与文件名做归一化(见 engine::matcher)，再按模式比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    Equal,      // 完全相等
    Contains,   // 文件名包含列值
    StartsWith, // 文件名以列值开头
    EndsWith,   // 文件名以列值结尾
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::Contains
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Equal => write!(f, "equal"),
            MatchPolicy::Contains => write!(f, "contains"),
            MatchPolicy::StartsWith => write!(f, "starts_with"),
            MatchPolicy::EndsWith => write!(f, "ends_with"),
        }
    }
}

// ==========================================
// 任务状态 (Job State)
// ==========================================
// 与后端轮询接口一致: queued/running 为进行中, done/error 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Error,
}

impl JobState {
    /// 终态判定: 到达终态后轮询必须停止
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Running => write!(f, "running"),
            JobState::Done => write!(f, "done"),
            JobState::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_policy_wire_format() {
        assert_eq!(
            serde_json::to_string(&MatchPolicy::StartsWith).unwrap(),
            "\"starts_with\""
        );
        assert_eq!(
            serde_json::from_str::<MatchPolicy>("\"contains\"").unwrap(),
            MatchPolicy::Contains
        );
    }

    #[test]
    fn test_job_state_terminal() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Done.is_terminal());
        assert!(JobState::Error.is_terminal());
    }
}
