// ==========================================
// 批量消息群发助手 - API层错误类型
// ==========================================
// 职责: 汇聚解析/引擎错误, 定义发送前置校验与网络错误
// 所有错误都是用户可见消息, 均可恢复
// ==========================================

use crate::domain::Channel;
use crate::engine::error::{ReconcileError, TableError};
use crate::parser::error::ParseError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 发送前置校验
    // ==========================================
    #[error("没有收件人数据, 请先导入或手动创建")]
    NoRecipients,

    #[error("尚未选择发送通道")]
    MissingChannel,

    #[error("发送前请先选择{}列", contact_label(.0))]
    MissingContactColumn(Channel),

    #[error("请先填写{}", sender_label(.0))]
    MissingSender(Channel),

    #[error("发送邮件需要填写邮箱应用专用密码")]
    MissingAppPassword,

    /// 唯一的硬性阻断: 存在引用了文件却没匹配到附件的收件人
    #[error("有 {0} 位收件人引用的附件未找到, 请补充附件、调整匹配模式或修改引用后重试")]
    SendBlocked(usize),

    // ==========================================
    // 导入/表格错误
    // ==========================================
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    // ==========================================
    // 网络/后端错误
    // ==========================================
    #[error("附件读取失败: {name}: {message}")]
    AttachmentRead { name: String, message: String },

    #[error("网络请求失败: {0}")]
    Http(String),

    #[error("后端返回错误: status={status}, body={body}")]
    Backend { status: u16, body: String },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("序列化失败: {0}")]
    Serialization(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

fn contact_label(channel: &Channel) -> &'static str {
    match channel {
        Channel::Whatsapp => "电话号码",
        Channel::Email => "邮箱",
    }
}

fn sender_label(channel: &Channel) -> &'static str {
    match channel {
        Channel::Whatsapp => "发送方 WhatsApp 号码",
        Channel::Email => "发件人邮箱",
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
