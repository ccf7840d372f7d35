// ==========================================
// 批量消息群发助手 - 领域层
// ==========================================
// 职责: 核心数据模型(表格/附件/类型)
// ==========================================

pub mod attachment;
pub mod table;
pub mod types;

// 重导出核心类型
pub use attachment::{format_bytes, Attachment};
pub use table::{FieldBinding, ParsedTable, Row};
pub use types::{Channel, JobState, MatchPolicy};
