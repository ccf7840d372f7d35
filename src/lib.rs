// ==========================================
// 批量消息群发助手 - 核心库
// ==========================================
// 技术栈: Tauri + Rust + 外部发送后端
// 系统定位: 批量 WhatsApp/邮件发送的收件人数据工作台
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 解析层 - 表格文件导入
pub mod parser;

// 引擎层 - 表格状态/合并/匹配/报告/导出
pub mod engine;

// 配置层 - 客户端配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 发送校验/任务提交与轮询
pub mod api;

// 应用层 - Tauri 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{Attachment, Channel, FieldBinding, JobState, MatchPolicy, ParsedTable, Row};

// 解析
pub use parser::{parse_path, ParseError, ParseResult};

// 引擎
pub use engine::{
    analyze, combine, export_csv, match_rows, ColumnRegistry, MergePlan, MergeReport,
    WarningReport,
};

// API
pub use api::{
    build_payload, prepare_send, ApiError, ApiResult, HttpJobTransport, JobPayload, JobPoller,
    JobStatus, JobTransport, SendPreview, SenderProfile,
};

// 应用
pub use app::{AppState, ImportOutcome, SendSession};

// 配置
pub use config::ClientConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "批量消息群发助手";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
