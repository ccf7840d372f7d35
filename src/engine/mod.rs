// ==========================================
// 批量消息群发助手 - 引擎层
// ==========================================
// 职责: 表格状态管理 / 多文件合并 / 附件匹配 / 差异报告 / 导出
// ==========================================

pub mod error;
pub mod exporter;
pub mod matcher;
pub mod reconciler;
pub mod registry;
pub mod warnings;

// 重导出核心类型
pub use error::{ReconcileError, TableError, TableResult};
pub use exporter::export_csv;
pub use matcher::{match_rows, normalize_file_reference, RowMatch};
pub use reconciler::{combine, headers_equal, MergePlan};
pub use registry::{ColumnRegistry, MergeReport, DEFAULT_PAGE_SIZE};
pub use warnings::{analyze, WarningReport};
