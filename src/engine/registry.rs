// ==========================================
// 批量消息群发助手 - 列注册表(权威表格状态)
// ==========================================
// 职责: 表头/数据行/列绑定/分页 的唯一可变入口
// 不变式: 每行与表头结构对齐; 绑定永不指向死列
// ==========================================

mod core;


pub use core::{ColumnRegistry, MergeReport, DEFAULT_PAGE_SIZE};
