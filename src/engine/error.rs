// ==========================================
// 批量消息群发助手 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 所有错误均可恢复: 操作被拒绝, 表格保持不变
// ==========================================

use thiserror::Error;

/// 表格操作错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("列名不能为空")]
    EmptyName,

    #[error("已存在同名列: {0}")]
    DuplicateColumn(String),

    #[error("列不存在: {0}")]
    UnknownColumn(String),

    #[error("行索引越界: {index} (当前共 {len} 行)")]
    RowIndexOutOfBounds { index: usize, len: usize },

    #[error("未能解析出任何表头")]
    NoHeaders,
}

/// 多文件合并错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// 同批文件之间表头不一致, 整批中止, 不做部分导入
    #[error("文件表头不一致: 「{first}」与「{other}」的列不同, 请选择表头相同的文件一起导入")]
    IncompatibleHeaders { first: String, other: String },
}

/// Result 类型别名
pub type TableResult<T> = Result<T, TableError>;
