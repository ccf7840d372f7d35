// ==========================================
// 批量消息群发助手 - 解析层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 任一文件解析失败都会中止整批导入, 不做部分采纳
// ==========================================

use thiserror::Error;

/// 解析层错误类型
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.txt/.xls/.xlsx）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("表格文件解析失败: {0}")]
    SpreadsheetError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::FileReadError(err.to_string())
    }
}

impl From<calamine::Error> for ParseError {
    fn from(err: calamine::Error) -> Self {
        ParseError::SpreadsheetError(err.to_string())
    }
}

/// Result 类型别名
pub type ParseResult<T> = Result<T, ParseError>;
