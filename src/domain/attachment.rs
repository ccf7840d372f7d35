// ==========================================
// 批量消息群发助手 - 附件领域模型
// ==========================================
// 附件以文件名为身份: 同名再次加入时替换旧附件
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ==========================================
// 附件 (Attachment)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// 文件名(去重身份)
    pub name: String,
    /// 字节数
    pub size: u64,
    /// 磁盘路径, 提交任务时才读取内容
    pub path: PathBuf,
}

impl Attachment {
    pub fn new(name: impl Into<String>, size: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            path: path.into(),
        }
    }
}

// ==========================================
// 字节数格式化
// ==========================================

/// 人类可读的文件大小(最多两位小数, 去除尾随零)
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let exp = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_bytes(5_368_709_120), "5 GB");
    }
}
