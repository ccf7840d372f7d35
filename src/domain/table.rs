// ==========================================
// 批量消息群发助手 - 表格领域模型
// ==========================================
// Row: 列名 → 单元格值, 键集合与当前表头严格对齐
// ParsedTable: 单个文件的解析结果
// FieldBinding: 三个指向活动表头的可选列绑定
// ==========================================

use crate::domain::types::Channel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 数据行: 列名到字符串值的映射
///
/// 不变式: 每一行都为当前每个表头携带一个键(值可为空串)。
/// 该对齐由 ColumnRegistry 的变更操作统一维护。
pub type Row = HashMap<String, String>;

// ==========================================
// 单文件解析结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    /// 来源文件名(用于错误提示)
    pub name: String,
    /// 表头(有序, 去重后)
    pub headers: Vec<String>,
    /// 数据行(已与表头对齐)
    pub rows: Vec<Row>,
}

impl ParsedTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }
}

// ==========================================
// 列绑定 (Field Binding)
// ==========================================
// 不变式: 绑定永不指向已不存在的表头。
// 列被删除时绑定清空, 列被重命名时绑定随之迁移。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldBinding {
    /// 电话号码列(WhatsApp 通道联系列)
    pub phone_column: Option<String>,
    /// 邮箱列(Email 通道联系列)
    pub email_column: Option<String>,
    /// 附件文件名列(未设置时为"全员附件"模式)
    pub file_column: Option<String>,
}

impl FieldBinding {
    /// 当前通道对应的联系列
    pub fn contact_column(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Whatsapp => self.phone_column.as_deref(),
            Channel::Email => self.email_column.as_deref(),
        }
    }

    /// 列删除后清空指向该列的绑定
    pub fn on_column_removed(&mut self, name: &str) {
        for slot in [
            &mut self.phone_column,
            &mut self.email_column,
            &mut self.file_column,
        ] {
            if slot.as_deref() == Some(name) {
                *slot = None;
            }
        }
    }

    /// 表头整体替换后, 清空不再指向活动表头的绑定
    pub fn retain_live(&mut self, headers: &[String]) {
        for slot in [
            &mut self.phone_column,
            &mut self.email_column,
            &mut self.file_column,
        ] {
            if let Some(name) = slot.as_deref() {
                if !headers.iter().any(|h| h == name) {
                    *slot = None;
                }
            }
        }
    }

    /// 列重命名后迁移指向该列的绑定
    pub fn on_column_renamed(&mut self, old_name: &str, new_name: &str) {
        for slot in [
            &mut self.phone_column,
            &mut self.email_column,
            &mut self.file_column,
        ] {
            if slot.as_deref() == Some(old_name) {
                *slot = Some(new_name.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_cleared_on_remove() {
        let mut binding = FieldBinding {
            phone_column: Some("Telefone".to_string()),
            email_column: Some("Email".to_string()),
            file_column: Some("Telefone".to_string()),
        };
        binding.on_column_removed("Telefone");
        assert_eq!(binding.phone_column, None);
        assert_eq!(binding.file_column, None);
        assert_eq!(binding.email_column.as_deref(), Some("Email"));
    }

    #[test]
    fn test_binding_follows_rename() {
        let mut binding = FieldBinding {
            phone_column: Some("Tel".to_string()),
            email_column: None,
            file_column: None,
        };
        binding.on_column_renamed("Tel", "手机号");
        assert_eq!(binding.phone_column.as_deref(), Some("手机号"));
    }
}
