// ==========================================
// 批量消息群发助手 - 列注册表实现
// ==========================================
// 所有变更操作相对 表格+列绑定 原子:
// 要么完整生效, 要么报错且状态不变
// ==========================================

use crate::domain::{FieldBinding, Row};
use crate::engine::error::{TableError, TableResult};
use crate::engine::reconciler::MergePlan;

/// 默认每页行数
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 手动定义表头时接受的分隔符
const HEADER_INPUT_SEPARATORS: [char; 4] = [',', ';', '\t', '|'];

// ==========================================
// 合并结果报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MergeReport {
    /// 本次新增行数
    pub rows_added: usize,
    /// 合并后总行数
    pub total_rows: usize,
}

// ==========================================
// 列注册表
// ==========================================

/// 内存中的权威表格状态
#[derive(Debug)]
pub struct ColumnRegistry {
    headers: Vec<String>,
    rows: Vec<Row>,
    binding: FieldBinding,
    page_size: usize,
    current_page: usize,
}

// 不变式: page_size ≥ 1, current_page ≥ 1。
// 派生 Default 会产生 page_size = 0, 必须走 new()。
impl Default for ColumnRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            binding: FieldBinding::default(),
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
        }
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn binding(&self) -> &FieldBinding {
        &self.binding
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// 总页数, 至少为 1
    pub fn total_pages(&self) -> usize {
        (self.rows.len().div_ceil(self.page_size)).max(1)
    }

    // ==========================================
    // 列操作
    // ==========================================

    /// 新增列: 追加到表头末尾, 所有现有行补空值
    pub fn add_column(&mut self, name: &str) -> TableResult<()> {
        if name.trim().is_empty() {
            return Err(TableError::EmptyName);
        }
        // 重名检查是精确匹配(区分大小写)
        if self.headers.iter().any(|h| h == name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.insert(name.to_string(), String::new());
        }
        Ok(())
    }

    /// 删除列: 从表头与每一行移除, 指向它的绑定清空
    ///
    /// 是否需要用户确认由调用方负责, 本方法只做变更。
    pub fn remove_column(&mut self, name: &str) -> TableResult<()> {
        let Some(pos) = self.headers.iter().position(|h| h == name) else {
            return Err(TableError::UnknownColumn(name.to_string()));
        };
        self.headers.remove(pos);
        for row in &mut self.rows {
            row.remove(name);
        }
        self.binding.on_column_removed(name);
        Ok(())
    }

    /// 重命名列: 表头替换, 每行键迁移, 绑定随之更新
    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> TableResult<()> {
        if new_name.trim().is_empty() {
            return Err(TableError::EmptyName);
        }
        if old_name == new_name {
            return Ok(());
        }
        let Some(pos) = self.headers.iter().position(|h| h == old_name) else {
            return Err(TableError::UnknownColumn(old_name.to_string()));
        };
        if self.headers.iter().any(|h| h == new_name) {
            return Err(TableError::DuplicateColumn(new_name.to_string()));
        }
        self.headers[pos] = new_name.to_string();
        for row in &mut self.rows {
            let value = row.remove(old_name).unwrap_or_default();
            row.insert(new_name.to_string(), value);
        }
        self.binding.on_column_renamed(old_name, new_name);
        Ok(())
    }

    /// 手动定义表头: 按 `, ; TAB |` 切分, trim 后丢弃空项
    ///
    /// 整体替换表头并清空数据行, 仅应在表格为空时使用。
    pub fn apply_headers_from_input(&mut self, raw: &str) -> TableResult<Vec<String>> {
        let parts: Vec<String> = raw
            .split(HEADER_INPUT_SEPARATORS)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(TableError::NoHeaders);
        }
        self.headers = parts.clone();
        self.rows.clear();
        self.binding = FieldBinding::default();
        self.current_page = 1;
        Ok(parts)
    }

    // ==========================================
    // 行操作
    // ==========================================

    /// 修改单元格: 仅做边界校验, 值直接替换
    pub fn update_cell(&mut self, row_index: usize, column: &str, value: &str) -> TableResult<()> {
        if row_index >= self.rows.len() {
            return Err(TableError::RowIndexOutOfBounds {
                index: row_index,
                len: self.rows.len(),
            });
        }
        if !self.headers.iter().any(|h| h == column) {
            return Err(TableError::UnknownColumn(column.to_string()));
        }
        self.rows[row_index].insert(column.to_string(), value.to_string());
        Ok(())
    }

    /// 追加一行: 键集合严格等于当前表头, 缺省值为空串
    ///
    /// `initial` 中不属于活动表头的键被忽略。翻页到末页。
    pub fn add_row(&mut self, initial: Option<&Row>) {
        let row: Row = self
            .headers
            .iter()
            .map(|h| {
                let value = initial
                    .and_then(|init| init.get(h))
                    .cloned()
                    .unwrap_or_default();
                (h.clone(), value)
            })
            .collect();
        self.rows.push(row);
        self.current_page = self.total_pages();
    }

    /// 删除一行, 当前页超出末页时向下收拢
    pub fn remove_row(&mut self, row_index: usize) -> TableResult<()> {
        if row_index >= self.rows.len() {
            return Err(TableError::RowIndexOutOfBounds {
                index: row_index,
                len: self.rows.len(),
            });
        }
        self.rows.remove(row_index);
        if self.current_page > self.total_pages() {
            self.current_page = self.total_pages();
        }
        Ok(())
    }

    /// 清空表格: 表头/数据/绑定全部重置, 回到第 1 页
    pub fn clear(&mut self) {
        self.headers.clear();
        self.rows.clear();
        self.binding = FieldBinding::default();
        self.current_page = 1;
    }

    // ==========================================
    // 列绑定
    // ==========================================

    /// 设置电话列, 必须指向活动表头(None 为解除)
    pub fn set_phone_column(&mut self, column: Option<String>) -> TableResult<()> {
        self.validate_binding_target(column.as_deref())?;
        self.binding.phone_column = column;
        Ok(())
    }

    /// 设置邮箱列
    pub fn set_email_column(&mut self, column: Option<String>) -> TableResult<()> {
        self.validate_binding_target(column.as_deref())?;
        self.binding.email_column = column;
        Ok(())
    }

    /// 设置附件文件名列(None 即"全员附件"模式)
    pub fn set_file_column(&mut self, column: Option<String>) -> TableResult<()> {
        self.validate_binding_target(column.as_deref())?;
        self.binding.file_column = column;
        Ok(())
    }

    fn validate_binding_target(&self, column: Option<&str>) -> TableResult<()> {
        match column {
            Some(name) if !self.headers.iter().any(|h| h == name) => {
                Err(TableError::UnknownColumn(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    // ==========================================
    // 导入合并应用
    // ==========================================

    /// 原子地应用一个合并计划
    ///
    /// Conflict 计划必须先经用户确认, 再以 `apply_replace` 应用;
    /// 本方法遇到 Conflict 不做任何变更。
    /// 追加后: 原表非空则翻到末页(让新行可见), 原表为空则回到第 1 页。
    pub fn apply_merge(&mut self, plan: MergePlan) -> MergeReport {
        match plan {
            MergePlan::NoOp | MergePlan::Conflict { .. } => MergeReport {
                rows_added: 0,
                total_rows: self.rows.len(),
            },
            MergePlan::Adopt { headers, rows } => {
                let added = rows.len();
                self.headers = headers;
                self.rows = rows;
                self.binding.retain_live(&self.headers);
                self.current_page = 1;
                MergeReport {
                    rows_added: added,
                    total_rows: self.rows.len(),
                }
            }
            MergePlan::Append { rows } => {
                let was_empty = self.rows.is_empty();
                let added = rows.len();
                self.rows.extend(rows);
                self.current_page = if was_empty { 1 } else { self.total_pages() };
                MergeReport {
                    rows_added: added,
                    total_rows: self.rows.len(),
                }
            }
        }
    }

    /// 用户确认替换后应用冲突计划: 丢弃现有数据, 采纳新表头与数据
    pub fn apply_replace(&mut self, headers: Vec<String>, rows: Vec<Row>) -> MergeReport {
        let added = rows.len();
        self.headers = headers;
        self.rows = rows;
        self.binding.retain_live(&self.headers);
        self.current_page = 1;
        MergeReport {
            rows_added: added,
            total_rows: self.rows.len(),
        }
    }

    // ==========================================
    // 分页
    // ==========================================

    /// 修改每页行数, 同一事件内页码一并重置到第 1 页
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.current_page = 1;
    }

    /// 跳转页码, 收拢到 [1, 总页数]
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages());
    }
}
