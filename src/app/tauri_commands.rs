// ==========================================
// 批量消息群发助手 - Tauri 命令
// ==========================================
// 职责: Tauri 命令定义, 连接前端与后端 API
// 命令一律返回 JSON 字符串, 错误为 ErrorResponse JSON
// ==========================================

#![cfg(feature = "tauri-app")]

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, JobPoller, JobSnapshot};
use crate::app::state::{attachment_from_path, AppState};
use crate::domain::{format_bytes, Channel, MatchPolicy};
use std::path::PathBuf;

// ==========================================
// 公共工具: 错误映射
// ==========================================

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// 错误代码
    code: String,

    /// 错误消息
    message: String,
}

/// 将 ApiError 转换为 JSON 字符串（Tauri 要求）
fn map_api_error(err: ApiError) -> String {
    let error_response = ErrorResponse {
        code: match &err {
            ApiError::NoRecipients => "NO_RECIPIENTS",
            ApiError::MissingChannel => "MISSING_CHANNEL",
            ApiError::MissingContactColumn(_) => "MISSING_CONTACT_COLUMN",
            ApiError::MissingSender(_) => "MISSING_SENDER",
            ApiError::MissingAppPassword => "MISSING_APP_PASSWORD",
            ApiError::SendBlocked(_) => "SEND_BLOCKED",
            ApiError::Parse(_) => "PARSE_ERROR",
            ApiError::Table(_) => "TABLE_ERROR",
            ApiError::Reconcile(_) => "IMPORT_CONFLICT",
            ApiError::AttachmentRead { .. } => "ATTACHMENT_READ_ERROR",
            ApiError::Http(_) => "HTTP_ERROR",
            ApiError::Backend { .. } => "BACKEND_ERROR",
            ApiError::Serialization(_) => "SERIALIZATION_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
        .to_string(),
        message: err.to_string(),
    };

    serde_json::to_string(&error_response).unwrap_or_else(|_| err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("序列化失败: {}", e))
}

fn parse_enum<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("无效的{}: {}", what, raw))
}

// ==========================================
// 表格视图
// ==========================================

/// 表格状态快照（含当前页数据）
#[derive(Debug, Serialize)]
struct TableView {
    headers: Vec<String>,
    rows: Vec<crate::domain::Row>,
    total_rows: usize,
    page: usize,
    page_size: usize,
    total_pages: usize,
    binding: crate::domain::FieldBinding,
}

fn table_view(session: &crate::app::state::SendSession) -> TableView {
    let registry = &session.registry;
    let page = registry.current_page();
    let page_size = registry.page_size();
    let start = (page - 1) * page_size;
    let rows = registry
        .rows()
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();
    TableView {
        headers: registry.headers().to_vec(),
        rows,
        total_rows: registry.rows().len(),
        page,
        page_size,
        total_pages: registry.total_pages(),
        binding: registry.binding().clone(),
    }
}

// ==========================================
// 导入命令
// ==========================================

/// 导入一批收件人表格文件
#[tauri::command(rename_all = "snake_case")]
pub fn import_recipient_files(
    state: tauri::State<'_, AppState>,
    paths: Vec<String>,
) -> Result<String, String> {
    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    let outcome = session.import_files(&paths).map_err(map_api_error)?;
    to_json(&outcome)
}

/// 裁决挂起的冲突导入
#[tauri::command(rename_all = "snake_case")]
pub fn resolve_import_conflict(
    state: tauri::State<'_, AppState>,
    replace: bool,
) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    let report = session.resolve_conflict(replace);
    to_json(&report)
}

// ==========================================
// 表格命令
// ==========================================

/// 获取表格状态（含当前页数据）
#[tauri::command(rename_all = "snake_case")]
pub fn get_table_state(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let session = state.session.lock().map_err(|e| e.to_string())?;
    to_json(&table_view(&session))
}

/// 手动定义表头（清空现有数据）
#[tauri::command(rename_all = "snake_case")]
pub fn define_headers(state: tauri::State<'_, AppState>, input: String) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    let headers = session
        .registry
        .apply_headers_from_input(&input)
        .map_err(|e| map_api_error(e.into()))?;
    to_json(&headers)
}

/// 新增列
#[tauri::command(rename_all = "snake_case")]
pub fn add_column(state: tauri::State<'_, AppState>, name: String) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session
        .registry
        .add_column(&name)
        .map_err(|e| map_api_error(e.into()))?;
    Ok("{}".to_string())
}

/// 删除列（确认由前端负责）
#[tauri::command(rename_all = "snake_case")]
pub fn remove_column(state: tauri::State<'_, AppState>, name: String) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session
        .registry
        .remove_column(&name)
        .map_err(|e| map_api_error(e.into()))?;
    Ok("{}".to_string())
}

/// 重命名列
#[tauri::command(rename_all = "snake_case")]
pub fn rename_column(
    state: tauri::State<'_, AppState>,
    old_name: String,
    new_name: String,
) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session
        .registry
        .rename_column(&old_name, &new_name)
        .map_err(|e| map_api_error(e.into()))?;
    Ok("{}".to_string())
}

/// 修改单元格
#[tauri::command(rename_all = "snake_case")]
pub fn update_cell(
    state: tauri::State<'_, AppState>,
    row_index: usize,
    column: String,
    value: String,
) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session
        .registry
        .update_cell(row_index, &column, &value)
        .map_err(|e| map_api_error(e.into()))?;
    Ok("{}".to_string())
}

/// 追加一行
#[tauri::command(rename_all = "snake_case")]
pub fn add_row(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.registry.add_row(None);
    to_json(&table_view(&session))
}

/// 删除一行
#[tauri::command(rename_all = "snake_case")]
pub fn remove_row(state: tauri::State<'_, AppState>, row_index: usize) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session
        .registry
        .remove_row(row_index)
        .map_err(|e| map_api_error(e.into()))?;
    to_json(&table_view(&session))
}

/// 清空表格
#[tauri::command(rename_all = "snake_case")]
pub fn clear_table(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.registry.clear();
    Ok("{}".to_string())
}

/// 设置列绑定: kind 为 phone / email / file, column 为 None 解除
#[tauri::command(rename_all = "snake_case")]
pub fn set_column_binding(
    state: tauri::State<'_, AppState>,
    kind: String,
    column: Option<String>,
) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    let result = match kind.as_str() {
        "phone" => session.registry.set_phone_column(column),
        "email" => session.registry.set_email_column(column),
        "file" => session.registry.set_file_column(column),
        other => return Err(format!("无效的绑定类型: {}", other)),
    };
    result.map_err(|e| map_api_error(e.into()))?;
    Ok("{}".to_string())
}

/// 跳转页码
#[tauri::command(rename_all = "snake_case")]
pub fn set_page(state: tauri::State<'_, AppState>, page: usize) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.registry.set_page(page);
    to_json(&table_view(&session))
}

/// 修改每页行数（页码回到第 1 页）
#[tauri::command(rename_all = "snake_case")]
pub fn set_page_size(state: tauri::State<'_, AppState>, size: usize) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.registry.set_page_size(size);
    to_json(&table_view(&session))
}

/// 导出当前表格为 CSV 文本
#[tauri::command(rename_all = "snake_case")]
pub fn export_table(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let session = state.session.lock().map_err(|e| e.to_string())?;
    session.export().map_err(map_api_error)
}

// ==========================================
// 附件命令
// ==========================================

/// 附件视图（含人类可读大小）
#[derive(Debug, Serialize)]
struct AttachmentView {
    name: String,
    size: u64,
    size_label: String,
}

/// 添加附件
#[tauri::command(rename_all = "snake_case")]
pub fn add_attachments(
    state: tauri::State<'_, AppState>,
    paths: Vec<String>,
) -> Result<String, String> {
    let mut incoming = Vec::with_capacity(paths.len());
    for path in &paths {
        incoming.push(attachment_from_path(PathBuf::from(path).as_path()).map_err(map_api_error)?);
    }
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.add_attachments(incoming);
    to_json(&session.attachments.len())
}

/// 按文件名移除附件
#[tauri::command(rename_all = "snake_case")]
pub fn remove_attachment(
    state: tauri::State<'_, AppState>,
    name: String,
) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    to_json(&session.remove_attachment(&name))
}

/// 清空附件
#[tauri::command(rename_all = "snake_case")]
pub fn clear_attachments(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.clear_attachments();
    Ok("{}".to_string())
}

/// 列出附件
#[tauri::command(rename_all = "snake_case")]
pub fn list_attachments(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let session = state.session.lock().map_err(|e| e.to_string())?;
    let views: Vec<AttachmentView> = session
        .attachments
        .iter()
        .map(|a| AttachmentView {
            name: a.name.clone(),
            size: a.size,
            size_label: format_bytes(a.size),
        })
        .collect();
    to_json(&views)
}

// ==========================================
// 发送配置命令
// ==========================================

/// 切换发送通道（whatsapp / email）
#[tauri::command(rename_all = "snake_case")]
pub fn set_channel(state: tauri::State<'_, AppState>, channel: String) -> Result<String, String> {
    let channel: Channel = parse_enum(&channel, "发送通道")?;
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.set_channel(channel);
    to_json(&session.registry.binding().clone())
}

/// 设置消息模板
#[tauri::command(rename_all = "snake_case")]
pub fn set_message(state: tauri::State<'_, AppState>, message: String) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.message = message;
    Ok("{}".to_string())
}

/// 设置发送人信息
#[tauri::command(rename_all = "snake_case")]
pub fn set_sender(
    state: tauri::State<'_, AppState>,
    sender_id: String,
    app_password: Option<String>,
    subject: Option<String>,
) -> Result<String, String> {
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.sender.sender_id = sender_id;
    if let Some(password) = app_password {
        session.sender.app_password = password;
    }
    if let Some(subject) = subject {
        session.sender.subject = subject;
    }
    Ok("{}".to_string())
}

/// 设置附件匹配模式（equal / contains / starts_with / ends_with）
#[tauri::command(rename_all = "snake_case")]
pub fn set_match_policy(state: tauri::State<'_, AppState>, mode: String) -> Result<String, String> {
    let policy: MatchPolicy = parse_enum(&mode, "匹配模式")?;
    let mut session = state.session.lock().map_err(|e| e.to_string())?;
    session.match_policy = policy;
    Ok("{}".to_string())
}

// ==========================================
// 发送命令
// ==========================================

/// 发送前置校验与差异报告
#[tauri::command(rename_all = "snake_case")]
pub fn preview_send(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let session = state.session.lock().map_err(|e| e.to_string())?;
    let preview = session.preview_send().map_err(map_api_error)?;
    to_json(&preview)
}

/// 提交发送任务并开始轮询进度
#[tauri::command(rename_all = "snake_case")]
pub async fn start_send(
    state: tauri::State<'_, AppState>,
    token: String,
) -> Result<String, String> {
    // 旧任务的轮询先停掉
    state.stop_polling();

    // 锁内只做数据准备, 不跨 await 持锁
    let (payload, attachments) = {
        let session = state.session.lock().map_err(|e| e.to_string())?;
        let preview = session.preview_send().map_err(map_api_error)?;
        let payload = session.build_job_payload(&preview).map_err(map_api_error)?;
        (payload, session.attachments.clone())
    };

    let job_id = state
        .transport
        .submit(&payload, &attachments, &token)
        .await
        .map_err(map_api_error)?;

    if let Ok(mut latest) = state.latest_status.lock() {
        *latest = None;
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let poller = JobPoller::spawn(
        state.transport.clone(),
        job_id.clone(),
        token,
        state.config.poll_interval(),
        tx,
    );

    let latest = state.latest_status.clone();
    tokio::spawn(async move {
        while let Some(status) = rx.recv().await {
            if let Ok(mut slot) = latest.lock() {
                *slot = Some(JobSnapshot::now(status));
            }
        }
    });

    *state.poller.lock().map_err(|e| e.to_string())? = Some(poller);
    *state.active_job.lock().map_err(|e| e.to_string())? = Some(job_id.clone());

    to_json(&serde_json::json!({ "job_id": job_id }))
}

/// 取消当前任务
#[tauri::command(rename_all = "snake_case")]
pub async fn cancel_send(
    state: tauri::State<'_, AppState>,
    token: String,
) -> Result<String, String> {
    state.stop_polling();
    let job_id = state
        .active_job
        .lock()
        .map_err(|e| e.to_string())?
        .clone();
    if let Some(job_id) = job_id {
        state
            .transport
            .cancel(&job_id, &token)
            .await
            .map_err(map_api_error)?;
    }
    Ok("{}".to_string())
}

/// 获取最近一次任务进度快照
#[tauri::command(rename_all = "snake_case")]
pub fn get_send_progress(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let latest = state.latest_status.lock().map_err(|e| e.to_string())?;
    to_json(&*latest)
}
