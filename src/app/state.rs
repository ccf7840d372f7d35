// ==========================================
// 批量消息群发助手 - 应用状态
// ==========================================
// 职责: 管理一次发送会话的全部可变状态与共享资源
// 表格/附件/通道/凭据都集中在 SendSession, 由锁保护
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::api::{
    build_payload, prepare_send, ApiError, ApiResult, HttpJobTransport, JobPayload, JobPoller,
    JobSnapshot, JobTransport, SendPreview, SenderProfile,
};
use crate::config::ClientConfig;
use crate::domain::{Attachment, Channel, MatchPolicy, ParsedTable, Row};
use crate::engine::registry::{ColumnRegistry, MergeReport};
use crate::engine::{combine, export_csv, MergePlan};
use crate::parser::parse_path;

// ==========================================
// 联系列自动识别关键词
// ==========================================
const EMAIL_COLUMN_HINTS: [&str; 4] = ["email", "e-mail", "mail", "邮箱"];
const PHONE_COLUMN_HINTS: [&str; 10] = [
    "tel", "celular", "numero", "número", "phone", "whatsapp", "mobile", "手机", "电话",
    "号码",
];

// ==========================================
// 导入结果
// ==========================================

/// 一次批量导入的结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// 已合并进当前表格
    Merged(MergeReport),
    /// 表头与现有数据冲突, 等待用户选择 替换/中止
    ConflictPending {
        incoming_headers: Vec<String>,
        incoming_rows: usize,
    },
}

// ==========================================
// 发送会话
// ==========================================

/// 一次发送会话的全部可变状态
#[derive(Default)]
pub struct SendSession {
    pub registry: ColumnRegistry,
    pub attachments: Vec<Attachment>,
    pub channel: Option<Channel>,
    pub message: String,
    pub sender: SenderProfile,
    pub match_policy: MatchPolicy,
    /// 待用户裁决的冲突导入(表头, 数据行)
    pending_conflict: Option<(Vec<String>, Vec<Row>)>,
}

impl SendSession {
    pub fn new() -> Self {
        Self {
            registry: ColumnRegistry::new(),
            ..Self::default()
        }
    }

    // ==========================================
    // 文件导入
    // ==========================================

    /// 导入一批表格文件
    ///
    /// 任一文件解析失败则整批放弃, 现有表格不变。
    /// 与现有数据表头冲突时不直接替换, 先挂起等待
    /// `resolve_conflict` 的用户决定。
    pub fn import_files(&mut self, paths: &[PathBuf]) -> ApiResult<ImportOutcome> {
        let mut tables: Vec<ParsedTable> = Vec::with_capacity(paths.len());
        for path in paths {
            tables.push(parse_path(path)?);
        }

        let plan = combine(
            &tables,
            self.registry.headers(),
            self.registry.rows().len(),
        )?;

        if let MergePlan::Conflict { headers, rows } = plan {
            tracing::info!(
                files = paths.len(),
                incoming_rows = rows.len(),
                "导入表头与现有数据冲突, 等待用户裁决"
            );
            let outcome = ImportOutcome::ConflictPending {
                incoming_headers: headers.clone(),
                incoming_rows: rows.len(),
            };
            self.pending_conflict = Some((headers, rows));
            return Ok(outcome);
        }

        let report = self.registry.apply_merge(plan);
        tracing::info!(
            files = paths.len(),
            rows_added = report.rows_added,
            total_rows = report.total_rows,
            "文件导入完成"
        );
        Ok(ImportOutcome::Merged(report))
    }

    /// 裁决挂起的冲突导入: replace=true 替换现有数据, 否则中止丢弃
    ///
    /// 没有挂起冲突时返回 None。
    pub fn resolve_conflict(&mut self, replace: bool) -> Option<MergeReport> {
        let (headers, rows) = self.pending_conflict.take()?;
        if replace {
            Some(self.registry.apply_replace(headers, rows))
        } else {
            tracing::info!("用户中止了冲突导入, 现有数据保持不变");
            None
        }
    }

    pub fn has_pending_conflict(&self) -> bool {
        self.pending_conflict.is_some()
    }

    // ==========================================
    // 附件管理
    // ==========================================

    /// 追加附件, 同名附件原位替换(保持已有位置)
    pub fn add_attachments(&mut self, incoming: Vec<Attachment>) {
        for attachment in incoming {
            if let Some(existing) = self
                .attachments
                .iter_mut()
                .find(|a| a.name == attachment.name)
            {
                *existing = attachment;
            } else {
                self.attachments.push(attachment);
            }
        }
    }

    /// 按文件名移除附件, 返回是否确实存在
    pub fn remove_attachment(&mut self, name: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.name != name);
        self.attachments.len() < before
    }

    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
    }

    // ==========================================
    // 通道与联系列自动识别
    // ==========================================

    /// 切换发送通道
    ///
    /// 该通道的联系列尚未绑定时, 按表头关键词自动识别一个候选列。
    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = Some(channel);
        let already_bound = self.registry.binding().contact_column(channel).is_some();
        if already_bound {
            return;
        }
        let hints: &[&str] = match channel {
            Channel::Email => &EMAIL_COLUMN_HINTS,
            Channel::Whatsapp => &PHONE_COLUMN_HINTS,
        };
        let candidate = self
            .registry
            .headers()
            .iter()
            .find(|h| {
                let lower = h.to_lowercase();
                hints.iter().any(|hint| lower.contains(hint))
            })
            .cloned();
        if let Some(column) = candidate {
            tracing::info!(channel = %channel, column = %column, "自动识别联系列");
            // 候选列取自活动表头, 绑定必然合法
            let result = match channel {
                Channel::Whatsapp => self.registry.set_phone_column(Some(column)),
                Channel::Email => self.registry.set_email_column(Some(column)),
            };
            debug_assert!(result.is_ok());
        }
    }

    // ==========================================
    // 发送流程
    // ==========================================

    /// 发送前置校验与差异报告
    pub fn preview_send(&self) -> ApiResult<SendPreview> {
        let channel = self.channel.ok_or(ApiError::MissingChannel)?;
        prepare_send(
            &self.registry,
            &self.attachments,
            channel,
            self.match_policy,
            &self.sender,
        )
    }

    /// 组装任务提交 payload(调用方需持有 preview)
    pub fn build_job_payload(&self, preview: &SendPreview) -> ApiResult<JobPayload> {
        let channel = self.channel.ok_or(ApiError::MissingChannel)?;
        build_payload(
            &self.registry,
            &self.attachments,
            channel,
            self.match_policy,
            &self.message,
            &self.sender,
            preview,
        )
    }

    /// 导出当前表格为 CSV 文本
    pub fn export(&self) -> ApiResult<String> {
        Ok(export_csv(self.registry.headers(), self.registry.rows())?)
    }
}

// ==========================================
// 附件构建辅助
// ==========================================

/// 从磁盘路径构建附件元数据(文件名+大小)
pub fn attachment_from_path(path: &Path) -> ApiResult<Attachment> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let metadata = std::fs::metadata(path).map_err(|e| ApiError::AttachmentRead {
        name: name.clone(),
        message: e.to_string(),
    })?;
    Ok(Attachment {
        name,
        size: metadata.len(),
        path: path.to_path_buf(),
    })
}

// ==========================================
// 应用状态
// ==========================================

/// 应用级共享状态
///
/// 在 Tauri 应用中作为全局状态管理
pub struct AppState {
    /// 当前发送会话
    pub session: Mutex<SendSession>,
    /// 任务传输层(测试中可替换)
    pub transport: Arc<dyn JobTransport>,
    /// 客户端配置
    pub config: ClientConfig,
    /// 当前任务的轮询器
    pub poller: Mutex<Option<JobPoller>>,
    /// 当前任务 ID
    pub active_job: Mutex<Option<String>>,
    /// 最近一次拉取到的任务状态
    pub latest_status: Arc<Mutex<Option<JobSnapshot>>>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Self {
        let transport: Arc<dyn JobTransport> = Arc::new(HttpJobTransport::new(&config));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn JobTransport>) -> Self {
        Self {
            session: Mutex::new(SendSession::new()),
            transport,
            config,
            poller: Mutex::new(None),
            active_job: Mutex::new(None),
            latest_status: Arc::new(Mutex::new(None)),
        }
    }

    /// 停止并丢弃当前轮询器(若有)
    pub fn stop_polling(&self) {
        if let Some(poller) = self.poller.lock().map(|mut p| p.take()).unwrap_or(None) {
            poller.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入失败");
        file
    }

    #[test]
    fn test_default_session_supports_manual_table_building() {
        // Default 会话直接手工建表不得恐慌
        let mut session = SendSession::default();
        session
            .registry
            .apply_headers_from_input("Nome, Telefone")
            .unwrap();
        session.registry.add_row(None);
        assert_eq!(session.registry.rows().len(), 1);
        assert_eq!(session.registry.total_pages(), 1);
    }

    #[test]
    fn test_import_then_append() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome,Telefone\nAna,111\nBia,222\n");
        let outcome = session.import_files(&[a.path().to_path_buf()]).unwrap();
        assert!(matches!(
            outcome,
            ImportOutcome::Merged(MergeReport {
                rows_added: 2,
                total_rows: 2
            })
        ));

        let b = temp_csv("nome,telefone\nCaio,333\n");
        let outcome = session.import_files(&[b.path().to_path_buf()]).unwrap();
        assert!(matches!(
            outcome,
            ImportOutcome::Merged(MergeReport {
                rows_added: 1,
                total_rows: 3
            })
        ));
    }

    #[test]
    fn test_conflict_requires_resolution() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome,Telefone\nAna,111\n");
        session.import_files(&[a.path().to_path_buf()]).unwrap();

        let b = temp_csv("Produto,Preço\nCaneta,2\n");
        let outcome = session.import_files(&[b.path().to_path_buf()]).unwrap();
        assert!(matches!(outcome, ImportOutcome::ConflictPending { .. }));
        assert!(session.has_pending_conflict());
        // 冲突挂起期间现有数据不变
        assert_eq!(session.registry.headers(), ["Nome", "Telefone"]);

        // 中止: 丢弃新数据
        assert!(session.resolve_conflict(false).is_none());
        assert_eq!(session.registry.rows().len(), 1);

        // 再次导入并选择替换
        let c = temp_csv("Produto,Preço\nCaneta,2\n");
        session.import_files(&[c.path().to_path_buf()]).unwrap();
        let report = session.resolve_conflict(true).unwrap();
        assert_eq!(report.total_rows, 1);
        assert_eq!(session.registry.headers(), ["Produto", "Preço"]);
    }

    #[test]
    fn test_import_batch_aborts_on_first_error() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome\nAna\n");
        let missing = PathBuf::from("/nonexistent/xyz.csv");
        let err = session
            .import_files(&[a.path().to_path_buf(), missing])
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
        // 整批放弃, 表格仍为空
        assert!(session.registry.headers().is_empty());
    }

    #[test]
    fn test_add_attachments_dedupes_by_name_in_place() {
        let mut session = SendSession::new();
        session.add_attachments(vec![
            Attachment {
                name: "a.pdf".to_string(),
                size: 10,
                path: PathBuf::from("/tmp/a.pdf"),
            },
            Attachment {
                name: "b.pdf".to_string(),
                size: 20,
                path: PathBuf::from("/tmp/b.pdf"),
            },
        ]);
        session.add_attachments(vec![Attachment {
            name: "a.pdf".to_string(),
            size: 99,
            path: PathBuf::from("/outra/a.pdf"),
        }]);
        assert_eq!(session.attachments.len(), 2);
        // 重名附件原位替换, 位置不变
        assert_eq!(session.attachments[0].name, "a.pdf");
        assert_eq!(session.attachments[0].size, 99);
        assert!(session.remove_attachment("b.pdf"));
        assert!(!session.remove_attachment("b.pdf"));
    }

    #[test]
    fn test_set_channel_auto_binds_contact_column() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome,Telefone,Email\nAna,111,a@b.c\n");
        session.import_files(&[a.path().to_path_buf()]).unwrap();

        session.set_channel(Channel::Whatsapp);
        assert_eq!(
            session.registry.binding().phone_column.as_deref(),
            Some("Telefone")
        );

        session.set_channel(Channel::Email);
        assert_eq!(
            session.registry.binding().email_column.as_deref(),
            Some("Email")
        );
    }

    #[test]
    fn test_set_channel_keeps_existing_binding() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome,Celular,Telefone\nAna,9,111\n");
        session.import_files(&[a.path().to_path_buf()]).unwrap();
        session
            .registry
            .set_phone_column(Some("Telefone".to_string()))
            .unwrap();
        session.set_channel(Channel::Whatsapp);
        // 已有绑定不被自动识别覆盖
        assert_eq!(
            session.registry.binding().phone_column.as_deref(),
            Some("Telefone")
        );
    }

    #[test]
    fn test_preview_requires_channel() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome,Telefone\nAna,111\n");
        session.import_files(&[a.path().to_path_buf()]).unwrap();
        let err = session.preview_send().unwrap_err();
        assert!(matches!(err, ApiError::MissingChannel));
    }

    #[test]
    fn test_full_preview_and_payload_flow() {
        let mut session = SendSession::new();
        let a = temp_csv("Nome,Telefone\nAna,111\nBia,222\n");
        session.import_files(&[a.path().to_path_buf()]).unwrap();
        session.set_channel(Channel::Whatsapp);
        session.message = "Olá {Nome}!".to_string();
        session.sender.sender_id = "+5511988887777".to_string();

        let preview = session.preview_send().unwrap();
        assert!(preview.can_continue());
        let payload = session.build_job_payload(&preview).unwrap();
        assert_eq!(payload.contact_column, "Telefone");
        assert_eq!(payload.rows.len(), 2);
    }
}
