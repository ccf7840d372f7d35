// ==========================================
// 批量消息群发助手 - API层
// ==========================================
// 职责: 发送前置校验 / payload 组装 / 任务提交与轮询
// ==========================================

pub mod error;
pub mod job_client;
pub mod payload;
pub mod send_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use job_client::{HttpJobTransport, JobPoller, JobTransport};
pub use payload::{JobPayload, JobSnapshot, JobStatus, JobSubmitResponse};
pub use send_api::{build_payload, prepare_send, SendPreview, SenderProfile};
