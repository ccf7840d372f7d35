// ==========================================
// 批量消息群发助手 - 任务提交与进度轮询
// ==========================================
// 提交: multipart (payload JSON 字段 + files 附件分片)
// 轮询: 固定间隔拉取, 终态或取消即停止
// 取消后保证不再产生任何状态更新
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::payload::{JobPayload, JobStatus, JobSubmitResponse};
use crate::config::ClientConfig;
use crate::domain::Attachment;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

// ==========================================
// 传输层接口(可在测试中替换)
// ==========================================
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// 提交任务, 返回后端分配的 job_id
    async fn submit(
        &self,
        payload: &JobPayload,
        attachments: &[Attachment],
        token: &str,
    ) -> ApiResult<String>;

    /// 拉取一次任务状态
    async fn fetch_status(&self, job_id: &str, token: &str) -> ApiResult<JobStatus>;

    /// 请求后端取消任务
    async fn cancel(&self, job_id: &str, token: &str) -> ApiResult<()>;
}

// ==========================================
// HTTP 实现
// ==========================================
pub struct HttpJobTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpJobTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl JobTransport for HttpJobTransport {
    async fn submit(
        &self,
        payload: &JobPayload,
        attachments: &[Attachment],
        token: &str,
    ) -> ApiResult<String> {
        let json = serde_json::to_string(payload)?;
        let mut form = reqwest::multipart::Form::new().text("payload", json);

        // 附件内容到提交时才读取
        for attachment in attachments {
            let bytes = tokio::fs::read(&attachment.path).await.map_err(|e| {
                ApiError::AttachmentRead {
                    name: attachment.name.clone(),
                    message: e.to_string(),
                }
            })?;
            let part = reqwest::multipart::Part::bytes(bytes).file_name(attachment.name.clone());
            form = form.part("files", part);
        }

        let resp = self
            .http
            .post(format!("{}/jobs/start/", self.base_url))
            .header("Authorization", format!("Token {}", token))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Backend { status, body });
        }

        let data: JobSubmitResponse = resp.json().await?;
        tracing::info!(job_id = %data.job_id, "任务提交成功");
        Ok(data.job_id)
    }

    async fn fetch_status(&self, job_id: &str, token: &str) -> ApiResult<JobStatus> {
        let resp = self
            .http
            .get(format!("{}/jobs/{}/", self.base_url, job_id))
            .header("Authorization", format!("Token {}", token))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Backend { status, body });
        }

        Ok(resp.json().await?)
    }

    async fn cancel(&self, job_id: &str, token: &str) -> ApiResult<()> {
        let resp = self
            .http
            .post(format!("{}/jobs/{}/cancel/", self.base_url, job_id))
            .header("Authorization", format!("Token {}", token))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Backend { status, body });
        }
        Ok(())
    }
}

// ==========================================
// 进度轮询器
// ==========================================

/// 固定间隔的任务进度轮询任务
///
/// 首次立即拉取, 之后每个间隔拉取一次;
/// 终态 / 调用 stop() / 接收端关闭 三者任一发生即退出。
pub struct JobPoller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl JobPoller {
    pub fn spawn(
        transport: Arc<dyn JobTransport>,
        job_id: String,
        token: String,
        interval: Duration,
        tx: mpsc::Sender<JobStatus>,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        match transport.fetch_status(&job_id, &token).await {
                            Ok(status) => {
                                // 拉取期间被取消: 丢弃结果, 不再更新
                                if *shutdown_rx.borrow() {
                                    break;
                                }
                                let terminal = status.state.is_terminal();
                                if tx.send(status).await.is_err() {
                                    break;
                                }
                                if terminal {
                                    tracing::debug!(job_id = %job_id, "任务到达终态, 停止轮询");
                                    break;
                                }
                            }
                            Err(e) => {
                                // 瞬时失败不终止轮询, 下个周期重试
                                tracing::warn!(job_id = %job_id, error = %e, "任务状态拉取失败");
                            }
                        }
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// 取消轮询: 调用后不再有任何状态更新被发送
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// 轮询任务是否已退出
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobState;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本依次返回状态, 脚本耗尽后重复最后一个
    struct ScriptedTransport {
        script: Mutex<VecDeque<JobStatus>>,
    }

    impl ScriptedTransport {
        fn new(states: Vec<JobState>) -> Self {
            let script = states
                .into_iter()
                .map(|state| JobStatus {
                    state,
                    total: 3,
                    processed: 0,
                    success: 0,
                    failed: 0,
                    items: Vec::new(),
                    error: None,
                })
                .collect();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl JobTransport for ScriptedTransport {
        async fn submit(
            &self,
            _payload: &JobPayload,
            _attachments: &[Attachment],
            _token: &str,
        ) -> ApiResult<String> {
            Ok("job-test".to_string())
        }

        async fn fetch_status(&self, _job_id: &str, _token: &str) -> ApiResult<JobStatus> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                Ok(script.pop_front().unwrap())
            } else {
                Ok(script.front().cloned().expect("脚本不能为空"))
            }
        }

        async fn cancel(&self, _job_id: &str, _token: &str) -> ApiResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_at_terminal_state() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            JobState::Queued,
            JobState::Running,
            JobState::Done,
        ]));
        let (tx, mut rx) = mpsc::channel(16);
        let _poller = JobPoller::spawn(
            transport,
            "job-1".to_string(),
            "token".to_string(),
            Duration::from_millis(1000),
            tx,
        );

        let mut seen = Vec::new();
        while let Some(status) = rx.recv().await {
            seen.push(status.state);
        }
        // 终态之后不再有更新, 通道随任务退出而关闭
        assert_eq!(seen, vec![JobState::Queued, JobState::Running, JobState::Done]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stop_ends_updates() {
        let transport = Arc::new(ScriptedTransport::new(vec![JobState::Running]));
        let (tx, mut rx) = mpsc::channel(16);
        let poller = JobPoller::spawn(
            transport,
            "job-2".to_string(),
            "token".to_string(),
            Duration::from_millis(1000),
            tx,
        );

        // 至少收到一次进行中的状态
        let first = rx.recv().await.expect("应收到首次状态");
        assert_eq!(first.state, JobState::Running);

        poller.stop();
        // 取消后通道最终关闭, 不会无限产生更新
        while rx.recv().await.is_some() {}
        assert!(poller.is_finished() || rx.recv().await.is_none());
    }
}
