// ==========================================
// 批量消息群发助手 - 客户端配置
// ==========================================
// 职责: 后端地址与轮询间隔, 支持环境变量覆写
// ==========================================

use std::time::Duration;

/// 默认后端地址
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
/// 默认轮询间隔(毫秒)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// 客户端运行配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 后端 API 根地址(不含末尾斜杠)
    pub api_base: String,
    /// 任务进度轮询间隔(毫秒)
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// 从环境变量构建配置, 未设置或非法的项回落到默认值
    ///
    /// - BULK_MESSENGER_API_BASE: 后端 API 根地址
    /// - BULK_MESSENGER_POLL_INTERVAL_MS: 轮询间隔(毫秒)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("BULK_MESSENGER_API_BASE") {
            let base = base.trim();
            if !base.is_empty() {
                config.api_base = base.trim_end_matches('/').to_string();
            }
        }
        if let Ok(interval) = std::env::var("BULK_MESSENGER_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.trim().parse::<u64>() {
                if ms > 0 {
                    config.poll_interval_ms = ms;
                }
            }
        }
        config
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, "http://localhost:8000/api");
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    }
}
