//! 补全服务抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 CompletionClient：一次请求、一段文本。
//! RetryingLlmClient 在任意后端外层叠加单次超时与指数退避重试。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmSection;

/// 补全服务错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited (retry after {retry_after_ms} ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("Request timed out")]
    Timeout,

    #[error("Empty response")]
    EmptyResponse,

    /// 请求本身不合法（参数、凭证），重试无意义
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::InvalidRequest(_))
    }
}

/// 一次补全请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// 补全结果：只暴露文本，调用方不依赖后端响应结构
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 补全客户端 trait
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 重试策略：第 n 次重试前等待 `initial * 2^n`，不超过 `max_backoff`
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// 单次尝试的超时；None 表示交给后端自身
    pub request_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            request_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl From<&LlmSection> for RetryConfig {
    fn from(section: &LlmSection) -> Self {
        Self {
            max_retries: section.retry.max_retries,
            initial_backoff: Duration::from_millis(section.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(section.retry.max_backoff_ms),
            request_timeout: (section.request_timeout_secs > 0)
                .then(|| Duration::from_secs(section.request_timeout_secs)),
        }
    }
}

impl RetryConfig {
    /// 第 `attempt` 次重试（从 0 计）前的等待时间
    pub fn backoff(&self, attempt: u32, err: &LlmError) -> Duration {
        let exp = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff);
        match err {
            LlmError::RateLimited { retry_after_ms } => {
                exp.max(Duration::from_millis(*retry_after_ms))
            }
            _ => exp,
        }
    }
}

/// 带超时与重试的客户端包装
pub struct RetryingLlmClient {
    inner: Arc<dyn CompletionClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn CompletionClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.complete(request))
                .await
                .map_err(|_| LlmError::Timeout)?,
            None => self.inner.complete(request).await,
        }
    }
}

#[async_trait]
impl CompletionClient for RetryingLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let mut attempt = 0;
        loop {
            match self.attempt(request).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let wait = self.config.backoff(attempt, &e);
                    tracing::warn!(
                        "Completion failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt + 1,
                        self.config.max_retries,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            request_timeout: None,
        }
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let cfg = RetryConfig {
            max_retries: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            request_timeout: None,
        };
        let err = LlmError::ApiError("boom".into());
        assert_eq!(cfg.backoff(0, &err), Duration::from_millis(100));
        assert_eq!(cfg.backoff(1, &err), Duration::from_millis(200));
        assert_eq!(cfg.backoff(2, &err), Duration::from_millis(400));
        assert_eq!(cfg.backoff(3, &err), Duration::from_millis(500));
        assert_eq!(cfg.backoff(31, &err), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_honours_rate_limit_hint() {
        let cfg = RetryConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            request_timeout: None,
        };
        let err = LlmError::RateLimited { retry_after_ms: 2000 };
        assert_eq!(cfg.backoff(0, &err), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let failures = Arc::new(AtomicUsize::new(0));
        let seen = failures.clone();
        let mock = Arc::new(MockLlmClient::new(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LlmError::ApiError("503".into()))
            } else {
                Ok("ok".to_string())
            }
        }));
        let client = RetryingLlmClient::new(mock.clone(), fast_retry(3));

        let out = client
            .complete(&CompletionRequest::new("m", "hi", 10))
            .await
            .unwrap();
        assert_eq!(out.text, "ok");
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let mock = Arc::new(MockLlmClient::failing());
        let client = RetryingLlmClient::new(mock.clone(), fast_retry(2));

        let err = client
            .complete(&CompletionRequest::new("m", "hi", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ApiError(_)));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_retried() {
        let mock = Arc::new(MockLlmClient::new(|_| {
            Err(LlmError::InvalidRequest("bad key".into()))
        }));
        let client = RetryingLlmClient::new(mock.clone(), fast_retry(5));

        let err = client
            .complete(&CompletionRequest::new("m", "hi", 10))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::InvalidRequest("bad key".into()));
        assert_eq!(mock.calls(), 1);
    }
}
