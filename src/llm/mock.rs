//! Mock 补全客户端（用于测试与离线运行，无需 API）
//!
//! 由一个闭包决定每个 prompt 的回复，并统计调用次数，便于断言"没有发生任何服务调用"。

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::llm::{Completion, CompletionClient, CompletionRequest, LlmError};

type Responder = dyn Fn(&str) -> Result<String, LlmError> + Send + Sync;

/// Mock 客户端：按 prompt 计算回复
pub struct MockLlmClient {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    /// 回显 prompt
    pub fn echo() -> Self {
        Self::new(|prompt| Ok(prompt.to_string()))
    }

    /// 永远返回同一段文本
    pub fn constant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// 永远失败
    pub fn failing() -> Self {
        Self::new(|_| Err(LlmError::ApiError("mock failure".to_string())))
    }

    /// 已收到的请求数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::echo()
    }
}

impl std::fmt::Debug for MockLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLlmClient")
            .field("calls", &self.calls())
            .finish()
    }
}

#[async_trait]
impl CompletionClient for MockLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(&request.prompt).map(Completion::new)
    }
}
