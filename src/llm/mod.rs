//! LLM 层：补全客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）+ 重试包装

pub mod deepseek;
pub mod factory;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use factory::{create_client_from_config, effective_model};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{
    Completion, CompletionClient, CompletionRequest, LlmError, RetryConfig, RetryingLlmClient,
};
