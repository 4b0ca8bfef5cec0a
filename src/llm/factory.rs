//! 根据配置选择补全后端（OpenAI 兼容 / DeepSeek / Mock），并统一包一层重试

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{
    create_deepseek_client, CompletionClient, LlmError, MockLlmClient, OpenAiClient, RetryConfig,
    RetryingLlmClient, DEEPSEEK_CHAT,
};

/// 实际使用的模型名：provider 为 deepseek 而 model 仍是 OpenAI 默认值时换成 deepseek-chat
pub fn effective_model(cfg: &AppConfig) -> String {
    let provider = cfg.llm.provider.to_lowercase();
    if provider == "deepseek" && cfg.llm.model.starts_with("gpt-") {
        DEEPSEEK_CHAT.to_string()
    } else {
        cfg.llm.model.clone()
    }
}

/// 构造客户端；真实后端缺少凭证时在发出任何请求之前报错
pub fn create_client_from_config(cfg: &AppConfig) -> Result<Arc<dyn CompletionClient>, LlmError> {
    let provider = cfg.llm.provider.to_lowercase();

    let backend: Arc<dyn CompletionClient> = match provider.as_str() {
        "mock" => {
            tracing::warn!("Using Mock LLM (echo), fitness will not be meaningful");
            Arc::new(MockLlmClient::echo())
        }
        "deepseek" => {
            let key = cfg.api_key().ok_or_else(|| {
                LlmError::InvalidRequest("DEEPSEEK_API_KEY / llm.api_key not set".to_string())
            })?;
            tracing::info!("Using DeepSeek LLM ({})", effective_model(cfg));
            Arc::new(create_deepseek_client(&key))
        }
        "openai" => {
            let key = cfg.api_key().ok_or_else(|| {
                LlmError::InvalidRequest("OPENAI_API_KEY / llm.api_key not set".to_string())
            })?;
            tracing::info!("Using OpenAI LLM ({})", effective_model(cfg));
            Arc::new(OpenAiClient::new(cfg.llm.base_url.as_deref(), &key))
        }
        other => {
            return Err(LlmError::InvalidRequest(format!(
                "unknown llm provider '{}'",
                other
            )))
        }
    };

    Ok(Arc::new(RetryingLlmClient::new(
        backend,
        RetryConfig::from(&cfg.llm),
    )))
}
