//! 根据配置与环境变量选择 LLM 后端（OpenAI / DeepSeek / Mock）

use std::sync::Arc;

use crate::config::LlmSection;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};

/// DeepSeek 提供 OpenAI 兼容接口
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 无 API Key 时 mock 固定返回的回复（一个空计划），保证本地可跑通
const MOCK_EMPTY_PLAN: &str = r#"{"goal": "", "reasoning": "No language model configured", "steps": []}"#;

/// 选择后端：provider=mock 直接用 Mock；deepseek 需要 DEEPSEEK_API_KEY（或 OPENAI_API_KEY）；
/// 其余走 OpenAI 兼容端点。缺少 Key 时退回 Mock 并告警。
pub fn create_llm_from_config(cfg: &LlmSection) -> Arc<dyn LlmClient> {
    let provider = cfg.provider.to_lowercase();
    if provider == "mock" {
        tracing::info!("Using Mock LLM");
        return Arc::new(MockLlmClient::new().with_fallback(MOCK_EMPTY_PLAN));
    }

    if provider == "deepseek" {
        let key = std::env::var("DEEPSEEK_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        if let Some(key) = key {
            let model = if cfg.model.starts_with("deepseek") {
                cfg.model.clone()
            } else {
                DEEPSEEK_CHAT.to_string()
            };
            tracing::info!("Using DeepSeek LLM ({})", model);
            let base = cfg.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
            return Arc::new(
                OpenAiClient::new(Some(base), &model, Some(&key))
                    .with_request_timeout(cfg.timeouts.request),
            );
        }
    } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        tracing::info!("Using OpenAI LLM ({})", cfg.model);
        return Arc::new(
            OpenAiClient::new(cfg.base_url.as_deref(), &cfg.model, Some(&key))
                .with_request_timeout(cfg.timeouts.request),
        );
    }

    tracing::warn!(provider = %provider, "No API key set, using Mock LLM");
    Arc::new(MockLlmClient::new().with_fallback(MOCK_EMPTY_PLAN))
}
