//! LLM 层：客户端抽象、OpenAI 兼容实现、Mock、后端选择与结构化生成

pub mod factory;
pub mod mock;
pub mod openai;
pub mod structured;
pub mod traits;

pub use factory::{create_llm_from_config, DEEPSEEK_BASE_URL, DEEPSEEK_CHAT};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use structured::{generate_structured, schema_json};
pub use traits::LlmClient;
