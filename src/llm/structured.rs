//! 结构化生成
//!
//! 把目标类型的 JSON Schema（schemars 生成）追加到 system 消息，要求模型只输出一个 JSON 对象，
//! 再从回复中提取 JSON 并反序列化。任何一步失败都归为 AgentError::Generation。

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::{Message, Role};
use crate::tools::extract_json_block;

/// 返回类型 T 的 JSON Schema（pretty 格式）
pub fn schema_json<T: JsonSchema>() -> String {
    serde_json::to_string_pretty(&schema_for!(T)).unwrap_or_default()
}

fn schema_instruction<T: JsonSchema>() -> String {
    format!(
        "Respond with a single JSON object and nothing else. It must conform to this JSON Schema:\n{}",
        schema_json::<T>()
    )
}

/// 生成并解析一个符合 T 结构的值
pub async fn generate_structured<T>(
    llm: &dyn LlmClient,
    messages: &[Message],
) -> Result<T, AgentError>
where
    T: DeserializeOwned + JsonSchema,
{
    let instruction = schema_instruction::<T>();
    let mut request = messages.to_vec();
    match request.iter_mut().find(|m| m.role == Role::System) {
        Some(system) => {
            system.content.push_str("\n\n");
            system.content.push_str(&instruction);
        }
        None => request.insert(0, Message::system(instruction)),
    }

    let raw = llm.complete(&request).await.map_err(AgentError::Generation)?;
    let json = extract_json_block(&raw)
        .ok_or_else(|| AgentError::Generation(format!("no JSON object in response: {}", preview(&raw))))?;
    serde_json::from_str(json)
        .map_err(|e| AgentError::Generation(format!("{e}: {}", preview(json))))
}

fn preview(s: &str) -> String {
    s.chars().take(200).collect()
}
