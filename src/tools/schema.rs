//! 工具调用协议：ToolCall 结构、JSON Schema 生成与模型输出解析
//!
//! 模型调用工具时只输出一个 `{"tool": "...", "args": {...}}` 对象；其余输出均视为文本回复。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

/// 模型发起的工具调用请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCall {
    /// 工具名，如 read_file、write_file、list_directory
    pub tool: String,
    /// 工具参数（path、content 等）
    #[serde(default)]
    pub args: serde_json::Value,
}

/// 模型输出的两种形态
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    ToolCall(ToolCall),
    Text(String),
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCall);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 从模型输出中提取 JSON 片段：```json 围栏优先，否则取首个 '{' 到最后一个 '}'
pub fn extract_json_block(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()));
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

/// 解析模型输出：含合法 JSON 且 tool 非空则为 ToolCall，否则为 Text
pub fn parse_model_reply(output: &str) -> ModelReply {
    let trimmed = output.trim();
    let Some(json_str) = extract_json_block(trimmed) else {
        return ModelReply::Text(trimmed.to_string());
    };
    match serde_json::from_str::<ToolCall>(json_str) {
        Ok(call) if !call.tool.trim().is_empty() => ModelReply::ToolCall(call),
        Ok(_) => ModelReply::Text(trimmed.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "model output is not a tool call, treating as text");
            ModelReply::Text(trimmed.to_string())
        }
    }
}
