//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters_schema / execute），由 ToolRegistry 按名注册与查找。
//! 工具失败以 ToolOutcome::Failed 作为数据返回，从不 panic 或向上抛错。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// 工具执行结果：带标签，路由只看标签不看文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "content", rename_all = "snake_case")]
pub enum ToolOutcome {
    Ok(String),
    /// 失败原因即展示给模型的错误文本（如 "Error: File not found: results/a.txt"）
    Failed(String),
}

impl ToolOutcome {
    pub fn content(&self) -> &str {
        match self {
            ToolOutcome::Ok(s) | ToolOutcome::Failed(s) => s,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ToolOutcome::Failed(_))
    }

    pub fn into_content(self) -> String {
        match self {
            ToolOutcome::Ok(s) | ToolOutcome::Failed(s) => s,
        }
    }
}

impl fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content())
    }
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> ToolOutcome;
}

/// 工具注册表：按名称有序存储，保证注入 prompt 的工具列表稳定
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub async fn execute(&self, name: &str, args: Value) -> ToolOutcome {
        match self.tools.get(name) {
            Some(tool) => tool.execute(args).await,
            None => ToolOutcome::Failed(format!("Error: Unknown tool: {name}")),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 工具 schema JSON（name / description / parameters），拼入 system prompt
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase text"
        }

        async fn execute(&self, args: Value) -> ToolOutcome {
            match args.get("text").and_then(|v| v.as_str()) {
                Some(t) => ToolOutcome::Ok(t.to_uppercase()),
                None => ToolOutcome::Failed("Error: missing text".to_string()),
            }
        }
    }

    #[tokio::test]
    async fn test_execute_registered_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Upper);
        let out = reg.execute("upper", serde_json::json!({"text": "hi"})).await;
        assert_eq!(out, ToolOutcome::Ok("HI".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_failed_outcome() {
        let reg = ToolRegistry::new();
        let out = reg.execute("nope", Value::Null).await;
        assert!(out.is_failed());
        assert_eq!(out.content(), "Error: Unknown tool: nope");
    }

    #[test]
    fn test_schema_json_lists_tools() {
        let mut reg = ToolRegistry::new();
        reg.register(Upper);
        let json = reg.to_schema_json();
        assert!(json.contains("\"upper\""));
        assert!(json.contains("Uppercase text"));
    }
}
