//! 工具执行器（工具调用层）
//!
//! 持有 ToolRegistry 与单次调用超时；超时同样折算为 ToolOutcome::Failed。每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::tools::{ToolCall, ToolOutcome, ToolRegistry};

/// 默认单次工具调用超时（秒）
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行一次工具调用；未知工具、工具失败、超时都以 Failed 返回
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        let start = Instant::now();
        let result = timeout(
            self.timeout,
            self.registry.execute(&call.tool, call.args.clone()),
        )
        .await;

        let (outcome, label) = match result {
            Ok(outcome) if outcome.is_failed() => (outcome, "error"),
            Ok(outcome) => (outcome, "ok"),
            Err(_) => (
                ToolOutcome::Failed(format!(
                    "Error: Tool {} timed out after {}s",
                    call.tool,
                    self.timeout.as_secs()
                )),
                "timeout",
            ),
        };

        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": call.tool,
            "ok": !outcome.is_failed(),
            "outcome": label,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(&call.args),
        });
        tracing::info!(audit = %audit, "tool");

        outcome
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Sleepy;

    #[async_trait]
    impl Tool for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        async fn execute(&self, _args: Value) -> ToolOutcome {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            ToolOutcome::Ok("late".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_failed_outcome() {
        let mut reg = ToolRegistry::new();
        reg.register(Sleepy);
        let exec = ToolExecutor::new(reg, 1);
        let call = ToolCall {
            tool: "sleepy".to_string(),
            args: Value::Null,
        };
        let out = exec.execute(&call).await;
        assert_eq!(out, ToolOutcome::Failed("Error: Tool sleepy timed out after 1s".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let exec = ToolExecutor::new(ToolRegistry::new(), 5);
        let call = ToolCall {
            tool: "ghost".to_string(),
            args: Value::Null,
        };
        assert!(exec.execute(&call).await.is_failed());
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = Value::String("x".repeat(500));
        assert!(args_preview(&long).ends_with("..."));
        assert_eq!(args_preview(&long).chars().count(), 203);
    }
}
