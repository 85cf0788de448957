//! 步骤执行器
//!
//! 针对当前游标所指步骤构造执行 prompt（历史结果摘要 + 当前步骤字段），调用 LLM，
//! 把工具调用请求或文本回复追加到会话历史。执行器从不推进游标：文本回复后仍停留在同一步。

use std::sync::Arc;

use crate::core::{AgentError, OrchestrationState};
use crate::llm::LlmClient;
use crate::memory::{Message, StepResults};
use crate::planning::events::{truncate_chars, EventSink, WorkflowEvent};
use crate::prompts::{render, PromptSet};
use crate::tools::{parse_model_reply, ModelReply, ToolCall};

/// 执行器回复以此开头（首个非空行，大小写不敏感）即视为步骤失败
pub const FAILURE_MARKER: &str = "STEP_FAILED:";

/// 文本是否带失败标记
pub fn has_failure_marker(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.to_uppercase().starts_with(FAILURE_MARKER))
}

/// 执行器产出
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorOutput {
    ToolCall(ToolCall),
    Text { content: String, failed: bool },
}

pub struct StepExecutor {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    /// 拼入 system prompt 的工具清单与调用格式
    tool_section: String,
    preview_chars: usize,
    events: EventSink,
}

impl StepExecutor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptSet>,
        tool_section: impl Into<String>,
        preview_chars: usize,
    ) -> Self {
        Self {
            llm,
            prompts,
            tool_section: tool_section.into(),
            preview_chars,
            events: EventSink::default(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// 执行当前步骤；无计划或游标已到末尾时为 no-op（返回 None，状态不变）
    pub async fn execute(
        &self,
        state: &mut OrchestrationState,
    ) -> Result<Option<ExecutorOutput>, AgentError> {
        let Some(plan) = state.plan() else {
            return Ok(None);
        };
        let Some(step) = plan.step(state.current_step_index()) else {
            return Ok(None);
        };
        let total = plan.total_steps();

        tracing::info!(
            step = step.step_number,
            total = total,
            action = %step.action,
            description = %truncate_chars(&step.description, 50),
            "Executing step"
        );
        self.events.emit(WorkflowEvent::StepStarted {
            step: step.step_number,
            total,
            action: step.action.to_string(),
        });

        let previous_context = previous_context(state.step_results(), self.preview_chars);
        let step_number = step.step_number.to_string();
        let prompt = render(
            &self.prompts.executor_template,
            &[
                ("previous_context", &previous_context),
                ("step_number", &step_number),
                ("action", step.action.as_str()),
                ("description", &step.description),
                ("input_data", &step.input_data),
                ("expected_output", &step.expected_output),
            ],
        );
        let system = format!("{}\n\n{}", self.prompts.executor, self.tool_section);
        let messages = vec![Message::system(system), Message::user(prompt)];

        let raw = self.llm.complete(&messages).await.map_err(AgentError::Llm)?;

        let output = match parse_model_reply(&raw) {
            ModelReply::ToolCall(call) => {
                tracing::info!(
                    tool = %call.tool,
                    args = %truncate_chars(&call.args.to_string(), 100),
                    "Tool called"
                );
                self.events.emit(WorkflowEvent::ToolCall {
                    tool: call.tool.clone(),
                    args: call.args.clone(),
                });
                state.push_message(Message::tool_request(raw.trim(), call.clone()));
                ExecutorOutput::ToolCall(call)
            }
            ModelReply::Text(content) => {
                let failed = has_failure_marker(&content);
                tracing::debug!(failed, "Step answered without tool call");
                state.push_message(Message::assistant(content.clone()).with_failed(failed));
                ExecutorOutput::Text { content, failed }
            }
        };
        Ok(Some(output))
    }
}

/// 历史结果摘要：每条截断到 preview_chars，按步骤下标升序
fn previous_context(results: &StepResults, preview_chars: usize) -> String {
    if results.is_empty() {
        return String::new();
    }
    let mut out = String::from("Previous results:\n");
    for (idx, record) in results.iter() {
        let status = if record.failed { " (failed)" } else { "" };
        out.push_str(&format!(
            "- Step {}{}: {}...\n",
            idx + 1,
            status,
            truncate_chars(&record.content, preview_chars)
        ));
    }
    out
}
