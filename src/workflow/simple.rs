//! Simple 模式：不做规划的单循环工具调用
//!
//! 每轮把 system prompt（含工具清单）与完整会话历史交给模型：模型要求调用工具则执行并继续，
//! 给出文本即结束。轮数受 max_steps 限制。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::{AgentError, OrchestrationState};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::planning::{truncate_chars, EventSink, WorkflowEvent};
use crate::prompts::PromptSet;
use crate::tools::{parse_model_reply, tool_prompt_section, ModelReply, ToolExecutor};
use crate::workflow::engine::{run_pending_tool, WorkflowResult};
use crate::workflow::types::{Phase, TerminationReason};

pub struct SimpleWorkflow {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolExecutor>,
    system_prompt: String,
    max_steps: usize,
    events: EventSink,
}

impl SimpleWorkflow {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptSet>,
        tools: Arc<ToolExecutor>,
        max_steps: usize,
    ) -> Self {
        let system_prompt = format!(
            "{}\n\n{}",
            prompts.system,
            tool_prompt_section(tools.registry())
        );
        Self {
            llm,
            tools,
            system_prompt,
            max_steps,
            events: EventSink::default(),
        }
    }

    pub fn with_events(mut self, tx: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub async fn run(&self, user_request: &str) -> Result<WorkflowResult, AgentError> {
        self.run_state(OrchestrationState::new(user_request)).await
    }

    pub async fn run_state(
        &self,
        mut state: OrchestrationState,
    ) -> Result<WorkflowResult, AgentError> {
        let mut trace = vec![Phase::Executing];
        let mut step = 0usize;

        let termination = loop {
            if step >= self.max_steps {
                tracing::warn!(max_steps = self.max_steps, "Step budget exhausted");
                break TerminationReason::StepBudgetExhausted;
            }
            step += 1;

            let mut messages = Vec::with_capacity(state.conversation.len() + 1);
            messages.push(Message::system(self.system_prompt.clone()));
            messages.extend(state.conversation.messages().iter().cloned());

            let raw = self.llm.complete(&messages).await.map_err(AgentError::Llm)?;
            match parse_model_reply(&raw) {
                ModelReply::ToolCall(call) => {
                    tracing::info!(
                        step,
                        tool = %call.tool,
                        args = %truncate_chars(&call.args.to_string(), 100),
                        "Tool called"
                    );
                    self.events.emit(WorkflowEvent::ToolCall {
                        tool: call.tool.clone(),
                        args: call.args.clone(),
                    });
                    state.push_message(Message::tool_request(raw.trim(), call));
                    trace.push(Phase::AwaitingTool);
                    run_pending_tool(&self.tools, &mut state, &self.events).await;
                    trace.push(Phase::Executing);
                }
                ModelReply::Text(content) => {
                    state.push_message(Message::assistant(content));
                    break TerminationReason::SimpleResponse;
                }
            }
        };

        trace.push(Phase::Terminated);
        tracing::info!(reason = ?termination, steps = step, "Simple run finished");
        self.events.emit(WorkflowEvent::Terminated {
            reason: termination,
        });

        Ok(WorkflowResult {
            response: state.final_response(),
            state,
            termination,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::Role;
    use crate::tools::file_tools;

    fn workflow(mock: Arc<MockLlmClient>, root: &std::path::Path, max_steps: usize) -> SimpleWorkflow {
        let tools = Arc::new(ToolExecutor::new(file_tools(root), 5));
        SimpleWorkflow::new(mock, Arc::new(PromptSet::default()), tools, max_steps)
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let mock = Arc::new(MockLlmClient::scripted([
            r#"{"tool": "read_file", "args": {"path": "a.txt"}}"#,
            "The file says hello.",
        ]));
        let result = workflow(mock.clone(), dir.path(), 5)
            .run("what is in a.txt?")
            .await
            .unwrap();

        assert_eq!(result.termination, TerminationReason::SimpleResponse);
        assert_eq!(result.response, "The file says hello.");
        let second = mock.request(1).unwrap();
        assert_eq!(second[0].role, Role::System);
        assert!(second.iter().any(|m| m.role == Role::Tool && m.content == "hello"));
    }

    #[tokio::test]
    async fn test_budget_stops_tool_loop() {
        let dir = tempfile::TempDir::new().unwrap();
        let mock = Arc::new(
            MockLlmClient::new().with_fallback(r#"{"tool": "list_directory", "args": {}}"#),
        );
        let result = workflow(mock.clone(), dir.path(), 3).run("loop").await.unwrap();
        assert_eq!(result.termination, TerminationReason::StepBudgetExhausted);
        assert_eq!(mock.call_count(), 3);
        assert_eq!(result.trace.last(), Some(&Phase::Terminated));
    }
}
