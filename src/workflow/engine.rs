//! Plan-Execute-Replan 编排引擎
//!
//! 显式状态机：每个阶段跑完产生一个 Signal，由 graph::next 决定下一阶段，直到 Terminated。
//! 执行器调用次数受 max_steps 限制；GenerationError / LLM 错误直接返回给调用方，不计入 replan_count。

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::PlanningSection;
use crate::core::{AgentError, OrchestrationState};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::planning::{
    truncate_chars, EventSink, Planner, Replanner, StepExecutor, StepResultTracker, WorkflowEvent,
};
use crate::prompts::PromptSet;
use crate::tools::{tool_prompt_section, ToolExecutor};
use crate::workflow::graph::{next, termination_reason};
use crate::workflow::types::{Phase, Signal, TerminationReason};

const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 一次 run 的结果
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    /// 最终回复：会话历史最后一条消息的内容
    pub response: String,
    pub state: OrchestrationState,
    pub termination: TerminationReason,
    /// 依次经过的阶段（含初始阶段与 Terminated）
    pub trace: Vec<Phase>,
}

/// Planner / Replanner 之后的路由
pub fn route_after_planner(state: &OrchestrationState) -> Signal {
    match state.plan() {
        Some(plan) if !plan.is_empty() => Signal::PlanReady,
        _ => Signal::PlanEmpty,
    }
}

/// 执行器之后的路由，按以下顺序判定：
/// 1. 最后一条消息是工具调用请求 -> ToolRequested
/// 2. 最后一条消息被判定为失败 -> 有额度则 StepFailed，否则 ReplanExhausted
/// 3. 还有剩余步骤 -> StepsRemaining
/// 4. 否则 StepsExhausted
pub fn route_after_executor(state: &OrchestrationState, planning: &PlanningSection) -> Signal {
    let Some(last) = state.last_message() else {
        return Signal::StepsExhausted;
    };
    if last.is_tool_request() {
        return Signal::ToolRequested;
    }
    if planning.failure_detection.is_failure(last) {
        return if state.replan_count() < planning.max_replans {
            Signal::StepFailed
        } else {
            Signal::ReplanExhausted
        };
    }
    if state.has_remaining_steps() {
        Signal::StepsRemaining
    } else {
        Signal::StepsExhausted
    }
}

/// 执行最后一条消息里挂起的工具调用，结果连同失败标签追加到会话历史
pub(crate) async fn run_pending_tool(
    tools: &ToolExecutor,
    state: &mut OrchestrationState,
    events: &EventSink,
) {
    let Some(call) = state.last_message().and_then(|m| m.tool_call.clone()) else {
        tracing::warn!("No pending tool call");
        state.push_message(Message::tool_result("Error: No pending tool call", true));
        return;
    };

    let outcome = tools.execute(&call).await;
    let failed = outcome.is_failed();
    let content = outcome.into_content();

    tracing::info!(
        tool = %call.tool,
        failed,
        observation = %truncate_chars(&content, 100),
        "Tool finished"
    );
    events.emit(WorkflowEvent::Observation {
        tool: call.tool.clone(),
        preview: truncate_chars(&content, OBSERVATION_PREVIEW_CHARS).to_string(),
        failed,
    });
    state.push_message(Message::tool_result(content, failed));
}

pub struct PlanExecuteWorkflow {
    planner: Planner,
    executor: StepExecutor,
    tracker: StepResultTracker,
    replanner: Replanner,
    tools: Arc<ToolExecutor>,
    planning: PlanningSection,
    events: EventSink,
}

impl PlanExecuteWorkflow {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptSet>,
        tools: Arc<ToolExecutor>,
        planning: PlanningSection,
    ) -> Self {
        let tool_section = tool_prompt_section(tools.registry());
        Self {
            planner: Planner::new(llm.clone(), prompts.clone()),
            executor: StepExecutor::new(
                llm.clone(),
                prompts.clone(),
                tool_section,
                planning.step_preview_chars,
            ),
            tracker: StepResultTracker::new(),
            replanner: Replanner::new(llm, prompts, planning.replan_summary_chars),
            tools,
            planning,
            events: EventSink::default(),
        }
    }

    /// 把过程事件推送到前端（CLI 进度输出等）
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        let sink = EventSink::new(tx);
        self.planner = self.planner.with_events(sink.clone());
        self.executor = self.executor.with_events(sink.clone());
        self.tracker = self.tracker.with_events(sink.clone());
        self.replanner = self.replanner.with_events(sink.clone());
        self.events = sink;
        self
    }

    pub fn planning(&self) -> &PlanningSection {
        &self.planning
    }

    /// 以一条用户请求开始一次 run
    pub async fn run(&self, user_request: &str) -> Result<WorkflowResult, AgentError> {
        self.run_state(OrchestrationState::new(user_request)).await
    }

    /// 在给定状态上运行状态机直到终止
    pub async fn run_state(
        &self,
        mut state: OrchestrationState,
    ) -> Result<WorkflowResult, AgentError> {
        let mut phase = Phase::initial();
        let mut trace = vec![phase];
        let mut executor_turns = 0usize;
        let mut termination = TerminationReason::InvalidTransition;

        while phase != Phase::Terminated {
            let signal = match phase {
                Phase::Planning => {
                    match self.planner.plan(&mut state).await {
                        Ok(()) => {}
                        Err(AgentError::NoUserRequest) => {
                            tracing::warn!("No user request found, nothing to plan");
                        }
                        Err(e) => return Err(e),
                    }
                    route_after_planner(&state)
                }
                Phase::Executing => {
                    // 游标到末尾时执行器为 no-op，仍需按最后一条消息路由
                    if executor_turns >= self.planning.max_steps && state.has_remaining_steps() {
                        tracing::warn!(
                            max_steps = self.planning.max_steps,
                            step = state.current_step_index() + 1,
                            "Step budget exhausted"
                        );
                        Signal::BudgetExhausted
                    } else {
                        if self.executor.execute(&mut state).await?.is_some() {
                            executor_turns += 1;
                        }
                        route_after_executor(&state, &self.planning)
                    }
                }
                Phase::AwaitingTool => {
                    run_pending_tool(&self.tools, &mut state, &self.events).await;
                    Signal::ToolFinished
                }
                Phase::ProcessingResult => {
                    self.tracker.record(&mut state);
                    Signal::ResultRecorded
                }
                Phase::Replanning => {
                    self.replanner.replan(&mut state).await?;
                    route_after_planner(&state)
                }
                Phase::Terminated => break,
            };

            let to = next(phase, signal);
            tracing::debug!(from = ?phase, ?signal, to = ?to, "transition");
            if to == Phase::Terminated {
                termination = termination_reason(phase, signal);
            }
            trace.push(to);
            phase = to;
        }

        tracing::info!(
            reason = ?termination,
            replan_count = state.replan_count(),
            executor_turns,
            "Workflow terminated"
        );
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
