//! Planner：从最近一条用户请求生成初始 Plan
//!
//! 结构化生成的结果经过数据约束校验，goal 强制替换为用户原始请求；安装时游标、结果、replan_count 全部归零。

use std::sync::Arc;

use crate::core::{AgentError, OrchestrationState};
use crate::llm::{generate_structured, LlmClient};
use crate::memory::Message;
use crate::plan::Plan;
use crate::planning::events::{truncate_chars, EventSink, WorkflowEvent};
use crate::prompts::PromptSet;

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    events: EventSink,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>) -> Self {
        Self {
            llm,
            prompts,
            events: EventSink::default(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// 生成并安装计划。没有用户请求时返回 NoUserRequest 且不改动状态
    pub async fn plan(&self, state: &mut OrchestrationState) -> Result<(), AgentError> {
        let request = state
            .conversation
            .last_user_request()
            .filter(|r| !r.trim().is_empty())
            .ok_or(AgentError::NoUserRequest)?
            .to_string();

        tracing::info!(request = %truncate_chars(&request, 100), "Planning started");

        let messages = vec![
            Message::system(self.prompts.planner.clone()),
            Message::user(format!("Create a plan for: {request}")),
        ];
        let plan: Plan = generate_structured(self.llm.as_ref(), &messages).await?;
        plan.validate()
            .map_err(|e| AgentError::Generation(e.to_string()))?;
        let plan = plan.with_goal(request);

        tracing::info!(
            goal = %truncate_chars(plan.goal(), 50),
            reasoning = %truncate_chars(plan.reasoning(), 100),
            total_steps = plan.total_steps(),
            "Plan created"
        );
        for step in plan.steps() {
            tracing::debug!(
                step = step.step_number,
                action = %step.action,
                description = %truncate_chars(&step.description, 50),
                "Plan step"
            );
        }
        self.events.emit(WorkflowEvent::PlanCreated {
            goal: plan.goal().to_string(),
            reasoning: truncate_chars(plan.reasoning(), 100).to_string(),
            total_steps: plan.total_steps(),
            replan_count: 0,
        });

        state.install_plan(plan);
        Ok(())
    }
}
