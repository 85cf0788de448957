//! Replanner：根据目标与已有步骤结果生成修订后的 Plan
//!
//! 与 Planner 共用结构化生成；安装时游标与结果清空，replan_count 在原值上 +1。无当前计划时为 no-op。

use std::sync::Arc;

use crate::core::{AgentError, OrchestrationState};
use crate::llm::{generate_structured, LlmClient};
use crate::memory::{Message, StepResults};
use crate::plan::Plan;
use crate::planning::events::{truncate_chars, EventSink, WorkflowEvent};
use crate::prompts::{render, PromptSet};

pub struct Replanner {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    summary_chars: usize,
    events: EventSink,
}

impl Replanner {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>, summary_chars: usize) -> Self {
        Self {
            llm,
            prompts,
            summary_chars,
            events: EventSink::default(),
        }
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// 生成并安装新计划；返回 false 表示没有当前计划（no-op）
    pub async fn replan(&self, state: &mut OrchestrationState) -> Result<bool, AgentError> {
        let Some(plan) = state.plan() else {
            return Ok(false);
        };
        let goal = plan.goal().to_string();
        let total_steps = plan.total_steps().to_string();
        let replan_count = state.replan_count() + 1;
        let completed_steps = state.step_results().len();

        tracing::warn!(replan_count, completed_steps, "Replanning triggered");
        self.events.emit(WorkflowEvent::Replanning {
            replan_count,
            completed_steps,
        });

        let results_summary = results_summary(state.step_results(), self.summary_chars);
        let current_step = state.current_step_index().to_string();
        let prompt = render(
            &self.prompts.replanner_template,
            &[
                ("goal", &goal),
                ("results_summary", &results_summary),
                ("current_step", &current_step),
                ("total_steps", &total_steps),
            ],
        );
        let messages = vec![
            Message::system(self.prompts.replanner.clone()),
            Message::user(prompt),
        ];

        let new_plan: Plan = generate_structured(self.llm.as_ref(), &messages).await?;
        new_plan
            .validate()
            .map_err(|e| AgentError::Generation(e.to_string()))?;
        let new_plan = new_plan.with_goal(goal);

        tracing::info!(
            goal = %truncate_chars(new_plan.goal(), 50),
            new_steps = new_plan.total_steps(),
            "New plan created"
        );
        self.events.emit(WorkflowEvent::PlanCreated {
            goal: new_plan.goal().to_string(),
            reasoning: truncate_chars(new_plan.reasoning(), 100).to_string(),
            total_steps: new_plan.total_steps(),
            replan_count,
        });

        state.install_replan(new_plan);
        Ok(true)
    }
}

/// "Step N: <结果前 summary_chars 个字符>"，按步骤下标升序逐行拼接
fn results_summary(results: &StepResults, summary_chars: usize) -> String {
    results
        .iter()
        .map(|(idx, record)| {
            format!(
                "Step {}: {}",
                idx + 1,
                truncate_chars(&record.content, summary_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::StepRecord;
    use crate::plan::{step, StepAction};

    const REVISED: &str = r#"{"goal": "ignored", "reasoning": "try listing first", "steps": [
        {"step_number": 1, "action": "list_directory", "description": "find the file", "input_data": ".", "expected_output": "names"},
        {"step_number": 2, "action": "read_file", "description": "read it", "input_data": "notes.md", "expected_output": "text"},
        {"step_number": 3, "action": "analyze", "description": "summarize", "input_data": "", "expected_output": "summary"}
    ]}"#;

    fn replanner(mock: Arc<MockLlmClient>) -> Replanner {
        Replanner::new(mock, Arc::new(PromptSet::default()), 300)
    }

    fn executed_state() -> OrchestrationState {
        let mut state = OrchestrationState::new("summarize notes");
        state.install_plan(Plan::new(
            "summarize notes",
            "r",
            vec![
                step(1, StepAction::ReadFile, "notes.txt"),
                step(2, StepAction::Analyze, ""),
            ],
        ));
        state.record_and_advance(StepRecord {
            content: "y".repeat(400),
            failed: false,
        });
        state
    }

    #[tokio::test]
    async fn test_replan_installs_fresh_plan_and_counts() {
        let mock = Arc::new(MockLlmClient::scripted([REVISED]));
        let mut state = executed_state();
        assert!(replanner(mock.clone()).replan(&mut state).await.unwrap());

        assert_eq!(state.replan_count(), 1);
        assert_eq!(state.current_step_index(), 0);
        assert!(state.step_results().is_empty());
        let plan = state.plan().unwrap();
        assert_eq!(plan.total_steps(), 3);
        assert_eq!(plan.goal(), "summarize notes");

        let sent = mock.request(0).unwrap();
        let prompt = &sent[1].content;
        assert!(prompt.contains("Goal: summarize notes"));
        assert!(prompt.contains(&format!("Step 1: {}", "y".repeat(300))));
        assert!(!prompt.contains(&"y".repeat(301)));
        assert!(prompt.contains("Stopped at step 1 of 2"));
    }

    #[tokio::test]
    async fn test_noop_without_plan() {
        let mock = Arc::new(MockLlmClient::scripted([REVISED]));
        let mut state = OrchestrationState::new("x");
        assert!(!replanner(mock.clone()).replan(&mut state).await.unwrap());
        assert_eq!(state.replan_count(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_error_propagates_without_counting() {
        let mock = Arc::new(MockLlmClient::scripted(["no plan for you"]));
        let mut state = executed_state();
        let err = replanner(mock).replan(&mut state).await.unwrap_err();
        assert!(matches!(err, AgentError::Generation(_)));
        assert_eq!(state.replan_count(), 0);
        assert_eq!(state.current_step_index(), 1);
    }

    #[test]
    fn test_results_summary_lines() {
        let mut results = StepResults::new();
        results.record(
            0,
            StepRecord {
                content: "a".to_string(),
                failed: false,
            },
        );
        results.record(
            1,
            StepRecord {
                content: "b".to_string(),
                failed: true,
            },
        );
        assert_eq!(results_summary(&results, 300), "Step 1: a\nStep 2: b");
    }
}
