//! 编排状态
//!
//! 每次 run 初始化一份。安装新 Plan（Planner 或 Replanner）时执行游标归零、步骤结果清空；
//! replan_count 在 Planner 路径归零，在 Replanner 路径 +1。

use serde::Serialize;

use crate::memory::{Conversation, Message, StepRecord, StepResults};
use crate::plan::Plan;

#[derive(Clone, Debug, Default, Serialize)]
pub struct OrchestrationState {
    pub conversation: Conversation,
    plan: Option<Plan>,
    current_step_index: usize,
    step_results: StepResults,
    replan_count: u32,
}

impl OrchestrationState {
    /// 以一条用户请求开始的新状态
    pub fn new(user_request: impl Into<String>) -> Self {
        let mut state = Self::default();
        state.conversation.push(Message::user(user_request));
        state
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn step_results(&self) -> &StepResults {
        &self.step_results
    }

    pub fn replan_count(&self) -> u32 {
        self.replan_count
    }

    pub fn total_steps(&self) -> usize {
        self.plan.as_ref().map_or(0, Plan::total_steps)
    }

    /// 是否还有未执行的步骤
    pub fn has_remaining_steps(&self) -> bool {
        self.plan.is_some() && self.current_step_index < self.total_steps()
    }

    /// Planner 路径：安装新计划并清零 replan_count
    pub fn install_plan(&mut self, plan: Plan) {
        self.reset_with(plan);
        self.replan_count = 0;
    }

    /// Replanner 路径：安装新计划，replan_count +1
    pub fn install_replan(&mut self, plan: Plan) {
        self.reset_with(plan);
        self.replan_count += 1;
    }

    fn reset_with(&mut self, plan: Plan) {
        self.plan = Some(plan);
        self.current_step_index = 0;
        self.step_results.clear();
    }

    /// 在当前游标处记录结果并前进一步（唯一推进游标的地方，由 StepResultTracker 调用）
    pub(crate) fn record_and_advance(&mut self, record: StepRecord) -> usize {
        let index = self.current_step_index;
        debug_assert!(index < self.total_steps(), "cursor already at end of plan");
        self.step_results.record(index, record);
        self.current_step_index = index + 1;
        index
    }

    pub fn push_message(&mut self, msg: Message) {
        self.conversation.push(msg);
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.conversation.last()
    }

    /// run 的结果：最后一条消息的内容
    pub fn final_response(&self) -> String {
        self.last_message()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{step, StepAction};

    fn two_step_plan() -> Plan {
        Plan::new(
            "g",
            "r",
            vec![
                step(1, StepAction::ReadFile, "a.txt"),
                step(2, StepAction::Analyze, ""),
            ],
        )
    }

    fn rec(s: &str) -> StepRecord {
        StepRecord {
            content: s.to_string(),
            failed: false,
        }
    }

    #[test]
    fn test_new_state_has_user_request() {
        let state = OrchestrationState::new("list files in root");
        assert_eq!(state.conversation.last_user_request(), Some("list files in root"));
        assert!(state.plan().is_none());
        assert_eq!(state.total_steps(), 0);
        assert!(!state.has_remaining_steps());
    }

    #[test]
    fn test_install_plan_resets_tracking() {
        let mut state = OrchestrationState::new("x");
        state.install_plan(two_step_plan());
        state.record_and_advance(rec("a"));
        state.install_replan(two_step_plan());
        state.record_and_advance(rec("b"));
        assert_eq!(state.replan_count(), 1);

        state.install_plan(two_step_plan());
        assert_eq!(state.current_step_index(), 0);
        assert!(state.step_results().is_empty());
        assert_eq!(state.replan_count(), 0);
    }

    #[test]
    fn test_install_replan_increments_by_one() {
        let mut state = OrchestrationState::new("x");
        state.install_plan(two_step_plan());
        state.record_and_advance(rec("a"));
        state.install_replan(two_step_plan());
        assert_eq!(state.replan_count(), 1);
        assert_eq!(state.current_step_index(), 0);
        assert!(state.step_results().is_empty());
        state.install_replan(two_step_plan());
        assert_eq!(state.replan_count(), 2);
    }

    #[test]
    fn test_total_steps_matches_plan() {
        let mut state = OrchestrationState::new("x");
        state.install_plan(two_step_plan());
        assert_eq!(state.total_steps(), state.plan().unwrap().steps().len());
        state.record_and_advance(rec("a"));
        state.record_and_advance(rec("b"));
        assert_eq!(state.current_step_index(), state.total_steps());
        assert!(!state.has_remaining_steps());
    }

    #[test]
    fn test_final_response_is_last_message() {
        let mut state = OrchestrationState::default();
        assert_eq!(state.final_response(), "");
        state.push_message(Message::user("q"));
        state.push_message(Message::tool_result("alpha.txt", false));
        assert_eq!(state.final_response(), "alpha.txt");
    }
}
