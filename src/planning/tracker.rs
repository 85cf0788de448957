//! 步骤结果记录：工具结果追加到历史之后调用，把结果写到当前游标处并前进一步

use crate::core::OrchestrationState;
use crate::memory::StepRecord;
use crate::planning::events::{truncate_chars, EventSink, WorkflowEvent};

#[derive(Debug, Default)]
pub struct StepResultTracker {
    events: EventSink,
}

impl StepResultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// 取最后一条消息的文本与失败标签，记录到 current_step_index（覆盖旧值），游标 +1。返回记录的下标
    pub fn record(&self, state: &mut OrchestrationState) -> usize {
        let (content, failed) = state
            .last_message()
            .map(|m| (m.content.clone(), m.failed))
            .unwrap_or_default();

        let index = state.record_and_advance(StepRecord {
            content: content.clone(),
            failed,
        });

        tracing::info!(
            step = index + 1,
            failed,
            result_preview = %truncate_chars(&content, 100),
            "Step result processed"
        );
        self.events.emit(WorkflowEvent::StepRecorded {
            index,
            preview: truncate_chars(&content, 100).to_string(),
        });
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Message;
    use crate::plan::{step, Plan, StepAction};

    fn state() -> OrchestrationState {
        let mut state = OrchestrationState::new("x");
        state.install_plan(Plan::new(
            "x",
            "r",
            vec![
                step(1, StepAction::ListDirectory, "."),
                step(2, StepAction::ReadFile, "a.txt"),
            ],
        ));
        state
    }

    #[test]
    fn test_records_last_message_and_advances() {
        let tracker = StepResultTracker::new();
        let mut state = state();
        state.push_message(Message::tool_result("alpha.txt\nbeta.txt", false));
        assert_eq!(tracker.record(&mut state), 0);
        assert_eq!(state.current_step_index(), 1);
        assert_eq!(state.step_results().get(0).unwrap().content, "alpha.txt\nbeta.txt");
    }

    #[test]
    fn test_keeps_failure_tag() {
        let tracker = StepResultTracker::new();
        let mut state = state();
        state.push_message(Message::tool_result("Error: File not found: results/a.txt", true));
        tracker.record(&mut state);
        assert!(state.step_results().get(0).unwrap().failed);
    }

    #[test]
    fn test_recording_twice_at_same_index_overwrites() {
        let tracker = StepResultTracker::new();
        let mut state = state();
        state.push_message(Message::tool_result("first", false));
        tracker.record(&mut state);

        // 重新安装同一计划后在下标 0 再记录一次
        let plan = state.plan().unwrap().clone();
        state.install_replan(plan);
        state.push_message(Message::tool_result("retry", false));
        tracker.record(&mut state);
        assert_eq!(state.step_results().len(), 1);
        assert_eq!(state.step_results().get(0).unwrap().content, "retry");
        assert_eq!(state.current_step_index(), 1);
    }

    #[test]
    fn test_each_call_advances_exactly_one() {
        let tracker = StepResultTracker::new();
        let mut state = state();
        for expected in 1..=state.total_steps() {
            state.push_message(Message::tool_result("r", false));
            tracker.record(&mut state);
            assert_eq!(state.current_step_index(), expected);
        }
        assert!(!state.has_remaining_steps());
    }
}
