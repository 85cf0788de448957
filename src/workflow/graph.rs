//! 转移表：(阶段, 信号) -> 下一阶段
//!
//! 全函数：表中未列出的组合一律进入 Terminated 并告警；Terminated 为吸收态。

use crate::workflow::types::{Phase, Signal, TerminationReason};

/// 计算下一阶段
pub fn next(phase: Phase, signal: Signal) -> Phase {
    use Phase::{AwaitingTool, Executing, Planning, ProcessingResult, Replanning, Terminated};
    use Signal::{
        BudgetExhausted, PlanEmpty, PlanReady, ReplanExhausted, ResultRecorded, StepFailed,
        StepsExhausted, StepsRemaining, ToolFinished, ToolRequested,
    };

    match (phase, signal) {
        (Terminated, _) => Terminated,
        (Planning | Replanning, PlanReady) => Executing,
        (Planning | Replanning, PlanEmpty) => Terminated,
        (Executing, ToolRequested) => AwaitingTool,
        (Executing, StepFailed) => Replanning,
        (Executing, StepsRemaining) => Executing,
        (Executing, ReplanExhausted | StepsExhausted | BudgetExhausted) => Terminated,
        (AwaitingTool, ToolFinished) => ProcessingResult,
        (ProcessingResult, ResultRecorded) => Executing,
        (phase, signal) => {
            tracing::warn!(?phase, ?signal, "invalid transition, terminating");
            Terminated
        }
    }
}

/// 导致终止的信号对应的终止原因
pub fn termination_reason(phase: Phase, signal: Signal) -> TerminationReason {
    match (phase, signal) {
        (Phase::Planning | Phase::Replanning, Signal::PlanEmpty) => TerminationReason::EmptyPlan,
        (Phase::Executing, Signal::StepsExhausted) => TerminationReason::StepsCompleted,
        (Phase::Executing, Signal::ReplanExhausted) => TerminationReason::ReplanBudgetExhausted,
        (Phase::Executing, Signal::BudgetExhausted) => TerminationReason::StepBudgetExhausted,
        _ => TerminationReason::InvalidTransition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHASES: [Phase; 6] = [
        Phase::Planning,
        Phase::Executing,
        Phase::AwaitingTool,
        Phase::ProcessingResult,
        Phase::Replanning,
        Phase::Terminated,
    ];

    const SIGNALS: [Signal; 10] = [
        Signal::PlanReady,
        Signal::PlanEmpty,
        Signal::ToolRequested,
        Signal::StepFailed,
        Signal::ReplanExhausted,
        Signal::StepsRemaining,
        Signal::StepsExhausted,
        Signal::BudgetExhausted,
        Signal::ToolFinished,
        Signal::ResultRecorded,
    ];

    #[test]
    fn test_listed_transitions() {
        assert_eq!(next(Phase::Planning, Signal::PlanReady), Phase::Executing);
        assert_eq!(next(Phase::Planning, Signal::PlanEmpty), Phase::Terminated);
        assert_eq!(next(Phase::Executing, Signal::ToolRequested), Phase::AwaitingTool);
        assert_eq!(next(Phase::Executing, Signal::StepFailed), Phase::Replanning);
        assert_eq!(next(Phase::Executing, Signal::ReplanExhausted), Phase::Terminated);
        assert_eq!(next(Phase::Executing, Signal::StepsRemaining), Phase::Executing);
        assert_eq!(next(Phase::Executing, Signal::StepsExhausted), Phase::Terminated);
        assert_eq!(next(Phase::Executing, Signal::BudgetExhausted), Phase::Terminated);
        assert_eq!(next(Phase::AwaitingTool, Signal::ToolFinished), Phase::ProcessingResult);
        assert_eq!(next(Phase::ProcessingResult, Signal::ResultRecorded), Phase::Executing);
        assert_eq!(next(Phase::Replanning, Signal::PlanReady), Phase::Executing);
        assert_eq!(next(Phase::Replanning, Signal::PlanEmpty), Phase::Terminated);
    }

    #[test]
    fn test_terminated_is_absorbing() {
        for signal in SIGNALS {
            assert_eq!(next(Phase::Terminated, signal), Phase::Terminated);
        }
    }

    #[test]
    fn test_exhaustive_table_only_reaches_known_phases() {
        let mut legal = 0;
        for phase in PHASES {
            for signal in SIGNALS {
                let to = next(phase, signal);
                assert!(PHASES.contains(&to));
                if phase != Phase::Terminated && to != Phase::Terminated {
                    legal += 1;
                }
            }
        }
        // 非终止转移正好 7 条
        assert_eq!(legal, 7);
    }

    #[test]
    fn test_replanning_only_from_executing() {
        for phase in PHASES {
            for signal in SIGNALS {
                if next(phase, signal) == Phase::Replanning {
                    assert_eq!((phase, signal), (Phase::Executing, Signal::StepFailed));
                }
            }
        }
    }

    #[test]
    fn test_termination_reasons() {
        assert_eq!(
            termination_reason(Phase::Planning, Signal::PlanEmpty),
            TerminationReason::EmptyPlan
        );
        assert_eq!(
            termination_reason(Phase::Executing, Signal::StepsExhausted),
            TerminationReason::StepsCompleted
        );
        assert_eq!(
            termination_reason(Phase::Executing, Signal::ReplanExhausted),
            TerminationReason::ReplanBudgetExhausted
        );
        assert_eq!(
            termination_reason(Phase::AwaitingTool, Signal::PlanReady),
            TerminationReason::InvalidTransition
        );
    }
}
