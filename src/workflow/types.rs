//! 状态机类型定义：阶段、路由信号、终止原因、失败判定方式

use serde::{Deserialize, Serialize};

use crate::memory::Message;

/// 单次 run 内允许的最大重规划次数
pub const MAX_REPLANS: u32 = 3;

/// 编排阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Executing,
    AwaitingTool,
    ProcessingResult,
    Replanning,
    /// 吸收态
    Terminated,
}

impl Phase {
    /// 每次 run 从 Planning 开始
    pub fn initial() -> Self {
        Phase::Planning
    }
}

/// 每个阶段结束时产生的路由信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// 产出了至少一步的计划
    PlanReady,
    /// 没有计划或计划为空
    PlanEmpty,
    /// 最后一条消息是工具调用请求
    ToolRequested,
    /// 执行失败且仍有重规划额度
    StepFailed,
    /// 执行失败且重规划额度已用完
    ReplanExhausted,
    StepsRemaining,
    StepsExhausted,
    /// 执行轮数额度用完
    BudgetExhausted,
    ToolFinished,
    ResultRecorded,
}

/// run 结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    EmptyPlan,
    StepsCompleted,
    ReplanBudgetExhausted,
    StepBudgetExhausted,
    /// simple 模式下模型给出文本回复
    SimpleResponse,
    /// 转移表中不存在的 (阶段, 信号) 组合
    InvalidTransition,
}

/// 执行结果的失败判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDetection {
    /// 按消息上的失败标签（工具 Failed 或执行器回复带 STEP_FAILED: 标记）
    #[default]
    Marker,
    /// 兼容模式：内容中出现不区分大小写的 "error" 即视为失败。
    /// 正常结果里出现该词（如 "No errors found"）也会被误判
    Substring,
}

impl FailureDetection {
    pub fn is_failure(&self, msg: &Message) -> bool {
        match self {
            FailureDetection::Marker => msg.failed,
            FailureDetection::Substring => msg.content.to_lowercase().contains("error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_detection_uses_tag() {
        let benign = Message::assistant("No errors found.");
        let tagged = Message::assistant("STEP_FAILED: missing").with_failed(true);
        assert!(!FailureDetection::Marker.is_failure(&benign));
        assert!(FailureDetection::Marker.is_failure(&tagged));
    }

    #[test]
    fn test_substring_detection_misroutes_benign_text() {
        let benign = Message::assistant("No ERRORS found.");
        assert!(FailureDetection::Substring.is_failure(&benign));
        assert!(!FailureDetection::Substring.is_failure(&Message::assistant("all good")));
    }

    #[test]
    fn test_failure_detection_deserializes() {
        #[derive(Deserialize)]
        struct Wrap {
            mode: FailureDetection,
        }
        let w: Wrap = toml::from_str("mode = \"substring\"").unwrap();
        assert_eq!(w.mode, FailureDetection::Substring);
    }
}
