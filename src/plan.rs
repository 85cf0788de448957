//! Plan 数据模型：PlanStep / Plan
//!
//! Plan 由 Planner / Replanner 产出后即不可变；新 Plan 整体替换旧 Plan，不做局部合并。
//! total_steps 由 steps 推导，不单独存储。

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// 步骤动作：固定词表，LLM 输出其它值时反序列化即失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// 读取文件
    #[serde(alias = "read-file")]
    ReadFile,
    /// 写入文件
    #[serde(alias = "write-file")]
    WriteFile,
    /// 列出目录
    #[serde(alias = "list-directory")]
    ListDirectory,
    /// 分析 / 总结，不一定需要工具
    Analyze,
}

impl StepAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::ReadFile => "read_file",
            StepAction::WriteFile => "write_file",
            StepAction::ListDirectory => "list_directory",
            StepAction::Analyze => "analyze",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 计划中的单个步骤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanStep {
    /// Step number (1-indexed)
    pub step_number: u32,
    /// Action to perform: read_file, write_file, list_directory, or analyze
    pub action: StepAction,
    /// What this step does
    pub description: String,
    /// Input data or target for this step
    pub input_data: String,
    /// Expected result of this step
    pub expected_output: String,
}

/// 完整执行计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// The user's original request
    goal: String,
    /// Why this plan was chosen
    reasoning: String,
    /// Steps to execute in order
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(goal: impl Into<String>, reasoning: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            goal: goal.into(),
            reasoning: reasoning.into(),
            steps,
        }
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&PlanStep> {
        self.steps.get(index)
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 以给定 goal 替换模型生成的 goal（goal 必须是用户原始请求的逐字拷贝）
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// 校验数据约束：step_number 为正且严格递增（因而唯一）
    pub fn validate(&self) -> Result<(), AgentError> {
        let mut previous = 0u32;
        for step in &self.steps {
            if step.step_number == 0 {
                return Err(AgentError::InvalidPlan(
                    "step_number must be positive".to_string(),
                ));
            }
            if step.step_number <= previous {
                return Err(AgentError::InvalidPlan(format!(
                    "step_number {} does not follow {}",
                    step.step_number, previous
                )));
            }
            previous = step.step_number;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn step(number: u32, action: StepAction, input: &str) -> PlanStep {
    PlanStep {
        step_number: number,
        action,
        description: format!("step {number}"),
        input_data: input.to_string(),
        expected_output: "done".to_string(),
    }
}
