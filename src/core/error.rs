//! Agent 错误类型
//!
//! 工具层错误不在此列：文件读写失败以 ToolOutcome::Failed 作为数据返回，由编排器按标签路由。

use thiserror::Error;

/// 规划 / 执行过程中会向调用方传播的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 会话历史中没有用户消息；Planner 视为 no-op，编排器不会把它抛给调用方
    #[error("No user request found in messages")]
    NoUserRequest,

    /// 结构化生成未能产出合法 Plan（JSON 解析失败或违反数据约束）
    #[error("Plan generation failed: {0}")]
    Generation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Plan 违反数据约束（步骤编号非正数、非递增等）；在 Planner / Replanner 边界折叠为 Generation
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::Config(e.to_string())
    }
}
