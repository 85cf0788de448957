//! Code Agent - Plan-Execute-Replan 智能体
//!
//! 模块划分：
//! - **agent**: CodeAgent 运行时与运行模式（planning / simple）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排状态与错误类型
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）、结构化生成
//! - **memory**: 会话历史与步骤结果
//! - **observability**: 日志初始化
//! - **plan**: Plan / PlanStep 数据模型
//! - **planning**: Planner、StepExecutor、StepResultTracker、Replanner 与过程事件
//! - **prompts**: 提示词集合
//! - **tools**: 沙箱文件工具、注册表与执行器
//! - **workflow**: 阶段转移表与编排引擎

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod plan;
pub mod planning;
pub mod prompts;
pub mod tools;
pub mod workflow;

pub use crate::agent::{AgentMode, CodeAgent};
pub use crate::core::{AgentError, OrchestrationState};
pub use crate::plan::{Plan, PlanStep, StepAction};
pub use crate::workflow::{PlanExecuteWorkflow, TerminationReason, WorkflowResult};
