//! 编排状态机：阶段与信号、转移表、Plan-Execute-Replan 引擎与 simple 模式

pub mod engine;
pub mod graph;
pub mod simple;
pub mod types;

pub use engine::{route_after_executor, route_after_planner, PlanExecuteWorkflow, WorkflowResult};
pub use graph::{next, termination_reason};
pub use simple::SimpleWorkflow;
pub use types::{FailureDetection, Phase, Signal, TerminationReason, MAX_REPLANS};
