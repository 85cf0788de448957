//! 核心：错误类型与编排状态

pub mod error;
pub mod state;

pub use error::AgentError;
pub use state::OrchestrationState;
