//! 记忆层：会话历史（只追加）与步骤结果日志

pub mod conversation;
pub mod step_results;

pub use conversation::{Conversation, Message, Role};
pub use step_results::{StepRecord, StepResults};
