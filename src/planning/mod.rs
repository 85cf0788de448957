//! 规划层：Planner、StepExecutor、StepResultTracker、Replanner 与过程事件

pub mod events;
pub mod executor;
pub mod planner;
pub mod replanner;
pub mod tracker;

pub use events::{truncate_chars, EventSink, WorkflowEvent};
pub use executor::{has_failure_marker, ExecutorOutput, StepExecutor, FAILURE_MARKER};
pub use planner::Planner;
pub use replanner::Replanner;
pub use tracker::StepResultTracker;
