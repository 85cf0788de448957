//! 工具调用层：沙箱文件工具、注册表、执行器与工具调用协议

pub mod executor;
pub mod filesystem;
pub mod registry;
pub mod schema;

pub use executor::{ToolExecutor, DEFAULT_TOOL_TIMEOUT_SECS};
pub use filesystem::{ListDirectoryTool, ReadFileTool, Sandbox, WriteFileTool, DEFAULT_SANDBOX_ROOT};
pub use registry::{Tool, ToolOutcome, ToolRegistry};
pub use schema::{extract_json_block, parse_model_reply, tool_call_schema_json, ModelReply, ToolCall};

use std::path::Path;

/// 注册三个沙箱文件工具
pub fn file_tools(root: impl AsRef<Path>) -> ToolRegistry {
    let sandbox = Sandbox::new(root);
    let mut registry = ToolRegistry::new();
    registry.register(ReadFileTool::new(sandbox.clone()));
    registry.register(WriteFileTool::new(sandbox.clone()));
    registry.register(ListDirectoryTool::new(sandbox));
    registry
}

/// 拼入执行器 system prompt 的工具清单与调用格式
pub fn tool_prompt_section(registry: &ToolRegistry) -> String {
    format!(
        "Available tools:\n{}\n\nTo call a tool respond with only a JSON object matching:\n{}",
        registry.to_schema_json(),
        tool_call_schema_json()
    )
}
