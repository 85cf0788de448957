//! 沙箱文件系统工具
//!
//! Sandbox 绑定根目录：空路径 / "." / 根目录本身映射到根；已在根下的路径原样通过；其它相对路径拼到根下。
//! 含 `..` 或指向根外的绝对路径一律拒绝。ReadFileTool / WriteFileTool / ListDirectoryTool 基于 Sandbox。

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolOutcome};

/// 默认沙箱根目录
pub const DEFAULT_SANDBOX_ROOT: &str = "results";

/// 沙箱：所有文件路径都相对它解析
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 解析路径；越界时返回错误文本
    pub fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let trimmed = path.trim();
        if matches!(trimmed, "" | "." | "./") {
            return Ok(self.root.clone());
        }
        let candidate = Path::new(trimmed);
        if candidate.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(format!("Error: Path escapes sandbox: {trimmed}"));
        }
        if candidate.starts_with(&self.root) {
            return Ok(candidate.to_path_buf());
        }
        if candidate.is_absolute() {
            return Err(format!("Error: Path escapes sandbox: {trimmed}"));
        }
        Ok(self.root.join(trimmed.trim_start_matches("./")))
    }

    pub async fn read_file(&self, path: &str) -> ToolOutcome {
        let resolved = match self.resolve(path) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::Failed(e),
        };
        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => ToolOutcome::Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ToolOutcome::Failed(format!("Error: File not found: {}", resolved.display()))
            }
            Err(e) => ToolOutcome::Failed(format!("Error reading file: {e}")),
        }
    }

    pub async fn write_file(&self, path: &str, content: &str) -> ToolOutcome {
        let resolved = match self.resolve(path) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::Failed(e),
        };
        if let Some(parent) = resolved.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolOutcome::Failed(format!("Error writing file: {e}"));
            }
        }
        match tokio::fs::write(&resolved, content).await {
            Ok(()) => ToolOutcome::Ok(format!("Successfully wrote to {}", resolved.display())),
            Err(e) => ToolOutcome::Failed(format!("Error writing file: {e}")),
        }
    }

    /// 列目录：条目名按字典序排序后换行拼接
    pub async fn list_directory(&self, path: &str) -> ToolOutcome {
        let resolved = match self.resolve(path) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::Failed(e),
        };
        let mut dir = match tokio::fs::read_dir(&resolved).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return ToolOutcome::Failed(format!(
                    "Error: Directory not found: {}",
                    resolved.display()
                ))
            }
            Err(e) => return ToolOutcome::Failed(format!("Error listing directory: {e}")),
        };
        let mut entries = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => entries.push(entry.file_name().to_string_lossy().to_string()),
                Ok(None) => break,
                Err(e) => return ToolOutcome::Failed(format!("Error listing directory: {e}")),
            }
        }
        entries.sort();
        ToolOutcome::Ok(entries.join("\n"))
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn missing_arg(key: &str) -> ToolOutcome {
    ToolOutcome::Failed(format!("Error: missing required argument: {key}"))
}

/// read_file：读取文件内容
pub struct ReadFileTool {
    sandbox: Sandbox,
}

impl ReadFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read and return the content of a file (path relative to the results directory)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to read"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> ToolOutcome {
        let Some(path) = str_arg(&args, "path") else {
            return missing_arg("path");
        };
        tracing::info!(path = %path, "read_file tool execute");
        self.sandbox.read_file(path).await
    }
}

/// write_file：写入文件（覆盖）
pub struct WriteFileTool {
    sandbox: Sandbox,
}

impl WriteFileTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file (path relative to the results directory)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to write"},
                "content": {"type": "string", "description": "Content to write to the file"}
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> ToolOutcome {
        let Some(path) = str_arg(&args, "path") else {
            return missing_arg("path");
        };
        let Some(content) = str_arg(&args, "content") else {
            return missing_arg("content");
        };
        tracing::info!(path = %path, bytes = content.len(), "write_file tool execute");
        self.sandbox.write_file(path, content).await
    }
}

/// list_directory：列出目录，默认根目录
pub struct ListDirectoryTool {
    sandbox: Sandbox,
}

impl ListDirectoryTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List files and directories, newline separated (defaults to the results root)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Directory path to list", "default": "."}
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> ToolOutcome {
        let path = str_arg(&args, "path").unwrap_or(".");
        tracing::info!(path = %path, "list_directory tool execute");
        self.sandbox.list_directory(path).await
    }
}
