//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CODE_AGENT__*` 覆盖（双下划线表示嵌套，如 `CODE_AGENT__LLM__PROVIDER=deepseek`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::agent::AgentMode;
use crate::core::AgentError;
use crate::tools::{DEFAULT_SANDBOX_ROOT, DEFAULT_TOOL_TIMEOUT_SECS};
use crate::workflow::{FailureDetection, MAX_REPLANS};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub planning: PlanningSection,
    pub tools: ToolsSection,
    pub prompts: PromptsSection,
}

/// [app] 段：运行模式、沙箱根目录、日志级别
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    pub mode: AgentMode,
    /// 文件工具的沙箱根目录
    pub sandbox_root: PathBuf,
    /// 默认日志级别，RUST_LOG 可覆盖
    pub log_level: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            mode: AgentMode::Planning,
            sandbox_root: PathBuf::from(DEFAULT_SANDBOX_ROOT),
            log_level: "info".to_string(),
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / deepseek / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [planning] 段：重规划上限、单次 run 的执行轮数上限、结果摘要截断、失败判定方式
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanningSection {
    pub max_replans: u32,
    /// 单次 run 内执行器最多被调用的次数，防止不调用工具的步骤原地打转
    pub max_steps: usize,
    /// 执行 prompt 中每条历史结果的最大字符数
    pub step_preview_chars: usize,
    /// 重规划 prompt 中每条结果的最大字符数
    pub replan_summary_chars: usize,
    pub failure_detection: FailureDetection,
}

impl Default for PlanningSection {
    fn default() -> Self {
        Self {
            max_replans: MAX_REPLANS,
            max_steps: 20,
            step_preview_chars: 200,
            replan_summary_chars: 300,
            failure_detection: FailureDetection::Marker,
        }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

/// [prompts] 段：可选的提示词覆盖文件（TOML）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsSection {
    pub file: Option<PathBuf>,
}

/// 从 config 目录加载配置，环境变量 CODE_AGENT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CODE_AGENT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, AgentError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, skipping");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CODE_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    Ok(builder.build()?.try_deserialize()?)
}
