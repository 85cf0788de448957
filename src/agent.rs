//! Agent 运行时
//!
//! CodeAgent 把 LLM、提示词集合、沙箱文件工具与规划配置组装起来，按模式跑一次请求：
//! planning 模式走 Plan-Execute-Replan 状态机，simple 模式走单循环工具调用。
//! 每次 run 都在带 run_id 的 tracing span 内执行。

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::config::{AppConfig, PlanningSection};
use crate::core::AgentError;
use crate::llm::{create_llm_from_config, LlmClient};
use crate::planning::WorkflowEvent;
use crate::prompts::PromptSet;
use crate::tools::{file_tools, ToolExecutor};
use crate::workflow::{PlanExecuteWorkflow, SimpleWorkflow, WorkflowResult};

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// 不规划，直接工具调用循环
    Simple,
    /// Plan-Execute-Replan
    #[default]
    Planning,
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentMode::Simple => write!(f, "simple"),
            AgentMode::Planning => write!(f, "planning"),
        }
    }
}

pub struct CodeAgent {
    mode: AgentMode,
    llm: Arc<dyn LlmClient>,
    planning: PlanExecuteWorkflow,
    simple: SimpleWorkflow,
}

impl CodeAgent {
    pub fn new(
        mode: AgentMode,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptSet>,
        tools: Arc<ToolExecutor>,
        planning: PlanningSection,
    ) -> Self {
        let max_steps = planning.max_steps;
        Self {
            mode,
            llm: llm.clone(),
            planning: PlanExecuteWorkflow::new(llm.clone(), prompts.clone(), tools.clone(), planning),
            simple: SimpleWorkflow::new(llm, prompts, tools, max_steps),
        }
    }

    /// 从配置构建：加载提示词、选择 LLM 后端、创建沙箱目录并注册文件工具
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let prompts = PromptSet::load(cfg.prompts.file.as_deref())?;
        let llm = create_llm_from_config(&cfg.llm);

        std::fs::create_dir_all(&cfg.app.sandbox_root).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create sandbox root {}: {}",
                cfg.app.sandbox_root.display(),
                e
            )
        })?;
        let tools = ToolExecutor::new(
            file_tools(&cfg.app.sandbox_root),
            cfg.tools.tool_timeout_secs,
        );

        tracing::info!(
            mode = %cfg.app.mode,
            sandbox_root = %cfg.app.sandbox_root.display(),
            tools = ?tools.tool_names(),
            "Agent initialized"
        );

        Ok(Self::new(
            cfg.app.mode,
            llm,
            Arc::new(prompts),
            Arc::new(tools),
            cfg.planning.clone(),
        ))
    }

    /// 两种模式的过程事件都推送到 tx
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        self.planning = self.planning.with_events(tx.clone());
        self.simple = self.simple.with_events(tx);
        self
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    /// 跑一次请求，只返回最终回复
    pub async fn run(&self, input: &str) -> Result<String, AgentError> {
        self.run_detailed(input).await.map(|r| r.response)
    }

    /// 跑一次请求，返回最终状态、终止原因与阶段轨迹
    pub async fn run_detailed(&self, input: &str) -> Result<WorkflowResult, AgentError> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, mode = %self.mode);

        async {
            let (init_prompt, init_completion, _) = self.llm.token_usage();
            let result = match self.mode {
                AgentMode::Planning => self.planning.run(input).await,
                AgentMode::Simple => self.simple.run(input).await,
            };
            let (prompt, completion, _) = self.llm.token_usage();
            tracing::info!(
                prompt_tokens = prompt.saturating_sub(init_prompt),
                completion_tokens = completion.saturating_sub(init_completion),
                "Token usage"
            );
            if let Err(ref e) = result {
                tracing::error!(error = %e, "Run failed");
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::workflow::TerminationReason;

    fn agent(mode: AgentMode, mock: Arc<MockLlmClient>, root: &std::path::Path) -> CodeAgent {
        CodeAgent::new(
            mode,
            mock,
            Arc::new(PromptSet::default()),
            Arc::new(ToolExecutor::new(file_tools(root), 5)),
            PlanningSection::default(),
        )
    }

    #[tokio::test]
    async fn test_planning_mode_empty_plan_echoes_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let mock = Arc::new(MockLlmClient::scripted([
            r#"{"goal": "", "reasoning": "nothing to do", "steps": []}"#,
        ]));
        let agent = agent(AgentMode::Planning, mock, dir.path());
        let result = agent.run_detailed("hello there").await.unwrap();
        assert_eq!(result.termination, TerminationReason::EmptyPlan);
        assert_eq!(result.response, "hello there");
    }

    #[tokio::test]
    async fn test_simple_mode_answers_directly() {
        let dir = tempfile::TempDir::new().unwrap();
        let mock = Arc::new(MockLlmClient::scripted(["Hi!"]));
        let agent = agent(AgentMode::Simple, mock, dir.path());
        assert_eq!(agent.run("hello").await.unwrap(), "Hi!");
    }

    #[test]
    fn test_from_config_creates_sandbox() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        cfg.app.sandbox_root = dir.path().join("results");
        let agent = CodeAgent::from_config(&cfg).unwrap();
        assert!(cfg.app.sandbox_root.is_dir());
        assert_eq!(agent.mode(), AgentMode::Planning);
    }

    #[test]
    fn test_mode_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrap {
            mode: AgentMode,
        }
        let w: Wrap = toml::from_str("mode = \"simple\"").unwrap();
        assert_eq!(w.mode, AgentMode::Simple);
    }
}
