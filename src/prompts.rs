//! 提示词集合
//!
//! 六个具名模板在进程启动时构造一次，之后只读，以 Arc<PromptSet> 注入各组件。
//! 可选 TOML 覆盖文件格式：`[planner]\ncontent = """..."""`，未出现的键保留内置文本。

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::core::AgentError;

const SYSTEM: &str = "You are a code agent that works inside a sandboxed results directory. \
You can read files, write files and list directories with the provided tools. \
Call a tool when the request needs file access; otherwise answer directly and concisely.";

const PLANNER: &str = "You are a planning assistant. Break the user's request into a short, ordered list of steps. \
Each step uses exactly one action: read_file, write_file, list_directory, or analyze. \
Number steps from 1. Put the file or directory path (or the data to analyze) in input_data. \
If the request needs no file work at all, return an empty steps list.";

const EXECUTOR: &str = "You execute one step of a plan at a time. \
If the step needs a file operation, respond with only the tool call JSON. \
If the step is analysis, answer with the result in plain text. \
If the step cannot be completed, start your answer with STEP_FAILED: followed by the reason.";

const EXECUTOR_TEMPLATE: &str = "{previous_context}
Current step {step_number}:
- Action: {action}
- Description: {description}
- Input: {input_data}
- Expected output: {expected_output}

Execute this step.";

const REPLANNER: &str = "You revise plans that ran into problems. \
Given the original goal and the results gathered so far, produce a new complete plan that avoids the failure. \
Use only the actions read_file, write_file, list_directory, analyze. Return an empty steps list if the goal cannot be reached.";

const REPLANNER_TEMPLATE: &str = "Goal: {goal}

Results so far:
{results_summary}

Stopped at step {current_step} of {total_steps}. Create a revised plan.";

/// 提示词名称
pub const PROMPT_NAMES: [&str; 6] = [
    "system",
    "planner",
    "executor",
    "executor_template",
    "replanner",
    "replanner_template",
];

/// 不可变提示词集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub system: String,
    pub planner: String,
    pub executor: String,
    pub executor_template: String,
    pub replanner: String,
    pub replanner_template: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: SYSTEM.to_string(),
            planner: PLANNER.to_string(),
            executor: EXECUTOR.to_string(),
            executor_template: EXECUTOR_TEMPLATE.to_string(),
            replanner: REPLANNER.to_string(),
            replanner_template: REPLANNER_TEMPLATE.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct PromptEntry {
    content: String,
}

impl PromptSet {
    /// 内置提示词；path 为 Some 时读取覆盖文件
    pub fn load(path: Option<&Path>) -> Result<Self, AgentError> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| AgentError::Prompt(format!("{}: {e}", p.display())))?;
                Self::from_toml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// 解析覆盖文件内容；content 去除首尾空白，未知键忽略
    pub fn from_toml_str(text: &str) -> Result<Self, AgentError> {
        let entries: HashMap<String, PromptEntry> =
            toml::from_str(text).map_err(|e| AgentError::Prompt(e.to_string()))?;
        let mut set = Self::default();
        for (name, entry) in entries {
            let content = entry.content.trim().to_string();
            match name.as_str() {
                "system" => set.system = content,
                "planner" => set.planner = content,
                "executor" => set.executor = content,
                "executor_template" => set.executor_template = content,
                "replanner" => set.replanner = content,
                "replanner_template" => set.replanner_template = content,
                other => tracing::warn!(prompt = %other, "unknown prompt name ignored"),
            }
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            "system" => Some(&self.system),
            "planner" => Some(&self.planner),
            "executor" => Some(&self.executor),
            "executor_template" => Some(&self.executor_template),
            "replanner" => Some(&self.replanner),
            "replanner_template" => Some(&self.replanner_template),
            _ => None,
        }
    }
}

/// 用 vars 替换模板中的 `{key}` 占位符。单遍扫描：替换进来的值不会再被展开，未知占位符原样保留
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let found = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end))
        });
        match found {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
