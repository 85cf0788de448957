//! 编排过程事件：计划生成、步骤执行、工具调用、结果记录、重规划与终止
//!
//! 可序列化为 JSON 供前端展示；发送为 best-effort，接收端关闭不影响 run。

use serde::Serialize;
use tokio::sync::mpsc;

use crate::workflow::TerminationReason;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// 生成了新计划（初次或重规划）
    PlanCreated {
        goal: String,
        reasoning: String,
        total_steps: usize,
        replan_count: u32,
    },
    /// 开始执行某一步
    StepStarted {
        step: u32,
        total: usize,
        action: String,
    },
    /// 模型请求调用工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览）
    Observation {
        tool: String,
        preview: String,
        failed: bool,
    },
    /// 记录了步骤结果，游标前进
    StepRecorded { index: usize, preview: String },
    /// 触发重规划
    Replanning {
        replan_count: u32,
        completed_steps: usize,
    },
    /// run 结束
    Terminated { reason: TerminationReason },
}

/// 事件发送端（可为空）
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<WorkflowEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn emit(&self, event: WorkflowEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// 截取前 n 个字符（按 char 计，避免切断 UTF-8）
pub fn truncate_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
