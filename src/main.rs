//! code-agent 命令行入口
//!
//! 带请求参数时跑一次并打印结果；否则进入交互模式，逐行读取请求，输入 exit 退出。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use code_agent::{
    agent::{AgentMode, CodeAgent},
    config::{load_config, AppConfig},
    observability,
    planning::WorkflowEvent,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "code-agent", version, about = "Plan-execute-replan agent over a sandboxed directory")]
struct Cli {
    /// 运行模式，覆盖配置文件
    #[arg(long, value_enum)]
    mode: Option<AgentMode>,

    /// 额外的配置文件（TOML）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 打印规划与执行过程
    #[arg(short, long)]
    verbose: bool,

    /// 一次性请求；省略时进入交互模式
    request: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.clone()).unwrap_or_else(|e| {
        eprintln!("Failed to load config ({e}), using defaults");
        AppConfig::default()
    });
    if let Some(mode) = cli.mode {
        cfg.app.mode = mode;
    }
    observability::init(&cfg.app.log_level);

    let mut agent = CodeAgent::from_config(&cfg).context("Failed to create agent")?;
    if cli.verbose {
        let (tx, rx) = mpsc::unbounded_channel();
        agent = agent.with_events(tx);
        tokio::spawn(print_events(rx));
    }

    if let Some(request) = cli.request {
        let response = agent.run(&request).await.context("Run failed")?;
        println!("{response}");
        return Ok(());
    }

    repl(&agent).await
}

async fn repl(agent: &CodeAgent) -> anyhow::Result<()> {
    println!("code-agent ({} mode). Type 'exit' to quit.", agent.mode());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        match agent.run(input).await {
            Ok(response) => println!("{response}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<WorkflowEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            WorkflowEvent::PlanCreated {
                goal,
                total_steps,
                replan_count,
                ..
            } => eprintln!("[plan] {total_steps} steps (replans: {replan_count}) for: {goal}"),
            WorkflowEvent::StepStarted {
                step,
                total,
                action,
            } => eprintln!("[step {step}/{total}] {action}"),
            WorkflowEvent::ToolCall { tool, args } => eprintln!("[tool] {tool} {args}"),
            WorkflowEvent::Observation {
                tool,
                preview,
                failed,
            } => {
                let status = if failed { "failed" } else { "ok" };
                eprintln!("[{tool} {status}] {preview}");
            }
            WorkflowEvent::StepRecorded { index, .. } => eprintln!("[recorded] step {}", index + 1),
            WorkflowEvent::Replanning {
                replan_count,
                completed_steps,
            } => eprintln!("[replan #{replan_count}] after {completed_steps} completed steps"),
            WorkflowEvent::Terminated { reason } => eprintln!("[done] {reason:?}"),
        }
    }
}
