//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! 按顺序返回预置的回复，并记录每次请求的消息，便于断言 prompt 内容。
//! 预置回复用完后：若设置了 fallback 则一直返回它，否则返回 Err。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::Message;

#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回给定回复
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// 脚本耗尽后固定返回 reply
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// 已收到的请求次数
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// 第 n 次请求的消息（0 起）
    pub fn request(&self, n: usize) -> Option<Vec<Message>> {
        self.requests.lock().ok().and_then(|r| r.get(n).cloned())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(messages.to_vec());
        }
        let next = self
            .replies
            .lock()
            .map_err(|e| e.to_string())?
            .pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| "mock script exhausted".to_string())
    }
}
