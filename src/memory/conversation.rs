//! 会话历史
//!
//! 一次 run 内的全部消息，只追加、不剪枝；run 的最终结果即最后一条消息的内容。

use serde::{Deserialize, Serialize};

use crate::tools::ToolCall;

/// 消息角色
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    /// 工具返回结果
    Tool,
}

/// 单条消息；assistant 消息可携带工具调用请求，tool / assistant 消息可带失败标签
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    /// 失败标签：工具返回 Failed，或执行器回复带失败标记
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            failed: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// 带工具调用请求的 assistant 消息；content 保留模型原始输出
    pub fn tool_request(content: impl Into<String>, call: ToolCall) -> Self {
        Self {
            tool_call: Some(call),
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool_result(content: impl Into<String>, failed: bool) -> Self {
        Self {
            failed,
            ..Self::plain(Role::Tool, content)
        }
    }

    pub fn with_failed(mut self, failed: bool) -> Self {
        self.failed = failed;
        self
    }

    pub fn is_tool_request(&self) -> bool {
        self.tool_call.is_some()
    }
}

/// 会话历史：只追加
#[derive(Clone, Debug, Default, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// 最近一条用户消息（Planner 从这里取请求）
    pub fn last_user_request(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_user_request_picks_most_recent() {
        let mut conv = Conversation::new();
        conv.push(Message::user("first"));
        conv.push(Message::assistant("reply"));
        conv.push(Message::user("second"));
        conv.push(Message::tool_result("output", false));
        assert_eq!(conv.last_user_request(), Some("second"));
    }

    #[test]
    fn test_last_user_request_none_without_user() {
        let conv = Conversation::from(vec![Message::system("sys"), Message::assistant("hi")]);
        assert_eq!(conv.last_user_request(), None);
    }

    #[test]
    fn test_history_is_never_pruned() {
        let mut conv = Conversation::new();
        for i in 0..500 {
            conv.push(Message::user(format!("m{i}")));
        }
        assert_eq!(conv.len(), 500);
        assert_eq!(conv.messages()[0].content, "m0");
    }

    #[test]
    fn test_failed_flag_skipped_when_false() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert!(!json.contains("failed"));
        let json = serde_json::to_string(&Message::tool_result("Error: x", true)).unwrap();
        assert!(json.contains("\"failed\":true"));
    }
}
