use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::analysis::RiskCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub category: Option<RiskCategory>,
}

/// A reply produced by a responder, not yet placed in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub content: String,
    pub category: Option<RiskCategory>,
}

/// Simulated voice capture state on the Q&A screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Listening,
    Transcribed,
}

/// Questions offered next to the Q&A chat for quick drafting.
pub const COMMON_QUESTIONS: [&str; 6] = [
    "What are my rights as a tenant in India?",
    "How to register a property in my state?",
    "What documents are needed for marriage registration?",
    "Consumer protection laws in India",
    "Employment rights and labor laws",
    "How to file a complaint in consumer court?",
];

pub fn greeting(name: Option<&str>) -> String {
    format!(
        "Hello {}! I'm your AI legal assistant. I'm here to help you understand Indian law \
         and answer your legal questions. How can I assist you today?",
        name.unwrap_or("there")
    )
}

/// An ordered chat log. User messages append; assistant replies are inserted
/// directly after the message they answer, so the log stays paired even when
/// replies finish out of send order. Messages are never edited or removed.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    next_id: u64,
    pending: usize,
    epoch: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Replies still outstanding; drives the thinking indicator.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Tag carried by in-flight reply workers. A reply whose epoch no longer
    /// matches belongs to a previous visit and must be dropped.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Clear the log and invalidate every outstanding reply.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending = 0;
        self.epoch += 1;
    }

    pub fn seed_greeting(&mut self, name: Option<&str>) {
        let id = self.alloc_id();
        self.messages.push(ChatMessage {
            id,
            role: ChatRole::Assistant,
            content: greeting(name),
            timestamp: Local::now(),
            category: Some(RiskCategory::Safe),
        });
    }

    /// Append a user message and return its id for pairing the reply.
    pub fn push_user(&mut self, content: String) -> u64 {
        let id = self.alloc_id();
        self.messages.push(ChatMessage {
            id,
            role: ChatRole::User,
            content,
            timestamp: Local::now(),
            category: None,
        });
        self.pending += 1;
        id
    }

    /// Place a reply directly after its user message. Returns false when the
    /// user message is gone (session was reset in the meantime).
    pub fn apply_reply(&mut self, user_id: u64, reply: AssistantReply) -> bool {
        let Some(pos) = self.messages.iter().position(|m| m.id == user_id) else {
            return false;
        };
        let id = self.alloc_id();
        self.messages.insert(
            pos + 1,
            ChatMessage {
                id,
                role: ChatRole::Assistant,
                content: reply.content,
                timestamp: Local::now(),
                category: reply.category,
            },
        );
        self.pending = self.pending.saturating_sub(1);
        true
    }

    /// Account for a reply that failed; the user message stays in the log.
    pub fn fail_reply(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str) -> AssistantReply {
        AssistantReply {
            content: text.to_string(),
            category: Some(RiskCategory::Neutral),
        }
    }

    #[test]
    fn greeting_addresses_user_by_name() {
        assert!(greeting(Some("Priya")).starts_with("Hello Priya!"));
        assert!(greeting(None).starts_with("Hello there!"));
    }

    #[test]
    fn replies_pair_with_their_messages_in_order() {
        let mut session = ChatSession::new();
        session.seed_greeting(Some("Priya"));
        let first = session.push_user("What are my rights as a tenant?".to_string());
        let second = session.push_user("How do I register property?".to_string());
        assert_eq!(session.pending(), 2);

        session.apply_reply(first, reply("tenant answer"));
        session.apply_reply(second, reply("property answer"));

        let roles: Vec<ChatRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
            ]
        );
        assert_eq!(session.messages()[2].content, "tenant answer");
        assert_eq!(session.messages()[4].content, "property answer");
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn out_of_order_delivery_keeps_pairing() {
        let mut session = ChatSession::new();
        let first = session.push_user("first".to_string());
        let second = session.push_user("second".to_string());

        // The later reply lands before the earlier one
        assert!(session.apply_reply(second, reply("second answer")));
        assert!(session.apply_reply(first, reply("first answer")));

        let contents: Vec<&str> = session
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["first", "first answer", "second", "second answer"]
        );
    }

    #[test]
    fn reset_invalidates_outstanding_replies() {
        let mut session = ChatSession::new();
        let epoch = session.epoch();
        let id = session.push_user("question".to_string());
        session.reset();

        assert_ne!(session.epoch(), epoch);
        assert!(session.is_empty());
        assert_eq!(session.pending(), 0);
        // The message is gone, so a late reply has nowhere to go
        assert!(!session.apply_reply(id, reply("late")));
    }

    #[test]
    fn failed_reply_keeps_user_message() {
        let mut session = ChatSession::new();
        session.push_user("question".to_string());
        session.fail_reply();
        assert_eq!(session.pending(), 0);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::User);
    }
}
