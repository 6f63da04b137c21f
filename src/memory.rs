use crate::message::{Message, Role};

/// In-memory transcript of the current chat session.
#[derive(Default, Clone, Debug)]
pub struct ConversationMemory {
    messages: Vec<Message>,
}

impl ConversationMemory {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Sliding-window context selection: keep system messages plus the last N
/// other messages, so long sessions do not grow the prompt unboundedly.
#[derive(Clone, Debug)]
pub struct WindowedContext {
    window_size: usize,
}

impl WindowedContext {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn select(&self, messages: &[Message]) -> Vec<Message> {
        let non_system: Vec<&Message> =
            messages.iter().filter(|m| m.role != Role::System).collect();

        let mut result: Vec<Message> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .cloned()
            .collect();

        let start = non_system.len().saturating_sub(self.window_size);
        for msg in &non_system[start..] {
            result.push((*msg).clone());
        }

        result
    }
}

impl Default for WindowedContext {
    fn default() -> Self {
        Self::new(20)
    }
}
