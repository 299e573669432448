//! Conversation-related types.

use vision_buddy_model::ModelMessage;

/// The ordered message history of a session.
///
/// A conversation only ever grows while answering questions, the agent
/// appends the user message, the assistant messages and the tool results of
/// a turn in the order they were produced. The system prompt is not part of
/// it, it is prepended to every model request instead.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the latest message.
    #[inline]
    pub fn last(&self) -> Option<&ModelMessage> {
        self.messages.last()
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: ModelMessage) {
        self.messages.push(msg);
    }

    #[inline]
    pub(crate) fn extend(&mut self, msgs: impl IntoIterator<Item = ModelMessage>) {
        self.messages.extend(msgs);
    }

    /// Drops all messages.
    #[inline]
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Returns the text of the latest assistant message that has any.
    #[inline]
    pub fn last_answer(&self) -> Option<&str> {
        self.last_answer_since(0)
    }

    /// Like [`Conversation::last_answer`], but only looks at the messages
    /// from index `start` on.
    pub fn last_answer_since(&self, start: usize) -> Option<&str> {
        self.messages
            .get(start..)
            .unwrap_or_default()
            .iter()
            .rev()
            .find_map(|msg| match msg {
                ModelMessage::Assistant(msg) if !msg.content.is_empty() => {
                    Some(msg.content.as_str())
                }
                _ => None,
            })
    }

    /// Renders the conversation for humans to read.
    ///
    /// User messages are prefixed with `You: `, assistant messages with
    /// `AI: `. Tool results and assistant messages without text are
    /// omitted.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            let line = match msg {
                ModelMessage::User(text) => format!("You: {text}"),
                ModelMessage::Assistant(msg) if !msg.content.is_empty() => {
                    format!("AI: {}", msg.content)
                }
                _ => continue,
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
