use tracing::debug;

use crate::core::message::{ChatMessage, MessageId, Role};

/// Separates partial assistant output from a failure note appended after it.
pub const ERROR_SUFFIX_SEPARATOR: &str = "\n\n---\n";

pub const CANCELLED_NOTE: &str = "(response cancelled)";

/// Ordered transcript of one chat session.
///
/// The conversation is the only place messages are created or mutated. At
/// most one assistant message is *open* (receiving fragments) at a time and
/// it is tracked by id rather than by position.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    next_id: u64,
    open: Option<MessageId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: Option<&str>) -> Self {
        let mut conversation = Self::new();
        if let Some(text) = greeting.map(str::trim).filter(|text| !text.is_empty()) {
            conversation.add_assistant_message(text);
        }
        conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|message| message.id == id)
    }

    pub fn open_message_id(&self) -> Option<MessageId> {
        self.open
    }

    pub fn has_open_message(&self) -> bool {
        self.open.is_some()
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().rev().find(|message| message.id == id)
    }

    fn push(&mut self, role: Role, text: String, attachment_name: Option<String>) -> MessageId {
        let id = self.allocate_id();
        self.messages
            .push(ChatMessage::new(id, role, text, attachment_name));
        id
    }

    pub fn add_user_message(
        &mut self,
        text: impl Into<String>,
        attachment_name: Option<String>,
    ) -> MessageId {
        self.push(Role::User, text.into(), attachment_name)
    }

    /// Append a closed assistant message.
    pub fn add_assistant_message(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Role::Assistant, text.into(), None)
    }

    /// Append the empty assistant placeholder that receives stream fragments.
    pub fn open_assistant_message(&mut self) -> MessageId {
        if let Some(previous) = self.open.take() {
            debug!(%previous, "Closing stale open message before opening a new one");
        }
        let id = self.push(Role::Assistant, String::new(), None);
        self.open = Some(id);
        id
    }

    /// Append a fragment to the open message. Returns false (and drops the
    /// fragment) when nothing is open.
    pub fn append_fragment(&mut self, fragment: &str) -> bool {
        let Some(id) = self.open else {
            debug!(len = fragment.len(), "Dropping fragment with no open message");
            return false;
        };
        match self.get_mut(id) {
            Some(message) => {
                message.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    pub fn close_open_message(&mut self) -> Option<MessageId> {
        self.open.take()
    }

    /// Record a terminal failure. The error never overwrites streamed text:
    /// a message that already holds partial output gets a separated suffix.
    pub fn record_failure(&mut self, error_text: &str) -> MessageId {
        let Some(id) = self.open.take() else {
            return self.add_assistant_message(error_text);
        };

        match self.get_mut(id) {
            Some(message) if message.text.is_empty() => {
                message.text.push_str(error_text);
                id
            }
            Some(message) => {
                message.text.push_str(ERROR_SUFFIX_SEPARATOR);
                message.text.push_str(error_text);
                id
            }
            None => self.add_assistant_message(error_text),
        }
    }

    /// Close the open message after the user abandoned the stream.
    pub fn record_cancellation(&mut self) -> Option<MessageId> {
        let id = self.open.take()?;
        if let Some(message) = self.get_mut(id) {
            if message.text.is_empty() {
                message.text.push_str(CANCELLED_NOTE);
            }
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_accumulate_in_order_on_the_open_message() {
        let mut conversation = Conversation::new();
        conversation.add_user_message("Hello", None);
        let open = conversation.open_assistant_message();

        for fragment in ["F1", "+F2", "+F3"] {
            assert!(conversation.append_fragment(fragment));
        }

        let message = conversation.get(open).expect("open message");
        assert_eq!(message.text, "F1+F2+F3");
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn closed_message_takes_no_more_fragments() {
        let mut conversation = Conversation::new();
        let open = conversation.open_assistant_message();
        conversation.append_fragment("done");
        assert_eq!(conversation.close_open_message(), Some(open));

        assert!(!conversation.append_fragment(" extra"));
        assert_eq!(conversation.get(open).map(|m| m.text.as_str()), Some("done"));
    }

    #[test]
    fn at_most_one_message_is_open() {
        let mut conversation = Conversation::new();
        let first = conversation.open_assistant_message();
        let second = conversation.open_assistant_message();
        assert_ne!(first, second);
        assert_eq!(conversation.open_message_id(), Some(second));

        conversation.append_fragment("x");
        assert_eq!(conversation.get(first).map(|m| m.text.as_str()), Some(""));
        assert_eq!(conversation.get(second).map(|m| m.text.as_str()), Some("x"));
    }

    #[test]
    fn failure_without_open_message_appends_new_assistant_message() {
        let mut conversation = Conversation::new();
        conversation.add_user_message("q", Some("data.csv".into()));
        let id = conversation.record_failure("Error: boom");

        let last = conversation.last().expect("message");
        assert_eq!(last.id, id);
        assert!(last.is_assistant());
        assert_eq!(last.text, "Error: boom");
        assert_eq!(
            conversation.messages()[0].attachment_name.as_deref(),
            Some("data.csv")
        );
    }

    #[test]
    fn mid_stream_failure_keeps_partial_text_and_appends_suffix() {
        let mut conversation = Conversation::new();
        let open = conversation.open_assistant_message();
        conversation.append_fragment("partial answer");

        let id = conversation.record_failure("Error: lost connection");
        assert_eq!(id, open);
        assert_eq!(
            conversation.get(open).map(|m| m.text.as_str()),
            Some("partial answer\n\n---\nError: lost connection")
        );
        assert!(!conversation.has_open_message());
    }

    #[test]
    fn failure_on_empty_placeholder_fills_it() {
        let mut conversation = Conversation::new();
        conversation.open_assistant_message();
        conversation.record_failure("Error: nothing arrived");
        assert_eq!(conversation.len(), 1);
        assert_eq!(
            conversation.last().map(|m| m.text.as_str()),
            Some("Error: nothing arrived")
        );
    }

    #[test]
    fn cancellation_marks_empty_placeholder() {
        let mut conversation = Conversation::new();
        conversation.open_assistant_message();
        assert!(conversation.record_cancellation().is_some());
        assert_eq!(conversation.last().map(|m| m.text.as_str()), Some(CANCELLED_NOTE));
        assert!(conversation.record_cancellation().is_none());
    }

    #[test]
    fn greeting_is_a_closed_assistant_message() {
        let conversation = Conversation::with_greeting(Some("Hi there"));
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.has_open_message());
        assert!(Conversation::with_greeting(Some("  ")).is_empty());
    }
}
