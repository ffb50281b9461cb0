//! Role-tagged messages exchanged within one round.

use std::fmt::{self, Display};

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The side that opened the round, including its auto-replies.
    User,
    /// The collaborator being consulted.
    Assistant,
    /// Instructions that frame the exchange.
    System,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
            Role::System => f.write_str("system"),
        }
    }
}

/// A message in a transcript. Messages never change after creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a message.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a [`Role::User`] message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a [`Role::Assistant`] message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a [`Role::System`] message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Returns the author of the message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of the message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The ordered messages of one round.
///
/// A transcript only grows: rounds append to it and everyone else reads.
/// Every round starts from an empty transcript, nothing is carried over
/// from earlier rounds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no message was appended yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the content of the most recent assistant message.
    #[inline]
    pub fn last_assistant_content(&self) -> Option<&str> {
        last_assistant_content(&self.messages)
    }

    #[inline]
    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

/// Returns the content of the most recent [`Role::Assistant`] message, or
/// `None` if there is none.
pub fn last_assistant_content(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|msg| msg.role == Role::Assistant)
        .map(Message::content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(last_assistant_content(&[]), None);
        assert_eq!(Transcript::new().last_assistant_content(), None);
    }

    #[test]
    fn test_no_assistant() {
        let messages = [
            Message::system("Be brief."),
            Message::user("a"),
            Message::user("b"),
        ];
        assert_eq!(last_assistant_content(&messages), None);
    }

    #[test]
    fn test_most_recent_assistant() {
        let messages = [
            Message::assistant("x"),
            Message::user("y"),
            Message::assistant("z"),
        ];
        assert_eq!(last_assistant_content(&messages), Some("z"));

        // Trailing user messages don't hide the assistant reply.
        let transcript: Transcript = [
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
        ]
        .into_iter()
        .collect();
        assert_eq!(transcript.last_assistant_content(), Some("b"));
        assert_eq!(transcript.len(), 3);
    }
}
