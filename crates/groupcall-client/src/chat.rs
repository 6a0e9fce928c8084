//! Append-only chat transcript

use crate::signaling::protocol::ChatMessage;

/// Greeting shown locally as soon as a room is joined
pub const WELCOME_TEXT: &str =
    "Welcome to the chat! Remember to enable your camera if you want to stream video!";

/// Alternating visual parity of transcript lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineParity {
    Odd,
    Even,
}

impl LineParity {
    fn flipped(self) -> Self {
        match self {
            LineParity::Odd => LineParity::Even,
            LineParity::Even => LineParity::Odd,
        }
    }
}

/// One transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    sender: Option<String>,
    text: String,
    time: Option<String>,
    is_you: bool,
    system: bool,
    parity: LineParity,
}

impl ChatLine {
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// Whether the local user wrote this line
    pub fn is_you(&self) -> bool {
        self.is_you
    }

    /// Whether the line is a notice rather than a user message
    pub fn is_system(&self) -> bool {
        self.system
    }

    pub fn parity(&self) -> LineParity {
        self.parity
    }

    /// Format as `[time]|sender| text`, omitting absent parts
    pub fn render(&self) -> String {
        let mut prefix = String::new();
        if let Some(time) = &self.time {
            prefix.push_str(&format!("[{}]", time));
        }
        if let Some(sender) = &self.sender {
            prefix.push_str(&format!("|{}|", sender));
        }

        if prefix.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", prefix, self.text)
        }
    }
}

/// Transcript for one room session; no eviction
#[derive(Debug)]
pub struct ChatLog {
    lines: Vec<ChatLine>,
    next_parity: LineParity,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            next_parity: LineParity::Odd,
        }
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message distributed by the server
    pub fn append_message(&mut self, message: ChatMessage) -> &ChatLine {
        self.push(
            message.sender,
            message.text,
            message.time,
            message.is_you,
            message.system_message,
        )
    }

    /// Append a locally generated notice
    pub fn append_system(&mut self, text: impl Into<String>) -> &ChatLine {
        self.push(None, text.into(), None, false, true)
    }

    fn push(
        &mut self,
        sender: Option<String>,
        text: String,
        time: Option<String>,
        is_you: bool,
        system: bool,
    ) -> &ChatLine {
        let parity = self.next_parity;
        self.next_parity = parity.flipped();
        self.lines.push(ChatLine {
            sender,
            text,
            time,
            is_you,
            system,
            parity,
        });
        &self.lines[self.lines.len() - 1]
    }

    /// Lines in append order
    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    /// Lines newest first, the order the transcript is displayed in
    pub fn latest_first(&self) -> impl Iterator<Item = &ChatLine> {
        self.lines.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
