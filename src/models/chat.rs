use chrono::Utc;
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoTimestamp {
    pub seconds: f64,
    pub label: String,
}

/// One renderable unit of a chat message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text {
        text: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        /// Character offset into the full answer; `None` means unanchored.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        path: String,
    },
    Video {
        url: String,
        #[serde(default)]
        timestamps: Vec<VideoTimestamp>,
    },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Segment::Image { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub typing: bool,
    #[serde(default)]
    pub show_thinking: bool,
    #[serde(default)]
    pub timestamp: i64,
}

impl Message {
    pub fn user(text: &str) -> Self {
        Self {
            id: format!("u-{}", Uuid::new_v4()),
            role: Role::User,
            text: text.to_string(),
            segments: vec![Segment::text(text)],
            typing: false,
            show_thinking: false,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Assistant placeholder shown while the backend is working.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: format!("b-{}", Uuid::new_v4()),
            role: Role::Assistant,
            text: String::new(),
            segments: Vec::new(),
            typing: true,
            show_thinking: false,
            timestamp: Utc::now().timestamp(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Applies `f` to the message with `id` and returns its new state,
    /// or `None` when the message no longer exists.
    pub fn update<F>(&mut self, id: &str, f: F) -> Option<Message> where F: FnOnce(&mut Message) {
        let message = self.messages.iter_mut().find(|m| m.id == id)?;
        f(message);
        Some(message.clone())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
