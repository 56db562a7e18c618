pub mod discord;

use async_trait::async_trait;

/// Snapshot of a chat message at the time its event arrived.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    /// Display name of the author, used for logging only
    pub author_name: String,
    pub author_is_bot: bool,
    /// The raw message text
    pub content: String,
    pub attachments: Vec<AttachmentDescriptor>,
    /// Number of embeds carried by the message
    pub embed_count: usize,
    pub kind: MessageKind,
    pub is_reply: bool,
    pub is_edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub url: String,
    /// Declared MIME type; Discord omits it for some uploads
    pub content_type: Option<String>,
    pub filename: String,
}

impl AttachmentDescriptor {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image"))
    }
}

/// Semantic message type. Everything other than a regular message or an
/// inline reply is a service notification (joins, pins, boosts, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Default,
    Reply,
    System,
}

/// A single reaction emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmojiToken {
    Unicode(String),
    Custom {
        animated: bool,
        name: String,
        id: u64,
    },
}

impl std::fmt::Display for EmojiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmojiToken::Unicode(s) => write!(f, "{}", s),
            EmojiToken::Custom { animated, name, id } => {
                let prefix = if *animated { "a" } else { "" };
                write!(f, "<{}:{}:{}>", prefix, name, id)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReactionError {
    #[error("missing permission to add reactions")]
    Forbidden,

    #[error("emoji not found or message deleted")]
    NotFound,

    #[error("invalid emoji format")]
    InvalidEmoji,

    #[error("platform error: {0}")]
    Platform(String),
}

/// The one action the bot performs on the platform.
#[async_trait]
pub trait ReactionSurface: Send + Sync {
    async fn add_reaction(
        &self,
        message: &IncomingMessage,
        emoji: &EmojiToken,
    ) -> Result<(), ReactionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_emoji_display() {
        let animated = EmojiToken::Custom {
            animated: true,
            name: "party".to_string(),
            id: 987654321,
        };
        assert_eq!(animated.to_string(), "<a:party:987654321>");

        let still = EmojiToken::Custom {
            animated: false,
            name: "wave".to_string(),
            id: 1,
        };
        assert_eq!(still.to_string(), "<:wave:1>");
        assert_eq!(EmojiToken::Unicode("🔥".to_string()).to_string(), "🔥");
    }

    #[test]
    fn test_attachment_is_image() {
        let mut att = AttachmentDescriptor {
            url: "https://cdn.example.com/a.png".to_string(),
            content_type: Some("image/png".to_string()),
            filename: "a.png".to_string(),
        };
        assert!(att.is_image());
        att.content_type = Some("video/mp4".to_string());
        assert!(!att.is_image());
        att.content_type = None;
        assert!(!att.is_image());
    }
}
