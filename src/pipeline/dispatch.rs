use std::sync::Arc;
use tracing::{error, info};

use crate::platform::{EmojiToken, IncomingMessage, ReactionError, ReactionSurface};

/// Applies the chosen emoji. Every platform failure is logged and swallowed.
pub struct ReactionDispatcher {
    surface: Arc<dyn ReactionSurface>,
}

impl ReactionDispatcher {
    pub fn new(surface: Arc<dyn ReactionSurface>) -> Self {
        Self { surface }
    }

    /// Returns whether the reaction landed.
    pub async fn apply(&self, message: &IncomingMessage, emoji: &EmojiToken) -> bool {
        match self.surface.add_reaction(message, emoji).await {
            Ok(()) => {
                info!(
                    "Added reaction {} to message from {}",
                    emoji, message.author_name
                );
                true
            }
            Err(e) => {
                let channel = message.channel_id;
                let author = &message.author_name;
                match e {
                    ReactionError::Forbidden => error!(
                        channel,
                        %author,
                        %emoji,
                        "Missing permissions to add reactions"
                    ),
                    ReactionError::NotFound => error!(
                        channel,
                        %author,
                        %emoji,
                        "Emoji not found or message deleted"
                    ),
                    ReactionError::InvalidEmoji => {
                        error!(channel, %author, %emoji, "Invalid emoji format")
                    }
                    ReactionError::Platform(ref detail) => error!(
                        channel,
                        %author,
                        %emoji,
                        "Failed to add reaction: {}",
                        detail
                    ),
                }
                false
            }
        }
    }
}
