use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::{ChatCompleter, ChatMessage, MessageContent, ModelRequest};
use crate::platform::IncomingMessage;

const TONE_RUBRIC: &str = "You decide whether a chat message is a good fit for a lighthearted \
emoji reaction. Answer only YES or NO.

Answer YES for casual conversation, jokes, memes, playful banter, good news, \
celebrations, shared photos, and everyday chatter.

Answer NO for bare links with no commentary, emotionally heavy topics (grief, \
illness, conflict), urgent requests or alerts, and formal or professional \
announcements.";

const MEDIA_PLACEHOLDER: &str = "[image/media content]";

/// LLM gate deciding whether a message's tone suits a reaction.
pub struct ToneClassifier {
    llm: Arc<dyn ChatCompleter>,
    model: String,
}

impl ToneClassifier {
    pub fn new(llm: Arc<dyn ChatCompleter>, model: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
        }
    }

    fn build_request(&self, message: &IncomingMessage) -> ModelRequest {
        let text = message.content.trim();
        let user_text = if text.is_empty() {
            MEDIA_PLACEHOLDER
        } else {
            text
        };

        ModelRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(TONE_RUBRIC),
                ChatMessage::user(MessageContent::Text(user_text.to_string())),
            ],
            max_tokens: 5,
            temperature: 0.1,
        }
    }

    /// Fails open: if the classifier call errors the message is treated as
    /// appropriate.
    pub async fn is_tone_appropriate(&self, message: &IncomingMessage) -> bool {
        let request = self.build_request(message);
        match self.llm.complete(&request).await {
            Ok(reply) => {
                debug!("Tone check reply: {}", reply);
                reply.trim().to_uppercase().starts_with("YES")
            }
            Err(e) => {
                warn!("Tone check failed, defaulting to appropriate: {:#}", e);
                true
            }
        }
    }
}
