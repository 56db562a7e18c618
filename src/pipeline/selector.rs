use std::sync::Arc;
use tracing::{debug, error};

use crate::llm::{ChatCompleter, ChatMessage, MessageContent, ModelRequest};

/// Enough room for one grapheme plus a little slack.
const SELECTION_MAX_TOKENS: u32 = 10;
const SELECTION_TEMPERATURE: f32 = 0.7;

/// Asks the model for a single emoji for the prepared content.
pub struct EmojiSelector {
    llm: Arc<dyn ChatCompleter>,
    model: String,
    system_prompt: String,
}

impl EmojiSelector {
    pub fn new(llm: Arc<dyn ChatCompleter>, model: &str, system_prompt: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
        }
    }

    /// Returns the trimmed raw reply, or `None` if the call failed.
    pub async fn select(&self, content: &MessageContent) -> Option<String> {
        let request = ModelRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(content.clone()),
            ],
            max_tokens: SELECTION_MAX_TOKENS,
            temperature: SELECTION_TEMPERATURE,
        };

        match self.llm.complete(&request).await {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                debug!("LLM response: {}", reply);
                Some(reply)
            }
            Err(e) => {
                error!("Error calling chat completions API: {:#}", e);
                None
            }
        }
    }
}
