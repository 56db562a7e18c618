use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::client::{Client, Context, EventHandler};
use serenity::http::Http;
use serenity::model::channel::{Message, MessageType, ReactionType};
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::{ChannelId, EmojiId, MessageId};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::pipeline::{PipelineOutcome, ReactionPipeline};
use crate::platform::{
    AttachmentDescriptor, EmojiToken, IncomingMessage, MessageKind, ReactionError,
    ReactionSurface,
};

/// Reaction surface backed by the Discord REST API.
pub struct DiscordReactions {
    http: Arc<Http>,
}

impl DiscordReactions {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(bot_token)),
        }
    }
}

#[async_trait]
impl ReactionSurface for DiscordReactions {
    async fn add_reaction(
        &self,
        message: &IncomingMessage,
        emoji: &EmojiToken,
    ) -> Result<(), ReactionError> {
        let channel_id = ChannelId::new(message.channel_id);
        let message_id = MessageId::new(message.id);
        let reaction = reaction_type(emoji)?;

        self.http
            .create_reaction(channel_id, message_id, &reaction)
            .await
            .map_err(classify_error)
    }
}

fn reaction_type(emoji: &EmojiToken) -> Result<ReactionType, ReactionError> {
    match emoji {
        EmojiToken::Unicode(s) => Ok(ReactionType::Unicode(s.clone())),
        // EmojiId::new panics on zero.
        EmojiToken::Custom { id: 0, .. } => Err(ReactionError::InvalidEmoji),
        EmojiToken::Custom { animated, name, id } => Ok(ReactionType::Custom {
            animated: *animated,
            id: EmojiId::new(*id),
            name: Some(name.clone()),
        }),
    }
}

fn classify_error(err: serenity::Error) -> ReactionError {
    if let serenity::Error::Http(http_err) = &err {
        if let Some(status) = http_err.status_code() {
            return classify_status(status.as_u16(), err.to_string());
        }
    }
    ReactionError::Platform(err.to_string())
}

fn classify_status(status: u16, detail: String) -> ReactionError {
    match status {
        403 => ReactionError::Forbidden,
        404 => ReactionError::NotFound,
        400 => ReactionError::InvalidEmoji,
        _ => ReactionError::Platform(detail),
    }
}

fn message_kind(kind: MessageType) -> MessageKind {
    match kind {
        MessageType::Regular => MessageKind::Default,
        MessageType::InlineReply => MessageKind::Reply,
        _ => MessageKind::System,
    }
}

fn to_incoming(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|att| AttachmentDescriptor {
                url: att.url.clone(),
                content_type: att.content_type.clone(),
                filename: att.filename.clone(),
            })
            .collect(),
        embed_count: msg.embeds.len(),
        kind: message_kind(msg.kind),
        is_reply: msg.message_reference.is_some(),
        is_edited: msg.edited_timestamp.is_some(),
    }
}

struct Handler {
    config: Arc<Config>,
    pipeline: Arc<ReactionPipeline>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Emoji React Bot logged in as {}", ready.user.name);
        info!("Bot ID: {}", ready.user.id);
        info!(
            "Vision support: {} (model: {})",
            if self.pipeline.vision_enabled() {
                "enabled"
            } else {
                "disabled"
            },
            self.config.model
        );
        if let Some(url) = self.config.invite_url() {
            info!("Invite URL: {}", url);
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let incoming = to_incoming(&msg);
        let message_id = incoming.id;
        let pipeline = self.pipeline.clone();

        // Own task so a panic in one run cannot reach the gateway loop.
        let run = tokio::spawn(async move { pipeline.run(&incoming).await });

        match run.await {
            Ok(PipelineOutcome::Reacted(emoji)) => {
                debug!("Message {} handled with {}", message_id, emoji)
            }
            Ok(PipelineOutcome::Dropped(_)) => {}
            Err(e) => error!("Error processing message {}: {}", message_id, e),
        }
    }
}

/// Connect to the Discord gateway and dispatch messages until Ctrl-C.
pub async fn run(config: Arc<Config>, pipeline: Arc<ReactionPipeline>) -> Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    info!("Starting Discord client...");

    let mut client = Client::builder(&config.bot_token, intents)
        .event_handler(Handler {
            config: config.clone(),
            pipeline,
        })
        .await
        .context("Failed to build Discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Bot shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    client
        .start()
        .await
        .context("Discord client stopped with an error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_reaction_type() {
        let reaction = reaction_type(&EmojiToken::Unicode("🔥".to_string())).unwrap();
        assert_eq!(reaction, ReactionType::Unicode("🔥".to_string()));
    }

    #[test]
    fn test_custom_reaction_type() {
        let reaction = reaction_type(&EmojiToken::Custom {
            animated: true,
            name: "party".to_string(),
            id: 987654321,
        })
        .unwrap();
        assert_eq!(
            reaction,
            ReactionType::Custom {
                animated: true,
                id: EmojiId::new(987654321),
                name: Some("party".to_string()),
            }
        );
    }

    #[test]
    fn test_zero_custom_emoji_id_rejected() {
        let result = reaction_type(&EmojiToken::Custom {
            animated: false,
            name: "x".to_string(),
            id: 0,
        });
        assert!(matches!(result, Err(ReactionError::InvalidEmoji)));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(403, String::new()),
            ReactionError::Forbidden
        ));
        assert!(matches!(
            classify_status(404, String::new()),
            ReactionError::NotFound
        ));
        assert!(matches!(
            classify_status(400, String::new()),
            ReactionError::InvalidEmoji
        ));
        match classify_status(500, "Internal Server Error".to_string()) {
            ReactionError::Platform(detail) => assert_eq!(detail, "Internal Server Error"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_message_kind_mapping() {
        assert_eq!(message_kind(MessageType::Regular), MessageKind::Default);
        assert_eq!(message_kind(MessageType::InlineReply), MessageKind::Reply);
        assert_eq!(message_kind(MessageType::MemberJoin), MessageKind::System);
        assert_eq!(message_kind(MessageType::PinsAdd), MessageKind::System);
    }
}
