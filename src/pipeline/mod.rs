pub mod admission;
pub mod content;
pub mod dispatch;
pub mod extract;
pub mod selector;
pub mod tone;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, ExtractionMode};
use crate::fetch::ImageFetcher;
use crate::llm::ChatCompleter;
use crate::platform::{EmojiToken, IncomingMessage, ReactionSurface};

use self::admission::FilterReason;
use self::content::ContentPreparer;
use self::dispatch::ReactionDispatcher;
use self::selector::EmojiSelector;
use self::tone::ToneClassifier;

/// Where a message is in its run. A run ends in `Reacted` or `Dropped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Admitted,
    ContentPrepared,
    ToneChecked,
    EmojiSelected,
    Extracted,
    Reacted,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotWhitelisted,
    Filtered(FilterReason),
    ToneInappropriate,
    SelectionFailed,
    NoEmoji,
    ReactionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Reacted(EmojiToken),
    Dropped(DropReason),
}

/// Per-message reaction pipeline. Holds only read-only shared handles, so
/// one instance serves every concurrent run.
pub struct ReactionPipeline {
    config: Arc<Config>,
    preparer: ContentPreparer,
    tone: Option<ToneClassifier>,
    selector: EmojiSelector,
    extraction_mode: ExtractionMode,
    dispatcher: ReactionDispatcher,
    vision: bool,
}

impl ReactionPipeline {
    pub fn new(
        config: Arc<Config>,
        llm: Arc<dyn ChatCompleter>,
        fetcher: Arc<dyn ImageFetcher>,
        surface: Arc<dyn ReactionSurface>,
    ) -> Self {
        let tone = config
            .check_tone_appropriateness
            .then(|| ToneClassifier::new(llm.clone(), config.tone_model()));

        Self {
            preparer: ContentPreparer::new(fetcher, config.max_images),
            tone,
            selector: EmojiSelector::new(llm, &config.model, &config.system_prompt),
            extraction_mode: config.extraction_mode,
            dispatcher: ReactionDispatcher::new(surface),
            vision: config.supports_vision(),
            config,
        }
    }

    pub fn vision_enabled(&self) -> bool {
        self.vision
    }

    pub async fn run(&self, message: &IncomingMessage) -> PipelineOutcome {
        let outcome = self.advance(message).await;
        if let PipelineOutcome::Dropped(reason) = &outcome {
            debug!(message_id = message.id, stage = ?Stage::Dropped, "Dropped: {:?}", reason);
        }
        outcome
    }

    async fn advance(&self, message: &IncomingMessage) -> PipelineOutcome {
        trace_stage(message, Stage::Received);

        if !self.config.is_whitelisted(message.channel_id) {
            return PipelineOutcome::Dropped(DropReason::NotWhitelisted);
        }

        if let Some(reason) = admission::check(message, &self.config) {
            debug!(
                "Ignoring message from {} ({}): {}...",
                message.author_name,
                reason,
                preview(&message.content, 50)
            );
            return PipelineOutcome::Dropped(DropReason::Filtered(reason));
        }
        trace_stage(message, Stage::Admitted);

        info!(
            author_id = message.author_id,
            reply = message.is_reply,
            edited = message.is_edited,
            "Processing message from {} in channel {}: {}",
            message.author_name,
            message.channel_id,
            preview(&message.content, 100)
        );

        let content = self.preparer.prepare(message, self.vision).await;
        trace_stage(message, Stage::ContentPrepared);

        if let Some(tone) = &self.tone {
            if !tone.is_tone_appropriate(message).await {
                debug!("Tone not suited for a reaction, skipping");
                return PipelineOutcome::Dropped(DropReason::ToneInappropriate);
            }
            trace_stage(message, Stage::ToneChecked);
        }

        let Some(reply) = self.selector.select(&content).await else {
            warn!("No valid emoji returned from LLM");
            return PipelineOutcome::Dropped(DropReason::SelectionFailed);
        };
        trace_stage(message, Stage::EmojiSelected);

        let Some(emoji) = extract::extract(&reply, self.extraction_mode) else {
            warn!("No valid emoji returned from LLM (reply: {:?})", reply);
            return PipelineOutcome::Dropped(DropReason::NoEmoji);
        };
        trace_stage(message, Stage::Extracted);

        if !self.dispatcher.apply(message, &emoji).await {
            return PipelineOutcome::Dropped(DropReason::ReactionFailed);
        }
        trace_stage(message, Stage::Reacted);

        PipelineOutcome::Reacted(emoji)
    }
}

fn trace_stage(message: &IncomingMessage, stage: Stage) {
    debug!(message_id = message.id, stage = ?stage, "pipeline stage");
}

/// First `max` characters, for log lines.
fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
