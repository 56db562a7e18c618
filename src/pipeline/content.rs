//! Builds the user-message payload: text plus a bounded number of inline images.

use base64::Engine as _;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::fetch::ImageFetcher;
use crate::llm::{ContentPart, MessageContent};
use crate::platform::{AttachmentDescriptor, IncomingMessage};

/// Heuristic: a model is image-capable if its lowercased id contains any of
/// the given indicator substrings.
pub fn is_vision_model(model: &str, indicators: &[String]) -> bool {
    let model = model.to_lowercase();
    indicators
        .iter()
        .any(|indicator| model.contains(&indicator.to_lowercase()))
}

pub struct ContentPreparer {
    fetcher: Arc<dyn ImageFetcher>,
    max_images: usize,
}

impl ContentPreparer {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, max_images: usize) -> Self {
        Self {
            fetcher,
            max_images,
        }
    }

    pub async fn prepare(&self, message: &IncomingMessage, vision_capable: bool) -> MessageContent {
        let mut parts = Vec::new();

        let text = message.content.trim();
        if !text.is_empty() {
            parts.push(ContentPart::text(text));
        }

        if vision_capable {
            let images: Vec<&AttachmentDescriptor> = message
                .attachments
                .iter()
                .filter(|att| att.is_image())
                .collect();

            if !images.is_empty() {
                info!("Processing {} image(s)", images.len().min(self.max_images));

                // Fetched concurrently; join_all keeps attachment order.
                let fetched = join_all(
                    images
                        .into_iter()
                        .take(self.max_images)
                        .map(|att| self.fetch_image(att)),
                )
                .await;
                parts.extend(fetched.into_iter().flatten());
            }
        }

        if parts.is_empty() {
            let fallback = if message.embed_count > 0 {
                "[embed content]"
            } else {
                "[message]"
            };
            parts.push(ContentPart::text(fallback));
        }

        collapse(parts)
    }

    /// Downloads one image; any failure skips just this image.
    async fn fetch_image(&self, attachment: &AttachmentDescriptor) -> Option<ContentPart> {
        let mime_type = attachment.content_type.as_deref()?;

        match self.fetcher.fetch(&attachment.url).await {
            Ok(body) if body.status == 200 => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&body.bytes);
                debug!(
                    filename = %attachment.filename,
                    mime = %mime_type,
                    size = body.bytes.len(),
                    "Added image"
                );
                Some(ContentPart::image(mime_type, &encoded))
            }
            Ok(body) => {
                warn!(
                    filename = %attachment.filename,
                    status = body.status,
                    "Skipping image with unexpected status"
                );
                None
            }
            Err(e) => {
                error!("Failed to process image {}: {:#}", attachment.filename, e);
                None
            }
        }
    }
}

/// Single text part becomes a bare string; anything else stays a part list.
fn collapse(mut parts: Vec<ContentPart>) -> MessageContent {
    if parts.len() == 1 && matches!(parts[0], ContentPart::Text { .. }) {
        if let Some(ContentPart::Text { text }) = parts.pop() {
            return MessageContent::Text(text);
        }
    }
    MessageContent::Parts(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{image_attachment, text_message, FakeFetcher};

    fn preparer(fetcher: &Arc<FakeFetcher>) -> ContentPreparer {
        ContentPreparer::new(fetcher.clone(), 3)
    }

    #[test]
    fn test_vision_model_heuristic() {
        let indicators: Vec<String> = ["gpt-4", "vision", "claude", "gemini"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(is_vision_model("gpt-4o-mini", &indicators));
        assert!(is_vision_model("Claude-3-Haiku", &indicators));
        assert!(is_vision_model("llama-3.2-vision", &indicators));
        assert!(!is_vision_model("gpt-3.5-turbo", &indicators));
        assert!(!is_vision_model("mistral-small", &indicators));
    }

    #[tokio::test]
    async fn test_text_only_collapses_to_string() {
        let fetcher = Arc::new(FakeFetcher::default());
        let content = preparer(&fetcher)
            .prepare(&text_message("  hello world  "), true)
            .await;
        assert_eq!(content, MessageContent::Text("hello world".to_string()));
    }

    #[tokio::test]
    async fn test_vision_disabled_never_fetches() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut msg = text_message("look at this");
        msg.attachments.push(image_attachment("a"));

        let content = preparer(&fetcher).prepare(&msg, false).await;
        assert_eq!(content, MessageContent::Text("look at this".to_string()));
        assert!(fetcher.requested().is_empty());

        let mut bare = text_message("");
        bare.attachments.push(image_attachment("b"));
        let content = preparer(&fetcher).prepare(&bare, false).await;
        assert_eq!(content, MessageContent::Text("[message]".to_string()));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_embed_fallback() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut msg = text_message("");
        msg.embed_count = 2;
        let content = preparer(&fetcher).prepare(&msg, true).await;
        assert_eq!(content, MessageContent::Text("[embed content]".to_string()));
    }

    #[tokio::test]
    async fn test_at_most_three_images_fetched() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut msg = text_message("");
        for name in ["a", "b", "c", "d", "e"] {
            let att = image_attachment(name);
            fetcher.succeed(&att.url, b"png-bytes");
            msg.attachments.push(att);
        }

        let content = preparer(&fetcher).prepare(&msg, true).await;
        assert_eq!(fetcher.requested().len(), 3);
        match content {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected parts, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_image_attachments_skipped() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut msg = text_message("notes");
        msg.attachments.push(AttachmentDescriptor {
            url: "https://cdn.example.com/notes.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            filename: "notes.pdf".to_string(),
        });
        let content = preparer(&fetcher).prepare(&msg, true).await;
        assert_eq!(content, MessageContent::Text("notes".to_string()));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_partial_image_failure_keeps_successes() {
        let fetcher = Arc::new(FakeFetcher::default());
        let broken = image_attachment("broken");
        let missing = image_attachment("missing");
        let good = image_attachment("good");
        fetcher.fail(&broken.url);
        fetcher.respond(&missing.url, 404, b"");
        fetcher.succeed(&good.url, b"abc");

        let mut msg = text_message("my cat");
        msg.attachments = vec![broken, missing, good];

        let content = preparer(&fetcher).prepare(&msg, true).await;
        assert_eq!(
            content,
            MessageContent::Parts(vec![
                ContentPart::text("my cat"),
                ContentPart::image("image/png", "YWJj"),
            ])
        );
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_single_image_stays_part_list() {
        let fetcher = Arc::new(FakeFetcher::default());
        let att = image_attachment("solo");
        fetcher.succeed(&att.url, b"abc");
        let mut msg = text_message("");
        msg.attachments.push(att);

        let content = preparer(&fetcher).prepare(&msg, true).await;
        assert_eq!(
            content,
            MessageContent::Parts(vec![ContentPart::image("image/png", "YWJj")])
        );
    }

    #[tokio::test]
    async fn test_all_images_failing_falls_back() {
        let fetcher = Arc::new(FakeFetcher::default());
        let att = image_attachment("gone");
        fetcher.fail(&att.url);
        let mut msg = text_message("");
        msg.attachments.push(att);

        let content = preparer(&fetcher).prepare(&msg, true).await;
        assert_eq!(content, MessageContent::Text("[message]".to_string()));
    }
}
