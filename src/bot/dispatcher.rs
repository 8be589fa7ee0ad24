//! Command dispatcher and presence controller.
//!
//! Routes an inbound message to the search or image handler, wraps the
//! handling window in presence signals and turns handler failures into a
//! single generic reply.

use crate::bot::format::{
    format_no_images_reply, format_search_reply, format_usage_reply, FAILURE_REPLY,
    PLACEHOLDER_REPLY,
};
use crate::bot::presence::Presence;
use crate::bot::query::{normalize, parse_command, CommandKind, ParsedQuery};
use crate::search::{ImageAsset, SearchApi};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, FutureExt, StreamExt, TryStreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A received chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Message body as sent
    pub raw_text: String,
}

impl InboundMessage {
    /// Wrap a message body
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

/// Capabilities the messaging session provides for one inbound message
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Reply with text
    async fn reply_text(&self, text: &str) -> Result<()>;
    /// Reply with a binary media payload
    async fn reply_media(&self, payload: Bytes, mime_type: &str, file_name: &str) -> Result<()>;
    /// Change the presence shown to the remote party
    async fn set_presence(&self, presence: Presence) -> Result<()>;
}

/// Routes `/search` and `/img` messages to their handlers
pub struct CommandDispatcher {
    search: Arc<dyn SearchApi>,
    image_fetch_concurrency: usize,
}

impl CommandDispatcher {
    /// Create a dispatcher.
    ///
    /// `image_fetch_concurrency` bounds parallel downloads within one `/img`
    /// command; 1 downloads sequentially.
    #[must_use]
    pub fn new(search: Arc<dyn SearchApi>, image_fetch_concurrency: usize) -> Self {
        Self {
            search,
            image_fetch_concurrency: image_fetch_concurrency.max(1),
        }
    }

    /// Handle one inbound message.
    ///
    /// Returns the recognized command, or `None` when the message was
    /// ignored. Presence goes active once and back to inactive once per
    /// recognized command, on every exit path.
    pub async fn handle(
        &self,
        message: &InboundMessage,
        transport: &dyn ChatTransport,
    ) -> Option<CommandKind> {
        let kind = CommandKind::detect(&normalize(&message.raw_text))?;
        info!(command = ?kind, "Handling command");

        if let Err(e) = transport.set_presence(Presence::Active).await {
            warn!(error = %e, "Failed to signal presence");
        }

        let outcome = AssertUnwindSafe(self.run(kind, message, transport))
            .catch_unwind()
            .await;

        let failed = match outcome {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                error!(command = ?kind, "Command failed: {e:#}");
                true
            }
            Err(_) => {
                error!(command = ?kind, "Command handler panicked");
                true
            }
        };

        if failed {
            if let Err(e) = transport.reply_text(FAILURE_REPLY).await {
                error!(error = %e, "Failed to send failure reply");
            }
        }

        if let Err(e) = transport.set_presence(Presence::Inactive).await {
            warn!(error = %e, "Failed to clear presence");
        }

        Some(kind)
    }

    async fn run(
        &self,
        kind: CommandKind,
        message: &InboundMessage,
        transport: &dyn ChatTransport,
    ) -> Result<()> {
        transport.reply_text(PLACEHOLDER_REPLY).await?;

        let Some(query) = parse_command(&message.raw_text, kind) else {
            debug!(command = ?kind, "Command without term");
            return transport.reply_text(&format_usage_reply(kind)).await;
        };

        match kind {
            CommandKind::Search => self.handle_search(&query, transport).await,
            CommandKind::Image => self.handle_images(&query, transport).await,
        }
    }

    async fn handle_search(&self, query: &ParsedQuery, transport: &dyn ChatTransport) -> Result<()> {
        let results = self.search.search(&query.term).await;
        info!(term = %query.term, results = results.len(), "Search finished");

        transport
            .reply_text(&format_search_reply(&query.term, &results))
            .await
    }

    async fn handle_images(&self, query: &ParsedQuery, transport: &dyn ChatTransport) -> Result<()> {
        let urls = self.search.search_images(&query.term, query.count).await;
        info!(term = %query.term, requested = query.count, found = urls.len(), "Image search finished");

        if urls.is_empty() {
            return transport
                .reply_text(&format_no_images_reply(&query.term))
                .await;
        }

        // Download everything first so a failed transfer sends no media at all
        let search = &self.search;
        let assets: Vec<ImageAsset> = stream::iter(urls)
            .map(|url| async move {
                search
                    .fetch_image(&url)
                    .await
                    .with_context(|| format!("Failed to download image {url}"))
            })
            .buffered(self.image_fetch_concurrency)
            .try_collect()
            .await?;

        for asset in assets {
            let file_name = asset.file_name();
            transport
                .reply_media(asset.bytes, &asset.mime_type, &file_name)
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NOT_AVAILABLE;
    use crate::search::{MockSearchApi, SearchError, SearchResult};
    use mockall::predicate::{self, eq};
    use mockall::Sequence;

    fn dispatcher(search: MockSearchApi) -> CommandDispatcher {
        CommandDispatcher::new(Arc::new(search), 1)
    }

    fn expect_presence(transport: &mut MockChatTransport, seq: &mut Sequence, presence: Presence) {
        transport
            .expect_set_presence()
            .with(eq(presence))
            .times(1)
            .in_sequence(seq)
            .returning(|_| Ok(()));
    }

    fn expect_text(transport: &mut MockChatTransport, seq: &mut Sequence, needle: &'static str) {
        transport
            .expect_reply_text()
            .with(predicate::str::contains(needle))
            .times(1)
            .in_sequence(seq)
            .returning(|_| Ok(()));
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_handle_future_is_send() {
        let dispatcher = dispatcher(MockSearchApi::new());
        let transport = MockChatTransport::new();
        let message = InboundMessage::new("/img cats [2]");

        // The Telegram endpoint awaits this future on a multi-threaded runtime
        assert_send(dispatcher.handle(&message, &transport));
    }

    #[tokio::test]
    async fn test_unrecognized_message_is_ignored() {
        let transport = MockChatTransport::new();
        let handled = dispatcher(MockSearchApi::new())
            .handle(&InboundMessage::new("hello there"), &transport)
            .await;
        assert_eq!(handled, None);
    }

    #[tokio::test]
    async fn test_search_flow_order() {
        let mut search = MockSearchApi::new();
        search
            .expect_search()
            .with(eq("cats"))
            .times(1)
            .returning(|_| {
                vec![SearchResult {
                    title: "A".to_string(),
                    description: "B".to_string(),
                    published_date: NOT_AVAILABLE.to_string(),
                    category: NOT_AVAILABLE.to_string(),
                    link: "http://x".to_string(),
                }]
            });

        let mut seq = Sequence::new();
        let mut transport = MockChatTransport::new();
        expect_presence(&mut transport, &mut seq, Presence::Active);
        expect_text(&mut transport, &mut seq, PLACEHOLDER_REPLY);
        expect_text(&mut transport, &mut seq, "Title: A");
        expect_presence(&mut transport, &mut seq, Presence::Inactive);

        let handled = dispatcher(search)
            .handle(&InboundMessage::new("/search cats"), &transport)
            .await;
        assert_eq!(handled, Some(CommandKind::Search));
    }

    #[tokio::test]
    async fn test_empty_term_sends_usage_without_search() {
        let mut seq = Sequence::new();
        let mut transport = MockChatTransport::new();
        expect_presence(&mut transport, &mut seq, Presence::Active);
        expect_text(&mut transport, &mut seq, PLACEHOLDER_REPLY);
        expect_text(&mut transport, &mut seq, "Use /img");
        expect_presence(&mut transport, &mut seq, Presence::Inactive);

        // No expectations: any search call fails the test
        let handled = dispatcher(MockSearchApi::new())
            .handle(&InboundMessage::new("/img   "), &transport)
            .await;
        assert_eq!(handled, Some(CommandKind::Image));
    }

    #[tokio::test]
    async fn test_download_failure_sends_single_failure_reply() {
        let mut search = MockSearchApi::new();
        search
            .expect_search_images()
            .with(eq("dogs"), eq(2))
            .returning(|_, _| vec!["http://1".to_string(), "http://2".to_string()]);
        search
            .expect_fetch_image()
            .with(eq("http://1"))
            .returning(|_| {
                Ok(ImageAsset {
                    bytes: Bytes::from_static(b"img"),
                    mime_type: "image/jpeg".to_string(),
                })
            });
        search
            .expect_fetch_image()
            .with(eq("http://2"))
            .returning(|_| Err(SearchError::Network("connection reset".to_string())));

        let mut seq = Sequence::new();
        let mut transport = MockChatTransport::new();
        expect_presence(&mut transport, &mut seq, Presence::Active);
        expect_text(&mut transport, &mut seq, PLACEHOLDER_REPLY);
        transport
            .expect_reply_text()
            .with(predicate::function(|text: &str| text == FAILURE_REPLY))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        expect_presence(&mut transport, &mut seq, Presence::Inactive);
        transport.expect_reply_media().never();

        dispatcher(search)
            .handle(&InboundMessage::new("/img dogs [2]"), &transport)
            .await;
    }

    #[tokio::test]
    async fn test_no_image_urls_reply() {
        let mut search = MockSearchApi::new();
        search.expect_search_images().returning(|_, _| Vec::new());

        let mut seq = Sequence::new();
        let mut transport = MockChatTransport::new();
        expect_presence(&mut transport, &mut seq, Presence::Active);
        expect_text(&mut transport, &mut seq, PLACEHOLDER_REPLY);
        expect_text(&mut transport, &mut seq, "couldn't find images");
        expect_presence(&mut transport, &mut seq, Presence::Inactive);

        dispatcher(search)
            .handle(&InboundMessage::new("/img nothing"), &transport)
            .await;
    }

    #[tokio::test]
    async fn test_transport_failure_still_clears_presence() {
        let mut seq = Sequence::new();
        let mut transport = MockChatTransport::new();
        expect_presence(&mut transport, &mut seq, Presence::Active);
        transport
            .expect_reply_text()
            .with(predicate::function(|text: &str| text == PLACEHOLDER_REPLY))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("telegram down")));
        transport
            .expect_reply_text()
            .with(predicate::function(|text: &str| text == FAILURE_REPLY))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("telegram down")));
        expect_presence(&mut transport, &mut seq, Presence::Inactive);

        dispatcher(MockSearchApi::new())
            .handle(&InboundMessage::new("/search cats"), &transport)
            .await;
    }
}
