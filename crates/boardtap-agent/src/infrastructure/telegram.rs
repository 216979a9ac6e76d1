//! HTTP implementation of the inbox transport against the Telegram Bot API.
//!
//! Two request shapes, both JSON-bodied POSTs against
//! `{base}/bot{token}/{method}`:
//!
//! - `getUpdates` with `{offset, limit, timeout}` — the server holds the
//!   request open for up to `timeout` seconds (long-poll), so the HTTP
//!   client timeout is set per-request to the long-poll bound plus a margin
//!   rather than globally.
//! - `sendMessage` with `{chat_id, text}`.
//!
//! Three failure surfaces are mapped onto [`TransportError`]: the request
//! not completing (`Http`), a non-2xx status (`Status`), and a well-formed
//! `ok: false` envelope (`Api`), which Telegram uses for application-level
//! rejections such as a bad credential.

use std::time::Duration;

use async_trait::async_trait;
use boardtap_core::{
    FetchUpdatesRequest, SendMessageRequest, SendMessageResponse, Update, UpdatesResponse,
};
use tracing::debug;

use crate::application::poll_messages::{InboxTransport, TransportError};

/// Extra headroom on top of the server-side long-poll bound before the HTTP
/// client gives up on a `getUpdates` call.
const LONG_POLL_MARGIN: Duration = Duration::from_secs(10);

/// Client-side timeout for plain (non-long-poll) requests.
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Telegram Bot API transport.
pub struct TelegramInbox {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramInbox {
    /// Creates a transport for the given API base (normally
    /// `https://api.telegram.org`) and bot credential.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

#[async_trait]
impl InboxTransport for TelegramInbox {
    async fn fetch_updates(
        &self,
        offset: i64,
        limit: u8,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let body = FetchUpdatesRequest {
            offset,
            limit,
            timeout: timeout_secs,
        };

        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + LONG_POLL_MARGIN)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let envelope: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Payload(e.to_string()))?;

        if !envelope.ok {
            return Err(TransportError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "no description supplied".to_string()),
            ));
        }

        debug!("fetched {} update(s) from offset {offset}", envelope.result.len());
        Ok(envelope.result)
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let body = SendMessageRequest {
            chat_id,
            text: text.to_string(),
        };

        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let envelope: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Payload(e.to_string()))?;

        if !envelope.ok {
            return Err(TransportError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "no description supplied".to_string()),
            ));
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── fetch_updates ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fetch_updates_posts_expected_body_and_parses_result() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/getUpdates")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "offset": 8, "limit": 10, "timeout": 30
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok":true,"result":[{"update_id":8,"message":{"message_id":1,"chat":{"id":42},"text":"e2e4"}}]}"#,
            )
            .create_async()
            .await;
        let inbox = TelegramInbox::new(server.url(), "TEST_TOKEN");

        // Act
        let updates = inbox.fetch_updates(8, 10, 30).await.unwrap();

        // Assert
        mock.assert_async().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 8);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("e2e4")
        );
    }

    #[tokio::test]
    async fn test_fetch_updates_maps_ok_false_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/getUpdates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"description":"Unauthorized"}"#)
            .create_async()
            .await;
        let inbox = TelegramInbox::new(server.url(), "TEST_TOKEN");

        let result = inbox.fetch_updates(1, 10, 30).await;

        match result {
            Err(TransportError::Api(description)) => assert_eq!(description, "Unauthorized"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_updates_maps_http_status_to_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/getUpdates")
            .with_status(502)
            .create_async()
            .await;
        let inbox = TelegramInbox::new(server.url(), "TEST_TOKEN");

        let result = inbox.fetch_updates(1, 10, 30).await;

        assert!(matches!(result, Err(TransportError::Status(502))));
    }

    #[tokio::test]
    async fn test_fetch_updates_maps_garbage_body_to_payload_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/getUpdates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("this is not json")
            .create_async()
            .await;
        let inbox = TelegramInbox::new(server.url(), "TEST_TOKEN");

        let result = inbox.fetch_updates(1, 10, 30).await;

        assert!(matches!(result, Err(TransportError::Payload(_))));
    }

    // ── send_text ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_send_text_posts_chat_id_and_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "chat_id": 42, "text": "g1f3"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;
        let inbox = TelegramInbox::new(server.url(), "TEST_TOKEN");

        inbox.send_text(42, "g1f3").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_text_maps_ok_false_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"description":"chat not found"}"#)
            .create_async()
            .await;
        let inbox = TelegramInbox::new(server.url(), "TEST_TOKEN");

        let result = inbox.send_text(1, "e2e4").await;

        assert!(matches!(result, Err(TransportError::Api(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_maps_to_http_error() {
        // Port 1 refuses connections immediately.
        let inbox = TelegramInbox::new("http://127.0.0.1:1", "TEST_TOKEN");

        let result = inbox.send_text(1, "e2e4").await;

        assert!(matches!(result, Err(TransportError::Http(_))));
    }
}
