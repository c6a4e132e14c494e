//! The conversation state machine.
//!
//! A session is either idle or awaiting a response; at most one request is
//! outstanding at a time. Every transport failure becomes a normal
//! assistant turn, so the conversation never halts or loses state.

use futures_util::StreamExt;

use askline_api::{ApiError, ChatClient, FALLBACK_REPLY};
use askline_models::Message;
use askline_store::{HistoryStore, StorageBackend};

/// Shown when the transport fails without a protocol-level explanation.
pub const ERROR_REPLY: &str =
    "Sorry, I encountered an error while processing your request. \
     Please make sure the assistant service is running and try again.";

/// One conversation against the assistant service.
///
/// Created from the history store's snapshot (or the welcome default) and
/// mutated only by [`send_message`](Self::send_message),
/// [`send_message_streaming`](Self::send_message_streaming) and
/// [`clear_history`](Self::clear_history). The store receives a full
/// snapshot after every mutation.
pub struct ChatSession<B: StorageBackend> {
    client: ChatClient,
    store: HistoryStore<B>,
    messages: Vec<Message>,
    is_loading: bool,
}

impl<B: StorageBackend> ChatSession<B> {
    /// Restore a session from the store, or start from the welcome default.
    pub fn new(client: ChatClient, store: HistoryStore<B>) -> Self {
        let messages = store.load();
        Self {
            client,
            store,
            messages,
            is_loading: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True exactly while a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// True once the conversation holds more than the welcome message.
    pub fn has_history(&self) -> bool {
        self.messages.len() > 1
    }

    /// True while only the welcome message is present.
    pub fn show_suggestions(&self) -> bool {
        self.messages.len() == 1
    }

    /// Send one message and append the complete reply.
    ///
    /// Blank input, or a call while a request is already in flight, is a
    /// no-op and returns false. Every completed call appends exactly two
    /// turns (user, then assistant or error) and leaves the session idle.
    pub async fn send_message(&mut self, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() || self.is_loading {
            return false;
        }

        self.begin_turn(content);
        let result = self.client.send_once(content).await;
        self.finish_turn(result);
        true
    }

    /// Send one message and append the reply as it streams in.
    ///
    /// `on_fragment` observes each content delta for incremental display;
    /// the accumulated text becomes the assistant turn once the stream
    /// completes. A mid-stream failure becomes an error turn, like the
    /// single-shot path.
    pub async fn send_message_streaming(
        &mut self,
        content: &str,
        mut on_fragment: impl FnMut(&str),
    ) -> bool {
        let content = content.trim();
        if content.is_empty() || self.is_loading {
            return false;
        }

        self.begin_turn(content);
        let result = self.stream_reply(content, &mut on_fragment).await;
        self.finish_turn(result);
        true
    }

    /// Reset to the welcome default and erase the persisted copy.
    pub fn clear_history(&mut self) {
        self.messages = vec![Message::welcome()];
        self.store.clear();
    }

    async fn stream_reply(
        &self,
        content: &str,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String, ApiError> {
        let mut stream = self.client.send_stream(content).await?;
        let mut reply = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            reply.push_str(&fragment);
        }
        // A stream that ends without content is handled like a missing
        // payload on the single-shot path.
        if reply.is_empty() {
            reply = FALLBACK_REPLY.to_string();
        }
        Ok(reply)
    }

    fn begin_turn(&mut self, content: &str) {
        self.messages.push(Message::user(content));
        self.store.save(&self.messages);
        self.is_loading = true;
    }

    fn finish_turn(&mut self, result: Result<String, ApiError>) {
        let reply = match result {
            Ok(reply) => reply,
            // Connection-level failures carry no message worth showing.
            Err(ApiError::Network(_)) => ERROR_REPLY.to_string(),
            Err(err) => format!("Error: {err}"),
        };
        self.messages.push(Message::assistant(reply));
        self.store.save(&self.messages);
        self.is_loading = false;
    }
}
