use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use askline_api::ChatClient;
use askline_chat::{ChatSession, ERROR_REPLY};
use askline_models::{Role, WELCOME_TEXT};
use askline_store::{HistoryStore, MemoryStorage};

fn session_for(
    server_uri: &str,
) -> (ChatSession<Arc<MemoryStorage>>, Arc<MemoryStorage>) {
    let backend = Arc::new(MemoryStorage::new());
    let client = ChatClient::new(server_uri)
        .with_timeouts(Duration::from_millis(500), Duration::from_secs(1));
    let session = ChatSession::new(client, HistoryStore::new(backend.clone()));
    (session, backend)
}

#[tokio::test]
async fn a_fresh_session_holds_only_the_welcome_message() {
    let (session, _backend) = session_for("http://127.0.0.1:9");
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].role, Role::Assistant);
    assert_eq!(session.messages()[0].content, WELCOME_TEXT);
    assert!(!session.has_history());
    assert!(session.show_suggestions());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn blank_input_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "hi"})))
        .expect(0)
        .mount(&server)
        .await;

    let (mut session, _backend) = session_for(&server.uri());
    assert!(!session.send_message("").await);
    assert!(!session.send_message("   \t  ").await);
    assert_eq!(session.messages().len(), 1);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn a_successful_send_appends_user_and_assistant_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({"input": "What do you offer?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "Answers."})))
        .expect(1)
        .mount(&server)
        .await;

    let (mut session, _backend) = session_for(&server.uri());
    assert!(session.send_message("  What do you offer?  ").await);

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "What do you offer?");
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "Answers.");
    assert!(!session.is_loading());
    assert!(session.has_history());
    assert!(!session.show_suggestions());
}

#[tokio::test]
async fn every_turn_is_persisted_as_a_full_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "noted"})))
        .mount(&server)
        .await;

    let (mut session, backend) = session_for(&server.uri());
    session.send_message("remember this").await;

    // A second store over the same backend simulates a reload.
    let reloaded = HistoryStore::new(backend).load();
    assert_eq!(reloaded, session.messages());
}

#[tokio::test]
async fn a_server_error_becomes_a_readable_assistant_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (mut session, _backend) = session_for(&server.uri());
    assert!(session.send_message("hello?").await);

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, Role::Assistant);
    assert!(
        messages[2].content.starts_with("Error:"),
        "content: {}",
        messages[2].content
    );
    assert!(messages[2].content.contains("503"));
    assert!(!session.is_loading());
}

#[tokio::test]
async fn a_connection_failure_becomes_the_generic_error_turn() {
    // Nothing listens here; connect is refused immediately.
    let (mut session, _backend) = session_for("http://127.0.0.1:9");
    assert!(session.send_message("anyone there?").await);

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, ERROR_REPLY);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn a_timeout_becomes_an_error_turn_and_never_drops_the_user_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"output": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (mut session, _backend) = session_for(&server.uri());
    assert!(session.send_message("slow one").await);

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "slow one");
    assert!(messages[2].content.contains("timed out"), "content: {}", messages[2].content);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn clear_history_resets_memory_and_storage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "sure"})))
        .mount(&server)
        .await;

    let (mut session, backend) = session_for(&server.uri());
    session.send_message("first").await;
    assert!(session.has_history());

    session.clear_history();
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].content, WELCOME_TEXT);
    assert!(session.show_suggestions());

    // A reload also comes up with the welcome default.
    let reloaded = HistoryStore::new(backend).load();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].content, WELCOME_TEXT);
}

#[tokio::test]
async fn a_new_session_restores_the_previous_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": "kept"})))
        .mount(&server)
        .await;

    let backend = Arc::new(MemoryStorage::new());
    let client = ChatClient::new(server.uri());
    let mut session = ChatSession::new(client.clone(), HistoryStore::new(backend.clone()));
    session.send_message("persist me").await;
    let before = session.messages().to_vec();
    drop(session);

    let restored = ChatSession::new(client, HistoryStore::new(backend));
    assert_eq!(restored.messages(), before.as_slice());
}

#[tokio::test]
async fn streaming_delivers_fragments_and_appends_the_accumulated_reply() {
    let server = MockServer::start().await;
    let body = "data: {\"content\":\"Hel\"}\n\ndata: {\"content\":\"lo\"}\n\ndata: [DONE]\n\n";
    Mock::given(method("POST"))
        .and(path("/stream"))
        .and(body_json(json!({"input": "stream it"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let (mut session, _backend) = session_for(&server.uri());
    let mut seen = Vec::new();
    assert!(
        session
            .send_message_streaming("stream it", |fragment| seen.push(fragment.to_string()))
            .await
    );

    assert_eq!(seen, vec!["Hel", "lo"]);
    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, "Hello");
    assert!(!session.is_loading());
}

#[tokio::test]
async fn a_streaming_failure_becomes_an_error_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut session, _backend) = session_for(&server.uri());
    assert!(session.send_message_streaming("stream it", |_| {}).await);

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[2].content.starts_with("Error:"));
    assert!(!session.is_loading());
}
