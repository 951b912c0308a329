//! Tests for the dispatcher.

use super::*;
use crate::catalog::domain::StaticResource;
use crate::event::{EventKind, InMemoryEventPublisher};
use crate::protocol::error::{
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, SESSION_NOT_INITIALIZED,
};
use crate::session::domain::SessionState;
use crate::tool::adapters::echo_tool;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Sink};

type TestDispatcher<W> = Dispatcher<W, InMemoryEventPublisher, DefaultClock>;

const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"inspector","version":"1.0"}}}"#;

fn build<W>(writer: W, publisher: &Arc<InMemoryEventPublisher>) -> TestDispatcher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    Dispatcher::new(
        Implementation::new("parley", "0.1.0"),
        ServerCapabilities::standard(true),
        writer,
        Arc::clone(publisher),
        Arc::new(DefaultClock),
    )
    .with_tool(echo_tool(&DefaultClock).expect("valid tool"))
    .with_resource(
        Resource::new(ResourceUri::new("file:///readme.md").expect("valid URI"), "README")
            .expect("valid resource")
            .with_reader(Arc::new(StaticResource::text("# Parley"))),
    )
}

#[fixture]
fn publisher() -> Arc<InMemoryEventPublisher> {
    Arc::new(InMemoryEventPublisher::new())
}

#[fixture]
fn dispatcher(publisher: Arc<InMemoryEventPublisher>) -> TestDispatcher<Sink> {
    build(tokio::io::sink(), &publisher)
}

async fn initialized(dispatcher: &TestDispatcher<Sink>) {
    let response = dispatcher.handle_line(INITIALIZE).await.expect("response");
    assert!(!response.is_error(), "initialize failed: {response:?}");
}

fn error_code(response: Option<Response>) -> Option<i64> {
    response.and_then(|reply| reply.error).map(|error| error.code)
}

#[rstest]
#[tokio::test]
async fn initialize_negotiates_and_installs_session(dispatcher: TestDispatcher<Sink>) {
    let response = dispatcher.handle_line(INITIALIZE).await.expect("response");

    let result = response.result.expect("success");
    assert_eq!(result.get("protocolVersion"), Some(&json!("2025-03-26")));
    assert_eq!(
        result.get("serverInfo"),
        Some(&json!({"name": "parley", "version": "0.1.0"}))
    );
    let session = dispatcher.current_session().expect("installed");
    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.get_tool("echo").is_some());
}

#[rstest]
#[tokio::test]
async fn initialize_without_version_is_invalid_params(dispatcher: TestDispatcher<Sink>) {
    let response = dispatcher
        .handle_line(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"c","version":"1"}}}"#,
        )
        .await;

    assert_eq!(error_code(response), Some(INVALID_PARAMS));
    assert!(dispatcher.current_session().is_none());
}

#[rstest]
#[tokio::test]
async fn second_initialize_replaces_and_closes_previous(publisher: Arc<InMemoryEventPublisher>) {
    let dispatcher = build(tokio::io::sink(), &publisher);
    initialized(&dispatcher).await;
    let first = dispatcher.current_session().expect("installed");

    initialized(&dispatcher).await;
    let second = dispatcher.current_session().expect("installed");

    assert_ne!(first.id(), second.id());
    assert_eq!(first.state(), SessionState::Closed);
    assert!(
        publisher
            .published()
            .iter()
            .any(|event| matches!(event.kind(), EventKind::SessionClosed))
    );
}

#[rstest]
#[case(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)]
#[case(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)]
#[case(r#"{"jsonrpc":"2.0","id":2,"method":"logging/setLevel","params":{"level":"debug"}}"#)]
#[tokio::test]
async fn requests_before_initialize_are_rejected(
    dispatcher: TestDispatcher<Sink>,
    #[case] line: &str,
) {
    let response = dispatcher.handle_line(line).await;

    assert_eq!(error_code(response), Some(SESSION_NOT_INITIALIZED));
}

#[rstest]
#[tokio::test]
async fn ping_works_before_initialize(dispatcher: TestDispatcher<Sink>) {
    let response = dispatcher
        .handle_line(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#)
        .await
        .expect("response");

    assert_eq!(response.id, Some(RequestId::String("p".to_owned())));
    assert_eq!(response.result, Some(json!({})));
}

#[rstest]
#[tokio::test]
async fn unknown_method_is_method_not_found(dispatcher: TestDispatcher<Sink>) {
    initialized(&dispatcher).await;

    let response = dispatcher
        .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"tools/explode"}"#)
        .await;

    assert_eq!(error_code(response), Some(METHOD_NOT_FOUND));
}

#[rstest]
#[case(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)]
#[case(r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":4}}"#)]
#[case(r#"{"jsonrpc":"1.0","method":"notifications/cancelled"}"#)]
#[case(r#"{"jsonrpc":"2.0","id":9,"method":"notifications/initialized"}"#)]
#[case(r#"{"jsonrpc":"2.0","id":"c-1","method":"cancelled","params":{"requestId":3}}"#)]
#[case("   ")]
#[tokio::test]
async fn notifications_are_never_answered(dispatcher: TestDispatcher<Sink>, #[case] line: &str) {
    assert!(dispatcher.handle_line(line).await.is_none());
}

#[rstest]
#[case("{oops", PARSE_ERROR)]
#[case(r#"{"jsonrpc":"1.0","id":5,"method":"ping"}"#, INVALID_REQUEST)]
#[tokio::test]
async fn malformed_requests_get_error_responses(
    dispatcher: TestDispatcher<Sink>,
    #[case] line: &str,
    #[case] code: i64,
) {
    assert_eq!(error_code(dispatcher.handle_line(line).await), Some(code));
}

#[rstest]
#[tokio::test]
async fn tools_call_echoes(dispatcher: TestDispatcher<Sink>) {
    initialized(&dispatcher).await;

    let response = dispatcher
        .handle_line(
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
        )
        .await
        .expect("response");

    assert_eq!(
        response.result,
        Some(json!({"content": [{"type": "text", "text": "hi"}], "isError": false}))
    );
}

#[rstest]
#[tokio::test]
async fn oversized_frame_is_answered_with_null_id(dispatcher: TestDispatcher<Sink>) {
    let response = dispatcher.handle_frame(Frame::Oversized).await.expect("response");

    assert_eq!(response.id, None);
    assert_eq!(response.error.map(|error| error.code), Some(INVALID_REQUEST));
}

#[rstest]
#[tokio::test]
async fn serve_answers_each_line_and_closes_session_at_eof(
    publisher: Arc<InMemoryEventPublisher>,
) {
    let (mut client, server_input) = tokio::io::duplex(4096);
    let (server_output, client_output) = tokio::io::duplex(4096);
    let dispatcher = build(server_output, &publisher);

    let input = format!(
        "{INITIALIZE}\n{}\n{}\n{}\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "not json",
        r#"{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"uri":"file:///readme.md"}}"#,
    );
    client.write_all(input.as_bytes()).await.expect("write input");
    drop(client);

    dispatcher.serve(server_input).await.expect("serve completes");
    drop(dispatcher);

    let mut lines = BufReader::new(client_output).lines();
    let mut responses = Vec::new();
    while let Some(line) = lines.next_line().await.expect("read output") {
        responses.push(serde_json::from_str::<Value>(&line).expect("valid JSON"));
    }

    assert_eq!(responses.len(), 3);
    assert_eq!(
        responses.get(1).and_then(|reply| reply.pointer("/error/code")),
        Some(&json!(PARSE_ERROR))
    );
    assert_eq!(
        responses.get(2).and_then(|reply| reply.pointer("/result/contents/0/text")),
        Some(&json!("# Parley"))
    );
    assert!(
        publisher
            .published()
            .iter()
            .any(|event| matches!(event.kind(), EventKind::SessionClosed))
    );
}

async fn subscribed_dispatcher(
    publisher: &Arc<InMemoryEventPublisher>,
) -> (TestDispatcher<DuplexStream>, DuplexStream) {
    let (server_output, client_output) = tokio::io::duplex(4096);
    let dispatcher = build(server_output, publisher);
    let response = dispatcher.handle_line(INITIALIZE).await.expect("response");
    assert!(!response.is_error());
    (dispatcher, client_output)
}

#[rstest]
#[tokio::test]
async fn resource_updates_require_subscription(publisher: Arc<InMemoryEventPublisher>) {
    let (dispatcher, client_output) = subscribed_dispatcher(&publisher).await;
    let uri = ResourceUri::new("file:///readme.md").expect("valid URI");

    assert!(!dispatcher.notify_resource_updated(&uri).await.expect("write"));

    let response = dispatcher
        .handle_line(
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/subscribe","params":{"uri":"file:///readme.md"}}"#,
        )
        .await
        .expect("response");
    assert!(!response.is_error());
    assert!(dispatcher.notify_resource_updated(&uri).await.expect("write"));
    drop(dispatcher);

    let mut lines = BufReader::new(client_output).lines();
    let pushed = lines.next_line().await.expect("read").expect("one line");
    assert_eq!(
        serde_json::from_str::<Value>(&pushed).expect("valid JSON"),
        json!({
            "jsonrpc": "2.0",
            "method": "notifications/resources/updated",
            "params": {"uri": "file:///readme.md"}
        })
    );
}

#[rstest]
#[tokio::test]
async fn client_logging_respects_level(publisher: Arc<InMemoryEventPublisher>) {
    let (dispatcher, client_output) = subscribed_dispatcher(&publisher).await;
    dispatcher
        .handle_line(
            r#"{"jsonrpc":"2.0","id":2,"method":"logging/setLevel","params":{"level":"warning"}}"#,
        )
        .await
        .expect("response");

    let quiet = dispatcher
        .log_to_client(LogLevel::Info, None, json!("ignored"))
        .await
        .expect("write");
    let loud = dispatcher
        .log_to_client(LogLevel::Error, Some("tools"), json!({"detail": "disk full"}))
        .await
        .expect("write");
    drop(dispatcher);

    assert!(!quiet);
    assert!(loud);
    let mut lines = BufReader::new(client_output).lines();
    let pushed = lines.next_line().await.expect("read").expect("one line");
    assert_eq!(
        serde_json::from_str::<Value>(&pushed)
            .expect("valid JSON")
            .get("params"),
        Some(&json!({"level": "error", "logger": "tools", "data": {"detail": "disk full"}}))
    );
}

#[rstest]
fn redaction_masks_nested_secrets() {
    let params = json!({
        "name": "deploy",
        "arguments": {
            "target": "prod",
            "api_key": "abc",
            "accessToken": "def",
            "nested": [{"Password": "ghi"}]
        }
    });

    assert_eq!(
        redact_params(Some(&params)),
        json!({
            "name": "deploy",
            "arguments": {
                "target": "prod",
                "api_key": REDACTED,
                "accessToken": REDACTED,
                "nested": [{"Password": REDACTED}]
            }
        })
    );
    assert_eq!(redact_params(None), Value::Null);
}
