//! Scripted agent server for integration tests.
//!
//! The client talks to [`FakeServer`] over an in-memory duplex pipe, so every
//! test controls exactly which lines the client reads and in what order.

#![allow(dead_code)]

use std::time::Duration;

use codex_rpc_client::{Client, ClientBuilder, StdioTransport};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FakeServer {
    lines: Lines<BufReader<DuplexStream>>,
    writer: DuplexStream,
}

impl FakeServer {
    /// Next message the client sent
    pub async fn read(&mut self) -> Value {
        let line = tokio::time::timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("client sent nothing")
            .expect("pipe failed")
            .expect("client closed the pipe");
        serde_json::from_str(&line).expect("client sent invalid JSON")
    }

    /// Next message, which must be a request for `method`. Returns it whole.
    pub async fn expect_request(&mut self, method: &str) -> Value {
        let message = self.read().await;
        assert_eq!(message["method"], method, "unexpected message {message}");
        assert!(message.get("id").is_some(), "expected a request, got {message}");
        message
    }

    /// Next message, which must be a notification for `method`.
    pub async fn expect_notification(&mut self, method: &str) -> Value {
        let message = self.read().await;
        assert_eq!(message["method"], method, "unexpected message {message}");
        assert!(message.get("id").is_none(), "expected a notification, got {message}");
        message
    }

    pub async fn write(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.expect("write failed");
        self.writer.flush().await.expect("flush failed");
    }

    pub async fn respond(&mut self, id: &Value, result: Value) {
        self.write(json!({"jsonrpc": "2.0", "id": id, "result": result}))
            .await;
    }

    pub async fn respond_error(&mut self, id: &Value, code: i64, message: &str) {
        self.write(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .await;
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.write(json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
    }

    /// Send a server-initiated request and return the client's answer.
    pub async fn call(&mut self, id: Value, method: &str, params: Value) -> Value {
        self.write(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        let answer = self.read().await;
        assert_eq!(answer["id"], id, "answer for another request: {answer}");
        answer
    }

    /// Answer `initialize` and take the `initialized` notification.
    pub async fn handshake(&mut self) {
        let request = self.expect_request("initialize").await;
        self.respond(&request["id"], json!({"userAgent": "fake-codex/1.0"}))
            .await;
        self.expect_notification("initialized").await;
    }

    /// Answer `thread/start` with `thread_id`.
    pub async fn start_thread(&mut self, thread_id: &str) {
        let request = self.expect_request("thread/start").await;
        self.respond(
            &request["id"],
            json!({"thread": {"id": thread_id, "preview": ""}, "model": "gpt-5-codex"}),
        )
        .await;
    }

    /// Answer `turn/start` with `turn_id`. Returns the request params.
    pub async fn start_turn(&mut self, turn_id: &str) -> Value {
        let request = self.expect_request("turn/start").await;
        self.respond(
            &request["id"],
            json!({"turn": {"id": turn_id, "items": [], "status": "inProgress"}}),
        )
        .await;
        request["params"].clone()
    }

    /// Close the server's write half, as an exiting process would.
    pub async fn hang_up(mut self) {
        let _ = self.writer.shutdown().await;
    }
}

pub fn pipe() -> (StdioTransport, FakeServer) {
    let (client_write, server_read) = tokio::io::duplex(64 * 1024);
    let (server_write, client_read) = tokio::io::duplex(64 * 1024);
    let transport = StdioTransport::from_raw(client_read, client_write);
    let server = FakeServer {
        lines: BufReader::new(server_read).lines(),
        writer: server_write,
    };
    (transport, server)
}

/// A connected client with default settings and its server.
pub async fn connect() -> (Client, FakeServer) {
    connect_with(ClientBuilder::new()).await
}

pub async fn connect_with(builder: ClientBuilder) -> (Client, FakeServer) {
    let (transport, server) = pipe();
    let client = builder.build(transport).await.expect("client connects");
    (client, server)
}

/// A connected client that has completed the handshake.
pub async fn initialized(builder: ClientBuilder) -> (Client, FakeServer) {
    let (client, mut server) = connect_with(builder).await;
    let (response, ()) = tokio::join!(client.initialize(), server.handshake());
    response.expect("handshake succeeds");
    (client, server)
}

pub fn agent_message(thread_id: &str, turn_id: &str, item_id: &str, text: &str) -> Value {
    json!({
        "threadId": thread_id,
        "turnId": turn_id,
        "item": {"type": "agentMessage", "id": item_id, "text": text}
    })
}

pub fn turn_payload(thread_id: &str, turn_id: &str, status: &str) -> Value {
    json!({"threadId": thread_id, "turn": {"id": turn_id, "items": [], "status": status}})
}
