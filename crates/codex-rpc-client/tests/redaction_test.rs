//! Credentials reach the wire intact but never a log line or `Debug` output.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use codex_rpc_client::types::{ApiKeyLogin, LoginAccountParams, LoginAccountResponse};
use codex_rpc_client::{ClientBuilder, Secret};
use common::initialized;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;

const API_KEY: &str = "sk-test-4f1d9c0a7b";

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_api_key_is_sent_but_never_logged() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(capture.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (client, mut server) = initialized(ClientBuilder::new()).await;

    let server_side = async {
        let request = server.expect_request("account/login/start").await;
        assert_eq!(
            request["params"],
            json!({"type": "apiKey", "apiKey": API_KEY})
        );
        server.respond(&request["id"], json!({"type": "apiKey"})).await;
    };
    let (response, ()) = tokio::join!(client.login_api_key(API_KEY), server_side);
    assert!(matches!(response.unwrap(), LoginAccountResponse::ApiKey(_)));

    let logs = capture.contents();
    assert!(logs.contains("account/login/start"), "{logs}");
    assert!(!logs.contains(API_KEY), "{logs}");
}

#[test]
fn test_debug_output_redacts_the_key() {
    let params = LoginAccountParams::ApiKey(ApiKeyLogin {
        api_key: Secret::new(API_KEY),
    });
    let rendered = format!("{params:?}");
    assert!(!rendered.contains(API_KEY), "{rendered}");
    assert!(rendered.contains("redacted"), "{rendered}");
    assert_eq!(params.clone(), params);
}
