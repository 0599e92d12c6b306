//! End-to-end relay tests: a real server on an ephemeral port, a mock
//! generation backend, and a mock search provider.

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yner::config::{AppConfig, BackendConfig, SearchSettings, ServerConfig};
use yner::{ChatClient, ChatServer};
use yner_search::ResultKind;

/// NDJSON body for a streamed backend response.
fn ndjson(tokens: &[&str]) -> String {
    let mut body = String::new();
    for token in tokens {
        body.push_str(&serde_json::json!({ "response": token, "done": false }).to_string());
        body.push('\n');
    }
    body.push_str(&serde_json::json!({ "response": "", "done": true }).to_string());
    body.push('\n');
    body
}

/// An unused localhost port; connections fail immediately.
fn dead_endpoint() -> String {
    "http://127.0.0.1:9".to_owned()
}

fn test_config(backend_url: String, search_url: Option<String>) -> AppConfig {
    let search_api = search_url
        .clone()
        .map(|u| format!("{u}/search-api"))
        .unwrap_or_else(dead_endpoint);
    let search_html = search_url
        .map(|u| format!("{u}/search-html"))
        .unwrap_or_else(dead_endpoint);
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        backend: BackendConfig {
            base_url: backend_url,
            request_timeout_secs: 5,
            ..Default::default()
        },
        search: SearchSettings {
            timeout_secs: 2,
            api_endpoint: Some(search_api),
            html_endpoint: Some(search_html),
            ..Default::default()
        },
    }
}

async fn mount_france_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search-api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
              "Heading": "France",
              "AbstractText": "France is a country in Western Europe.",
              "AbstractURL": "https://en.wikipedia.org/wiki/France"
            }"#,
            "application/json",
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn end_to_end_prompt_to_demultiplexed_response() {
    let mocks = MockServer::start().await;
    mount_france_search(&mocks).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        // The relay must forward the augmented prompt, not the bare one.
        .and(body_string_contains("STRUCTURED WEB SEARCH DATA"))
        .and(body_string_contains("What is the capital of France?"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ndjson(&["The capital", " of France", " is Paris."]),
            "application/x-ndjson",
        ))
        .mount(&mocks)
        .await;

    let server = ChatServer::start(test_config(mocks.uri(), Some(mocks.uri())))
        .await
        .expect("server start");
    let client = ChatClient::new(format!("http://{}", server.addr())).expect("client");

    let response = client
        .generate("What is the capital of France?")
        .await
        .expect("generate");

    let envelope = response.envelope.expect("envelope present");
    assert_eq!(envelope.query, "What is the capital of France");
    assert_eq!(envelope.total_results, 1);
    assert_eq!(envelope.sources[0].id, 1);
    assert_eq!(envelope.sources[0].domain, "en.wikipedia.org");
    assert_eq!(envelope.sources[0].kind, ResultKind::InstantAnswer);
    assert_eq!(response.text, "The capital of France is Paris.");
}

#[tokio::test]
async fn streaming_callback_sees_text_in_order() {
    let mocks = MockServer::start().await;
    mount_france_search(&mocks).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ndjson(&["a", "b", "c"]),
            "application/x-ndjson",
        ))
        .mount(&mocks)
        .await;

    let server = ChatServer::start(test_config(mocks.uri(), Some(mocks.uri())))
        .await
        .expect("server start");
    let client = ChatClient::new(format!("http://{}", server.addr())).expect("client");

    let mut seen = String::new();
    let response = client
        .generate_with("hello", |fragment| seen.push_str(fragment))
        .await
        .expect("generate");

    assert_eq!(response.text, "abc");
    assert_eq!(seen, "abc");
}

#[tokio::test]
async fn search_failure_still_produces_a_valid_empty_envelope() {
    let mocks = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        // The no-results rendering must reach the model.
        .and(body_string_contains("no results were found"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ndjson(&["I could not verify that online."]),
            "application/x-ndjson",
        ))
        .mount(&mocks)
        .await;

    // Search endpoints point nowhere; the backend is real.
    let server = ChatServer::start(test_config(mocks.uri(), None))
        .await
        .expect("server start");
    let client = ChatClient::new(format!("http://{}", server.addr())).expect("client");

    let response = client.generate("anything at all").await.expect("generate");
    let envelope = response.envelope.expect("envelope still present");
    assert_eq!(envelope.total_results, 0);
    assert!(envelope.sources.is_empty());
    assert_eq!(response.text, "I could not verify that online.");
}

#[tokio::test]
async fn backend_failure_surfaces_as_terminal_fragment() {
    let mocks = MockServer::start().await;
    mount_france_search(&mocks).await;

    let mut config = test_config(dead_endpoint(), Some(mocks.uri()));
    config.backend.request_timeout_secs = 1;
    let server = ChatServer::start(config).await.expect("server start");
    let client = ChatClient::new(format!("http://{}", server.addr())).expect("client");

    let response = client.generate("hello").await.expect("stream still closes cleanly");
    assert!(response.envelope.is_some());
    assert!(
        response.text.starts_with("generation error:"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn response_headers_mirror_the_envelope() {
    let mocks = MockServer::start().await;
    mount_france_search(&mocks).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ndjson(&["ok"]),
            "application/x-ndjson",
        ))
        .mount(&mocks)
        .await;

    let server = ChatServer::start(test_config(mocks.uri(), Some(mocks.uri())))
        .await
        .expect("server start");

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/generate", server.addr()))
        .json(&serde_json::json!({ "prompt": "What is France?" }))
        .send()
        .await
        .expect("request");

    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/plain")
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert_eq!(
        response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok()),
        Some("no-cache")
    );

    let header_value = response
        .headers()
        .get("x-search-metadata")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("metadata header present");
    let header_envelope: yner::SearchEnvelope = serde_json::from_str(
        &urlencoding::decode(&header_value).expect("urldecode"),
    )
    .expect("header envelope");

    // The in-body frame and the header must describe the same envelope.
    let body = response.text().await.expect("body");
    let mut demux = yner::StreamDemux::new();
    let mut events = demux.push(body.as_bytes());
    events.extend(demux.finish());
    let body_envelope = events
        .into_iter()
        .find_map(|e| match e {
            yner::DemuxEvent::Metadata(env) => Some(env),
            yner::DemuxEvent::Text(_) => None,
        })
        .expect("frame envelope");

    assert_eq!(body_envelope, header_envelope);
    assert_eq!(body_envelope.sources[0].domain, "en.wikipedia.org");
}

#[tokio::test]
async fn models_endpoint_proxies_backend_response() {
    let mocks = MockServer::start().await;
    let tags = serde_json::json!({
        "models": [
            { "name": "mistral:latest", "size": 4109865159u64 },
            { "name": "llama3:8b", "size": 4661224676u64 }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tags.clone()))
        .mount(&mocks)
        .await;

    let server = ChatServer::start(test_config(mocks.uri(), None))
        .await
        .expect("server start");

    let response = reqwest::get(format!("http://{}/api/models", server.addr()))
        .await
        .expect("request");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body, tags);
}

#[tokio::test]
async fn models_endpoint_failure_uses_fixed_diagnostic() {
    let server = ChatServer::start(test_config(dead_endpoint(), None))
        .await
        .expect("server start");

    let response = reqwest::get(format!("http://{}/api/models", server.addr()))
        .await
        .expect("request");
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["error"], "unable to retrieve models");
}

#[tokio::test]
async fn preflight_allows_cross_origin_posts() {
    let server = ChatServer::start(test_config(dead_endpoint(), None))
        .await
        .expect("server start");

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/api/generate", server.addr()),
        )
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 204);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert!(
        response
            .headers()
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("POST"))
    );
}

#[tokio::test]
async fn server_binds_ephemeral_port() {
    let server = ChatServer::start(test_config(dead_endpoint(), None))
        .await
        .expect("server start");
    assert_ne!(server.port(), 0);
    server.shutdown();
}
