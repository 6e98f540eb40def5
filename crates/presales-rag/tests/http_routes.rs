//! Integration tests for the HTTP endpoints.
//!
//! Providers are replaced with in-process fakes so the router can be driven
//! end to end without network access.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use futures_util::StreamExt;
use parking_lot::Mutex;
use presales_rag::config::RagConfig;
use presales_rag::context::RagContext;
use presales_rag::ingestion::{index_pages, TextSplitter};
use presales_rag::providers::{
    ChatMessage, EmbeddingProvider, InMemoryVectorStore, LlmProvider, TextStream,
};
use presales_rag::server::{build_router, state::AppState};
use presales_rag::types::PageContent;
use presales_rag::Result;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Replies with a fixed text, streamed one word at a time
struct EchoLlm {
    reply: String,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl EchoLlm {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().push(messages.to_vec());
        Ok(self.reply.clone())
    }

    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        self.prompts.lock().push(messages.to_vec());
        let pieces: Vec<Result<String>> = self
            .reply
            .split_inclusive(' ')
            .map(|p| Ok(p.to_string()))
            .collect();
        Ok(futures_util::stream::iter(pieces).boxed())
    }

    fn model(&self) -> &str {
        "echo-1"
    }
}

/// Two-dimensional embedding keyed on storage vs server vocabulary
#[derive(Default)]
struct TopicEmbedder {
    calls: AtomicUsize,
}

impl TopicEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        vec![
            lower.matches("storage").count() as f32 + 0.1,
            lower.matches("server").count() as f32 + 0.1,
        ]
    }
}

#[async_trait]
impl EmbeddingProvider for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }
}

async fn ready_state(reply: &str) -> (AppState, Arc<EchoLlm>, Arc<TopicEmbedder>) {
    let config = RagConfig::default();
    let llm = Arc::new(EchoLlm::new(reply));
    let embedder = Arc::new(TopicEmbedder::default());
    let store = Arc::new(InMemoryVectorStore::new(2));

    let pages = vec![PageContent {
        path: PathBuf::from("docs/powerstore.pdf"),
        page_number: 1,
        page_count: 1,
        content: "PowerStore is unified storage for block and file.".to_string(),
    }];
    let stats = index_pages(
        &pages,
        &TextSplitter::new(1500, 200).unwrap(),
        embedder.as_ref(),
        store.as_ref(),
    )
    .await
    .unwrap();

    let context = RagContext::from_parts(&config, llm.clone(), embedder.clone(), store, stats);
    (AppState::new(config, context), llm, embedder)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 10_000_000)
        .await
        .unwrap()
        .to_vec()
}

fn history() -> serde_json::Value {
    serde_json::json!([
        ["human", "Customer needs VDI storage"],
        ["ai", "PowerStore is a good fit"]
    ])
}

// --- uninitialized service ---

#[tokio::test]
async fn test_uninitialized_chat_is_service_unavailable() {
    let app = build_router(AppState::uninitialized(RagConfig::default()));
    let response = app
        .oneshot(post_json("/chat", serde_json::json!({"input": "hi", "chat_history": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json.get("error").is_some());
    assert_eq!(json["error"]["message"], "RAG chain not initialized");
}

#[tokio::test]
async fn test_uninitialized_reports_are_service_unavailable() {
    for uri in ["/report", "/json_report", "/report_docx", "/report_pdf"] {
        let app = build_router(AppState::uninitialized(RagConfig::default()));
        let response = app
            .oneshot(post_json(uri, serde_json::json!({"chat_history": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
    }
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = build_router(AppState::uninitialized(RagConfig::default()));
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let (state, _, _) = ready_state("ok").await;
    let response = build_router(state).oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// --- chat ---

#[tokio::test]
async fn test_chat_streams_answer_text_only() {
    let (state, llm, embedder) = ready_state("PowerStore 5200T fits this workload.").await;
    let response = build_router(state)
        .oneshot(post_json(
            "/chat",
            serde_json::json!({"input": "Which storage array?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        String::from_utf8(body_bytes(response).await).unwrap(),
        "PowerStore 5200T fits this workload."
    );

    // no history, so one retrieval and a single answer call
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    let prompts = llm.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0][0].content.contains("PowerStore is unified storage"));
}

#[tokio::test]
async fn test_chat_with_history_reformulates_first() {
    let (state, llm, _) = ready_state("standalone storage question").await;
    let response = build_router(state)
        .oneshot(post_json(
            "/chat",
            serde_json::json!({"input": "How big can it get?", "chat_history": history()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_bytes(response).await;

    let prompts = llm.prompts.lock();
    assert_eq!(prompts.len(), 2);
    // system, two history turns, question
    assert_eq!(prompts[1].len(), 4);
    assert_eq!(prompts[1][3].content, "How big can it get?");
}

#[tokio::test]
async fn test_chat_without_input_is_rejected() {
    let (state, llm, _) = ready_state("unused").await;
    let response = build_router(state)
        .oneshot(post_json("/chat", serde_json::json!({"chat_history": []})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(llm.prompts.lock().is_empty());
}

// --- reports ---

#[tokio::test]
async fn test_json_report_is_passed_through_verbatim() {
    let (state, _, _) = ready_state("not json at all").await;
    let response = build_router(state)
        .oneshot(post_json("/json_report", serde_json::json!({"chat_history": history()})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"not json at all");
}

#[tokio::test]
async fn test_report_prompt_contains_transcript() {
    let (state, llm, _) = ready_state("**Presales Call Summary Report:**").await;
    let response = build_router(state)
        .oneshot(post_json("/report", serde_json::json!({"chat_history": history()})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_bytes(response).await;

    let prompts = llm.prompts.lock();
    assert!(prompts[0][0].content.ends_with(
        "Presales Engineer: Customer needs VDI storage\nAssistant: PowerStore is a good fit"
    ));
}

#[tokio::test]
async fn test_report_docx_is_attachment() {
    let (state, _, _) = ready_state("**Section:**\n- **A:** one\n- plain\nEnd.").await;
    let response = build_router(state)
        .oneshot(post_json("/report_docx", serde_json::json!({"chat_history": history()})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"dell_presales_report.docx\""
    );

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(xml.contains(">Section<"));
    assert!(xml.contains(">End.<"));
}

#[tokio::test]
async fn test_report_pdf_is_attachment() {
    let (state, _, _) = ready_state("**Section:**\n- **A:** one\n- plain\nEnd.").await;
    let response = build_router(state)
        .oneshot(post_json("/report_pdf", serde_json::json!({"chat_history": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"dell_presales_report.pdf\""
    );
    assert!(body_bytes(response).await.starts_with(b"%PDF"));
}

// --- info ---

#[tokio::test]
async fn test_info_reports_index_stats() {
    let (state, _, _) = ready_state("ok").await;
    let response = build_router(state).oneshot(get("/info")).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert_eq!(json["ready"], true);
    assert_eq!(json["model"], "echo-1");
    assert_eq!(json["index"]["chunks"], 1);
    assert!(json["endpoints"].get("POST /chat").is_some());
}
