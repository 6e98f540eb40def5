//! Gemini client for generation and embeddings via the Generative Language API
//!
//! One HTTP client and API key serve both provider traits. Streaming uses
//! `streamGenerateContent?alt=sse`, read as an event source.

use async_trait::async_trait;
use futures_util::{future, StreamExt};
use reqwest::{Client, RequestBuilder};
use reqwest_eventsource::{retry, Event, EventSource};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::llm::{ChatMessage, LlmProvider, MessageRole, TextStream};

/// Maximum texts per `batchEmbedContents` call
const MAX_EMBED_BATCH: usize = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gemini client authenticated with an API key
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embed_model: String,
    dimensions: usize,
    batch_size: usize,
    temperature: f32,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client
    ///
    /// `llm.timeout_secs` bounds whole unary calls. Streams have no total
    /// deadline; the same value only caps the wait between two reads.
    pub fn new(api_key: &str, llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        let timeout = Duration::from_secs(llm.timeout_secs);
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: llm.generate_model.clone(),
            embed_model: qualified_model(&embeddings.model),
            dimensions: embeddings.dimensions,
            batch_size: embeddings.batch_size.clamp(1, MAX_EMBED_BATCH),
            temperature: llm.temperature,
            timeout,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/{}:{}", self.base_url, qualified_model(model), method)
    }

    fn build_request(&self, messages: &[ChatMessage]) -> GenerateRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            let part = Part {
                text: message.content.clone(),
            };
            match message.role {
                MessageRole::System => system_parts.push(part),
                MessageRole::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                MessageRole::Assistant => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
            }
        }

        GenerateRequest {
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url).header("x-goog-api-key", &self.api_key)
    }

    fn unary_request<T: serde::Serialize + ?Sized>(&self, url: &str, body: &T) -> RequestBuilder {
        self.post(url).timeout(self.timeout).json(body)
    }

    fn stream_request(&self, messages: &[ChatMessage]) -> RequestBuilder {
        let url = format!(
            "{}?alt=sse",
            self.model_url(&self.model, "streamGenerateContent")
        );
        self.post(&url).json(&self.build_request(messages))
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> std::result::Result<reqwest::Response, String> {
        let response = self
            .unary_request(url, body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        Ok(response)
    }

    fn embed_request(&self, text: &str, task_type: &'static str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: self.embed_model.clone(),
            content: Content {
                role: None,
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type,
        }
    }
}

fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(serde::Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        Some(content.parts.into_iter().map(|p| p.text).collect())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(serde::Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(serde::Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(serde::Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(serde::Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Text carried by one streamed event (empty for metadata-only events)
fn parse_stream_event(payload: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(payload)
        .map_err(|e| Error::llm(format!("Malformed Gemini stream event: {}", e)))?;
    Ok(response.text().unwrap_or_default())
}

/// Readable cause of a stream that failed before its first event
async fn open_error(error: reqwest_eventsource::Error) -> String {
    match error {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            format!("HTTP {}: {}", status, response.text().await.unwrap_or_default())
        }
        other => other.to_string(),
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.build_request(messages);
        let url = self.model_url(&self.model, "generateContent");

        tracing::debug!("Gemini generate with {} messages", messages.len());

        let response = self
            .post_json(&url, &request)
            .await
            .map_err(|e| Error::llm(format!("Gemini generation failed: {}", e)))?;

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse Gemini response: {}", e)))?;

        gen_response
            .text()
            .ok_or_else(|| Error::llm("No text in Gemini response"))
    }

    async fn generate_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        tracing::debug!("Gemini stream with {} messages", messages.len());

        let mut events = EventSource::new(self.stream_request(messages))
            .map_err(|e| Error::llm(format!("Gemini stream failed: {}", e)))?;
        events.set_retry_policy(Box::new(retry::Never));

        // Status errors arrive before `Open`, so they fail the call itself
        let first = match events.next().await {
            Some(Err(e)) => {
                return Err(Error::llm(format!("Gemini stream failed: {}", open_error(e).await)))
            }
            first => first,
        };

        let stream = futures_util::stream::iter(first)
            .chain(events)
            .take_while(|event| {
                future::ready(!matches!(event, Err(reqwest_eventsource::Error::StreamEnded)))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(Event::Open) => None,
                    Ok(Event::Message(message)) => match parse_stream_event(&message.data) {
                        Ok(text) if text.is_empty() => None,
                        item => Some(item),
                    },
                    Err(e) => Some(Err(Error::llm(format!("Gemini stream error: {}", e)))),
                })
            })
            .boxed();

        Ok(stream)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.model_url(&self.embed_model, "embedContent");
        let request = self.embed_request(text, "RETRIEVAL_QUERY");

        let response = self
            .post_json(&url, &request)
            .await
            .map_err(|e| Error::embedding(format!("Gemini embedding failed: {}", e)))?;

        let embed_response: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        Ok(embed_response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.model_url(&self.embed_model, "batchEmbedContents");
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|t| self.embed_request(t, "RETRIEVAL_DOCUMENT"))
                    .collect(),
            };

            let response = self
                .post_json(&url, &request)
                .await
                .map_err(|e| Error::embedding(format!("Gemini batch embedding failed: {}", e)))?;

            let embed_response: BatchEmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse batch embedding response: {}", e))
            })?;

            if embed_response.embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embed_response.embeddings.len()
                )));
            }

            all_embeddings.extend(embed_response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn client() -> GeminiClient {
        GeminiClient::new("test-key", &LlmConfig::default(), &EmbeddingConfig::default()).unwrap()
    }

    #[test]
    fn test_system_messages_become_system_instruction() {
        let request = client().build_request(&[
            ChatMessage::system("be helpful"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("which switch?"),
        ]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be helpful");
        assert!(json["systemInstruction"].get("role").is_none());
        let roles: Vec<&str> = json["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_no_system_instruction_when_absent() {
        let request = client().build_request(&[ChatMessage::user("report please")]);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_model_urls() {
        let c = client();
        assert_eq!(
            c.model_url("gemini-1.5-flash", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            c.model_url(&c.embed_model, "embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent"
        );
    }

    #[test]
    fn test_embed_request_shape() {
        let json = serde_json::to_value(client().embed_request("PowerEdge", "RETRIEVAL_QUERY")).unwrap();
        assert_eq!(json["model"], "models/embedding-001");
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["content"]["parts"][0]["text"], "PowerEdge");
    }

    /// Serve one chunked HTTP response on a local port, writing each body
    /// piece separately. Returns the base URL.
    async fn serve_once(status: &'static str, content_type: &'static str, pieces: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;

            let head = format!(
                "HTTP/1.1 {}\r\ncontent-type: {}\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n",
                status, content_type
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for piece in pieces {
                socket.write_all(format!("{:x}\r\n", piece.len()).as_bytes()).await.unwrap();
                socket.write_all(&piece).await.unwrap();
                socket.write_all(b"\r\n").await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
        });

        format!("http://{}", addr)
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);

            let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + length {
                return;
            }
        }
    }

    fn local_client(base_url: String) -> GeminiClient {
        let llm = LlmConfig {
            base_url,
            ..LlmConfig::default()
        };
        GeminiClient::new("test-key", &llm, &EmbeddingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_stream_keeps_characters_split_across_reads() {
        let event = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"café — 5°C\"}]}}]}\r\n\r\n";
        // cut between the two bytes of the e-acute
        let cut = event.find('é').unwrap() + 1;
        let bytes = event.as_bytes();
        let pieces = vec![
            bytes[..cut].to_vec(),
            bytes[cut..].to_vec(),
            b"data: {\"candidates\":[]}\n\n".to_vec(),
        ];
        let base_url = serve_once("200 OK", "text/event-stream", pieces).await;

        let stream = local_client(base_url)
            .generate_stream(&[ChatMessage::user("weather?")])
            .await
            .unwrap();
        let texts: Vec<String> = stream.map(|item| item.unwrap()).collect().await;

        assert_eq!(texts, vec!["café — 5°C".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_status_error_fails_before_streaming() {
        let base_url = serve_once(
            "429 Too Many Requests",
            "application/json",
            vec![b"{\"error\":\"quota exhausted\"}".to_vec()],
        )
        .await;

        let err = local_client(base_url)
            .generate_stream(&[ChatMessage::user("hi")])
            .await
            .err()
            .unwrap();

        assert!(matches!(err, Error::Llm(_)));
        let message = err.to_string();
        assert!(message.contains("429"), "{}", message);
        assert!(message.contains("quota exhausted"), "{}", message);
    }

    #[test]
    fn test_only_unary_calls_have_a_total_timeout() {
        let c = client();
        let unary = c
            .unary_request(&c.model_url(&c.model, "generateContent"), &c.build_request(&[]))
            .build()
            .unwrap();
        assert_eq!(unary.timeout(), Some(&Duration::from_secs(LlmConfig::default().timeout_secs)));

        let streaming = c.stream_request(&[ChatMessage::user("hi")]).build().unwrap();
        assert!(streaming.timeout().is_none());
        assert!(streaming.url().as_str().ends_with(":streamGenerateContent?alt=sse"));
        assert_eq!(streaming.headers()["x-goog-api-key"], "test-key");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("ab"));

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(blocked.text().is_none());
    }
}
