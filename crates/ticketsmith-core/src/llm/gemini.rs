use crate::constants::endpoints;
use crate::error::TicketError;
use crate::llm::traits::*;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Finish reasons that mean the backend refused to answer.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "RECITATION"];

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            endpoints::GEMINI_API_VERSION,
            model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: &'a [Content],
    generation_config: GeminiGenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationConfig> for GeminiGenerationConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Maps an HTTP status and body to reply text or a classified failure.
fn interpret_response(status: StatusCode, body: &str) -> Result<String, TicketError> {
    if !status.is_success() {
        let message = error_message(body);
        return Err(match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                TicketError::transient(format!("Gemini API error ({status}): {message}"))
            }
            s if s.is_server_error() => {
                TicketError::transient(format!("Gemini API error ({status}): {message}"))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                TicketError::rejected(format!("Authentication failed ({status}): {message}"))
            }
            _ => TicketError::rejected(format!("Gemini API error ({status}): {message}")),
        });
    }

    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| TicketError::rejected(format!("Failed to parse response: {e}")))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(TicketError::rejected(format!("Prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| TicketError::rejected("No candidates in response"))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(TicketError::rejected(format!("Reply blocked: {reason}")));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(TicketError::rejected("Empty reply from model"));
    }
    Ok(text)
}

#[async_trait::async_trait]
impl ChatBackend for GeminiClient {
    async fn generate(&self, request: &ChatRequest) -> Result<String, TicketError> {
        let url = self.endpoint(&request.model);

        let body = GeminiRequest {
            contents: &request.contents,
            generation_config: GeminiGenerationConfig::from(request.config.as_ref()),
            safety_settings: &request.config.safety_settings,
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        interpret_response(status, &response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn kind_of(result: Result<String, TicketError>) -> Option<FailureKind> {
        result.unwrap_err().failure_kind()
    }

    #[test]
    fn test_successful_reply_joins_text_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "**Title:** "}, {"text": "Dark mode"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let text = interpret_response(StatusCode::OK, body).unwrap();
        assert_eq!(text, "**Title:** Dark mode");
    }

    #[test]
    fn test_prompt_feedback_block_is_rejected() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = interpret_response(StatusCode::OK, body).unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Rejected));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_safety_finish_reason_is_rejected() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert_eq!(kind_of(interpret_response(StatusCode::OK, body)), Some(FailureKind::Rejected));
    }

    #[test]
    fn test_no_candidates_is_rejected() {
        let body = r#"{"candidates": []}"#;
        assert_eq!(kind_of(interpret_response(StatusCode::OK, body)), Some(FailureKind::Rejected));
    }

    #[test]
    fn test_server_errors_and_rate_limits_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::REQUEST_TIMEOUT,
        ] {
            assert_eq!(kind_of(interpret_response(status, "")), Some(FailureKind::Transient));
        }
    }

    #[test]
    fn test_auth_failure_is_rejected_with_api_message() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        let err = interpret_response(StatusCode::FORBIDDEN, body).unwrap_err();
        assert_eq!(err.failure_kind(), Some(FailureKind::Rejected));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert_eq!(
            kind_of(interpret_response(StatusCode::OK, "not json")),
            Some(FailureKind::Rejected)
        );
    }

    #[test]
    fn test_request_body_uses_camel_case_wire_names() {
        let config = GenerationConfig::default();
        let contents = vec![Content::user("hi")];
        let body = GeminiRequest {
            contents: &contents,
            generation_config: GeminiGenerationConfig::from(&config),
            safety_settings: &config.safety_settings,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["generationConfig"]["topK"], 1);
        assert_eq!(json["safetySettings"][0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    // ── Against a local HTTP server ────────────────────────────────────────

    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gemini-1.0-pro".to_string(),
            contents: vec![Content::user("login crashes on submit")],
            config: Arc::new(GenerationConfig::default()),
        }
    }

    /// Read one HTTP request (head plus `Content-Length` body) and return its head.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        head
    }

    /// Serve one connection with a raw `response`, returning the request head.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            head
        });
        (base_url, handle)
    }

    #[tokio::test]
    async fn test_generate_returns_reply_and_sends_api_key_header() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "**Title:** Login crash"}]}, "finishReason": "STOP"}]}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, server) = serve_once(response).await;
        let client = GeminiClient::new("test-key").with_base_url(base_url);

        let text = client.generate(&chat_request()).await.unwrap();
        let head = server.await.unwrap();

        assert_eq!(text, "**Title:** Login crash");
        assert!(head.starts_with("post /v1beta/models/gemini-1.0-pro:generatecontent"));
        assert!(head.contains("x-goog-api-key: test-key"));
        assert!(!head.contains("key=test-key"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let client = GeminiClient::new("test-key").with_base_url(base_url);

        let err = client.generate(&chat_request()).await.unwrap_err();

        assert_eq!(err.failure_kind(), Some(FailureKind::Transient));
    }

    #[tokio::test]
    async fn test_connection_dropped_mid_body_is_transient() {
        let response =
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1000\r\n\r\n{\"candidates\": [".to_string();
        let (base_url, server) = serve_once(response).await;
        let client = GeminiClient::new("test-key").with_base_url(base_url);

        let err = client.generate(&chat_request()).await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.failure_kind(), Some(FailureKind::Transient));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_over_the_wire_is_transient() {
        let body = r#"{"error": {"code": 503, "message": "overloaded"}}"#;
        let response = format!(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, server) = serve_once(response).await;
        let client = GeminiClient::new("test-key").with_base_url(base_url);

        let err = client.generate(&chat_request()).await.unwrap_err();
        server.await.unwrap();

        assert_eq!(err.failure_kind(), Some(FailureKind::Transient));
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_endpoint_includes_model_and_version() {
        let client = GeminiClient::new("key").with_base_url("http://localhost:8080/");
        assert_eq!(
            client.endpoint("gemini-1.0-pro"),
            "http://localhost:8080/v1beta/models/gemini-1.0-pro:generateContent"
        );
    }
}
