use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::models::ai::ChatMessage;
use crate::utils::AppError;

const CHAT_MAX_TOKENS: u32 = 300;
const CHAT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Transcription {
    text: String,
}

/// Audio upload forwarded to the transcription endpoint.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Client for the OpenAI-compatible HTTP API used by the `/ai` routes.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    transcribe_model: String,
    realtime_model: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        if config.openai_api_key.is_none() {
            log::warn!("⚠️  No OpenAI API key configured, /ai routes will answer 503");
        }

        Ok(Self {
            http,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            chat_model: config.chat_model.clone(),
            transcribe_model: config.transcribe_model.clone(),
            realtime_model: config.realtime_model.clone(),
        })
    }

    /// The configured key, or 503 when none is set.
    pub fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("OpenAI API key not configured".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, AppError> {
        let response = request
            .bearer_auth(self.api_key()?)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ OpenAI returned {}: {}", status, body);
            return Err(AppError::Upstream(format!("OpenAI API error: {}", status)));
        }
        Ok(response)
    }

    async fn complete(&self, body: Value) -> Result<String, AppError> {
        let response = self.send(self.http.post(self.url("chat/completions")).json(&body)).await?;
        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid completion response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Internal("Completion response has no content".to_string()))
    }

    /// Plain chat completion; returns the assistant's text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        log::info!("🤖 Chat completion with {} messages", messages.len());
        self.complete(json!({
            "model": self.chat_model,
            "messages": messages,
            "max_tokens": CHAT_MAX_TOKENS,
            "temperature": CHAT_TEMPERATURE,
        }))
        .await
    }

    /// Completion constrained to `schema`, parsed into `T`.
    pub async fn structured<T: DeserializeOwned>(
        &self,
        messages: &[ChatMessage],
        schema_name: &str,
        schema: Value,
    ) -> Result<T, AppError> {
        log::info!("🤖 Structured completion '{}'", schema_name);
        let content = self
            .complete(json!({
                "model": self.chat_model,
                "messages": messages,
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {
                        "name": schema_name,
                        "strict": true,
                        "schema": schema,
                    }
                }
            }))
            .await?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Internal(format!("Model output does not match {}: {}", schema_name, e)))
    }

    pub async fn transcribe(&self, audio: AudioUpload) -> Result<String, AppError> {
        log::info!("🎙️  Transcribing {} ({} bytes)", audio.file_name, audio.bytes.len());
        let part = reqwest::multipart::Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)
            .map_err(|e| AppError::bad_request(format!("Invalid audio content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.transcribe_model.clone())
            .part("file", part);

        let response = self
            .send(self.http.post(self.url("audio/transcriptions")).multipart(form))
            .await?;
        let transcription: Transcription = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid transcription response: {}", e)))?;
        Ok(transcription.text)
    }

    /// Creates a realtime session and returns the upstream JSON untouched.
    pub async fn create_realtime_session(&self, model: Option<&str>, voice: Option<&str>) -> Result<Value, AppError> {
        let mut body = json!({ "model": model.unwrap_or(&self.realtime_model) });
        if let Some(voice) = voice {
            body["voice"] = Value::String(voice.to_string());
        }

        let response = self.send(self.http.post(self.url("realtime/sessions")).json(&body)).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid realtime session response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tree::{tree_graph_schema, TreeGraph};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> OpenAiClient {
        let config = Config {
            openai_base_url: server.uri(),
            openai_api_key: key.map(str::to_string),
            ..Config::default()
        };
        OpenAiClient::new(&config).unwrap()
    }

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn test_chat_sends_model_and_limits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4.1-mini", "max_tokens": 300})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("What links cells to tissues?")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let reply = client.chat(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "What links cells to tissues?");
    }

    #[tokio::test]
    async fn test_structured_parses_model_json() {
        let server = MockServer::start().await;
        let graph = r#"{"nodes":[{"id":"n1","type":"goal","title":"Med school","content":""}],"edges":[]}"#;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"response_format": {"type": "json_schema"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(graph)))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let parsed: TreeGraph = client
            .structured(&[ChatMessage::user("go")], "tree_graph", tree_graph_schema())
            .await
            .unwrap();
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].title.as_deref(), Some("Med school"));
    }

    #[tokio::test]
    async fn test_structured_rejects_malformed_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json")))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let result: Result<TreeGraph, _> = client.structured(&[], "tree_graph", tree_graph_schema()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_upstream_error_maps_to_502() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let server = MockServer::start().await;
        let client = client_for(&server, None);
        assert!(matches!(client.api_key(), Err(AppError::Unavailable(_))));
        assert!(matches!(
            client.chat(&[ChatMessage::user("hi")]).await,
            Err(AppError::Unavailable(_))
        ));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_transcribe_and_realtime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "photosynthesis"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/realtime/sessions"))
            .and(body_partial_json(json!({"model": "gpt-4o-realtime-preview", "voice": "verse"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"client_secret": {"value": "ek_1"}})))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let text = client
            .transcribe(AudioUpload {
                bytes: vec![0, 1, 2],
                file_name: "note.webm".to_string(),
                content_type: "audio/webm".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(text, "photosynthesis");

        let session = client.create_realtime_session(None, Some("verse")).await.unwrap();
        assert_eq!(session["client_secret"]["value"], "ek_1");
    }
}
