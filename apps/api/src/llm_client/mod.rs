/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All model interactions MUST go through this module.
///
/// Every call is schema-constrained: the schema is sent as `responseSchema`
/// and the returned text is validated against it before deserialization.
/// There is no retry loop and no repair of malformed output.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod schema;

use schema::{Schema, SchemaViolation};

pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Finish reasons meaning the model withheld its answer.
const BLOCKING_FINISH_REASONS: &[&str] =
    &["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No Gemini API key configured")]
    MissingCredential,

    #[error("Prompt blocked by the model: {0}")]
    Blocked(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}

impl LlmError {
    /// True when the call succeeded but the answer had the wrong shape.
    pub fn is_schema_failure(&self) -> bool {
        matches!(self, LlmError::Parse(_) | LlmError::Schema(_))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: RequestContent<'a>,
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }

    /// Error for a response that carried no usable text.
    fn missing_text_error(&self) -> LlmError {
        match self.finish_reason() {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => {
                LlmError::Blocked(reason.to_string())
            }
            _ => LlmError::EmptyContent,
        }
    }

    /// Concatenated text of the first candidate's parts, if any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single LLM client used by the report gateway.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes one raw call to `generateContent`, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        schema: &Schema,
        temperature: f32,
    ) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredential)?;

        let request_body = GenerateContentRequest {
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart { text: system }],
            },
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema.to_json(),
                temperature,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        if let Some(reason) = llm_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(LlmError::Blocked(reason));
        }

        let usage = llm_response.usage_metadata.as_ref();
        debug!(
            "LLM call succeeded: prompt_tokens={}, output_tokens={}",
            usage.map(|u| u.prompt_token_count).unwrap_or_default(),
            usage.map(|u| u.candidates_token_count).unwrap_or_default()
        );

        Ok(llm_response)
    }

    /// Calls the model and turns its text into a `T` that conforms to `schema`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        schema: &Schema,
        temperature: f32,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system, schema, temperature).await?;
        let text = match response.text() {
            Some(text) => text,
            None => return Err(response.missing_text_error()),
        };
        if response.finish_reason() == Some("MAX_TOKENS") {
            debug!("Model output hit the token limit; parsing what was returned");
        }
        parse_structured(&text, schema)
    }
}

/// Strict parse: the text must be exactly one JSON value matching `schema`.
pub fn parse_structured<T: DeserializeOwned>(text: &str, schema: &Schema) -> Result<T, LlmError> {
    let value: Value = serde_json::from_str(text.trim())?;
    schema.validate(&value)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Requirements {
        requirements: String,
        link: String,
    }

    fn requirements_schema() -> Schema {
        Schema::object(vec![
            ("requirements", Schema::string()),
            ("link", Schema::string()),
        ])
    }

    fn gemini_body(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 30 }
        })
        .to_string()
    }

    #[test]
    fn test_parse_structured_rejects_code_fences() {
        let text = "```json\n{\"requirements\": \"A*AA\", \"link\": \"x\"}\n```";
        let result: Result<Requirements, _> = parse_structured(text, &requirements_schema());
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_parse_structured_rejects_missing_field() {
        let result: Result<Requirements, _> =
            parse_structured(r#"{"requirements": "A*AA"}"#, &requirements_schema());
        assert!(matches!(result, Err(LlmError::Schema(_))));
    }

    #[test]
    fn test_parse_structured_accepts_surrounding_whitespace() {
        let parsed: Requirements = parse_structured(
            "\n  {\"requirements\": \"A*AA\", \"link\": \"https://example.ac.uk\"}  \n",
            &requirements_schema(),
        )
        .unwrap();
        assert_eq!(parsed.requirements, "A*AA");
        assert_eq!(parsed.link, "https://example.ac.uk");
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: LlmResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_response_text_none_without_candidates() {
        let response: LlmResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let client = LlmClient::new(None, DEFAULT_MODEL, "http://127.0.0.1:9").unwrap();
        let result = client
            .call("prompt", "system", &requirements_schema(), 0.2)
            .await;
        assert!(matches!(result, Err(LlmError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_call_json_success_sends_schema_and_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT" }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_body(
                r#"{"requirements": "A*AA", "link": "https://www.ox.ac.uk/physics"}"#,
            ))
            .expect(1)
            .create_async()
            .await;

        let client =
            LlmClient::new(Some("test-key".to_string()), DEFAULT_MODEL, server.url()).unwrap();
        let parsed: Requirements = client
            .call_json("prompt", "system", &requirements_schema(), 0.2)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(parsed.requirements, "A*AA");
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(503)
            .with_body(r#"{"error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client =
            LlmClient::new(Some("test-key".to_string()), DEFAULT_MODEL, server.url()).unwrap();
        let result = client
            .call("prompt", "system", &requirements_schema(), 0.2)
            .await;

        mock.assert_async().await;
        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let client =
            LlmClient::new(Some("test-key".to_string()), DEFAULT_MODEL, server.url()).unwrap();
        let result = client
            .call("prompt", "system", &requirements_schema(), 0.2)
            .await;
        assert!(matches!(result, Err(LlmError::Blocked(reason)) if reason == "SAFETY"));
    }

    #[tokio::test]
    async fn test_safety_stop_without_text_is_blocked() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#)
            .create_async()
            .await;

        let client =
            LlmClient::new(Some("test-key".to_string()), DEFAULT_MODEL, server.url()).unwrap();
        let result: Result<Requirements, _> = client
            .call_json("prompt", "system", &requirements_schema(), 0.2)
            .await;
        assert!(matches!(result, Err(LlmError::Blocked(reason)) if reason == "SAFETY"));
    }

    #[test]
    fn test_empty_candidate_without_blocking_reason_is_empty_content() {
        let response: LlmResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "STOP" }]
        }))
        .unwrap();
        assert_eq!(response.finish_reason(), Some("STOP"));
        assert!(matches!(response.missing_text_error(), LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_call_json_schema_violation() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(gemini_body(r#"{"requirements": 42, "link": "x"}"#))
            .create_async()
            .await;

        let client =
            LlmClient::new(Some("test-key".to_string()), DEFAULT_MODEL, server.url()).unwrap();
        let result: Result<Requirements, _> = client
            .call_json("prompt", "system", &requirements_schema(), 0.2)
            .await;
        let err = result.unwrap_err();
        assert!(err.is_schema_failure());
    }
}
