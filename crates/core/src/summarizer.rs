use crate::error::SummarizeError;
use crate::traits::Summarizer;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_TOKENS: u32 = 3000;

const SYSTEM_INSTRUCTION: &str = "Extract the most relevant, detailed, and structured information from the given text. Ensure the extracted content is at least 2 pages long.";

pub fn build_user_prompt(keyword: &str, text: &str) -> String {
    format!(
        "Extract all the **important details** related to '{keyword}' from the following text.

- Summarize key points **clearly**.
- Use **headings and subheadings** for structure.
- Ensure the **content is at least 1-2 pages** long.
- Expand on important **facts, statistics, and examples**.
- If relevant, provide **historical context, latest trends, and expert opinions**.

TEXT:
{text}"
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiSummarizer {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url,
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, keyword: &str, text: &str) -> Result<String, SummarizeError> {
        let prompt = build_user_prompt(keyword, text);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SummarizeError::Api { status, body: text });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(SummarizeError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn prompt_embeds_keyword_and_text() {
        let prompt = build_user_prompt("Inflation", "CPI rose 3%.");
        assert!(prompt.contains("related to 'Inflation'"));
        assert!(prompt.ends_with("TEXT:\nCPI rose 3%."));
    }

    #[test]
    fn debug_output_redacts_key() {
        let summarizer = OpenAiSummarizer::new("sk-secret", "https://api.test/v1/", "gpt-4", 10);
        let rendered = format!("{summarizer:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("https://api.test/v1\""));
    }

    #[tokio::test]
    async fn summary_is_trimmed_completion_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "max_tokens": 3000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "\n# Inflation\nDetails.\n  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new(
            "sk-test",
            format!("{}/v1", server.uri()),
            DEFAULT_MODEL,
            DEFAULT_MAX_TOKENS,
        );
        let summary = summarizer
            .summarize("Inflation", "CPI rose 3%.")
            .await
            .expect("summarize should succeed");

        assert_eq!(summary, "# Inflation\nDetails.");
    }

    #[tokio::test]
    async fn api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new("sk-test", server.uri(), DEFAULT_MODEL, 100);
        let result = summarizer.summarize("Inflation", "text").await;

        match result {
            Err(SummarizeError::Api { status, body }) => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new("sk-test", server.uri(), DEFAULT_MODEL, 100);
        let result = summarizer.summarize("Inflation", "text").await;
        assert!(matches!(result, Err(SummarizeError::EmptyResponse)));
    }
}
