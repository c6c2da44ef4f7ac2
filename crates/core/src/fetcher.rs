//! Headless page fetching through a W3C WebDriver endpoint such as chromedriver.
//!
//! Every fetch opens its own session and deletes it before returning, whether
//! navigation succeeded or not. A session whose creation response cannot be
//! decoded has no id to delete; it is reported as an unexpected response and
//! left to the driver's own session timeout.

use crate::error::FetchError;
use crate::traits::PageFetcher;
use crate::PageContent;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// W3C key under which element references are returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub settle_delay: Duration,
    pub user_agent: String,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BrowserOptions {
    pub fn chrome_args(&self) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--ignore-certificate-errors".to_string(),
            format!("--user-agent={}", self.user_agent),
        ]
    }

    fn capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "acceptInsecureCerts": true,
                    "goog:chromeOptions": {
                        "args": self.chrome_args(),
                        "excludeSwitches": ["enable-automation"],
                        "useAutomationExtension": false
                    }
                }
            }
        })
    }
}

pub struct WebDriverFetcher {
    client: Client,
    options: BrowserOptions,
}

impl WebDriverFetcher {
    pub fn new(options: BrowserOptions) -> Self {
        let mut options = options;
        while options.webdriver_url.ends_with('/') {
            options.webdriver_url.pop();
        }
        Self {
            client: Client::new(),
            options,
        }
    }

    async fn command(
        &self,
        name: &'static str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, FetchError> {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.options.webdriver_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|_| FetchError::UnexpectedResponse {
                command: name,
                details: format!("{status}: {body}"),
            })?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(FetchError::WebDriver {
                command: name,
                error: value
                    .pointer("/error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
                message: value
                    .pointer("/message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        Ok(value)
    }

    async fn open_session(&self) -> Result<String, FetchError> {
        let value = self
            .command(
                "new session",
                Method::POST,
                "/session",
                Some(self.options.capabilities()),
            )
            .await?;

        value
            .pointer("/sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| FetchError::UnexpectedResponse {
                command: "new session",
                details: value.to_string(),
            })
    }

    async fn close_session(&self, session_id: &str) -> Result<(), FetchError> {
        self.command(
            "delete session",
            Method::DELETE,
            &format!("/session/{session_id}"),
            None,
        )
        .await
        .map(|_| ())
    }

    async fn read_body_text(&self, session_id: &str, url: &str) -> Result<String, FetchError> {
        self.command(
            "navigate",
            Method::POST,
            &format!("/session/{session_id}/url"),
            Some(json!({ "url": url })),
        )
        .await?;

        tokio::time::sleep(self.options.settle_delay).await;

        let element = self
            .command(
                "find element",
                Method::POST,
                &format!("/session/{session_id}/element"),
                Some(json!({ "using": "tag name", "value": "body" })),
            )
            .await?;
        let element_id = element
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::UnexpectedResponse {
                command: "find element",
                details: element.to_string(),
            })?;

        let text = self
            .command(
                "element text",
                Method::GET,
                &format!("/session/{session_id}/element/{element_id}/text"),
                None,
            )
            .await?;

        Ok(text.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let session_id = self.open_session().await?;
        debug!(%session_id, %url, "browser session opened");

        let text = self.read_body_text(&session_id, url).await;

        if let Err(error) = self.close_session(&session_id).await {
            warn!(%session_id, %error, "failed to delete browser session");
        }

        text.map(PageContent::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> WebDriverFetcher {
        WebDriverFetcher::new(BrowserOptions {
            webdriver_url: format!("{}/", server.uri()),
            settle_delay: Duration::ZERO,
            user_agent: "test-agent".to_string(),
        })
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_partial_json(json!({
                "capabilities": {"alwaysMatch": {"acceptInsecureCerts": true}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {"sessionId": "s-1", "capabilities": {}}
            })))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/session/s-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn chrome_args_hide_automation_and_set_agent() {
        let args = BrowserOptions::default().chrome_args();
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--ignore-certificate-errors".to_string()));
        assert!(args.contains(&format!("--user-agent={DEFAULT_USER_AGENT}")));
    }

    #[tokio::test]
    async fn fetch_returns_body_text_and_deletes_session() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/s-1/url"))
            .and(body_partial_json(json!({"url": "https://www.reuters.com/x"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/element"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {"element-6066-11e4-a52e-4f735466cecf": "e-1"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s-1/element/e-1/text"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"value": "Markets rallied."})),
            )
            .mount(&server)
            .await;

        let content = fetcher(&server)
            .fetch("https://www.reuters.com/x")
            .await
            .expect("fetch should succeed");

        assert_eq!(content.as_str(), "Markets rallied.");
    }

    #[tokio::test]
    async fn navigation_failure_still_deletes_session() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/s-1/url"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "value": {"error": "unknown error", "message": "net::ERR_NAME_NOT_RESOLVED"}
            })))
            .mount(&server)
            .await;

        let result = fetcher(&server).fetch("https://missing.invalid").await;

        match result {
            Err(FetchError::WebDriver { command, message, .. }) => {
                assert_eq!(command, "navigate");
                assert!(message.contains("ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("expected webdriver error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_body_element_is_an_error() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/s-1/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s-1/element"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": {"error": "no such element", "message": "body"}
            })))
            .mount(&server)
            .await;

        let result = fetcher(&server).fetch("https://www.reuters.com/x").await;
        assert!(matches!(result, Err(FetchError::WebDriver { command: "find element", .. })));
    }

    #[tokio::test]
    async fn undecodable_session_response_is_reported_without_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .expect(0)
            .mount(&server)
            .await;

        let result = fetcher(&server).fetch("https://www.reuters.com/x").await;

        match result {
            Err(FetchError::UnexpectedResponse { command, details }) => {
                assert_eq!(command, "new session");
                assert!(details.contains("proxy error"));
            }
            other => panic!("expected unexpected response, got {other:?}"),
        }
    }
}
