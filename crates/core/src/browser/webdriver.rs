use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::driver::{BrowserDriver, BrowserError, BrowserSession};
use crate::config::BrowserConfig;

/// W3C element identifier key in element-reference objects.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// WebDriver key code for Enter.
const ENTER_KEY: &str = "\u{E007}";

fn map_send_error(err: reqwest::Error) -> BrowserError {
    if err.is_timeout() {
        BrowserError::Timeout(err.to_string())
    } else if err.is_connect() {
        BrowserError::Connection(err.to_string())
    } else {
        BrowserError::Api {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    }
}

/// Pull the human-readable message out of a WebDriver error envelope,
/// falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("value")?
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Browser driver speaking the W3C WebDriver REST protocol, compatible
/// with chromedriver and geckodriver endpoints.
pub struct WebDriverBrowser {
    client: Client,
    config: BrowserConfig,
}

impl WebDriverBrowser {
    pub fn new(config: BrowserConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    fn base_url(&self) -> String {
        self.config.url.trim_end_matches('/').to_string()
    }

    fn capabilities(&self) -> Value {
        let mut always_match = json!({ "browserName": self.config.browser_name });
        if self.config.headless && self.config.browser_name == "chrome" {
            always_match["goog:chromeOptions"] = json!({
                "args": ["--headless=new", "--window-size=1920,1080"]
            });
        }
        json!({ "capabilities": { "alwaysMatch": always_match, "firstMatch": [{}] } })
    }
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    async fn new_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let base_url = self.base_url();
        let response = self
            .client
            .post(format!("{base_url}/session"))
            .json(&self.capabilities())
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrowserError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| BrowserError::InvalidResponse(e.to_string()))?;
        let session_id = envelope
            .get("value")
            .and_then(|v| v.get("sessionId"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BrowserError::InvalidResponse("session response carried no sessionId".to_string())
            })?
            .to_string();

        info!(session_id = %session_id, browser = %self.config.browser_name, "Browser session created");
        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            base_url,
            session_id,
        }))
    }
}

/// One live WebDriver session.
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrowserError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| BrowserError::InvalidResponse(e.to_string()))?;
        Ok(envelope.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Find every element matching `selector`. The plural endpoint
    /// returns an empty list instead of an error when nothing matches.
    async fn find_elements(&self, selector: &str) -> Result<Vec<String>, BrowserError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        let entries = value.as_array().ok_or_else(|| {
            BrowserError::InvalidResponse("element list response was not an array".to_string())
        })?;

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let object = entry.as_object().ok_or_else(|| {
                BrowserError::InvalidResponse("element reference was not an object".to_string())
            })?;
            let id = object
                .get(ELEMENT_KEY)
                .or_else(|| object.values().next())
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    BrowserError::InvalidResponse(
                        "element reference carried no element id".to_string(),
                    )
                })?;
            ids.push(id.to_string());
        }
        Ok(ids)
    }

    async fn first_element(&self, selector: &str) -> Result<String, BrowserError> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn send_keys(&self, element_id: &str, text: &str) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &format!("/element/{element_id}/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        debug!(session_id = %self.session_id, url = %url, "Navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| BrowserError::InvalidResponse("url response was not a string".to_string()))
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(!self.find_elements(selector).await?.is_empty())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element_id = self.first_element(selector).await?;
        self.send_keys(&element_id, text).await
    }

    async fn press_enter(&self, selector: &str) -> Result<(), BrowserError> {
        let element_id = self.first_element(selector).await?;
        self.send_keys(&element_id, ENTER_KEY).await
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/source", None).await?;
        value.as_str().map(String::from).ok_or_else(|| {
            BrowserError::InvalidResponse("source response was not a string".to_string())
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value.as_str().ok_or_else(|| {
            BrowserError::InvalidResponse("screenshot response was not a string".to_string())
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| BrowserError::InvalidResponse(format!("screenshot decode failed: {e}")))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        debug!(session_id = %self.session_id, "Closing browser session");
        self.command(Method::DELETE, "", None).await?;
        Ok(())
    }
}
