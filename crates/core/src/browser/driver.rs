use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Browser command failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Browser request timed out: {0}")]
    Timeout(String),

    #[error("Browser connection error: {0}")]
    Connection(String),

    #[error("Invalid browser response: {0}")]
    InvalidResponse(String),
}

/// Hands out live browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn new_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One driving session against a real page.
///
/// Element selectors are CSS. Lookups that find nothing make `exists`
/// return false; the interaction methods turn the same situation into
/// [`BrowserError::ElementNotFound`].
#[async_trait]
pub trait BrowserSession: Send + Sync + std::fmt::Debug {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError>;

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    async fn press_enter(&self, selector: &str) -> Result<(), BrowserError>;

    async fn page_source(&self) -> Result<String, BrowserError>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;

    /// Tear the session down. Callers run this on every exit path.
    async fn close(&self) -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::ElementNotFound {
            selector: "input[type='email']".to_string(),
        };
        assert_eq!(err.to_string(), "Element not found: input[type='email']");
    }
}
