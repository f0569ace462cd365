use serde::Serialize;

/// A reCAPTCHA v2 challenge to hand to the solving service.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CaptchaChallenge {
    /// Full URL of the page presenting the challenge.
    pub website_url: String,
    /// The site key embedded in the page.
    pub website_key: String,
    /// Browser user agent to solve under, when the target checks it.
    pub user_agent: Option<String>,
}

impl CaptchaChallenge {
    pub fn new(website_url: impl Into<String>, website_key: impl Into<String>) -> Self {
        Self {
            website_url: website_url.into(),
            website_key: website_key.into(),
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// One poll of a submitted solving task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPoll {
    /// Solved; carries the response token to inject into the page.
    Ready { token: String },
    /// Still being worked on.
    Processing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_builder() {
        let challenge = CaptchaChallenge::new("https://demo.test/signup", "site-key-1")
            .with_user_agent("Mozilla/5.0");
        assert_eq!(challenge.website_url, "https://demo.test/signup");
        assert_eq!(challenge.website_key, "site-key-1");
        assert_eq!(challenge.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
