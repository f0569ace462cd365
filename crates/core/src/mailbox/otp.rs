use std::sync::Arc;
use std::time::Duration;

use regex_lite::Regex;
use tracing::{debug, info, warn};

use super::client::{MailboxClient, OtpError};
use crate::metrics;

const CODE_PATTERN: &str = r"\b\d{6}\b";

/// Polls a mailbox for the 6-digit verification code a service sends
/// after registration.
///
/// Each attempt is a fresh inbox query. Transport and service errors are
/// logged and consume the attempt like an empty inbox does; the retriever
/// only fails once every attempt is spent. No delay runs after the last
/// attempt.
pub struct OtpRetriever {
    client: Arc<dyn MailboxClient>,
    max_attempts: u32,
    retry_delay: Duration,
    code_pattern: Regex,
}

impl OtpRetriever {
    pub fn new(client: Arc<dyn MailboxClient>, max_attempts: u32, retry_delay: Duration) -> Self {
        let code_pattern =
            Regex::new(CODE_PATTERN).expect("Failed to compile verification-code pattern");
        Self {
            client,
            max_attempts,
            retry_delay,
            code_pattern,
        }
    }

    /// Retrieve the verification code for `mailbox`, scanning message
    /// bodies newest-first. The first 6-digit token wins.
    pub async fn retrieve_code(&self, mailbox: &str) -> Result<String, OtpError> {
        for attempt in 1..=self.max_attempts {
            debug!(
                mailbox = %mailbox,
                attempt = attempt,
                max_attempts = self.max_attempts,
                "Checking mailbox for verification code"
            );

            match self.client.fetch_messages(mailbox).await {
                Ok(messages) => {
                    for message in &messages {
                        if let Some(found) = self.code_pattern.find(&message.mail_text_only) {
                            info!(
                                mailbox = %mailbox,
                                attempt = attempt,
                                "Verification code found"
                            );
                            metrics::OTP_ATTEMPTS
                                .with_label_values(&["found"])
                                .inc_by(attempt as u64);
                            return Ok(found.as_str().to_string());
                        }
                    }
                    debug!(
                        mailbox = %mailbox,
                        messages = messages.len(),
                        "No verification code in inbox yet"
                    );
                }
                Err(e) => {
                    warn!(mailbox = %mailbox, attempt = attempt, error = %e, "Mailbox query failed");
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        metrics::OTP_ATTEMPTS
            .with_label_values(&["not_found"])
            .inc_by(self.max_attempts as u64);
        Err(OtpError::NotFound {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::MailMessage;
    use crate::testing::MockMailboxClient;

    fn message(text: &str) -> MailMessage {
        MailMessage {
            mail_text_only: text.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_found_on_first_attempt_without_delay() {
        let client = Arc::new(MockMailboxClient::new());
        client.push_messages(vec![message("Your verification code is 482913.")]);

        let retriever = OtpRetriever::new(client.clone(), 3, Duration::from_millis(6000));
        let started = tokio::time::Instant::now();
        let code = retriever.retrieve_code("a@demo.test").await.unwrap();

        assert_eq!(code, "482913");
        assert_eq!(client.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_found_on_second_attempt_after_one_delay() {
        let client = Arc::new(MockMailboxClient::new());
        client.push_messages(vec![]);
        client.push_messages(vec![message("code: 111222 enjoy")]);

        let retriever = OtpRetriever::new(client.clone(), 3, Duration::from_millis(6000));
        let started = tokio::time::Instant::now();
        let code = retriever.retrieve_code("a@demo.test").await.unwrap();

        assert_eq!(code, "111222");
        assert_eq!(client.calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_skip_final_delay() {
        let client = Arc::new(MockMailboxClient::new());

        let retriever = OtpRetriever::new(client.clone(), 3, Duration::from_millis(6000));
        let started = tokio::time::Instant::now();
        let err = retriever.retrieve_code("a@demo.test").await.unwrap_err();

        match err {
            OtpError::NotFound { attempts } => assert_eq!(attempts, 3),
            other => panic!("Expected NotFound, got: {other:?}"),
        }
        assert_eq!(client.calls(), 3);
        // two delays between three attempts, none after the last
        assert_eq!(started.elapsed(), Duration::from_millis(12000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_consume_attempts() {
        let client = Arc::new(MockMailboxClient::new());
        for _ in 0..3 {
            client.push_error(OtpError::Connection("refused".to_string()));
        }

        let retriever = OtpRetriever::new(client.clone(), 3, Duration::from_millis(100));
        let err = retriever.retrieve_code("a@demo.test").await.unwrap_err();

        assert!(matches!(err, OtpError::NotFound { attempts: 3 }));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_six_digit_boundary_and_first_match_wins() {
        let client = Arc::new(MockMailboxClient::new());
        client.push_messages(vec![
            message("your order 1234567 has shipped"),
            message("verification code 335577, valid 10 minutes"),
            message("older code 999999"),
        ]);

        let retriever = OtpRetriever::new(client, 1, Duration::from_millis(100));
        let code = retriever.retrieve_code("a@demo.test").await.unwrap();
        assert_eq!(code, "335577");
    }
}
