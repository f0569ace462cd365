use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::client::{MailboxClient, OtpError};
use super::types::MailMessage;
use crate::config::MailboxConfig;

/// Mailbox provider client speaking the md5-addressed REST dialect:
/// messages for a mailbox live at `{base}/request/mail/id/{md5(address)}/`.
/// A 404 means the inbox is empty, not that the request failed.
pub struct HttpMailboxClient {
    client: Client,
    config: MailboxConfig,
}

impl HttpMailboxClient {
    pub fn new(config: MailboxConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    fn messages_url(&self, mailbox: &str) -> String {
        let hash = md5::compute(mailbox.trim());
        format!(
            "{}/request/mail/id/{:x}/",
            self.config.url.trim_end_matches('/'),
            hash
        )
    }

    fn map_send_error(err: reqwest::Error) -> OtpError {
        if err.is_timeout() {
            OtpError::Timeout(err.to_string())
        } else if err.is_connect() {
            OtpError::Connection(err.to_string())
        } else {
            OtpError::Api {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl MailboxClient for HttpMailboxClient {
    async fn fetch_messages(&self, mailbox: &str) -> Result<Vec<MailMessage>, OtpError> {
        let url = self.messages_url(mailbox);
        debug!(mailbox = %mailbox, url = %url, "Fetching mailbox messages");

        let response = self
            .client
            .get(&url)
            .header(&self.config.api_key_header, &self.config.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OtpError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let mut messages: Vec<MailMessage> = response
            .json()
            .await
            .map_err(|e| OtpError::InvalidResponse(e.to_string()))?;
        messages.sort_by(|a, b| {
            b.timestamp()
                .partial_cmp(&a.timestamp())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(messages)
    }
}
