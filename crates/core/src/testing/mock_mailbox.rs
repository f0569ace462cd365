//! Scriptable mailbox client for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::mailbox::{MailMessage, MailboxClient, OtpError};

/// Mock implementation of the [`MailboxClient`] trait.
///
/// Each `fetch_messages` call pops the next scripted response; once the
/// script is spent the inbox reads as empty.
pub struct MockMailboxClient {
    responses: Mutex<VecDeque<Result<Vec<MailMessage>, OtpError>>>,
    calls: AtomicU32,
}

impl Default for MockMailboxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailboxClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Script the next fetch to return these messages.
    pub fn push_messages(&self, messages: Vec<MailMessage>) {
        self.responses.lock().unwrap().push_back(Ok(messages));
    }

    /// Script the next fetch to fail.
    pub fn push_error(&self, error: OtpError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Number of fetches performed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailboxClient for MockMailboxClient {
    async fn fetch_messages(&self, _mailbox: &str) -> Result<Vec<MailMessage>, OtpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
