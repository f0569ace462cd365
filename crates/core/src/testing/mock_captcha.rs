//! Scriptable captcha API for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::captcha::{CaptchaApi, CaptchaChallenge, CaptchaError, TaskPoll};

/// Mock implementation of the [`CaptchaApi`] trait.
///
/// Task creation succeeds with sequential ids unless a failure is
/// scripted. Polls pop scripted results; once the script is spent every
/// poll reports `Processing`, which is what a timeout test wants.
pub struct MockCaptchaApi {
    create_failure: Mutex<Option<CaptchaError>>,
    polls: Mutex<VecDeque<Result<TaskPoll, CaptchaError>>>,
    create_calls: AtomicU32,
    poll_calls: AtomicU32,
}

impl Default for MockCaptchaApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCaptchaApi {
    pub fn new() -> Self {
        Self {
            create_failure: Mutex::new(None),
            polls: Mutex::new(VecDeque::new()),
            create_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
        }
    }

    /// Fail the next `create_task` call.
    pub fn fail_create(&self, error: CaptchaError) {
        *self.create_failure.lock().unwrap() = Some(error);
    }

    /// Script the next poll result.
    pub fn push_poll(&self, poll: Result<TaskPoll, CaptchaError>) {
        self.polls.lock().unwrap().push_back(poll);
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaApi for MockCaptchaApi {
    async fn create_task(&self, _challenge: &CaptchaChallenge) -> Result<i64, CaptchaError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.create_failure.lock().unwrap().take() {
            return Err(err);
        }
        Ok(i64::from(call) + 1)
    }

    async fn fetch_result(&self, _task_id: i64) -> Result<TaskPoll, CaptchaError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(TaskPoll::Processing))
    }
}
