use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::client::{CaptchaApi, CaptchaError};
use super::types::{CaptchaChallenge, TaskPoll};
use crate::metrics;

/// Drives a captcha task from submission to token.
///
/// After creating the task the solver sleeps one poll interval, checks the
/// overall deadline, then polls; the cycle repeats until the task is ready,
/// the service reports a failure, or the deadline elapses.
pub struct CaptchaSolver {
    api: Arc<dyn CaptchaApi>,
    timeout: Duration,
    poll_interval: Duration,
}

impl CaptchaSolver {
    pub fn new(api: Arc<dyn CaptchaApi>, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            api,
            timeout,
            poll_interval,
        }
    }

    /// Solve `challenge`, returning the response token.
    pub async fn solve(&self, challenge: &CaptchaChallenge) -> Result<String, CaptchaError> {
        let task_id = self.api.create_task(challenge).await?;
        info!(task_id = task_id, url = %challenge.website_url, "Waiting for captcha solution");

        let started = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(self.poll_interval).await;
            if started.elapsed() >= self.timeout {
                self.observe(&started, "timeout");
                return Err(CaptchaError::Timeout {
                    waited_ms: self.timeout.as_millis() as u64,
                });
            }

            match self.api.fetch_result(task_id).await {
                Ok(TaskPoll::Ready { token }) => {
                    info!(task_id = task_id, "Captcha solved");
                    self.observe(&started, "solved");
                    return Ok(token);
                }
                Ok(TaskPoll::Processing) => {
                    debug!(task_id = task_id, "Captcha task still processing");
                }
                Err(e) => {
                    self.observe(&started, "error");
                    return Err(e);
                }
            }
        }
    }

    fn observe(&self, started: &tokio::time::Instant, result: &str) {
        metrics::CAPTCHA_SOLVE_DURATION
            .with_label_values(&[result])
            .observe(started.elapsed().as_secs_f64());
    }
}
