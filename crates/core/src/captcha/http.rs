use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{CaptchaApi, CaptchaError};
use super::types::{CaptchaChallenge, TaskPoll};
use crate::config::CaptchaConfig;

const TASK_TYPE: &str = "ReCaptchaV2TaskProxyless";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    client_key: &'a str,
    task: TaskPayload<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskPayload<'a> {
    #[serde(rename = "type")]
    task_type: &'static str,
    #[serde(rename = "websiteURL")]
    website_url: &'a str,
    website_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultRequest<'a> {
    client_key: &'a str,
    task_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    task_id: Option<i64>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    solution: Option<TaskSolution>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct TaskSolution {
    #[serde(rename = "gRecaptchaResponse", default)]
    g_recaptcha_response: Option<String>,
}

fn service_error(error_id: i64, code: Option<String>, description: Option<String>) -> CaptchaError {
    let message = description
        .or(code)
        .unwrap_or_else(|| format!("errorId {error_id}"));
    CaptchaError::Service(message)
}

/// Client for a `createTask`/`getTaskResult` captcha-solving API.
pub struct HttpCaptchaClient {
    client: Client,
    config: CaptchaConfig,
}

impl HttpCaptchaClient {
    pub fn new(config: CaptchaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn map_send_error(err: reqwest::Error) -> CaptchaError {
        if err.is_timeout() || err.is_connect() {
            CaptchaError::Connection(err.to_string())
        } else {
            CaptchaError::Api {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            }
        }
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, CaptchaError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptchaError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CaptchaError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CaptchaApi for HttpCaptchaClient {
    async fn create_task(&self, challenge: &CaptchaChallenge) -> Result<i64, CaptchaError> {
        let request = CreateTaskRequest {
            client_key: &self.config.client_key,
            task: TaskPayload {
                task_type: TASK_TYPE,
                website_url: &challenge.website_url,
                website_key: &challenge.website_key,
                user_agent: challenge.user_agent.as_deref(),
            },
        };

        let response: CreateTaskResponse = self.post_json("createTask", &request).await?;
        if response.error_id != 0 {
            return Err(service_error(
                response.error_id,
                response.error_code,
                response.error_description,
            ));
        }
        let task_id = response.task_id.ok_or_else(|| {
            CaptchaError::InvalidResponse("createTask response carried no taskId".to_string())
        })?;
        debug!(task_id = task_id, url = %challenge.website_url, "Captcha task created");
        Ok(task_id)
    }

    async fn fetch_result(&self, task_id: i64) -> Result<TaskPoll, CaptchaError> {
        let request = TaskResultRequest {
            client_key: &self.config.client_key,
            task_id,
        };

        let response: TaskResultResponse = self.post_json("getTaskResult", &request).await?;
        if response.error_id != 0 {
            return Err(service_error(
                response.error_id,
                response.error_code,
                response.error_description,
            ));
        }

        match response.status.as_deref() {
            Some("ready") => {
                let token = response
                    .solution
                    .and_then(|s| s.g_recaptcha_response)
                    .ok_or_else(|| {
                        CaptchaError::InvalidResponse(
                            "ready task carried no gRecaptchaResponse".to_string(),
                        )
                    })?;
                Ok(TaskPoll::Ready { token })
            }
            Some("processing") => Ok(TaskPoll::Processing),
            other => Err(CaptchaError::Service(format!(
                "unexpected task status: {}",
                other.unwrap_or("<missing>")
            ))),
        }
    }
}
