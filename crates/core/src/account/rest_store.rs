//! REST account store implementation.
//!
//! Speaks a PostgREST-style row API: filters are query-string operators
//! (`column=eq.value`), updates are PATCH requests returning the mutated
//! rows. The store owns no schema; columns map 1:1 onto [`AccountRecord`]
//! serde names.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::account::{AccountRecord, AccountStatus, AccountStore, AccountStoreError, StatusUpdate};
use crate::config::DatastoreConfig;

/// Account store backed by a PostgREST-style HTTP API.
pub struct RestAccountStore {
    client: Client,
    config: DatastoreConfig,
}

/// Minimal row used for existence probes.
#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: String,
}

impl RestAccountStore {
    /// Create a new store from the datastore configuration.
    pub fn new(config: DatastoreConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    fn map_send_error(e: reqwest::Error) -> AccountStoreError {
        if e.is_timeout() {
            AccountStoreError::Timeout(e.to_string())
        } else if e.is_connect() {
            AccountStoreError::Connection(e.to_string())
        } else {
            AccountStoreError::Api {
                status: 0,
                message: e.to_string(),
            }
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AccountStoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AccountStoreError::Api {
            status,
            message: body.chars().take(200).collect::<String>(),
        })
    }

    async fn parse_rows<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, AccountStoreError> {
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AccountStoreError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AccountStore for RestAccountStore {
    async fn fetch_by_service_and_status(
        &self,
        service: &str,
        status: AccountStatus,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AccountRecord>, AccountStoreError> {
        let url = format!(
            "{}?service=eq.{}&status=eq.{}&order=created_at.asc&limit={}&offset={}",
            self.table_url(),
            urlencoding::encode(service),
            status.as_str(),
            limit,
            offset
        );
        debug!(service = service, status = %status, limit, offset, "Fetching account batch");

        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let records: Vec<AccountRecord> = Self::parse_rows(response).await?;

        debug!(count = records.len(), "Account batch fetched");
        Ok(records)
    }

    async fn update_status(
        &self,
        id: &str,
        status: AccountStatus,
        update: StatusUpdate,
    ) -> Result<AccountRecord, AccountStoreError> {
        let url = format!("{}?id=eq.{}", self.table_url(), urlencoding::encode(id));

        let mut body = serde_json::json!({
            "status": status.as_str(),
            "updated_at": Utc::now(),
        });
        if let Some(comment) = update.comment {
            body["comment"] = serde_json::Value::String(comment);
        }
        if let Some(checked_at) = update.checked_at {
            body["checked_at"] = serde_json::json!(checked_at);
        }

        debug!(id = id, status = %status, "Updating account status");

        let response = self
            .authed(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let mut rows: Vec<AccountRecord> = Self::parse_rows(response).await?;

        match rows.pop() {
            Some(record) => Ok(record),
            None => Err(AccountStoreError::NotFound(id.to_string())),
        }
    }

    async fn exists_by_mailbox(&self, mailbox: &str) -> Result<bool, AccountStoreError> {
        let url = format!(
            "{}?mailbox=eq.{}&select=id&limit=1",
            self.table_url(),
            urlencoding::encode(mailbox)
        );

        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let rows: Vec<IdRow> = Self::parse_rows(response).await?;

        Ok(!rows.is_empty())
    }

    async fn fetch_by_mailbox(
        &self,
        mailbox: &str,
    ) -> Result<Option<AccountRecord>, AccountStoreError> {
        let url = format!(
            "{}?mailbox=eq.{}&limit=1",
            self.table_url(),
            urlencoding::encode(mailbox)
        );

        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;
        let mut rows: Vec<AccountRecord> = Self::parse_rows(response).await?;

        Ok(rows.pop())
    }
}
