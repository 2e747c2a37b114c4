use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::config::StoreConfig;
use crate::errors::{AppError, AppResult};
use crate::shared::retry::RetryConfig;
use super::types::NotificationRecord;
use super::NotificationStore;

#[derive(Debug, Deserialize)]
struct CountBody {
    count: usize,
}

/// REST client for the clinic backend's notification routes
///
/// The backend authenticates the caller from the bearer token; the user id
/// is sent as a query parameter so the backend can check it against the
/// token's subject.
#[derive(Clone)]
pub struct HttpNotificationStore {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    retry_config: RetryConfig,
}

impl HttpNotificationStore {
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        let raw_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::config("store.base_url is not set"))?;
        let base_url = Url::parse(raw_url)?;
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(30));

        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("quick-clinic-push/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::store_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
            retry_config: RetryConfig::exponential(config.retry_attempts, 250),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Build `<base>/api/notifications/<segments...>`
    pub fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::config("store.base_url cannot be a base URL"))?;
            path.pop_if_empty().push("api").push("notifications");
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, user_id: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url).query(&[("userId", user_id)]);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send with retry on retryable failures
    async fn send(&self, method: Method, url: Url, user_id: &str) -> AppResult<Response> {
        let mut attempt = 0;
        loop {
            match self.send_once(method.clone(), url.clone(), user_id).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry_config.max_attempts => {
                    let delay = self.retry_config.calculate_delay(attempt);
                    attempt += 1;
                    warn!(
                        "Notification store request {} {} failed (attempt {}/{}), retrying in {:?}: {}",
                        method, url, attempt, self.retry_config.max_attempts, delay, e
                    );
                    sleep(delay).await;
                }
                Err(e) if e.is_retryable() && attempt > 0 => {
                    warn!("Notification store request {} {} gave up: {}", method, url, e);
                    return Err(AppError::StoreRetryExhausted { attempts: attempt + 1 });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, method: Method, url: Url, user_id: &str) -> AppResult<Response> {
        debug!("Notification store request: {} {}", method, url);
        let response = self.request(method, url, user_id).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            let id = response.url().path().to_string();
            return Err(AppError::NotificationNotFound { id });
        }
        let reason = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::HttpStatus {
            status_code: status.as_u16(),
            reason,
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::store_with_source("Unexpected response body from notification store", e))
    }
}

#[async_trait]
impl NotificationStore for HttpNotificationStore {
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<NotificationRecord>> {
        let url = self.endpoint(&[])?;
        let response = self.send(Method::GET, url, user_id).await?;
        Self::json(response).await
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> AppResult<NotificationRecord> {
        let url = self.endpoint(&[id, "read"])?;
        let response = self.send(Method::PATCH, url, user_id).await?;
        Self::json(response).await
    }

    async fn mark_all_read(&self, user_id: &str) -> AppResult<usize> {
        let url = self.endpoint(&["read-all"])?;
        let response = self.send(Method::PATCH, url, user_id).await?;
        Ok(Self::json::<CountBody>(response).await?.count)
    }

    async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let url = self.endpoint(&[id])?;
        self.send(Method::DELETE, url, user_id).await?;
        Ok(())
    }

    async fn unread_count(&self, user_id: &str) -> AppResult<usize> {
        let url = self.endpoint(&["unread-count"])?;
        let response = self.send(Method::GET, url, user_id).await?;
        Ok(Self::json::<CountBody>(response).await?.count)
    }
}
