use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::OtpConfig;
use crate::errors::{AppError, AppResult, ErrorContextExt};

/// Uniform result of an OTP operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OtpResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Client for the SMS provider's send and verify endpoints
#[derive(Clone)]
pub struct OtpClient {
    client: Client,
    base_url: Url,
}

impl OtpClient {
    pub fn new(config: &OtpConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(10));

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| AppError::InvalidConfigValue {
                key: "otp.api_key".to_string(),
                value: "<redacted>".to_string(),
            })?;
            headers.insert("X-Api-Key", value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .with_context("Failed to create OTP HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Ask the provider to text a one-time code to `phone`
    pub async fn send_otp(&self, phone: &str) -> OtpResponse {
        let phone = match normalize_phone(phone) {
            Ok(phone) => phone,
            Err(e) => return OtpResponse::failure(e.to_string()),
        };

        match self.post("send", json!({ "phone": phone })).await {
            Ok(response) => response.or_message("OTP sent successfully"),
            Err(e) => {
                warn!("OTP send failed: {}", e);
                OtpResponse::failure(format!("Failed to send OTP: {}", e))
            }
        }
    }

    /// Check `code` against the provider for `phone`
    pub async fn verify_otp(&self, phone: &str, code: &str) -> OtpResponse {
        let phone = match normalize_phone(phone) {
            Ok(phone) => phone,
            Err(e) => return OtpResponse::failure(e.to_string()),
        };
        if let Err(e) = validate_code(code) {
            return OtpResponse::failure(e.to_string());
        }

        match self.post("verify", json!({ "phone": phone, "otp": code })).await {
            Ok(response) => response.or_message("OTP verified successfully"),
            Err(e) => {
                warn!("OTP verification failed: {}", e);
                OtpResponse::failure(format!("Failed to verify OTP: {}", e))
            }
        }
    }

    fn endpoint(&self, operation: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config("otp.base_url cannot be a base URL"))?
            .pop_if_empty()
            .push("otp")
            .push(operation);
        Ok(url)
    }

    async fn post(&self, operation: &str, body: Value) -> AppResult<ProviderReply> {
        let url = self.endpoint(operation)?;
        debug!("OTP provider request: POST {}", url);

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let reason = provider_message(&body).unwrap_or_else(|| text.clone());
            return Err(AppError::HttpStatus {
                status_code: status.as_u16(),
                reason,
            });
        }

        Ok(ProviderReply { body })
    }
}

/// Successful HTTP exchange with the provider
struct ProviderReply {
    body: Value,
}

impl ProviderReply {
    /// Providers may report logical failure with a 2xx status
    fn or_message(self, default_message: &str) -> OtpResponse {
        let explicit_failure = self.body.get("success").and_then(Value::as_bool) == Some(false)
            || ["status", "Status"]
                .iter()
                .filter_map(|key| self.body.get(*key).and_then(Value::as_str))
                .any(|status| status.eq_ignore_ascii_case("error"));
        let message = provider_message(&self.body);

        if explicit_failure {
            return OtpResponse::failure(message.unwrap_or_else(|| "OTP provider rejected the request".to_string()));
        }
        let data = if self.body.is_null() { None } else { Some(self.body) };
        OtpResponse::ok(message.unwrap_or_else(|| default_message.to_string()), data)
    }
}

fn provider_message(body: &Value) -> Option<String> {
    ["message", "Details", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Strip spaces, dashes and parentheses; require 10 to 15 digits with an optional leading `+`
pub fn normalize_phone(phone: &str) -> AppResult<String> {
    let cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidPhoneNumber {
            phone: phone.to_string(),
        });
    }
    Ok(cleaned)
}

pub fn validate_code(code: &str) -> AppResult<()> {
    if !(4..=8).contains(&code.len()) {
        return Err(AppError::InvalidOtpCode {
            reason: "code must be 4 to 8 digits".to_string(),
        });
    }
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidOtpCode {
            reason: "code must contain digits only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> OtpClient {
        OtpClient::new(&OtpConfig {
            base_url: server.url(),
            api_key: Some("provider-key".to_string()),
            timeout_secs: Some(2),
        })
        .unwrap()
    }

    fn unreachable_client() -> OtpClient {
        OtpClient::new(&OtpConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("key".to_string()),
            timeout_secs: Some(2),
        })
        .unwrap()
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone("+91 98765-43210").unwrap(), "+919876543210");
        assert_eq!(normalize_phone("(555) 123-4567").unwrap(), "5551234567");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("+91 98765 4321a").is_err());
        assert!(normalize_phone("").is_err());
    }

    #[test]
    fn test_code_validation() {
        assert!(validate_code("123456").is_ok());
        assert!(validate_code("123").is_err());
        assert!(validate_code("12ab").is_err());
    }

    #[test]
    fn test_endpoint() {
        let client = unreachable_client();
        assert_eq!(client.endpoint("send").unwrap().as_str(), "http://127.0.0.1:9/otp/send");
    }

    #[test]
    fn test_provider_logical_failure() {
        let reply = ProviderReply {
            body: json!({"success": false, "message": "Invalid OTP"}),
        };
        assert_eq!(reply.or_message("ok"), OtpResponse::failure("Invalid OTP"));

        let reply = ProviderReply {
            body: json!({"Status": "Success", "Details": "session-1"}),
        };
        let response = reply.or_message("OTP sent successfully");
        assert!(response.success);
        assert_eq!(response.message, "session-1");
        assert!(response.data.is_some());
    }

    #[test]
    fn test_capitalised_error_status_is_failure() {
        let reply = ProviderReply {
            body: json!({"Status": "Error", "Details": "OTP Mismatch"}),
        };
        assert_eq!(reply.or_message("OTP verified successfully"), OtpResponse::failure("OTP Mismatch"));

        let reply = ProviderReply {
            body: json!({"status": "ERROR"}),
        };
        assert!(!reply.or_message("ok").success);
    }

    #[tokio::test]
    async fn test_send_posts_phone_with_api_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/otp/send")
            .match_header("x-api-key", "provider-key")
            .match_body(Matcher::Json(json!({"phone": "+919876543210"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Status": "Success", "Details": "session-1"}"#)
            .create_async()
            .await;

        let response = client_for(&server).send_otp("+91 98765-43210").await;

        assert!(response.success);
        assert_eq!(response.message, "session-1");
        assert_eq!(response.data, Some(json!({"Status": "Success", "Details": "session-1"})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_success_uses_default_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/otp/verify")
            .match_body(Matcher::Json(json!({"phone": "+919876543210", "otp": "123456"})))
            .with_status(200)
            .with_body(r#"{"verified": true}"#)
            .create_async()
            .await;

        let response = client_for(&server).verify_otp("+919876543210", "123456").await;

        assert!(response.success);
        assert_eq!(response.message, "OTP verified successfully");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_mismatch_with_2xx_is_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/otp/verify")
            .with_status(200)
            .with_body(r#"{"Status": "Error", "Details": "OTP Mismatch"}"#)
            .create_async()
            .await;

        let response = client_for(&server).verify_otp("+919876543210", "654321").await;

        assert_eq!(response, OtpResponse::failure("OTP Mismatch"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_provider_error_status_is_folded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/otp/send")
            .with_status(500)
            .with_body(r#"{"message": "SMS gateway down"}"#)
            .create_async()
            .await;

        let response = client_for(&server).send_otp("+919876543210").await;

        assert!(!response.success);
        assert!(response.message.contains("SMS gateway down"), "{}", response.message);
        assert!(response.data.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_phone_never_reaches_network() {
        let response = unreachable_client().send_otp("123").await;
        assert!(!response.success);
        assert!(response.message.contains("Invalid phone number"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_folded() {
        let client = unreachable_client();

        let sent = client.send_otp("+919876543210").await;
        assert!(!sent.success);
        assert!(sent.message.starts_with("Failed to send OTP"));

        let verified = client.verify_otp("+919876543210", "123456").await;
        assert!(!verified.success);
        assert!(verified.data.is_none());
    }

    #[tokio::test]
    async fn test_invalid_code_is_folded() {
        let response = unreachable_client().verify_otp("+919876543210", "12").await;
        assert_eq!(response, OtpResponse::failure("Invalid OTP code: code must be 4 to 8 digits"));
    }
}
