use crate::config::watch_config::EmailConfig;
use crate::core::{Mailbox, Notification, Notifier};
use crate::utils::error::{Result, WatchError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SEND_PATH: &str = "/v3/smtp/email";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: &'a Mailbox,
    to: [&'a Mailbox; 1],
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    message_id: Option<String>,
}

/// Transactional email through Brevo's SMTP API.
pub struct BrevoNotifier {
    config: EmailConfig,
    client: Client,
}

impl BrevoNotifier {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WatchError::delivery(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Notifier for BrevoNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let sender = self.config.sender();
        let payload = SendEmailRequest {
            sender: &sender,
            to: [&notification.recipient],
            subject: &notification.subject,
            html_content: &notification.html_body,
            text_content: &notification.text_body,
        };

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), SEND_PATH);
        tracing::debug!("POST {} to {}", url, notification.recipient.email);

        let response = self
            .client
            .post(&url)
            .header("api-key", self.config.api_key.as_str())
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WatchError::delivery("email API timed out")
                } else {
                    WatchError::delivery(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string());
        if !status.is_success() {
            return Err(WatchError::delivery(rejection_message(status, &body)));
        }

        match body
            .ok()
            .and_then(|b| serde_json::from_str::<SendEmailResponse>(&b).ok())
        {
            Some(SendEmailResponse {
                message_id: Some(id),
            }) => tracing::info!("Email accepted, messageId={}", id),
            _ => tracing::info!("Email accepted ({})", status),
        }
        Ok(())
    }
}

fn rejection_message(status: StatusCode, body: &std::result::Result<String, String>) -> String {
    match body {
        Ok(body) => format!("email API returned {}: {}", status, body),
        Err(e) => format!(
            "email API returned {} and the response body could not be read: {}",
            status, e
        ),
    }
}
