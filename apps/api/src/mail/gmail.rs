//! Gmail API v1: lists job-related messages and fetches full message detail.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{MailError, MailProvider};
use crate::classifier::EmailSummary;

const GMAIL_MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    snippet: String,
    /// Epoch milliseconds, sent as a string.
    #[serde(default)]
    internal_date: Option<String>,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

/// Gmail client bound to one user's access token.
pub struct GmailClient {
    client: Client,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: String, timeout: Duration) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            access_token,
        })
    }
}

async fn check_status(response: Response) -> Result<Response, MailError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(MailError::Unauthorized);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(MailError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_message_ids(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<String>, MailError> {
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(GMAIL_MESSAGES_URL)
            .bearer_auth(&self.access_token)
            .query(&[("q", query), ("maxResults", max_results.as_str())])
            .send()
            .await?;

        let list: MessageListResponse = check_status(response).await?.json().await?;
        debug!("Gmail search returned {} messages", list.messages.len());
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, id: &str) -> Result<EmailSummary, MailError> {
        let response = self
            .client
            .get(format!("{GMAIL_MESSAGES_URL}/{id}"))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .send()
            .await?;

        let detail: MessageDetail = check_status(response).await?.json().await?;
        summarize(detail)
    }
}

fn summarize(detail: MessageDetail) -> Result<EmailSummary, MailError> {
    if detail.thread_id.is_empty() {
        return Err(MailError::Decode(format!(
            "message {} has no thread id",
            detail.id
        )));
    }

    let headers = detail
        .payload
        .as_ref()
        .map(|p| &p.headers[..])
        .unwrap_or(&[]);
    let header = |name: &str| -> Option<String> {
        headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    };

    Ok(EmailSummary {
        message_id: detail.id,
        thread_id: detail.thread_id,
        subject: header("Subject").unwrap_or_default(),
        from: header("From").unwrap_or_default(),
        // Gmail snippets arrive HTML-escaped.
        snippet: html_escape::decode_html_entities(&detail.snippet).into_owned(),
        date_header: header("Date"),
        internal_date_ms: detail.internal_date.and_then(|d| d.parse().ok()),
    })
}
