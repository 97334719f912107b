//! TinyWebDB HTTP backend
//!
//! Every call is a form POST to a single endpoint:
//!
//! | action   | fields                                  |
//! |----------|-----------------------------------------|
//! | `update` | `tag`, `value` (JSON text)              |
//! | `search` | `no`, `count`, `tag` (filter), `type`   |
//! | `delete` | `tag`                                   |
//!
//! `user` and `secret` accompany every request. A search answers with a JSON
//! object mapping tag to value.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{MirrorError, MirrorRange, MirrorStore};
use crate::config::MirrorConfig;

pub struct TinyWebDbMirror {
    client: reqwest::Client,
    api_url: String,
    user: String,
    secret: String,
    timeout_ms: u64,
}

impl TinyWebDbMirror {
    pub fn new(config: &MirrorConfig) -> Result<Self, MirrorError> {
        info!(api_url = %config.api_url, "Initializing TinyWebDB mirror");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                MirrorError::SyncFailure(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            user: config.user.clone(),
            secret: config.secret.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    async fn call(&self, action: &str, fields: &[(&str, &str)]) -> Result<String, MirrorError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("user", self.user.as_str()),
            ("secret", self.secret.as_str()),
            ("action", action),
        ];
        form.extend_from_slice(fields);

        let response = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::SyncFailure(format!(
                "{} returned HTTP {}",
                action, status
            )));
        }

        response.text().await.map_err(|e| self.map_err(e))
    }

    fn map_err(&self, e: reqwest::Error) -> MirrorError {
        if e.is_timeout() {
            MirrorError::Timeout(self.timeout_ms)
        } else {
            MirrorError::from(e)
        }
    }
}

/// Turn a search response body into `(tag, value)` pairs.
///
/// Values may come back either as JSON text or already decoded; both are
/// normalized to JSON text.
pub fn parse_search_body(body: &str) -> Result<Vec<(String, String)>, MirrorError> {
    let parsed: serde_json::Value = serde_json::from_str(body)?;
    let object = parsed.as_object().ok_or_else(|| {
        MirrorError::SyncFailure("search response is not a JSON object".into())
    })?;

    Ok(object
        .iter()
        .map(|(tag, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (tag.clone(), text)
        })
        .collect())
}

#[async_trait]
impl MirrorStore for TinyWebDbMirror {
    fn name(&self) -> &'static str {
        "tinywebdb"
    }

    async fn put(&self, tag: &str, value: &str) -> Result<(), MirrorError> {
        self.call("update", &[("tag", tag), ("value", value)]).await?;
        debug!(tag, "TinyWebDB update ok");
        Ok(())
    }

    async fn get_range(&self, range: MirrorRange) -> Result<Vec<(String, String)>, MirrorError> {
        let no = range.no.to_string();
        let count = range.count.to_string();
        let body = self
            .call(
                "search",
                &[
                    ("no", no.as_str()),
                    ("count", count.as_str()),
                    ("tag", ""),
                    ("type", "both"),
                ],
            )
            .await?;
        parse_search_body(&body)
    }

    async fn delete(&self, tag: &str) -> Result<(), MirrorError> {
        self.call("delete", &[("tag", tag)]).await?;
        debug!(tag, "TinyWebDB delete ok");
        Ok(())
    }
}
