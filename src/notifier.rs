use async_trait::async_trait;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::config::PushoverCredentials;

/// Best-effort delivery of a short text message. Failures never reach the
/// caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, message: &str);
}

#[derive(Clone)]
pub struct PushoverNotifier {
    url: String,
    credentials: PushoverCredentials,
    http: reqwest::Client,
}

impl PushoverNotifier {
    pub fn new(url: String, credentials: PushoverCredentials) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            url,
            credentials,
            http,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn push(&self, message: &str) {
        let form = [
            ("token", self.credentials.token.as_str()),
            ("user", self.credentials.user.as_str()),
            ("message", message),
        ];
        match self.http.post(&self.url).form(&form).send().await {
            Ok(resp) if resp.status().is_success() => info!("push delivered"),
            Ok(resp) => warn!(status = %resp.status(), "push rejected"),
            Err(e) => warn!(error = %e, "push failed"),
        }
    }
}

/// Stand-in used when no push credentials are configured.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn push(&self, message: &str) {
        info!(text = message, "push (no credentials configured)");
    }
}
