use crate::error::{ChatError, Result};
use crate::types::{Completion, FinishReason, Message, ROLE_ASSISTANT};
use serde_json::Value;
use tokio::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct LlmClient {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    /// `request_timeout` should match the agent's step timeout so the
    /// configured deadline is the one that fires.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(8)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url,
            api_key,
            model,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat_once(&self, messages: &[Message], tools: &Value) -> Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut req = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false
        });
        if tools.as_array().is_some_and(|t| !t.is_empty()) {
            req["tools"] = tools.clone();
        }

        debug!(messages = messages.len(), model = %self.model, "completion request");
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        let response_text = resp.text().await?;
        let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
            ChatError::Completion(format!("failed to parse response ({}): {}", status, e))
        })?;

        if let Some(error) = response_json.get("error") {
            return Err(ChatError::Completion(format!("API error: {}", error)));
        }
        if !status.is_success() {
            return Err(ChatError::Completion(format!(
                "HTTP {}: {}",
                status, response_text
            )));
        }

        parse_completion(&response_json)
    }
}

pub(crate) fn parse_completion(response_json: &Value) -> Result<Completion> {
    let choice = response_json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| ChatError::Completion("no choices in response".to_string()))?;

    let mut message: Message = serde_json::from_value(choice["message"].clone())?;
    if message.role.is_empty() {
        message.role = ROLE_ASSISTANT.to_string();
    }
    let finish_reason = FinishReason::parse(choice["finish_reason"].as_str());
    debug!(?finish_reason, tool_calls = message.has_tool_calls(), "completion response");

    Ok(Completion {
        finish_reason,
        message,
    })
}
