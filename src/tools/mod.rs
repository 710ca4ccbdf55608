pub use self::record_unknown_question::RecordUnknownQuestion;
pub use self::record_user_details::RecordUserDetails;

mod record_unknown_question;
mod record_user_details;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dedup::DedupGuard;
use crate::error::{ChatError, Result};

/// A side-effecting function the completion endpoint may call by name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// The `function` object advertised to the endpoint.
    fn schema(&self) -> Value;

    async fn call(&self, args: Value, guard: &mut DedupGuard) -> Result<Value>;
}

pub fn recorded_ok() -> Value {
    serde_json::json!({ "recorded": "ok" })
}

pub fn skipped(reason: &str) -> Value {
    serde_json::json!({ "recorded": "skipped", "reason": reason })
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| ChatError::ToolArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}
