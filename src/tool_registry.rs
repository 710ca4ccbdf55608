use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::dedup::DedupGuard;
use crate::notifier::Notifier;
use crate::tools::{RecordUnknownQuestion, RecordUserDetails, ToolHandler};
use crate::types::{Message, ToolCall};

pub struct ToolRegistry {
    handlers: HashMap<&'static str, Box<dyn ToolHandler>>,
    schemas: Value,
}

impl ToolRegistry {
    /// The two resume tools, both reporting through `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::from_handlers(vec![
            Box::new(RecordUserDetails::new(notifier.clone())),
            Box::new(RecordUnknownQuestion::new(notifier)),
        ])
    }

    pub fn from_handlers(handlers: Vec<Box<dyn ToolHandler>>) -> Self {
        // Single source of truth for "tools" schema the LLM sees
        let schemas = Value::Array(
            handlers
                .iter()
                .map(|h| serde_json::json!({ "type": "function", "function": h.schema() }))
                .collect(),
        );
        let handlers = handlers.into_iter().map(|h| (h.name(), h)).collect();
        Self { handlers, schemas }
    }

    pub fn schemas(&self) -> &Value {
        &self.schemas
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Runs one requested call and always answers its id. Unknown tools are a
    /// no-op; bad arguments and handler failures become an `error` result.
    pub async fn dispatch(&self, call: &ToolCall, guard: &mut DedupGuard) -> Message {
        let name = call.function.name.as_str();
        let raw = match call.function.arguments.trim() {
            "" => "{}",
            args => args,
        };
        let result = match self.handlers.get(name) {
            None => {
                warn!(tool = name, "unknown tool requested, ignoring");
                serde_json::json!({})
            }
            Some(handler) => match serde_json::from_str::<Value>(raw) {
                Err(e) => {
                    warn!(tool = name, error = %e, "invalid JSON in tool arguments");
                    serde_json::json!({ "error": format!("invalid arguments: {}", e) })
                }
                Ok(args) => {
                    info!(tool = name, "tool called");
                    match handler.call(args, guard).await {
                        Ok(v) => v,
                        Err(e) => {
                            warn!(tool = name, error = %e, "tool call failed");
                            serde_json::json!({ "error": e.to_string() })
                        }
                    }
                }
            },
        };
        Message::tool_result(call.id.clone(), result.to_string())
    }
}
