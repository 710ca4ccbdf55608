use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{ToolHandler, parse_args, recorded_ok, skipped};
use crate::dedup::DedupGuard;
use crate::error::Result;
use crate::notifier::Notifier;

pub const NAME: &str = "record_unknown_question";

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    question: Option<String>,
}

pub struct RecordUnknownQuestion {
    notifier: Arc<dyn Notifier>,
}

impl RecordUnknownQuestion {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ToolHandler for RecordUnknownQuestion {
    fn name(&self) -> &'static str {
        NAME
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "name": NAME,
            "description": "Always use this tool to record any question that couldn't be answered as you didn't know the answer",
            "parameters": {
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question that couldn't be answered"
                    }
                },
                "required": ["question"],
                "additionalProperties": false
            }
        })
    }

    async fn call(&self, args: Value, guard: &mut DedupGuard) -> Result<Value> {
        let args: Args = parse_args(NAME, args)?;
        let question = args.question.as_deref().map(str::trim).unwrap_or_default();
        if question.is_empty() {
            warn!("record_unknown_question skipped: empty question");
            return Ok(skipped("missing question"));
        }

        if !guard.mark(DedupGuard::key(NAME, question)) {
            info!(question, "record_unknown_question: already recorded");
            return Ok(recorded_ok());
        }

        self.notifier.push(&format!("Recording {}", question)).await;
        Ok(recorded_ok())
    }
}
