use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{ToolHandler, parse_args, recorded_ok, skipped};
use crate::dedup::DedupGuard;
use crate::error::Result;
use crate::notifier::Notifier;

pub const NAME: &str = "record_user_details";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub struct RecordUserDetails {
    notifier: Arc<dyn Notifier>,
}

impl RecordUserDetails {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ToolHandler for RecordUserDetails {
    fn name(&self) -> &'static str {
        NAME
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "name": NAME,
            "description": "Use this tool to record that a user is interested in being in touch and provided an email address",
            "parameters": {
                "type": "object",
                "properties": {
                    "email": {
                        "type": "string",
                        "description": "The email address of this user"
                    },
                    "name": {
                        "type": "string",
                        "description": "The user's name, if they provided it"
                    },
                    "notes": {
                        "type": "string",
                        "description": "Any additional information about the conversation that's worth recording to give context"
                    }
                },
                "required": ["email"],
                "additionalProperties": false
            }
        })
    }

    async fn call(&self, args: Value, guard: &mut DedupGuard) -> Result<Value> {
        let args: Args = parse_args(NAME, args)?;

        let email = args.email.as_deref().map(str::trim).unwrap_or_default();
        if email.is_empty() {
            warn!("record_user_details skipped: missing email");
            return Ok(skipped("missing email"));
        }
        if !EMAIL_RE.is_match(email) {
            warn!(email, "record_user_details skipped: invalid email");
            return Ok(skipped("invalid email"));
        }

        let key = DedupGuard::key(NAME, email);
        if guard.contains(&key) {
            info!(email, "record_user_details: already recorded");
            return Ok(recorded_ok());
        }

        let name = non_empty(args.name.as_deref()).unwrap_or("Name not provided");
        let notes = non_empty(args.notes.as_deref()).unwrap_or("not provided");
        self.notifier
            .push(&format!(
                "Recording {} with email {} and notes {}",
                name, email, notes
            ))
            .await;
        guard.mark(key);
        Ok(recorded_ok())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
