use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ChatError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";
pub const DEFAULT_PERSONA: &str = "Mohamed Shemy";

#[derive(Debug, Clone)]
pub struct PushoverCredentials {
    pub token: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub pushover: Option<PushoverCredentials>,
    pub pushover_url: String,
    pub persona_name: String,
    pub persona_blurb: String,
    pub summary_path: PathBuf,
    pub profile_path: PathBuf,
    pub max_tool_rounds: usize,
    pub history_window: usize,
    pub step_timeout: Duration,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ChatError::Config("OPENAI_API_KEY not set".to_string()))?;

        let pushover = match (get("PUSHOVER_TOKEN"), get("PUSHOVER_USER")) {
            (Some(token), Some(user)) => Some(PushoverCredentials { token, user }),
            _ => None,
        };

        let persona_name = get("PERSONA_NAME").unwrap_or_else(|| DEFAULT_PERSONA.to_string());
        let persona_blurb = get("PERSONA_BLURB").unwrap_or_else(|| {
            format!(
                "This is a demo of a custom AI assistant representing {}, answering questions \
                 about their career and background. It can record visitor interest and \
                 unknown questions using tools.",
                persona_name
            )
        });

        Ok(Self {
            base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            pushover,
            pushover_url: get("PUSHOVER_URL").unwrap_or_else(|| DEFAULT_PUSHOVER_URL.to_string()),
            persona_name,
            persona_blurb,
            summary_path: get("SUMMARY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("me/summary.txt")),
            profile_path: get("PROFILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("me/linkedin.pdf")),
            max_tool_rounds: nonzero_or("MAX_TOOL_ROUNDS", get("MAX_TOOL_ROUNDS"), 5)?,
            history_window: parse_or("HISTORY_WINDOW", get("HISTORY_WINDOW"), 4)?,
            step_timeout: Duration::from_secs(nonzero_or(
                "STEP_TIMEOUT_SECS",
                get("STEP_TIMEOUT_SECS"),
                60,
            )?),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ChatError::Config(format!("{} must be a number, got '{}'", key, v))),
    }
}

// Zero rounds or a zero-second deadline would fail every turn.
fn nonzero_or<T: FromStr + Default + PartialEq>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    let value = parse_or(key, raw, default)?;
    if value == T::default() {
        return Err(ChatError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(value)
}
