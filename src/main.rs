use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use resume_chat::agent::{Agent, AgentOptions};
use resume_chat::config::Config;
use resume_chat::knowledge::Knowledge;
use resume_chat::llm_client::LlmClient;
use resume_chat::notifier::{LogNotifier, Notifier, PushoverNotifier};
use resume_chat::prompt::system_prompt;
use resume_chat::tool_registry::ToolRegistry;
use resume_chat::ui::{Branding, TuiApp, run_agent_worker};

const APP_DIR: &str = ".resume-chat";

fn create_app_dir() -> anyhow::Result<PathBuf> {
    let dir = PathBuf::from(APP_DIR);
    match fs::create_dir(&dir) {
        Ok(_) => Ok(dir),
        //suppress already exists error
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(dir),
        Err(err) => Err(err).context("creating .resume-chat directory"),
    }
}

// The TUI owns the terminal, so logs go to a file.
fn init_logging(dir: &Path) -> anyhow::Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("resume-chat.log"))
        .context("opening log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dir = create_app_dir()?;
    init_logging(&dir)?;

    let config = Config::from_env()?;
    let knowledge = Knowledge::load(&config.summary_path, &config.profile_path)
        .context("loading knowledge files")?;

    let notifier: Arc<dyn Notifier> = match &config.pushover {
        Some(creds) => Arc::new(PushoverNotifier::new(config.pushover_url.clone(), creds.clone())?),
        None => {
            tracing::warn!("PUSHOVER_TOKEN/PUSHOVER_USER not set, notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let llm = LlmClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.step_timeout,
    )?;
    tracing::info!(model = llm.model(), persona = %config.persona_name, "starting");

    let agent = Agent::new(
        Box::new(llm),
        ToolRegistry::new(notifier),
        system_prompt(&config.persona_name, &knowledge),
        AgentOptions {
            max_tool_rounds: config.max_tool_rounds,
            history_window: config.history_window,
            step_timeout: config.step_timeout,
        },
    );

    let (mut app, ui_tx) = TuiApp::new(Branding {
        name: config.persona_name.clone(),
        blurb: config.persona_blurb.clone(),
    });
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
    let worker = tokio::spawn(run_agent_worker(agent, input_rx, ui_tx));

    let result = app.run_with_input_callback(input_tx).await;
    worker.abort();
    result
}
