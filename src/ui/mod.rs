pub(crate) mod render;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::Stdout;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::agent::{Agent, AgentEventHandler};
use crate::error::ChatError;
use crate::session::Session;

const READY_STATUS: &str = "Ready | Press 'i' to type, 'q' to quit, '?' for help";
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PAGE: usize = 10;

type Tui = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    AgentMessage(String),
    ToolCall(String, String), // name, args
    ToolResult(String, String), // name, result
    Error(String),
    Complete,
}

/// Static sidebar content.
#[derive(Debug, Clone)]
pub struct Branding {
    pub name: String,
    pub blurb: String,
}

/// Forwards tool activity from a running turn to the UI.
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelHandler {
    pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl AgentEventHandler for ChannelHandler {
    fn on_tool_call(&mut self, name: &str, args: &str) {
        let _ = self.tx.send(UiEvent::ToolCall(name.to_string(), args.to_string()));
    }

    fn on_tool_result(&mut self, name: &str, result: &str) {
        let _ = self.tx.send(UiEvent::ToolResult(name.to_string(), result.to_string()));
    }
}

pub struct TuiApp {
    pub running: bool,
    pub input_mode: InputMode,
    pub messages: Vec<DisplayMessage>,
    pub input: String,
    pub status_line: String,
    pub scroll_offset: usize,
    pub show_help: bool,
    pub busy: bool,
    branding: Branding,
    rx: mpsc::UnboundedReceiver<UiEvent>,
}

#[derive(Debug, Clone)]
pub struct DisplayMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

impl TuiApp {
    pub fn new(branding: Branding) -> (Self, mpsc::UnboundedSender<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Self {
            running: true,
            input_mode: InputMode::Normal,
            messages: Vec::new(),
            input: String::new(),
            status_line: READY_STATUS.to_string(),
            scroll_offset: 0,
            show_help: false,
            busy: false,
            branding,
            rx,
        };
        (app, tx)
    }

    /// Takes over the terminal until the visitor quits, forwarding each
    /// submitted message to `input_tx`.
    pub async fn run_with_input_callback(&mut self, input_tx: mpsc::UnboundedSender<String>) -> Result<()> {
        enable_raw_mode()?;
        execute!(std::io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        terminal.clear()?;

        let outcome = self.event_loop(&mut terminal, &input_tx).await;

        // Restore the terminal even when the loop failed.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;
        outcome
    }

    async fn event_loop(&mut self, terminal: &mut Tui, input_tx: &mpsc::UnboundedSender<String>) -> Result<()> {
        while self.running {
            terminal.draw(|f| render::draw(f, self))?;

            if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(text) = self.handle_key(key) {
                            let _ = input_tx.send(text);
                        }
                    }
                    _ => {}
                }
            }

            while let Ok(update) = self.rx.try_recv() {
                self.handle_ui_event(update);
            }
        }
        Ok(())
    }

    fn push(&mut self, role: &str, content: String) {
        self.messages.push(DisplayMessage {
            role: role.to_string(),
            content,
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        });
        self.auto_scroll();
    }

    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::AgentMessage(content) => self.push("assistant", content),
            UiEvent::ToolCall(name, args) => self.push("tool", format!("🔧 {} {}", name, args)),
            UiEvent::ToolResult(name, result) => self.push("tool_result", format!("{} → {}", name, result)),
            UiEvent::Error(error) => {
                self.status_line = format!("Error: {}", error);
                self.push("error", format!("❌ {}", error));
            }
            UiEvent::Complete => {
                self.busy = false;
                self.status_line = "✓ Complete | Press 'i' to continue".to_string();
            }
        }
    }

    // Keep the latest exchange in view.
    fn auto_scroll(&mut self) {
        self.scroll_offset = self.messages.len().saturating_sub(4);
    }

    fn last_index(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }

    fn scroll_up(&mut self, by: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(by);
    }

    fn scroll_down(&mut self, by: usize) {
        self.scroll_offset = (self.scroll_offset + by).min(self.last_index());
    }

    fn leave_editing(&mut self, status: &str) {
        self.input_mode = InputMode::Normal;
        self.status_line = status.to_string();
    }

    /// Returns the text to send when the visitor submits a message.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        match self.input_mode {
            InputMode::Normal => {
                self.browse_key(key.code);
                None
            }
            InputMode::Editing => self.edit_key(key),
        }
    }

    fn browse_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('i') => {
                self.input_mode = InputMode::Editing;
                self.status_line = "Insert mode | Enter to send, Esc to cancel".to_string();
            }
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char('q') => self.running = false,
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE),
            KeyCode::PageDown => self.scroll_down(PAGE),
            _ => {}
        }
    }

    fn edit_key(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.leave_editing("Cancelled");
            }
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Esc => self.leave_editing(READY_STATUS),
            _ => {}
        }
        None
    }

    // One turn at a time: a second message waits until the agent completes.
    fn submit(&mut self) -> Option<String> {
        if self.busy {
            self.status_line = "Still answering the previous message...".to_string();
            return None;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.push("user", text.clone());
        self.input.clear();
        self.leave_editing("Thinking...");
        self.busy = true;
        Some(text)
    }
}

/// Reply shown when a turn gives up on the tool loop.
pub const DEGRADED_ANSWER: &str =
    "I'm having trouble putting an answer together right now. Please try asking again.";

/// Owns the visitor's session and answers inputs one at a time until the
/// input channel closes.
pub async fn run_agent_worker(
    agent: Agent,
    mut inputs: mpsc::UnboundedReceiver<String>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
) -> Session {
    let mut session = Session::new();
    let mut handler = ChannelHandler::new(ui_tx.clone());
    tracing::info!(session = %session.id, "session started");

    while let Some(input) = inputs.recv().await {
        match agent.chat_with_handler(&mut session, &input, &mut handler).await {
            Ok(answer) => {
                let _ = ui_tx.send(UiEvent::AgentMessage(answer));
            }
            Err(ChatError::ToolRoundsExceeded(rounds)) => {
                tracing::warn!(rounds, "turn degraded");
                let _ = ui_tx.send(UiEvent::AgentMessage(DEGRADED_ANSWER.to_string()));
            }
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                let _ = ui_tx.send(UiEvent::Error(e.to_string()));
            }
        }
        let _ = ui_tx.send(UiEvent::Complete);
    }
    session
}
