use crate::error::{ChatError, Result};
use crate::llm_client::LlmClient;
use crate::session::Session;
use crate::tool_registry::ToolRegistry;
use crate::types::{Completion, Message, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_TOOL, ROLE_USER};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{Duration, timeout};
use tracing::{debug, info, warn};

/// Shown when the endpoint finishes without any text.
pub const EMPTY_ANSWER_FALLBACK: &str =
    "Sorry, I don't have an answer for that right now. Could you rephrase the question?";

/// Receives tool activity while a turn is in progress.
pub trait AgentEventHandler: Send {
    fn on_tool_call(&mut self, name: &str, args: &str);
    fn on_tool_result(&mut self, name: &str, result: &str);
}

pub struct NoopHandler;

impl AgentEventHandler for NoopHandler {
    fn on_tool_call(&mut self, _name: &str, _args: &str) {}
    fn on_tool_result(&mut self, _name: &str, _result: &str) {}
}

#[async_trait]
pub trait LlmClientTrait: Send + Sync {
    async fn chat_once(&self, messages: &[Message], tools: &Value) -> Result<Completion>;
}

#[async_trait]
impl LlmClientTrait for LlmClient {
    async fn chat_once(&self, messages: &[Message], tools: &Value) -> Result<Completion> {
        LlmClient::chat_once(self, messages, tools).await
    }
}

#[derive(Clone, Debug)]
pub struct AgentOptions {
    pub max_tool_rounds: usize,
    pub history_window: usize,
    pub step_timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            history_window: 4,
            step_timeout: Duration::from_secs(60),
        }
    }
}

pub struct Agent {
    llm: Box<dyn LlmClientTrait>,
    tools: ToolRegistry,
    system_prompt: String,
    opts: AgentOptions,
}

impl Agent {
    pub fn new(
        llm: Box<dyn LlmClientTrait>,
        tools: ToolRegistry,
        system_prompt: String,
        opts: AgentOptions,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt,
            opts,
        }
    }

    pub fn options(&self) -> &AgentOptions {
        &self.opts
    }

    pub async fn chat(&self, session: &mut Session, user_input: &str) -> Result<String> {
        self.chat_with_handler(session, user_input, &mut NoopHandler)
            .await
    }

    /// Answers one visitor message. The user message is recorded in `session`
    /// as soon as the turn starts, so a failed turn still leaves it in the
    /// history; the final answer is recorded on success. Intermediate tool
    /// traffic is never stored.
    pub async fn chat_with_handler(
        &self,
        session: &mut Session,
        user_input: &str,
        handler: &mut dyn AgentEventHandler,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(self.opts.history_window + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend_from_slice(session.recent(self.opts.history_window));
        messages.push(Message::user(user_input));
        session.add_message(Message::user(user_input));

        for round in 0..=self.opts.max_tool_rounds {
            let outbound = sanitize_messages(&messages);
            let step = timeout(
                self.opts.step_timeout,
                self.llm.chat_once(&outbound, self.tools.schemas()),
            )
            .await
            .map_err(|_| ChatError::Timeout(self.opts.step_timeout.as_secs()))??;

            if !step.wants_tools() {
                let answer = step
                    .message
                    .content
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| EMPTY_ANSWER_FALLBACK.to_string());
                debug!(round, "final answer received");
                session.add_message(Message::assistant(answer.clone()));
                return Ok(answer);
            }

            if round == self.opts.max_tool_rounds {
                break;
            }

            let calls = step.message.tool_calls.clone().unwrap_or_default();
            messages.push(step.message);
            for call in &calls {
                handler.on_tool_call(&call.function.name, &call.function.arguments);
                let result = self.tools.dispatch(call, &mut session.guard).await;
                if let Some(content) = &result.content {
                    handler.on_tool_result(&call.function.name, content);
                }
                messages.push(result);
            }
            info!(round, calls = calls.len(), "tool round complete");
        }

        warn!(
            max = self.opts.max_tool_rounds,
            "tool round limit reached without a final answer"
        );
        Err(ChatError::ToolRoundsExceeded(self.opts.max_tool_rounds))
    }
}

/// Drops messages the endpoint would reject and strips fields that don't
/// belong to a message's role.
pub fn sanitize_messages(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter_map(|m| match m.role.as_str() {
            ROLE_SYSTEM | ROLE_USER => m.content.as_ref().map(|_| Message {
                role: m.role.clone(),
                content: m.content.clone(),
                tool_calls: None,
                tool_call_id: None,
            }),
            ROLE_ASSISTANT if m.content.is_some() || m.has_tool_calls() => Some(Message {
                role: m.role.clone(),
                content: m.content.clone(),
                tool_calls: m.tool_calls.clone().filter(|c| !c.is_empty()),
                tool_call_id: None,
            }),
            ROLE_TOOL => m.tool_call_id.as_ref().map(|id| Message {
                role: m.role.clone(),
                content: Some(m.content.clone().unwrap_or_default()),
                tool_calls: None,
                tool_call_id: Some(id.clone()),
            }),
            _ => None,
        })
        .collect()
}
