use crate::error::{ChatError, Result};
use crate::types::{Completion, FinishReason, FunctionCall, Message, ToolCall};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Replays scripted completions in order and records every outbound request.
#[derive(Clone, Default)]
pub struct MockLlmClient {
    responses: Arc<Mutex<Vec<Completion>>>,
    call_history: Arc<Mutex<Vec<Vec<Message>>>>,
    repeat_last: bool,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps returning the final scripted response once the script runs out.
    pub fn repeating() -> Self {
        Self {
            repeat_last: true,
            ..Self::default()
        }
    }

    pub fn add_text_response(&mut self, content: &str) {
        self.responses.lock().unwrap().push(Completion {
            finish_reason: FinishReason::Stop,
            message: Message::assistant(content),
        });
    }

    pub fn add_tool_call_response(&mut self, tool_name: &str, args: &str) {
        self.add_tool_calls_response(&[(tool_name, args)]);
    }

    pub fn add_tool_calls_response(&mut self, calls: &[(&str, &str)]) {
        let mut responses = self.responses.lock().unwrap();
        let round = responses.len();
        let tool_calls = calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCall {
                id: format!("call-{}-{}", round, i),
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: args.to_string(),
                },
            })
            .collect();

        responses.push(Completion {
            finish_reason: FinishReason::ToolCalls,
            message: Message {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(tool_calls),
                tool_call_id: None,
            },
        });
    }

    pub fn get_call_history(&self) -> Vec<Vec<Message>> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    fn pop_response(&self) -> Option<Completion> {
        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => None,
            1 if self.repeat_last => responses.first().cloned(),
            _ => Some(responses.remove(0)),
        }
    }
}

#[async_trait]
impl crate::agent::LlmClientTrait for MockLlmClient {
    async fn chat_once(&self, messages: &[Message], _tools: &Value) -> Result<Completion> {
        // Store the call for verification
        self.call_history.lock().unwrap().push(messages.to_vec());

        self.pop_response()
            .ok_or_else(|| ChatError::Completion("no mock response available".to_string()))
    }
}
