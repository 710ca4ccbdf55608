use crate::agent::{Agent, AgentOptions, EMPTY_ANSWER_FALLBACK, LlmClientTrait, sanitize_messages};
use crate::error::{ChatError, Result};
use crate::knowledge::Knowledge;
use crate::mocks::mock_llm_client::MockLlmClient;
use crate::mocks::recording_notifier::RecordingNotifier;
use crate::prompt::system_prompt;
use crate::session::Session;
use crate::tool_registry::ToolRegistry;
use crate::types::{Completion, Message, ToolCall, FunctionCall};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    fn knowledge() -> Knowledge {
        Knowledge {
            summary: "Backend engineer with ten years of Python and Rust.".to_string(),
            profile: "Experience: Senior Engineer at Acme (2019 - present)".to_string(),
        }
    }

    fn create_test_agent(mock: MockLlmClient, notifier: RecordingNotifier, max_tool_rounds: usize) -> Agent {
        Agent::new(
            Box::new(mock),
            ToolRegistry::new(Arc::new(notifier)),
            system_prompt("Test Person", &knowledge()),
            AgentOptions {
                max_tool_rounds,
                history_window: 4,
                step_timeout: Duration::from_secs(10),
            },
        )
    }

    #[tokio::test]
    async fn test_text_response_is_final_answer() {
        let mut mock = MockLlmClient::new();
        mock.add_text_response("  I have ten years of backend experience.  ");
        let agent = create_test_agent(mock.clone(), RecordingNotifier::new(), 5);
        let mut session = Session::new();

        let answer = agent.chat(&mut session, "How experienced are you?").await.unwrap();

        assert_eq!(answer, "I have ten years of backend experience.");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0], Message::user("How experienced are you?"));
        assert_eq!(session.messages[1].role, "assistant");

        let sent = &mock.get_call_history()[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, "system");
        assert!(sent[0].content.as_ref().unwrap().contains("Test Person"));
        assert_eq!(sent[1], Message::user("How experienced are you?"));
    }

    #[tokio::test]
    async fn test_unknown_question_is_pushed_and_turn_still_answers() {
        let mut mock = MockLlmClient::new();
        mock.add_tool_call_response("record_unknown_question", r#"{"question": "What's your favorite hobby?"}"#);
        mock.add_text_response("I'm not sure about that one, but I'd love to hear from you by email!");
        let notifier = RecordingNotifier::new();
        let agent = create_test_agent(mock.clone(), notifier.clone(), 5);
        let mut session = Session::new();

        let answer = agent.chat(&mut session, "What's your favorite hobby?").await.unwrap();

        assert!(!answer.is_empty());
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("What's your favorite hobby?"));

        // The second request carries the assistant tool request and its result.
        let second = &mock.get_call_history()[1];
        assert_eq!(second.len(), 4);
        let requested_id = &second[2].tool_calls.as_ref().unwrap()[0].id;
        assert_eq!(second[3].role, "tool");
        assert_eq!(second[3].tool_call_id.as_ref(), Some(requested_id));
        assert_eq!(second[3].content.as_deref(), Some(r#"{"recorded":"ok"}"#));
    }

    #[tokio::test]
    async fn test_same_email_twice_in_session_pushes_once() {
        let mut mock = MockLlmClient::new();
        for _ in 0..2 {
            mock.add_tool_call_response("record_user_details", r#"{"email": "a@b.com"}"#);
            mock.add_text_response("Thanks, I'll be in touch!");
        }
        let notifier = RecordingNotifier::new();
        let agent = create_test_agent(mock.clone(), notifier.clone(), 5);
        let mut session = Session::new();

        let first = agent.chat(&mut session, "My email is a@b.com, please contact me").await.unwrap();
        let second = agent.chat(&mut session, "My email is a@b.com, please contact me").await.unwrap();

        assert_eq!(first, "Thanks, I'll be in touch!");
        assert_eq!(second, "Thanks, I'll be in touch!");
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("a@b.com"));
        assert_eq!(session.guard.len(), 1);

        // The duplicate still gets a success-shaped result.
        let last_call = mock.get_call_history().pop().unwrap();
        let result = last_call.last().unwrap();
        assert_eq!(result.role, "tool");
        assert_eq!(result.content.as_deref(), Some(r#"{"recorded":"ok"}"#));
    }

    #[tokio::test]
    async fn test_tool_loop_is_bounded() {
        let mut mock = MockLlmClient::repeating();
        mock.add_tool_call_response("record_unknown_question", r#"{"question": "Why?"}"#);
        let notifier = RecordingNotifier::new();
        let agent = create_test_agent(mock.clone(), notifier.clone(), 3);
        let mut session = Session::new();

        let err = agent.chat(&mut session, "Why?").await.unwrap_err();

        assert!(matches!(err, ChatError::ToolRoundsExceeded(3)));
        assert_eq!(mock.call_count(), 4);
        // Same question every round, recorded once.
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(session.messages, vec![Message::user("Why?")]);
    }

    #[tokio::test]
    async fn test_every_requested_call_gets_a_result() {
        let mut mock = MockLlmClient::new();
        mock.add_tool_calls_response(&[
            ("record_user_details", r#"{"email": ""}"#),
            ("record_user_details", "{not json"),
            ("no_such_tool", "{}"),
            ("record_unknown_question", r#"{"question": "Do you ski?"}"#),
        ]);
        mock.add_text_response("Done.");
        let notifier = RecordingNotifier::new();
        let agent = create_test_agent(mock.clone(), notifier.clone(), 5);
        let mut session = Session::new();

        let answer = agent.chat(&mut session, "hi").await.unwrap();
        assert_eq!(answer, "Done.");

        let second = &mock.get_call_history()[1];
        let requested: Vec<String> = second[2]
            .tool_calls
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        let results: Vec<&Message> = second.iter().filter(|m| m.role == "tool").collect();
        assert_eq!(results.len(), requested.len());
        for (result, id) in results.iter().zip(&requested) {
            assert_eq!(result.tool_call_id.as_ref(), Some(id));
        }

        let content = |i: usize| -> Value { serde_json::from_str(results[i].content.as_ref().unwrap()).unwrap() };
        assert_eq!(content(0)["recorded"], "skipped");
        assert!(content(1)["error"].as_str().unwrap().contains("invalid arguments"));
        assert_eq!(content(2), serde_json::json!({}));
        assert_eq!(content(3)["recorded"], "ok");

        assert_eq!(notifier.sent(), vec!["Recording Do you ski?".to_string()]);
    }

    #[tokio::test]
    async fn test_history_is_truncated_to_window() {
        let mut mock = MockLlmClient::new();
        mock.add_text_response("ok");
        let agent = create_test_agent(mock.clone(), RecordingNotifier::new(), 5);
        let mut session = Session::new();
        for i in 1..=6 {
            session.add_message(Message::user(format!("Message {}", i)));
        }

        agent.chat(&mut session, "latest").await.unwrap();

        let sent = &mock.get_call_history()[0];
        assert_eq!(sent.len(), 1 + 4 + 1);
        assert_eq!(sent[1].content.as_deref(), Some("Message 3"));
        assert_eq!(sent[4].content.as_deref(), Some("Message 6"));
        assert_eq!(sent[5].content.as_deref(), Some("latest"));
    }

    #[tokio::test]
    async fn test_only_sanitized_messages_are_sent() {
        let mut mock = MockLlmClient::new();
        mock.add_text_response("ok");
        let agent = create_test_agent(mock.clone(), RecordingNotifier::new(), 5);
        let mut session = Session::new();
        session.add_message(Message {
            role: "tool".to_string(),
            content: Some("orphan".to_string()),
            tool_calls: None,
            tool_call_id: None,
        });
        session.add_message(Message::assistant("Hello!"));

        agent.chat(&mut session, "hi").await.unwrap();

        let sent = &mock.get_call_history()[0];
        assert!(sent.iter().all(|m| m.role != "tool"));
        assert_eq!(sent.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_final_content_uses_fallback() {
        let mut mock = MockLlmClient::new();
        mock.add_text_response("   ");
        let agent = create_test_agent(mock, RecordingNotifier::new(), 5);
        let mut session = Session::new();

        let answer = agent.chat(&mut session, "hello?").await.unwrap();
        assert_eq!(answer, EMPTY_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn test_completion_error_propagates() {
        let mock = MockLlmClient::new();
        let agent = create_test_agent(mock, RecordingNotifier::new(), 5);
        let mut session = Session::new();

        let err = agent.chat(&mut session, "hello?").await.unwrap_err();
        assert!(matches!(err, ChatError::Completion(_)));
        assert_eq!(session.messages, vec![Message::user("hello?")]);
    }

    #[tokio::test]
    async fn test_failed_turn_question_reaches_next_turn() {
        let mut mock = MockLlmClient::new();
        mock.add_tool_call_response("record_unknown_question", r#"{"question": "Do you ski?"}"#);
        mock.add_tool_call_response("record_unknown_question", r#"{"question": "Do you ski?"}"#);
        mock.add_text_response("I don't ski, sorry.");
        let agent = create_test_agent(mock.clone(), RecordingNotifier::new(), 1);
        let mut session = Session::new();

        let err = agent.chat(&mut session, "Do you ski?").await.unwrap_err();
        assert!(matches!(err, ChatError::ToolRoundsExceeded(1)));

        agent.chat(&mut session, "Hello again").await.unwrap();

        let history = mock.get_call_history();
        let retry = history.last().unwrap();
        let users: Vec<_> = retry
            .iter()
            .filter(|m| m.role == "user")
            .filter_map(|m| m.content.as_deref())
            .collect();
        assert_eq!(users, vec!["Do you ski?", "Hello again"]);
        assert_eq!(session.messages.len(), 3);
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClientTrait for SlowClient {
        async fn chat_once(&self, _messages: &[Message], _tools: &Value) -> Result<Completion> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(ChatError::Completion("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let agent = Agent::new(
            Box::new(SlowClient),
            ToolRegistry::new(Arc::new(RecordingNotifier::new())),
            "system".to_string(),
            AgentOptions {
                step_timeout: Duration::from_millis(20),
                ..AgentOptions::default()
            },
        );
        let mut session = Session::new();

        let err = agent.chat(&mut session, "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Timeout(_)));
    }

    #[test]
    fn test_sanitize_drops_incomplete_messages() {
        let call = ToolCall {
            id: "call-1".to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: "record_unknown_question".to_string(),
                arguments: "{}".to_string(),
            },
        };
        let messages = vec![
            Message::system("persona"),
            Message { role: "user".to_string(), content: None, tool_calls: None, tool_call_id: None },
            Message { role: "narrator".to_string(), content: Some("?".to_string()), tool_calls: None, tool_call_id: None },
            Message { role: "assistant".to_string(), content: None, tool_calls: None, tool_call_id: None },
            Message { role: "assistant".to_string(), content: None, tool_calls: Some(vec![call]), tool_call_id: None },
            Message { role: "tool".to_string(), content: Some("{}".to_string()), tool_calls: None, tool_call_id: None },
            Message::tool_result("call-1", "{}"),
            Message {
                role: "user".to_string(),
                content: Some("hi".to_string()),
                tool_calls: None,
                tool_call_id: Some("stray".to_string()),
            },
        ];

        let cleaned = sanitize_messages(&messages);

        let roles: Vec<&str> = cleaned.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "assistant", "tool", "user"]);
        assert!(cleaned[1].has_tool_calls());
        assert_eq!(cleaned[2].tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(cleaned[3].tool_call_id, None);
    }
}
