pub mod mock_llm_client;
pub mod recording_notifier;
