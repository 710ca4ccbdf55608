pub mod agent;
pub mod config;
pub mod dedup;
pub mod error;
pub mod knowledge;
pub mod llm_client;
pub mod notifier;
pub mod prompt;
pub mod session;
pub mod tool_registry;
pub mod tools;
pub mod types;
pub mod ui;

#[cfg(test)]
mod mocks;
#[cfg(test)]
mod tests;
