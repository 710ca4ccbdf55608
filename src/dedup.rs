use std::collections::HashSet;

/// Keys of side effects already performed in a session.
#[derive(Debug, Clone, Default)]
pub struct DedupGuard {
    seen: HashSet<String>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `"<tool>:<normalized value>"`
    pub fn key(tool: &str, value: &str) -> String {
        format!("{}:{}", tool, normalize(value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Returns false if the key was already present.
    pub fn mark(&mut self, key: String) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

// Case and inner whitespace don't make a question or address different.
fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
