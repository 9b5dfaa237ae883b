/// Mock chat model for testing purposes.
///
/// Returns a canned response and counts invocations, so tests can assert
/// both the parsed output and whether the model was called at all.
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChatModel, LlmError};

pub struct MockChatModel {
    response: String,
    calls: AtomicUsize,
}

impl MockChatModel {
    /// Create a mock that answers every prompt with `response`.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `complete` has been invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatModel for MockChatModel {
    fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
