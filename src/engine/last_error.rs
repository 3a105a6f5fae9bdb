use std::sync::Mutex;
use tracing::warn;

/// Returned by [`ErrorState::describe`] when nothing has been recorded.
pub const NO_ERROR: &str = "no error";

/// Most recent failure description, shared by every engine component.
///
/// Holds a single message: each record overwrites the previous one. Reading
/// never clears it.
#[derive(Debug, Default)]
pub struct ErrorState {
    last: Mutex<Option<String>>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, component: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(component, error = %message, "Engine error recorded");

        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(message);
    }

    pub fn clear(&self) {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = None;
    }

    pub fn get(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The recorded message, or [`NO_ERROR`].
    pub fn describe(&self) -> String {
        self.get().unwrap_or_else(|| NO_ERROR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_record_wins() {
        let state = ErrorState::new();
        assert_eq!(state.describe(), NO_ERROR);

        state.record("queue", "first");
        state.record("pipeline", "second");
        assert_eq!(state.get().as_deref(), Some("second"));
    }

    #[test]
    fn reading_does_not_clear() {
        let state = ErrorState::new();
        state.record("queue", "buffer capacity reached");

        assert_eq!(state.describe(), "buffer capacity reached");
        assert_eq!(state.describe(), "buffer capacity reached");

        state.clear();
        assert_eq!(state.get(), None);
    }
}
