use thiserror::Error;

/// Failure modes of [`Registry::dispatch`](crate::Registry::dispatch).
///
/// None of these are fatal to the session: the session loop prints them
/// under the alert prompt and reads the next line.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no commands registered")]
    NoCommandsRegistered,

    #[error("command '{name}' not found. Try 'help'")]
    CommandNotFound { name: String },

    /// Error returned by a command callback, passed through verbatim.
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl DispatchError {
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::CommandNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_errors_display_verbatim() {
        let err = DispatchError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn not_found_names_the_token() {
        let err = DispatchError::not_found("frobnicate");
        assert!(err.to_string().contains("'frobnicate'"));
    }
}
