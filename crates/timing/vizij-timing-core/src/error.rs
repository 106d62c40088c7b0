//! Error types for the timing core.

/// Failures surfaced by the timing core.
///
/// Everything here is a programming error on the caller's side: the core does
/// no I/O, so none of these are retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TimingError {
    /// A constructor or setter received a value outside its allowed domain.
    #[error("Invalid argument {name} = {value}: {reason}")]
    InvalidArgument {
        name: String,
        value: f64,
        reason: String,
    },

    /// An enumerator was used after its collection changed, or read while
    /// not positioned on an element.
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// A configuration document could not be parsed.
    #[error("Config error: {reason}")]
    Config { reason: String },
}

pub type Result<T, E = TimingError> = std::result::Result<T, E>;

impl TimingError {
    pub(crate) fn invalidated() -> Self {
        Self::InvalidState {
            reason: "enumerator invalidated by concurrent mutation".to_string(),
        }
    }

    pub(crate) fn not_positioned() -> Self {
        Self::InvalidState {
            reason: "enumerator is not positioned on an element".to_string(),
        }
    }

    /// Get error category for host diagnostics.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "argument",
            Self::InvalidState { .. } => "state",
            Self::Config { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for TimingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let arg = TimingError::InvalidArgument {
            name: "control_point1.x".into(),
            value: 1.5,
            reason: "outside [0, 1]".into(),
        };
        assert_eq!(arg.category(), "argument");
        assert_eq!(TimingError::invalidated().category(), "state");
    }

    #[test]
    fn message_names_the_argument() {
        let arg = TimingError::InvalidArgument {
            name: "control_point2.x".into(),
            value: -0.25,
            reason: "outside [0, 1]".into(),
        };
        let msg = arg.to_string();
        assert!(msg.contains("control_point2.x"));
        assert!(msg.contains("-0.25"));
    }

    #[test]
    fn json_errors_become_config_errors() {
        let err: TimingError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, TimingError::Config { .. }));
    }
}
