/// Failure of one recognition round trip.
///
/// None of these variants carry partially applied state: a failed round
/// leaves bindings and annotations exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("recognition service is not configured: {0}")]
    Configuration(String),
    #[error("recognition service call failed: {0}")]
    Service(String),
    #[error("recognition response did not match the expected schema: {message}")]
    Parse { message: String, raw: String },
}

impl RecognitionError {
    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Whether retrying the same request can succeed without reconfiguration.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Service(_) => "service",
            Self::Parse { .. } => "parse",
        }
    }

    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RecognitionError {
    /// The request URL is stripped so endpoint query parameters never end up
    /// in logs.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Self::Service(format!("request timed out: {err}"))
        } else {
            Self::Service(err.to_string())
        }
    }
}
