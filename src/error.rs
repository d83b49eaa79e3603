use crate::state::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("State decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Randomness for salt {salt} was not fulfilled in time")]
    RandomnessTimeout { salt: String },

    #[error("Salt mismatch: expected {expected}, observed {observed}")]
    SaltMismatch { expected: String, observed: String },

    #[error("Submission error: {0}")]
    Submission(String),

    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Purchase {tx} could not be confirmed: {reason}")]
    PurchaseUnconfirmed { tx: String, reason: String },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BotError {
    /// Whether the loop may recover by re-reading state and trying again.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            BotError::Decode(_)
                | BotError::Provider(_)
                | BotError::Submission(_)
                | BotError::RandomnessTimeout { .. }
                | BotError::SaltMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(BotError::Submission("rpc down".into()).is_retriable());
        assert!(BotError::RandomnessTimeout { salt: "0x1".into() }.is_retriable());
        let truncated = DecodeError::Truncated {
            expected: 70,
            actual: 3,
        };
        assert!(BotError::Decode(truncated).is_retriable());
        assert!(!BotError::IllegalAction("attack while dead".into()).is_retriable());
        assert!(!BotError::Config("missing game address".into()).is_retriable());
        assert!(!BotError::RetriesExhausted {
            attempts: 5,
            last_error: "x".into()
        }
        .is_retriable());
        assert!(!BotError::PurchaseUnconfirmed {
            tx: "0x9".into(),
            reason: "no receipt".into()
        }
        .is_retriable());
    }
}
