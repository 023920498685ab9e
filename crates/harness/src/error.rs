//! Error types for the harness support layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Callback server is not listening (call start() first)")]
    NotStarted,

    #[error("No free callback port found after {attempts} probes starting at {base}")]
    PortBind { base: u16, attempts: u16 },

    #[error("Expected redirect was not observed within {waited_ms} ms")]
    CallbackTimeout { waited_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarnessError {
    /// Whether this is the recoverable callback-timeout outcome, as opposed
    /// to a transport or infrastructure failure.
    pub fn is_callback_timeout(&self) -> bool {
        matches!(self, HarnessError::CallbackTimeout { .. })
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
