use thiserror::Error;

/// Failure of a single round trip to the question-answering service.
///
/// Every variant is surfaced to the user the same way: its `Display` text is
/// the message shown in the status line or alert.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
