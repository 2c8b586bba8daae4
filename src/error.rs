/// Failures that reach the answer boundary.
///
/// Everything below context assembly degrades locally (fewer variants,
/// fewer chunks, unscored ranking); only these categories are reported
/// back to the user, and always as text.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("context error: {0}")]
    Context(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AnswerError {
    /// User-facing description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            AnswerError::Context(msg) => {
                format!("I encountered an issue retrieving information: {msg}")
            }
            AnswerError::Generation(msg) => {
                format!("I encountered an issue generating an explanation: {msg}")
            }
            AnswerError::Unexpected(msg) => format!("An unexpected error occurred: {msg}"),
        }
    }
}
