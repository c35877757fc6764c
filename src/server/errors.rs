use thiserror::Error;

use crate::ChatbotError;

pub const EMPTY_MESSAGE_REPLY: &str = "Por favor escribe algo.";
pub const NOT_READY_REPLY: &str = "Error técnico: El cerebro del bot no pudo cargar.";
pub const INTERNAL_ERROR_REPLY: &str =
    "Lo siento, tuve un error interno al procesar tu pregunta.";

/// Reasons a chat request does not get a model answer
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Request has no message")]
    EmptyMessage,

    #[error("No answering pipeline is loaded")]
    NotReady,

    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] ChatbotError),
}

impl ChatError {
    /// The text sent back to the user in place of an answer
    #[inline]
    pub fn reply(&self) -> &'static str {
        match self {
            Self::EmptyMessage => EMPTY_MESSAGE_REPLY,
            Self::NotReady => NOT_READY_REPLY,
            Self::Pipeline(_) => INTERNAL_ERROR_REPLY,
        }
    }
}
