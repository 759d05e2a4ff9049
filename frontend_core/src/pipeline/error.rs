use crate::logging::{codes, Code};
use crate::source::SourceError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Unknown language '{name}' (expected 'cmake' or 'cpp')")]
    UnknownLanguage { name: String },

    #[error("Cannot infer language for {path}; pass --lang")]
    LanguageNotInferred { path: String },
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            PipelineError::Source(e) => e.error_code(),
            PipelineError::UnknownLanguage { .. } | PipelineError::LanguageNotInferred { .. } => {
                codes::system::INTERNAL_ERROR
            }
        }
    }
}
