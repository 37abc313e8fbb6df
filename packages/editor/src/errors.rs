//! Error types for editor operations.

use crate::lookup::LookupId;
use thiserror::Error;

pub type EditResult<T> = Result<T, EditError>;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("parse error: {0}")]
    MarkupParse(#[from] easel_markup::ParseError),

    #[error("parse error: {0}")]
    StyleParse(#[from] easel_css::ParseError),

    #[error("marker not found: {0}")]
    MarkerNotFound(String),

    #[error("would create cycle")]
    CycleDetected,

    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

impl EditError {
    pub fn marker_not_found(id: &LookupId) -> Self {
        EditError::MarkerNotFound(id.to_string())
    }

    pub fn invalid_structure(message: impl Into<String>) -> Self {
        EditError::InvalidStructure(message.into())
    }
}
