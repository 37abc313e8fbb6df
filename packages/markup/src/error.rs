use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },
}

impl ParseError {
    pub fn unexpected_token(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedToken { pos, .. }
            | Self::UnexpectedEof { pos }
            | Self::InvalidSyntax { pos, .. } => *pos,
        }
    }

    /// Renders the error as an annotated snippet of the offending source.
    #[cfg(feature = "pretty-errors")]
    pub fn to_report(&self, source: &str) -> String {
        use ariadne::{Label, Report, ReportKind, Source};

        let pos = self.position().min(source.len());
        let end = source.len().min(pos + 1).max(pos);
        let mut out = Vec::new();
        let result = Report::build(ReportKind::Error, (), pos)
            .with_message(self.to_string())
            .with_label(Label::new(pos..end).with_message("here"))
            .finish()
            .write(Source::from(source), &mut out);
        match result {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
