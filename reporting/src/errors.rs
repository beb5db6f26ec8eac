use thiserror::Error;

/// Result type alias for report parsing operations
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Errors that can occur while turning a request body into normalized records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{0:?} is not a supported content-type")]
    UnsupportedContentType(String),

    #[error("malformed content-type {content_type:?}: {reason}")]
    MalformedContentType {
        content_type: String,
        reason: &'static str,
    },

    #[error("malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("{0} is required")]
    MissingRequiredField(&'static str),

    #[error("unknown report type: {0:?}")]
    UnknownReportType(String),

    #[error("invalid service tag {tag:?}: {reason}")]
    InvalidServiceTag { tag: String, reason: &'static str },
}

impl ParseError {
    /// Short machine-readable name, used as a metric tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::UnsupportedContentType(_) => "unsupported_content_type",
            ParseError::MalformedContentType { .. } => "malformed_content_type",
            ParseError::MalformedJson(_) => "malformed_json",
            ParseError::MissingRequiredField(_) => "missing_required_field",
            ParseError::UnknownReportType(_) => "unknown_report_type",
            ParseError::InvalidServiceTag { .. } => "invalid_service_tag",
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::MalformedJson(err.to_string())
    }
}
