use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LivepostError>;

/// Top-level error for setting construction, persistence and configuration.
///
/// Construction failures (`IllegalSettingId`, `UnrecognizedPostType`,
/// `ComponentNotInstantiated`) are fatal to the setting being built and are
/// never retried. Sanitization failures are recoverable per setting and are
/// wrapped here when they abort a save.
#[derive(Debug, Error)]
pub enum LivepostError {
    /// The setting id string does not match the canonical grammar.
    /// Carries the offending id for diagnosability.
    #[error("illegal setting id: {0}")]
    IllegalSettingId(String),

    /// The id parsed, but its subtype is not a previewable post type.
    #[error("unrecognized post type: {post_type}")]
    UnrecognizedPostType { post_type: String },

    /// The manager has no posts component to resolve fields against.
    #[error("posts component not instantiated")]
    ComponentNotInstantiated,

    /// A staged value was rejected during sanitization.
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),

    /// The underlying content-record store rejected a write.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] confique::Error),
}

/// A rejected value, raised while sanitizing client input.
///
/// Recoverable: the caller may re-prompt or drop the single write without
/// aborting the whole request. Every variant carries a stable machine
/// code (see [`SanitizeError::code`]) so batch-save logic can decide
/// partial-success handling without string matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// A multi-valued field was handed something other than a sequence.
    #[error("expected an array of values")]
    ExpectedSequence,

    /// The storage layer vetoed the write outright.
    #[error("the value cannot be saved")]
    NotAllowed,

    /// A page template not offered by the current theme.
    #[error("invalid page template: {template}")]
    InvalidPageTemplate { template: String },

    /// A date string that does not match the accepted format.
    #[error("invalid date: {raw}")]
    InvalidDate { raw: String },

    /// A malformed email address.
    #[error("invalid email address: {raw}")]
    InvalidEmail { raw: String },

    /// An author reference that is not a positive id.
    #[error("author must be a positive id")]
    InvalidAuthor,
}

impl SanitizeError {
    /// Stable machine-readable code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            SanitizeError::ExpectedSequence => "expected_array",
            SanitizeError::NotAllowed => "not_allowed",
            SanitizeError::InvalidPageTemplate { .. } => "invalid_page_template",
            SanitizeError::InvalidDate { .. } => "invalid_date",
            SanitizeError::InvalidEmail { .. } => "invalid_email",
            SanitizeError::InvalidAuthor => "invalid_author",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_name_the_offender() {
        let err = LivepostError::IllegalSettingId("postmeta[post][food]".into());
        assert!(err.to_string().contains("postmeta[post][food]"));

        let err = LivepostError::UnrecognizedPostType {
            post_type: "food".into(),
        };
        assert!(err.to_string().contains("food"));
    }

    #[test]
    fn sanitize_codes_are_stable() {
        assert_eq!(SanitizeError::ExpectedSequence.code(), "expected_array");
        assert_eq!(SanitizeError::NotAllowed.code(), "not_allowed");
        assert_eq!(
            SanitizeError::InvalidPageTemplate {
                template: "bad-template.php".into()
            }
            .code(),
            "invalid_page_template"
        );
        assert_eq!(
            SanitizeError::InvalidDate { raw: "soon".into() }.code(),
            "invalid_date"
        );
    }

    #[test]
    fn sanitize_error_lifts_into_umbrella() {
        let err: LivepostError = SanitizeError::NotAllowed.into();
        match err {
            LivepostError::Sanitize(inner) => assert_eq!(inner.code(), "not_allowed"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
