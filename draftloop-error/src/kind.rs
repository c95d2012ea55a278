//! Error kinds for draftloop operations

use std::fmt;

/// The kind of error that occurred.
///
/// Match on this to decide how to react; the message is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General
    // =========================================================================
    /// Catch-all for unhandled cases
    Unexpected,

    /// The requested feature is not supported
    Unsupported,

    /// Invalid argument passed to a function
    InvalidArgument,

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Configuration file or flag is malformed
    ConfigInvalid,

    /// Required credential (API key) is absent
    CredentialMissing,

    /// Prompt template is malformed
    TemplateInvalid,

    // =========================================================================
    // Completion service
    // =========================================================================
    /// Model call failed
    InferenceFailed,

    /// Provider endpoint not reachable or not configured
    ProviderUnavailable,

    /// Rate limit or quota exceeded
    RateLimited,

    /// Provider rejected the credential
    AuthenticationFailed,

    /// Network error
    NetworkFailed,

    /// Failed to parse a response or input
    ParseFailed,

    // =========================================================================
    // IO
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// Other IO failure
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::CredentialMissing => "CredentialMissing",
            ErrorKind::TemplateInvalid => "TemplateInvalid",

            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::ParseFailed => "ParseFailed",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
