//! # draftloop-error
//!
//! Unified error handling for draftloop.
//!
//! - **ErrorKind**: what went wrong (e.g. `CredentialMissing`, `InferenceFailed`)
//! - **ErrorStatus**: whether retrying could help
//! - **Context**: operation name plus key-value pairs for locating the cause
//! - **Source**: the wrapped underlying error, never leaked as a raw type
//!
//! ```rust
//! use draftloop_error::{Error, ErrorKind};
//!
//! fn load() -> draftloop_error::Result<()> {
//!     Err(Error::new(ErrorKind::ConfigInvalid, "unknown field `modle`")
//!         .with_operation("config::load")
//!         .with_context("path", "draftloop.toml"))
//! }
//!
//! assert_eq!(load().unwrap_err().kind(), ErrorKind::ConfigInvalid);
//! ```
//!
//! Workflow step failures are not `Error`s: they are recorded as tagged
//! strings on the session record. This crate covers everything around the
//! workflow (configuration, credentials, provider setup, serving).

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using draftloop Error
pub type Result<T> = std::result::Result<T, Error>;
