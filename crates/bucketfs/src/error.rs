// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for contents operations

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`crate::ContentsManager`]
///
/// Each variant maps onto an HTTP-equivalent status via [`Error::status_code`]
/// so that a host can translate failures without inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A container or object that was required to exist is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller may not perform this operation at this path
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A directory was expected but a file was found, or the reverse
    #[error("Type conflict: {0}")]
    TypeConflict(String),

    /// Undecodable content, unparsable document or unsupported format token
    #[error("Bad format: {0}")]
    BadFormat(String),

    /// The requested path cannot be used for this operation
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Unclassified failure while writing
    #[error("Unexpected error while saving file: {path} {message}")]
    Unexpected { path: String, message: String },

    #[error("Object store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub fn not_found<S: AsRef<str>>(what: S) -> Self {
        Error::NotFound(what.as_ref().to_string())
    }

    pub fn forbidden<S: AsRef<str>>(what: S) -> Self {
        Error::Forbidden(what.as_ref().to_string())
    }

    pub fn type_conflict<S: AsRef<str>>(what: S) -> Self {
        Error::TypeConflict(what.as_ref().to_string())
    }

    pub fn bad_format<S: AsRef<str>>(what: S) -> Self {
        Error::BadFormat(what.as_ref().to_string())
    }

    pub fn invalid_path<S: AsRef<str>>(what: S) -> Self {
        Error::InvalidPath(what.as_ref().to_string())
    }

    pub fn unexpected<P: AsRef<str>, M: std::fmt::Display>(path: P, message: M) -> Self {
        Error::Unexpected {
            path: path.as_ref().to_string(),
            message: message.to_string(),
        }
    }

    /// True for the kinds a host reports as client errors (4xx)
    #[must_use]
    pub fn is_classified(&self) -> bool {
        !matches!(self, Error::Unexpected { .. } | Error::Store(_))
    }

    /// HTTP-equivalent status for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::Forbidden(_) => 403,
            Error::TypeConflict(_) | Error::BadFormat(_) | Error::InvalidPath(_) => 400,
            Error::Unexpected { .. } => 500,
            Error::Store(StoreError::NotFound(_)) => 404,
            Error::Store(StoreError::Forbidden(_)) => 403,
            Error::Store(StoreError::InvalidName(_)) => 400,
            Error::Store(_) => 500,
        }
    }
}
