// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::types::Href;

/// `CalDAV` client errors.
///
/// The unit variants are sentinels: callers match on them to implement their
/// own recovery. Transport and decode failures are carried as opaque text.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CalDavError {
    /// HTTP transport error (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with an unexpected status code.
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Response body, if readable.
        body: String,
    },

    /// XML parsing/writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// iCalendar parsing or formatting error.
    #[error("iCalendar error: {0}")]
    Ical(String),

    /// A response entry carried an href that cannot be used as a path.
    #[error("invalid href: {0}")]
    InvalidHref(String),

    /// Conditional write rejected (HTTP 412) and not overridden by a resolver.
    #[error("precondition failed (HTTP 412)")]
    PreconditionFailed,

    /// Server no longer accepts the sync token (HTTP 410); restart with an empty token.
    #[error("sync token expired (HTTP 410)")]
    SyncTokenExpired,

    /// The conflict resolver chose to merge, which is not supported.
    #[error("merge conflict resolution not supported")]
    MergeNotSupported,

    /// Resource conflict.
    #[error("resource conflict: {0}")]
    Conflict(Href),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(Href),

    /// Invalid response from server.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CalDavError {
    /// Returns `true` for [`CalDavError::PreconditionFailed`].
    #[must_use]
    pub const fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed)
    }

    /// Returns `true` for [`CalDavError::SyncTokenExpired`].
    #[must_use]
    pub const fn is_sync_token_expired(&self) -> bool {
        matches!(self, Self::SyncTokenExpired)
    }

    /// Returns the HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::PreconditionFailed => Some(412),
            Self::SyncTokenExpired => Some(410),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CalDavError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<quick_xml::Error> for CalDavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for CalDavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}
