// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

use aimcal_ical::ICalendar;
use jiff::Timestamp;

/// Calendar resource href (path).
///
/// A `Href` represents the server-relative path to a calendar resource on a
/// `CalDAV` server, such as `/calendars/user/event1.ics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path segment, ignoring a trailing slash.
    #[must_use]
    pub fn file_name(&self) -> &str {
        let trimmed = self.0.strip_suffix('/').unwrap_or(&self.0);
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for change detection.
///
/// An `ETag` is kept exactly as the server sent it, quoted or not. It is only
/// ever compared for equality or replayed in a conditional header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// Value of an `If-Match` / `If-None-Match` header.
///
/// Sent verbatim. RFC 7232 wants opaque tags double-quoted, but servers
/// differ, so quoting is left to the caller; [`ConditionalMatch::from_etag`]
/// helps with the common case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalMatch(String);

impl ConditionalMatch {
    /// Creates a match token from a raw header value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// The wildcard token `*`.
    #[must_use]
    pub fn any() -> Self {
        Self("*".to_string())
    }

    /// Builds a token from an entity tag, adding double quotes if missing.
    #[must_use]
    pub fn from_etag(etag: &ETag) -> Self {
        let raw = etag.as_str();
        if raw.starts_with('"') || raw.starts_with("W/\"") {
            Self(raw.to_string())
        } else {
            Self(format!("\"{raw}\""))
        }
    }

    /// Returns `true` for the wildcard token.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == "*"
    }

    /// Returns the header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConditionalMatch {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConditionalMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `WebDAV` traversal depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Depth {
    /// The resource itself.
    Zero,
    /// The resource and its direct members.
    #[default]
    One,
    /// The resource and all descendants.
    Infinity,
}

impl Depth {
    /// Value of the `Depth` header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Infinity => "infinity",
        }
    }
}

/// A calendar object resource.
///
/// Produced fresh by every read or write; two objects with the same `href`
/// may carry different `etag`s taken at different points in time.
#[derive(Debug, Clone, Default)]
pub struct CalendarObject {
    /// The server-relative path of the resource.
    pub href: Href,
    /// The entity tag of the resource, if the server reported one.
    pub etag: Option<ETag>,
    /// Last modification time, if the server reported one.
    pub mod_time: Option<Timestamp>,
    /// Content length in bytes, zero when unknown.
    pub content_length: u64,
    /// The iCalendar document, absent when only metadata was fetched.
    pub data: Option<ICalendar<String>>,
}

impl CalendarObject {
    /// Creates a metadata-less object for `href`.
    #[must_use]
    pub fn new(href: Href) -> Self {
        Self {
            href,
            ..Self::default()
        }
    }

    /// Attaches an iCalendar document.
    #[must_use]
    pub fn with_data(mut self, data: ICalendar<String>) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the entity tag.
    #[must_use]
    pub fn with_etag(mut self, etag: ETag) -> Self {
        self.etag = Some(etag);
        self
    }

    /// Sets the modification time.
    #[must_use]
    pub fn with_mod_time(mut self, mod_time: Timestamp) -> Self {
        self.mod_time = Some(mod_time);
        self
    }
}

/// Calendar collection metadata.
///
/// Represents a calendar collection found under a calendar home set.
#[derive(Debug, Clone)]
pub struct Calendar {
    /// The href of the calendar collection.
    pub href: Href,
    /// The display name of the calendar.
    pub display_name: Option<String>,
    /// The description of the calendar.
    pub description: Option<String>,
    /// Maximum accepted resource size in bytes, if advertised.
    pub max_resource_size: Option<u64>,
    /// Supported component types (VEVENT, VTODO, etc.).
    pub supported_components: Vec<String>,
}

impl Calendar {
    /// Creates a new `Calendar`.
    #[must_use]
    pub fn new(href: Href) -> Self {
        Self {
            href,
            display_name: None,
            description: None,
            max_resource_size: None,
            supported_components: Vec::new(),
        }
    }
}
