// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Incremental synchronization over `sync-collection` (RFC 6578).

use crate::codec;
use crate::error::CalDavError;
use crate::response::{MultiStatusResponse, ResponseItem};
use crate::types::{CalendarObject, Href};

/// Scope of a `sync-collection` report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncLevel {
    /// Direct members of the collection.
    #[default]
    One,
    /// All descendants of the collection.
    Infinite,
}

impl SyncLevel {
    /// Value of the `DAV:sync-level` element.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Infinite => "infinite",
        }
    }
}

/// Options for [`CalDavClient::sync_calendar`](crate::CalDavClient::sync_calendar).
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Scope of the report.
    pub sync_level: SyncLevel,
    /// Upper bound on returned changes, if the server honors it.
    pub limit: Option<u32>,
}

/// A resource reported as removed since the last token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncDeletedItem {
    /// Server-relative path of the removed resource. Never empty.
    pub path: Href,
    /// The UID of the removed object, when known.
    pub uid: Option<String>,
}

impl SyncDeletedItem {
    /// Creates an entry for `path` with its UID derived from the path.
    #[must_use]
    pub fn new(path: Href) -> Self {
        let uid = uid_from_path(&path);
        let uid = (!uid.is_empty()).then(|| uid.to_string());
        Self { path, uid }
    }

    /// Returns the explicit UID, or the last path segment without `.ics`.
    ///
    /// An empty path, or a segment that is exactly `.ics`, yields an empty
    /// string.
    #[must_use]
    pub fn extract_uid(&self) -> &str {
        match self.uid.as_deref() {
            Some(uid) if !uid.is_empty() => uid,
            _ => uid_from_path(&self.path),
        }
    }
}

fn uid_from_path(path: &str) -> &str {
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.strip_suffix(".ics").unwrap_or(segment)
}

/// Outcome of one synchronization call.
///
/// The token is opaque; persist it and pass it back on the next call.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Objects that appeared since the last token.
    pub created: Vec<CalendarObject>,
    /// Objects that changed. Metadata-only changes carry no `data`.
    pub updated: Vec<CalendarObject>,
    /// Objects that were removed.
    pub deleted: Vec<SyncDeletedItem>,
    /// The new collection sync token.
    pub sync_token: String,
}

impl SyncResult {
    /// Number of created, updated and deleted entries.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }

    /// Builds the result of a `sync-collection` answer for `collection`.
    ///
    /// The entry describing the collection itself is skipped, as are entries
    /// with an unusable href or an unrecognized status.
    ///
    /// # Errors
    ///
    /// Returns an error if a calendar document cannot be decoded.
    pub fn from_multistatus(
        ms: MultiStatusResponse,
        collection: &Href,
    ) -> Result<Self, CalDavError> {
        let mut result = Self {
            sync_token: ms.sync_token.unwrap_or_default(),
            ..Self::default()
        };

        for response in ms.responses {
            let path = match response.path() {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(%err, "skipping sync entry");
                    continue;
                }
            };
            if same_collection(&path, collection) {
                continue;
            }

            let data = response
                .prop(|p| p.calendar_data.clone())
                .filter(|d| !d.trim().is_empty());

            match SyncChange::classify(response.status_text(), data.is_some()) {
                SyncChange::Deleted => result.deleted.push(SyncDeletedItem::new(path)),
                SyncChange::Created => result.created.push(decode_object(&response, path, data)?),
                SyncChange::Updated => result.updated.push(decode_object(&response, path, data)?),
                SyncChange::MetadataOnly => result.updated.push(response.object_metadata(path)),
                SyncChange::Unrecognized => {
                    tracing::warn!(
                        href = %path,
                        status = response.status_text(),
                        "unrecognized sync status, skipping"
                    );
                }
            }
        }

        Ok(result)
    }
}

fn decode_object(
    response: &ResponseItem,
    path: Href,
    data: Option<String>,
) -> Result<CalendarObject, CalDavError> {
    let mut object = response.object_metadata(path);
    if let Some(data) = data {
        object.data = Some(codec::decode(&data)?);
    }
    Ok(object)
}

fn same_collection(path: &str, collection: &str) -> bool {
    path.trim_end_matches('/') == collection.trim_end_matches('/')
}

/// Classification of one `sync-collection` entry.
///
/// Providers format status lines inconsistently, so matching is done on
/// substrings of the status text rather than a parsed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncChange {
    /// Status mentions 404: the resource is gone.
    Deleted,
    /// Status mentions both 200 and 201 and a document was returned.
    // NOTE: no provider is known to emit this combination.
    Created,
    /// Status mentions 200 and a document was returned.
    Updated,
    /// Status mentions 200 but only metadata was returned.
    MetadataOnly,
    /// None of the above.
    Unrecognized,
}

impl SyncChange {
    /// Classifies an entry from its status text and whether it carried data.
    #[must_use]
    pub fn classify(status: &str, has_data: bool) -> Self {
        if status.contains("404") {
            Self::Deleted
        } else if status.contains("200") {
            match (has_data, status.contains("201")) {
                (true, true) => Self::Created,
                (true, false) => Self::Updated,
                (false, _) => Self::MetadataOnly,
            }
        } else {
            Self::Unrecognized
        }
    }
}
