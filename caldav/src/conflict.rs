// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Conflict resolution for rejected conditional writes.

use std::fmt;

use crate::types::CalendarObject;

/// What to do when a conditional write was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictDecision {
    /// Overwrite the server copy with the local one, without a precondition.
    UseLocal,
    /// Keep the server copy and drop the local change.
    UseRemote,
    /// Merge both copies. Reserved: the client answers with
    /// [`CalDavError::MergeNotSupported`](crate::CalDavError::MergeNotSupported).
    Merge,
    /// Give up and report the precondition failure to the caller.
    Skip,
}

impl ConflictDecision {
    /// Stable lowercase name of the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UseLocal => "use_local",
            Self::UseRemote => "use_remote",
            Self::Merge => "merge",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for ConflictDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy consulted when a conditional write fails with HTTP 412.
///
/// `local` is the object the caller tried to write; `remote` is the server
/// copy fetched after the conflict was detected. Implementations must honor
/// the missing-object rules of [`missing_object_decision`] before applying
/// their own policy.
pub trait ConflictResolver: fmt::Debug + Send + Sync {
    /// Decides between the local and the remote copy.
    fn resolve(
        &self,
        local: Option<&CalendarObject>,
        remote: Option<&CalendarObject>,
    ) -> ConflictDecision;
}

/// Decision forced by a missing side, shared by every resolver: both missing
/// is [`Skip`](ConflictDecision::Skip), a missing local side is
/// [`UseRemote`](ConflictDecision::UseRemote), a missing remote side is
/// [`UseLocal`](ConflictDecision::UseLocal).
#[must_use]
pub const fn missing_object_decision(
    local: Option<&CalendarObject>,
    remote: Option<&CalendarObject>,
) -> Option<ConflictDecision> {
    match (local, remote) {
        (None, None) => Some(ConflictDecision::Skip),
        (None, Some(_)) => Some(ConflictDecision::UseRemote),
        (Some(_), None) => Some(ConflictDecision::UseLocal),
        (Some(_), Some(_)) => None,
    }
}

/// The copy with the later modification time wins; ties favor local.
///
/// A copy without a modification time counts as older than any dated copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastModifiedWins;

impl ConflictResolver for LastModifiedWins {
    fn resolve(
        &self,
        local: Option<&CalendarObject>,
        remote: Option<&CalendarObject>,
    ) -> ConflictDecision {
        if let Some(decision) = missing_object_decision(local, remote) {
            return decision;
        }
        let local_time = local.and_then(|o| o.mod_time);
        let remote_time = remote.and_then(|o| o.mod_time);

        // Option orders None before Some, so undated copies lose.
        if remote_time > local_time {
            ConflictDecision::UseRemote
        } else {
            ConflictDecision::UseLocal
        }
    }
}

/// Always keeps the local copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysUseLocal;

impl ConflictResolver for AlwaysUseLocal {
    fn resolve(
        &self,
        local: Option<&CalendarObject>,
        remote: Option<&CalendarObject>,
    ) -> ConflictDecision {
        missing_object_decision(local, remote).unwrap_or(ConflictDecision::UseLocal)
    }
}

/// Always keeps the remote copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysUseRemote;

impl ConflictResolver for AlwaysUseRemote {
    fn resolve(
        &self,
        local: Option<&CalendarObject>,
        remote: Option<&CalendarObject>,
    ) -> ConflictDecision {
        missing_object_decision(local, remote).unwrap_or(ConflictDecision::UseRemote)
    }
}
