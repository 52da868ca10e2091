// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` protocol engine (RFC 4791, RFC 6578).
//!
//! Encodes calendar queries, decodes multistatus answers, performs
//! conditional writes with pluggable conflict resolution and drives
//! incremental synchronization with sync tokens.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod client;
pub mod codec;
mod config;
mod conflict;
mod error;
mod http;
mod query;
mod request;
mod response;
mod sync;
mod types;
mod xml;

pub use crate::client::{CalDavClient, PutOptions};
pub use crate::config::{AuthMethod, CalDavConfig};
pub use crate::conflict::{
    AlwaysUseLocal, AlwaysUseRemote, ConflictDecision, ConflictResolver, LastModifiedWins,
    missing_object_decision,
};
pub use crate::error::CalDavError;
pub use crate::http::parse_http_date;
pub use crate::query::{
    CalendarMultiGet, CalendarQuery, CompFilter, CompRequest, ParamFilter, PropFilter,
    QueryOptions, TextMatch, TimeRange, format_utc, parse_utc,
};
pub use crate::request::{
    CalendarMultiGetRequest, CalendarQueryRequest, Prop, PropFindRequest, SyncCollectionRequest,
};
pub use crate::response::{
    CalendarObjectList, MultiStatusResponse, PropStat, Properties, ResponseItem, status_code,
};
pub use crate::sync::{SyncChange, SyncDeletedItem, SyncLevel, SyncOptions, SyncResult};
pub use crate::types::{Calendar, CalendarObject, ConditionalMatch, Depth, ETag, Href};
