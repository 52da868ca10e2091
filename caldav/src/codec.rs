// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Bridge to the iCalendar parser and formatter.

use aimcal_ical::{ICalendar, formatter, parse};

use crate::error::CalDavError;

/// MIME type of iCalendar documents.
pub const MIME_TYPE: &str = "text/calendar";

/// Decodes the first calendar of an iCalendar stream.
///
/// Surrounding whitespace is dropped and line endings are normalized to CRLF
/// first, since XML transport and some servers rewrite them.
///
/// # Errors
///
/// Returns [`CalDavError::Ical`] if the data is not valid iCalendar or holds
/// no calendar.
pub fn decode(data: &str) -> Result<ICalendar<String>, CalDavError> {
    let data = normalize_line_endings(data);
    let calendars = parse(&data).map_err(|e| CalDavError::Ical(format!("Parse error: {e:?}")))?;

    calendars
        .into_iter()
        .next()
        .map(|calendar| calendar.to_owned())
        .ok_or_else(|| CalDavError::Ical("No calendar data found".to_string()))
}

/// Encodes a calendar into an iCalendar stream.
///
/// # Errors
///
/// Returns [`CalDavError::Ical`] if formatting fails.
pub fn encode(calendar: &ICalendar<String>) -> Result<String, CalDavError> {
    formatter::format(calendar).map_err(|e| CalDavError::Ical(format!("Formatter error: {e}")))
}

fn normalize_line_endings(data: &str) -> String {
    let mut out = String::with_capacity(data.len() + 2);
    for line in data.trim().lines() {
        out.push_str(line.trim_end_matches('\r'));
        out.push_str("\r\n");
    }
    out
}
