// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendar query model: component selection and filter trees.

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::error::CalDavError;
use crate::types::Href;

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Formats a timestamp in the iCalendar UTC basic format (`20250101T000000Z`).
#[must_use]
pub fn format_utc(ts: Timestamp) -> String {
    ts.strftime(UTC_FORMAT).to_string()
}

/// Parses a timestamp in the iCalendar UTC basic format.
///
/// # Errors
///
/// Returns an error if the string is not in `YYYYMMDDTHHMMSSZ` form.
pub fn parse_utc(s: &str) -> Result<Timestamp, CalDavError> {
    DateTime::strptime(UTC_FORMAT, s)
        .map_err(|e| CalDavError::InvalidResponse(format!("Invalid datetime format: {e}")))?
        .to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp())
        .map_err(|e| CalDavError::InvalidResponse(format!("Datetime conversion error: {e}")))
}

/// A time interval used by filters and expansion. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: Option<Timestamp>,
    /// Exclusive end.
    pub end: Option<Timestamp>,
}

impl TimeRange {
    /// Creates a closed range.
    #[must_use]
    pub const fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns `true` if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Selects which components and properties the server returns in
/// `calendar-data`.
#[derive(Debug, Clone, Default)]
pub struct CompRequest {
    /// Component name, e.g. `VCALENDAR`. Empty requests the whole document.
    pub name: String,
    /// Return all properties of this component.
    pub all_props: bool,
    /// Property names to return.
    pub props: Vec<String>,
    /// Return all sub-components.
    pub all_comps: bool,
    /// Sub-component selections.
    pub comps: Vec<CompRequest>,
    /// Ask the server to expand recurrences within this range.
    pub expand: Option<TimeRange>,
}

impl CompRequest {
    /// Creates a selection for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Selects every property and sub-component.
    #[must_use]
    pub fn all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            all_props: true,
            all_comps: true,
            ..Self::default()
        }
    }

    /// Adds a property name.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>) -> Self {
        self.props.push(name.into());
        self
    }

    /// Adds a sub-component selection.
    #[must_use]
    pub fn comp(mut self, comp: Self) -> Self {
        self.comps.push(comp);
        self
    }
}

/// Matches calendar components (`comp-filter`).
#[derive(Debug, Clone, Default)]
pub struct CompFilter {
    /// Component name, e.g. `VCALENDAR` or `VEVENT`.
    pub name: String,
    /// Restrict matches to this interval.
    pub time_range: Option<TimeRange>,
    /// Property predicates.
    pub props: Vec<PropFilter>,
    /// Nested component predicates.
    pub comps: Vec<CompFilter>,
}

impl CompFilter {
    /// Creates a filter for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the time range.
    #[must_use]
    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Adds a nested component filter.
    #[must_use]
    pub fn comp(mut self, comp: Self) -> Self {
        self.comps.push(comp);
        self
    }

    /// Adds a property filter.
    #[must_use]
    pub fn prop(mut self, prop: PropFilter) -> Self {
        self.props.push(prop);
        self
    }
}

/// Matches a calendar property (`prop-filter`).
#[derive(Debug, Clone, Default)]
pub struct PropFilter {
    /// Property name, e.g. `SUMMARY`.
    pub name: String,
    /// Restrict the property value to this interval.
    pub time_range: Option<TimeRange>,
    /// Substring match on the property value. Not encoded when a bounded
    /// `time_range` is also set.
    pub text_match: Option<TextMatch>,
    /// Parameter predicates.
    pub param_filters: Vec<ParamFilter>,
}

impl PropFilter {
    /// Creates a filter for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the text match.
    #[must_use]
    pub fn text_match(mut self, text_match: TextMatch) -> Self {
        self.text_match = Some(text_match);
        self
    }

    /// Sets the time range.
    #[must_use]
    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Adds a parameter filter.
    #[must_use]
    pub fn param(mut self, param: ParamFilter) -> Self {
        self.param_filters.push(param);
        self
    }
}

/// Matches a property parameter (`param-filter`).
#[derive(Debug, Clone, Default)]
pub struct ParamFilter {
    /// Parameter name, e.g. `PARTSTAT`.
    pub name: String,
    /// Substring match on the parameter value.
    pub text_match: Option<TextMatch>,
}

impl ParamFilter {
    /// Creates a filter for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text_match: None,
        }
    }

    /// Sets the text match.
    #[must_use]
    pub fn text_match(mut self, text_match: TextMatch) -> Self {
        self.text_match = Some(text_match);
        self
    }
}

/// Text match filter for calendar queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatch {
    /// Text to search for.
    pub text: String,
    /// Whether to negate the match.
    pub negate: bool,
}

impl TextMatch {
    /// Creates a positive match.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            negate: false,
        }
    }

    /// Creates a negated match.
    #[must_use]
    pub fn negated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            negate: true,
        }
    }
}

/// A `calendar-query` REPORT: what to return and what to match.
#[derive(Debug, Clone, Default)]
pub struct CalendarQuery {
    /// Selection of returned data.
    pub comp_request: CompRequest,
    /// Filter tree; its root is normally `VCALENDAR`.
    pub comp_filter: CompFilter,
}

impl CalendarQuery {
    /// Creates a query returning full `VCALENDAR` documents matching `filter`.
    #[must_use]
    pub fn new(filter: CompFilter) -> Self {
        Self {
            comp_request: CompRequest::default(),
            comp_filter: filter,
        }
    }

    /// Creates a query for every `component` (e.g. `VEVENT`) in a calendar.
    #[must_use]
    pub fn component(component: impl Into<String>) -> Self {
        Self::new(CompFilter::new("VCALENDAR").comp(CompFilter::new(component)))
    }

    /// Returns a copy of this query with `options` applied.
    ///
    /// A time range is injected into the first direct child of the filter
    /// root named `VEVENT`; without such a child the range is dropped. The
    /// copy is deep, so the caller's query is never modified.
    #[must_use]
    pub fn with_options(&self, options: &QueryOptions) -> Self {
        let mut query = self.clone();
        if let Some(range) = options.range() {
            match query.comp_filter.comps.iter_mut().find(|c| c.name == "VEVENT") {
                Some(event) => event.time_range = Some(range),
                None => tracing::debug!("no VEVENT filter, dropping time range"),
            }
        }
        query
    }
}

/// A `calendar-multiget` REPORT.
#[derive(Debug, Clone, Default)]
pub struct CalendarMultiGet {
    /// Resources to fetch. Empty fetches the request path itself.
    pub paths: Vec<Href>,
    /// Selection of returned data.
    pub comp_request: CompRequest,
}

impl CalendarMultiGet {
    /// Creates a multiget for `paths` returning full documents.
    #[must_use]
    pub fn new(paths: Vec<Href>) -> Self {
        Self {
            paths,
            comp_request: CompRequest::default(),
        }
    }
}

/// Optional parameters for [`CalDavClient::query_calendar`](crate::CalDavClient::query_calendar).
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Start of the event time range.
    pub time_range_start: Option<Timestamp>,
    /// End of the event time range.
    pub time_range_end: Option<Timestamp>,
    /// Reserved; queries do not use sync tokens.
    pub sync_token: Option<String>,
}

impl QueryOptions {
    /// Options restricting events to `[start, end)`.
    #[must_use]
    pub const fn time_range(start: Timestamp, end: Timestamp) -> Self {
        Self {
            time_range_start: Some(start),
            time_range_end: Some(end),
            sync_token: None,
        }
    }

    fn range(&self) -> Option<TimeRange> {
        let range = TimeRange {
            start: self.time_range_start,
            end: self.time_range_end,
        };
        (!range.is_unbounded()).then_some(range)
    }
}
