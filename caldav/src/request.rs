// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request builders for `CalDAV` operations.

use crate::error::CalDavError;
use crate::query::{
    CalendarMultiGet, CalendarQuery, CompFilter, CompRequest, ParamFilter, PropFilter, TextMatch,
    TimeRange, format_utc,
};
use crate::sync::SyncOptions;
use crate::types::Href;
use crate::xml::{XmlWriter, ns};

/// PROPFIND request builder.
#[derive(Debug)]
pub struct PropFindRequest {
    props: Vec<Prop>,
}

/// Properties to request in PROPFIND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prop {
    /// Display name.
    DisplayName,
    /// Resource type.
    ResourceType,
    /// Principal of the authenticated user.
    CurrentUserPrincipal,
    /// Calendar home set.
    CalendarHomeSet,
    /// Supported calendar components.
    SupportedCalendarComponents,
    /// Calendar description.
    CalendarDescription,
    /// Maximum resource size.
    MaxResourceSize,
}

impl Prop {
    const fn name(self) -> &'static str {
        match self {
            Self::DisplayName => "displayname",
            Self::ResourceType => "resourcetype",
            Self::CurrentUserPrincipal => "current-user-principal",
            Self::CalendarHomeSet => "calendar-home-set",
            Self::SupportedCalendarComponents => "supported-calendar-component-set",
            Self::CalendarDescription => "calendar-description",
            Self::MaxResourceSize => "max-resource-size",
        }
    }

    const fn is_caldav(self) -> bool {
        match self {
            Self::DisplayName | Self::ResourceType | Self::CurrentUserPrincipal => false,
            Self::CalendarHomeSet
            | Self::SupportedCalendarComponents
            | Self::CalendarDescription
            | Self::MaxResourceSize => true,
        }
    }

    fn qualified_name(self) -> String {
        let prefix = if self.is_caldav() { "C" } else { "D" };
        format!("{prefix}:{}", self.name())
    }
}

impl PropFindRequest {
    /// Creates a new PROPFIND request.
    #[must_use]
    pub fn new() -> Self {
        Self { props: Vec::new() }
    }

    /// Adds a property to the request.
    pub fn add_property(&mut self, prop: Prop) -> &mut Self {
        self.props.push(prop);
        self
    }

    /// Builds the XML body for the PROPFIND request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut w = XmlWriter::new();

        // <D:propfind xmlns:D="DAV:">
        if self.props.iter().any(|p| p.is_caldav()) {
            w.start("D:propfind", &[("xmlns:D", ns::DAV), ("xmlns:C", ns::CALDAV)])?;
        } else {
            w.start("D:propfind", &[("xmlns:D", ns::DAV)])?;
        }

        w.start("D:prop", &[])?;
        for prop in &self.props {
            w.empty(&prop.qualified_name(), &[])?;
        }
        w.end("D:prop")?;

        w.end("D:propfind")?;
        w.finish()
    }
}

impl Default for PropFindRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Calendar query request builder.
#[derive(Debug)]
pub struct CalendarQueryRequest<'a> {
    query: &'a CalendarQuery,
}

impl<'a> CalendarQueryRequest<'a> {
    /// Creates a request for `query`.
    #[must_use]
    pub const fn new(query: &'a CalendarQuery) -> Self {
        Self { query }
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut w = XmlWriter::new();

        // <C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
        w.start(
            "C:calendar-query",
            &[("xmlns:D", ns::DAV), ("xmlns:C", ns::CALDAV)],
        )?;

        write_object_props(&mut w, &self.query.comp_request)?;

        w.start("C:filter", &[])?;
        write_comp_filter(&mut w, &self.query.comp_filter)?;
        w.end("C:filter")?;

        w.end("C:calendar-query")?;
        w.finish()
    }
}

/// Calendar multiget request builder.
#[derive(Debug)]
pub struct CalendarMultiGetRequest<'a> {
    multiget: &'a CalendarMultiGet,
    fallback: &'a Href,
}

impl<'a> CalendarMultiGetRequest<'a> {
    /// Creates a request for `multiget`; `fallback` is fetched when the
    /// multiget names no paths.
    #[must_use]
    pub const fn new(multiget: &'a CalendarMultiGet, fallback: &'a Href) -> Self {
        Self { multiget, fallback }
    }

    /// Builds the XML body for the calendar multiget request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut w = XmlWriter::new();

        // <C:calendar-multiget xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
        w.start(
            "C:calendar-multiget",
            &[("xmlns:D", ns::DAV), ("xmlns:C", ns::CALDAV)],
        )?;

        write_object_props(&mut w, &self.multiget.comp_request)?;

        if self.multiget.paths.is_empty() {
            w.text_element("D:href", self.fallback.as_str())?;
        } else {
            for href in &self.multiget.paths {
                w.text_element("D:href", href.as_str())?;
            }
        }

        w.end("C:calendar-multiget")?;
        w.finish()
    }
}

/// `sync-collection` request builder (RFC 6578).
#[derive(Debug)]
pub struct SyncCollectionRequest<'a> {
    sync_token: &'a str,
    options: &'a SyncOptions,
}

impl<'a> SyncCollectionRequest<'a> {
    /// Creates a request; an empty token asks for an initial sync.
    #[must_use]
    pub const fn new(sync_token: &'a str, options: &'a SyncOptions) -> Self {
        Self {
            sync_token,
            options,
        }
    }

    /// Builds the XML body for the sync-collection request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, CalDavError> {
        let mut w = XmlWriter::new();

        w.start(
            "D:sync-collection",
            &[("xmlns:D", ns::DAV), ("xmlns:C", ns::CALDAV)],
        )?;

        if self.sync_token.is_empty() {
            w.empty("D:sync-token", &[])?;
        } else {
            w.text_element("D:sync-token", self.sync_token)?;
        }
        w.text_element("D:sync-level", self.options.sync_level.as_str())?;

        if let Some(limit) = self.options.limit {
            w.start("D:limit", &[])?;
            w.text_element("D:nresults", &limit.to_string())?;
            w.end("D:limit")?;
        }

        // Some providers only inline calendar-data for part of the changes,
        // so the ETag is always requested alongside it.
        w.start("D:prop", &[])?;
        w.empty("D:getetag", &[])?;
        w.empty("C:calendar-data", &[])?;
        w.end("D:prop")?;

        w.end("D:sync-collection")?;
        w.finish()
    }
}

/// Writes the `<D:prop>` block shared by calendar-query and multiget.
fn write_object_props(w: &mut XmlWriter, comp_request: &CompRequest) -> Result<(), CalDavError> {
    w.start("D:prop", &[])?;

    if comp_request.name.is_empty() && comp_request.expand.is_none() {
        w.empty("C:calendar-data", &[])?;
    } else {
        w.start("C:calendar-data", &[])?;
        if !comp_request.name.is_empty() {
            write_comp_request(w, comp_request)?;
        }
        if let Some(expand) = &comp_request.expand {
            write_time_range(w, "C:expand", expand)?;
        }
        w.end("C:calendar-data")?;
    }

    w.empty("D:getlastmodified", &[])?;
    w.empty("D:getetag", &[])?;
    w.empty("D:getcontentlength", &[])?;
    w.end("D:prop")
}

fn write_comp_request(w: &mut XmlWriter, comp: &CompRequest) -> Result<(), CalDavError> {
    w.start("C:comp", &[("name", comp.name.as_str())])?;

    if comp.all_props {
        w.empty("C:allprop", &[])?;
    }
    for name in &comp.props {
        w.empty("C:prop", &[("name", name.as_str())])?;
    }

    if comp.all_comps {
        w.empty("C:allcomp", &[])?;
    }
    for child in &comp.comps {
        write_comp_request(w, child)?;
    }

    w.end("C:comp")
}

fn write_comp_filter(w: &mut XmlWriter, filter: &CompFilter) -> Result<(), CalDavError> {
    let name = [("name", filter.name.as_str())];
    let time_range = filter.time_range.filter(|r| !r.is_unbounded());

    if time_range.is_none() && filter.props.is_empty() && filter.comps.is_empty() {
        return w.empty("C:comp-filter", &name);
    }

    w.start("C:comp-filter", &name)?;
    if let Some(range) = &time_range {
        write_time_range(w, "C:time-range", range)?;
    }
    for prop in &filter.props {
        write_prop_filter(w, prop)?;
    }
    for child in &filter.comps {
        write_comp_filter(w, child)?;
    }
    w.end("C:comp-filter")
}

fn write_prop_filter(w: &mut XmlWriter, filter: &PropFilter) -> Result<(), CalDavError> {
    let name = [("name", filter.name.as_str())];
    let time_range = filter.time_range.filter(|r| !r.is_unbounded());

    if time_range.is_none() && filter.text_match.is_none() && filter.param_filters.is_empty() {
        return w.empty("C:prop-filter", &name);
    }

    w.start("C:prop-filter", &name)?;
    // RFC 4791 allows one of time-range and text-match; the time range wins.
    if let Some(range) = &time_range {
        if filter.text_match.is_some() {
            tracing::debug!(prop = %filter.name, "text-match dropped in favor of time-range");
        }
        write_time_range(w, "C:time-range", range)?;
    } else if let Some(text_match) = &filter.text_match {
        write_text_match(w, text_match)?;
    }
    for param in &filter.param_filters {
        write_param_filter(w, param)?;
    }
    w.end("C:prop-filter")
}

fn write_param_filter(w: &mut XmlWriter, filter: &ParamFilter) -> Result<(), CalDavError> {
    let name = [("name", filter.name.as_str())];
    match &filter.text_match {
        Some(text_match) => {
            w.start("C:param-filter", &name)?;
            write_text_match(w, text_match)?;
            w.end("C:param-filter")
        }
        None => w.empty("C:param-filter", &name),
    }
}

fn write_text_match(w: &mut XmlWriter, text_match: &TextMatch) -> Result<(), CalDavError> {
    let negate = if text_match.negate { "yes" } else { "no" };
    w.start("C:text-match", &[("negate-condition", negate)])?;
    w.text(&text_match.text)?;
    w.end("C:text-match")
}

fn write_time_range(w: &mut XmlWriter, tag: &str, range: &TimeRange) -> Result<(), CalDavError> {
    let start = range.start.map(format_utc);
    let end = range.end.map(format_utc);

    let mut attrs = Vec::with_capacity(2);
    if let Some(start) = &start {
        attrs.push(("start", start.as_str()));
    }
    if let Some(end) = &end {
        attrs.push(("end", end.as_str()));
    }
    w.empty(tag, &attrs)
}
