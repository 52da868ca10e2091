// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for WebDAV/CalDAV operations.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::codec;
use crate::error::CalDavError;
use crate::http::parse_http_date;
use crate::types::{Calendar, CalendarObject, ETag, Href};
use crate::xml::{read_element_text, skip_element};

/// `WebDAV` multistatus response.
#[derive(Debug, Clone, Default)]
pub struct MultiStatusResponse {
    /// The response items.
    pub responses: Vec<ResponseItem>,
    /// The collection sync token of a `sync-collection` answer.
    pub sync_token: Option<String>,
}

/// Individual response in multistatus.
#[derive(Debug, Clone, Default)]
pub struct ResponseItem {
    /// The hrefs of the entry; well-formed entries carry exactly one.
    pub hrefs: Vec<String>,
    /// Per-property outcomes.
    pub prop_stats: Vec<PropStat>,
    /// Entry-level status line, e.g. `HTTP/1.1 404 Not Found`.
    pub status: Option<String>,
}

/// Property stat with status and value.
#[derive(Debug, Clone, Default)]
pub struct PropStat {
    /// The properties reported under `status`.
    pub props: Properties,
    /// The status line of this propstat.
    pub status: String,
}

/// WebDAV/CalDAV properties.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    /// `DAV:displayname`.
    pub display_name: Option<String>,
    /// `DAV:getetag`.
    pub get_etag: Option<ETag>,
    /// `DAV:getlastmodified`, as sent.
    pub get_last_modified: Option<String>,
    /// `DAV:getcontentlength`, as sent.
    pub get_content_length: Option<String>,
    /// `DAV:current-user-principal`.
    pub current_user_principal: Option<Href>,
    /// `CALDAV:calendar-data`.
    pub calendar_data: Option<String>,
    /// `CALDAV:calendar-home-set`.
    pub calendar_home_set: Option<Href>,
    /// `CALDAV:supported-calendar-component-set`.
    pub supported_calendar_components: Option<Vec<String>>,
    /// `CALDAV:calendar-description`.
    pub calendar_description: Option<String>,
    /// `CALDAV:max-resource-size`, as sent.
    pub max_resource_size: Option<String>,
    /// `DAV:resourcetype` contains `collection`.
    pub is_collection: bool,
    /// `DAV:resourcetype` contains `calendar`.
    pub is_calendar: bool,
}

/// Calendar objects decoded from a multistatus, with the per-entry errors
/// that did not stop decoding.
#[derive(Debug, Default)]
pub struct CalendarObjectList {
    /// Successfully decoded objects, in response order.
    pub objects: Vec<CalendarObject>,
    /// Entries skipped because their href was unusable.
    pub errors: Vec<CalDavError>,
}

impl CalendarObjectList {
    /// Returns `true` if no entry was skipped.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the objects, failing with the first skipped-entry error if any.
    ///
    /// # Errors
    ///
    /// Returns the first per-entry error when decoding was partial.
    pub fn into_complete(self) -> Result<Vec<CalendarObject>, CalDavError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.objects),
        }
    }
}

/// Extracts the numeric code of a status line such as `HTTP/1.1 200 OK`.
#[must_use]
pub fn status_code(status: &str) -> Option<u16> {
    status.split_whitespace().nth(1)?.parse().ok()
}

fn is_success(status: &str) -> bool {
    match status_code(status) {
        Some(code) => (200..300).contains(&code),
        None => status.trim().is_empty(),
    }
}

impl ResponseItem {
    /// Returns the server-relative path of this entry.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::InvalidHref`] if the entry does not carry exactly
    /// one usable href.
    pub fn path(&self) -> Result<Href, CalDavError> {
        let [href] = self.hrefs.as_slice() else {
            return Err(CalDavError::InvalidHref(format!(
                "expected exactly one href, got {}",
                self.hrefs.len()
            )));
        };
        href_to_path(href)
    }

    /// Looks a property up in the successful propstats of this entry.
    pub fn prop<T>(&self, get: impl Fn(&Properties) -> Option<T>) -> Option<T> {
        self.prop_stats
            .iter()
            .filter(|p| is_success(&p.status))
            .find_map(|p| get(&p.props))
    }

    /// Builds a data-less object from the metadata properties of this entry.
    ///
    /// Malformed `getlastmodified` or `getcontentlength` values are logged
    /// and left unset.
    pub(crate) fn object_metadata(&self, href: Href) -> CalendarObject {
        let mut object = CalendarObject::new(href);
        object.etag = self.prop(|p| p.get_etag.clone());
        object.mod_time = self
            .prop(|p| p.get_last_modified.clone())
            .and_then(|raw| match parse_http_date(&raw) {
                Ok(ts) => Some(ts),
                Err(err) => {
                    tracing::warn!(href = %object.href, %err, "ignoring getlastmodified");
                    None
                }
            });
        object.content_length = self
            .prop(|p| p.get_content_length.clone())
            .and_then(|raw| match raw.trim().parse() {
                Ok(n) => Some(n),
                Err(err) => {
                    tracing::warn!(href = %object.href, %err, "ignoring getcontentlength");
                    None
                }
            })
            .unwrap_or_default();
        object
    }

    /// The entry status, falling back to the first propstat status.
    #[must_use]
    pub fn status_text(&self) -> &str {
        self.status
            .as_deref()
            .or_else(|| self.prop_stats.first().map(|p| p.status.as_str()))
            .unwrap_or("")
    }
}

/// Converts an href, absolute or server-relative, into a path.
pub(crate) fn href_to_path(href: &str) -> Result<Href, CalDavError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(CalDavError::InvalidHref("empty href".to_string()));
    }
    if href.starts_with('/') {
        return Ok(Href::from(href));
    }

    if !href.contains("://") {
        return Ok(Href::from(href));
    }
    reqwest::Url::parse(href)
        .map(|url| Href::from(url.path()))
        .map_err(|e| CalDavError::InvalidHref(format!("{href}: {e}")))
}

fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.local_name().as_ref().to_vec()
}

impl MultiStatusResponse {
    /// Parses multistatus response from XML.
    ///
    /// # Errors
    ///
    /// Returns an error if XML parsing fails.
    pub fn from_xml(xml: &str) -> Result<Self, CalDavError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut ms = Self::default();
        let mut response: Option<ResponseItem> = None;
        let mut propstat: Option<PropStat> = None;
        let mut in_prop = false;

        loop {
            match reader.read_event()? {
                Event::Eof => break,

                Event::Start(ref e) if in_prop => {
                    if let Some(stat) = propstat.as_mut() {
                        read_property(&mut reader, e, &mut stat.props)?;
                    } else {
                        skip_element(&mut reader)?;
                    }
                }
                Event::Start(ref e) => match local_name(e).as_slice() {
                    b"response" => response = Some(ResponseItem::default()),
                    b"href" if propstat.is_none() => {
                        let href = read_element_text(&mut reader)?;
                        if let Some(resp) = response.as_mut() {
                            resp.hrefs.push(href.trim().to_string());
                        }
                    }
                    b"propstat" if response.is_some() => propstat = Some(PropStat::default()),
                    b"prop" if propstat.is_some() => in_prop = true,
                    b"status" => {
                        let status = read_element_text(&mut reader)?.trim().to_string();
                        if let Some(stat) = propstat.as_mut() {
                            stat.status = status;
                        } else if let Some(resp) = response.as_mut() {
                            resp.status = Some(status);
                        }
                    }
                    b"sync-token" if response.is_none() => {
                        ms.sync_token = Some(read_element_text(&mut reader)?.trim().to_string());
                    }
                    b"multistatus" => {}
                    _ => skip_element(&mut reader)?,
                },

                Event::End(ref e) => match e.local_name().as_ref() {
                    b"prop" => in_prop = false,
                    b"propstat" => {
                        if let (Some(resp), Some(stat)) = (response.as_mut(), propstat.take()) {
                            resp.prop_stats.push(stat);
                        }
                    }
                    b"response" => {
                        if let Some(resp) = response.take() {
                            ms.responses.push(resp);
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        Ok(ms)
    }

    /// Decodes the calendar objects of a `calendar-query` or
    /// `calendar-multiget` answer.
    ///
    /// Entries with an unusable href are recorded in
    /// [`CalendarObjectList::errors`] and skipped; entries without
    /// `calendar-data` (such as the collection itself) are ignored. A
    /// calendar document that fails to decode aborts the whole call.
    ///
    /// # Errors
    ///
    /// Returns an error if any calendar document cannot be decoded.
    pub fn into_calendar_objects(self) -> Result<CalendarObjectList, CalDavError> {
        let mut list = CalendarObjectList::default();

        for response in self.responses {
            let href = match response.path() {
                Ok(href) => href,
                Err(err) => {
                    tracing::warn!(%err, "skipping multistatus entry");
                    list.errors.push(err);
                    continue;
                }
            };

            let Some(data) = response
                .prop(|p| p.calendar_data.clone())
                .filter(|d| !d.trim().is_empty())
            else {
                continue;
            };

            let mut object = response.object_metadata(href);
            object.data = Some(codec::decode(&data)?);

            list.objects.push(object);
        }

        Ok(list)
    }

    /// Converts the answer of a calendar-home-set PROPFIND into calendars.
    ///
    /// Returns the calendars together with the per-entry href errors.
    ///
    /// # Errors
    ///
    /// Returns an error if a calendar advertises an invalid
    /// `max-resource-size`.
    pub fn into_calendars(self) -> Result<(Vec<Calendar>, Vec<CalDavError>), CalDavError> {
        let mut calendars = Vec::new();
        let mut errors = Vec::new();

        for response in self.responses {
            let href = match response.path() {
                Ok(href) => href,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };

            if response.prop(|p| p.is_calendar.then_some(())).is_none() {
                continue;
            }

            let mut calendar = Calendar::new(href);
            calendar.display_name = response.prop(|p| p.display_name.clone());
            calendar.description = response.prop(|p| p.calendar_description.clone());
            calendar.supported_components = response
                .prop(|p| p.supported_calendar_components.clone())
                .unwrap_or_default();
            calendar.max_resource_size = response
                .prop(|p| p.max_resource_size.clone())
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|_| {
                        CalDavError::InvalidResponse(format!(
                            "max-resource-size must be a positive integer, got {raw:?}"
                        ))
                    })
                })
                .transpose()?;

            calendars.push(calendar);
        }

        Ok((calendars, errors))
    }
}

/// Reads one property element (its start tag already consumed) into `props`.
fn read_property(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    props: &mut Properties,
) -> Result<(), CalDavError> {
    match local_name(start).as_slice() {
        b"displayname" => props.display_name = Some(read_element_text(reader)?),
        b"getetag" => props.get_etag = Some(ETag::new(read_element_text(reader)?.trim().into())),
        b"getlastmodified" => props.get_last_modified = Some(read_element_text(reader)?),
        b"getcontentlength" => props.get_content_length = Some(read_element_text(reader)?),
        b"calendar-data" => props.calendar_data = Some(read_element_text(reader)?),
        b"calendar-description" => props.calendar_description = Some(read_element_text(reader)?),
        b"max-resource-size" => props.max_resource_size = Some(read_element_text(reader)?),
        b"calendar-home-set" => props.calendar_home_set = read_nested_href(reader)?,
        b"current-user-principal" => props.current_user_principal = read_nested_href(reader)?,
        b"resourcetype" => {
            props.is_collection = false;
            for name in read_child_names(reader, None)? {
                match name.as_str() {
                    "collection" => props.is_collection = true,
                    "calendar" => props.is_calendar = true,
                    _ => {}
                }
            }
        }
        b"supported-calendar-component-set" => {
            props.supported_calendar_components = Some(read_child_names(reader, Some("name"))?);
        }
        _ => skip_element(reader)?,
    }
    Ok(())
}

/// Reads the first `<href>` inside the current element.
fn read_nested_href(reader: &mut Reader<&[u8]>) -> Result<Option<Href>, CalDavError> {
    let mut href = None;
    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.local_name().as_ref() == b"href" => {
                let text = read_element_text(reader)?;
                if href.is_none() {
                    href = Some(href_to_path(&text)?);
                }
            }
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => return Ok(href),
            Event::Eof => return Err(CalDavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
}

/// Collects the local names of the children of the current element, or the
/// value of `attr` on each child when given.
fn read_child_names(
    reader: &mut Reader<&[u8]>,
    attr: Option<&str>,
) -> Result<Vec<String>, CalDavError> {
    let mut names = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                names.extend(child_name(e, attr)?);
                skip_element(reader)?;
            }
            Event::Empty(ref e) => names.extend(child_name(e, attr)?),
            Event::End(_) => return Ok(names),
            Event::Eof => return Err(CalDavError::Xml("Unexpected EOF".to_string())),
            _ => {}
        }
    }
}

fn child_name(e: &BytesStart<'_>, attr: Option<&str>) -> Result<Option<String>, CalDavError> {
    let Some(attr) = attr else {
        return Ok(Some(String::from_utf8_lossy(&local_name(e)).into_owned()));
    };
    let Some(value) = e
        .try_get_attribute(attr)
        .map_err(|e| CalDavError::Xml(e.to_string()))?
    else {
        return Ok(None);
    };
    std::str::from_utf8(&value.value)
        .map(|v| Some(v.to_string()))
        .map_err(|e| CalDavError::Xml(format!("UTF-8 error: {e}")))
}
