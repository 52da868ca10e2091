// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Multistatus parsing and decoding tests.

use caldav_engine::{CalDavError, ETag, MultiStatusResponse, codec, status_code};

#[test]
fn response_parse_multistatus_basic() {
    let xml = "\
<?xml version=\"1.0\" encoding=\"utf-8\" ?>
<D:multistatus xmlns:D=\"DAV:\">
  <D:response>
    <D:href>/calendars/user/event1.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>\"12345\"</D:getetag>
        <D:getlastmodified>Wed, 01 Jan 2025 12:00:00 GMT</D:getlastmodified>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>";

    let response = MultiStatusResponse::from_xml(xml).expect("Failed to parse multistatus");

    assert_eq!(response.responses.len(), 1);
    let item = &response.responses[0];
    assert_eq!(item.hrefs, vec!["/calendars/user/event1.ics".to_string()]);
    assert_eq!(item.path().expect("path").as_str(), "/calendars/user/event1.ics");
    assert_eq!(item.status_text(), "HTTP/1.1 200 OK");
    assert_eq!(item.prop(|p| p.get_etag.clone()), Some(ETag::from("\"12345\"")));
    assert!(response.sync_token.is_none());
}

#[test]
fn response_prop_ignores_failed_propstats() {
    let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/cal/</D:href>
    <D:propstat>
      <D:prop><D:displayname>Work</D:displayname></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
    <D:propstat>
      <D:prop><C:calendar-description>hidden</C:calendar-description></D:prop>
      <D:status>HTTP/1.1 404 Not Found</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    let response = MultiStatusResponse::from_xml(xml).expect("parse");
    let item = &response.responses[0];

    assert_eq!(item.prop(|p| p.display_name.clone()).as_deref(), Some("Work"));
    assert_eq!(item.prop(|p| p.calendar_description.clone()), None);
}

#[test]
fn response_parse_sync_token_and_entry_status() {
    let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/cal/gone.ics</D:href>
    <D:status>HTTP/1.1 404 Not Found</D:status>
  </D:response>
  <D:sync-token>http://example.com/ns/sync/5678</D:sync-token>
</D:multistatus>"#;

    let response = MultiStatusResponse::from_xml(xml).expect("parse");

    assert_eq!(
        response.sync_token.as_deref(),
        Some("http://example.com/ns/sync/5678")
    );
    assert_eq!(response.responses[0].status.as_deref(), Some("HTTP/1.1 404 Not Found"));
    assert_eq!(response.responses[0].status_text(), "HTTP/1.1 404 Not Found");
}

#[test]
fn response_absolute_href_becomes_path() {
    let xml = r#"<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>https://dav.example.com/cal/user/a%20b.ics</D:href>
  </D:response>
</D:multistatus>"#;

    let response = MultiStatusResponse::from_xml(xml).expect("parse");

    assert_eq!(
        response.responses[0].path().expect("path").as_str(),
        "/cal/user/a%20b.ics"
    );
}

#[test]
fn response_relative_and_broken_hrefs() {
    let xml = r#"<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>work/a.ics</D:href>
  </D:response>
  <D:response>
    <D:href>http://[::1/cal/a.ics</D:href>
  </D:response>
</D:multistatus>"#;

    let response = MultiStatusResponse::from_xml(xml).expect("parse");

    assert_eq!(response.responses[0].path().expect("path").as_str(), "work/a.ics");
    assert!(matches!(
        response.responses[1].path(),
        Err(CalDavError::InvalidHref(_))
    ));
}

#[test]
fn response_entry_with_two_hrefs_has_no_path() {
    let xml = r#"<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/cal/a.ics</D:href>
    <D:href>/cal/b.ics</D:href>
  </D:response>
</D:multistatus>"#;

    let response = MultiStatusResponse::from_xml(xml).expect("parse");

    assert!(matches!(
        response.responses[0].path(),
        Err(CalDavError::InvalidHref(_))
    ));
}

#[test]
fn response_rejects_malformed_xml() {
    let xml = "<D:multistatus xmlns:D=\"DAV:\"><D:response></D:multistatus>";
    assert!(MultiStatusResponse::from_xml(xml).is_err());
}

#[test]
fn response_status_code() {
    assert_eq!(status_code("HTTP/1.1 200 OK"), Some(200));
    assert_eq!(status_code("HTTP/1.1 404 Not Found"), Some(404));
    assert_eq!(status_code("garbage"), None);
}

const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/cal/</D:href>
    <D:propstat>
      <D:prop><D:getetag>"collection"</D:getetag></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/cal/meeting.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>"abc"</D:getetag>
        <D:getlastmodified>Wed, 01 Jan 2025 12:00:00 GMT</D:getlastmodified>
        <D:getcontentlength>not-a-number</D:getcontentlength>
        <C:calendar-data>BEGIN:VCALENDAR&#13;
VERSION:2.0&#13;
PRODID:-//Example Corp.//CalDAV Client//EN&#13;
BEGIN:VEVENT&#13;
UID:meeting@example.com&#13;
DTSTAMP:20250101T000000Z&#13;
DTSTART:20250102T090000Z&#13;
SUMMARY:Planning &amp; review&#13;
END:VEVENT&#13;
END:VCALENDAR&#13;
</C:calendar-data>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/cal/a.ics</D:href>
    <D:href>/cal/b.ics</D:href>
  </D:response>
</D:multistatus>"#;

#[test]
fn response_decode_calendar_objects() {
    let list = MultiStatusResponse::from_xml(REPORT)
        .expect("parse")
        .into_calendar_objects()
        .expect("decode");

    assert_eq!(list.objects.len(), 1);
    assert_eq!(list.errors.len(), 1);
    assert!(!list.is_complete());

    let object = &list.objects[0];
    assert_eq!(object.href.as_str(), "/cal/meeting.ics");
    assert_eq!(object.etag, Some(ETag::from("\"abc\"")));
    assert_eq!(
        object.mod_time,
        Some("2025-01-01T12:00:00Z".parse().expect("timestamp"))
    );
    assert_eq!(object.content_length, 0);

    let data = object.data.as_ref().expect("calendar data");
    let encoded = codec::encode(data).expect("encode");
    assert!(encoded.contains("SUMMARY:Planning & review"));
}

#[test]
fn response_into_complete_reports_first_error() {
    let list = MultiStatusResponse::from_xml(REPORT)
        .expect("parse")
        .into_calendar_objects()
        .expect("decode");

    assert!(matches!(
        list.into_complete(),
        Err(CalDavError::InvalidHref(_))
    ));
}

#[test]
fn response_corrupt_document_aborts_decoding() {
    let xml = r#"<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/cal/bad.ics</D:href>
    <D:propstat>
      <D:prop><C:calendar-data>this is not a calendar</C:calendar-data></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    let result = MultiStatusResponse::from_xml(xml)
        .expect("parse")
        .into_calendar_objects();

    assert!(matches!(result, Err(CalDavError::Ical(_))));
}

#[test]
fn response_into_calendars() {
    let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/dav/calendars/user/</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype><D:collection/></D:resourcetype>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/dav/calendars/user/work/</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype><D:collection/><C:calendar/></D:resourcetype>
        <D:displayname>Work</D:displayname>
        <C:calendar-description>Office events</C:calendar-description>
        <C:max-resource-size>102400</C:max-resource-size>
        <C:supported-calendar-component-set>
          <C:comp name="VEVENT"/>
          <C:comp name="VTODO"></C:comp>
        </C:supported-calendar-component-set>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    let (calendars, errors) = MultiStatusResponse::from_xml(xml)
        .expect("parse")
        .into_calendars()
        .expect("calendars");

    assert!(errors.is_empty());
    assert_eq!(calendars.len(), 1);
    let work = &calendars[0];
    assert_eq!(work.href.as_str(), "/dav/calendars/user/work/");
    assert_eq!(work.display_name.as_deref(), Some("Work"));
    assert_eq!(work.description.as_deref(), Some("Office events"));
    assert_eq!(work.max_resource_size, Some(102_400));
    assert_eq!(work.supported_components, vec!["VEVENT", "VTODO"]);
}

#[test]
fn response_negative_max_resource_size_is_invalid() {
    let xml = r#"<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/dav/calendars/user/work/</D:href>
    <D:propstat>
      <D:prop>
        <D:resourcetype><D:collection/><C:calendar/></D:resourcetype>
        <C:max-resource-size>-1</C:max-resource-size>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

    let result = MultiStatusResponse::from_xml(xml)
        .expect("parse")
        .into_calendars();

    assert!(matches!(result, Err(CalDavError::InvalidResponse(_))));
}
