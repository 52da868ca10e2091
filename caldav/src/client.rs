// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` client for calendar operations.

use std::sync::{Arc, PoisonError, RwLock};

use aimcal_ical::ICalendar;
use jiff::Timestamp;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use crate::codec;
use crate::config::CalDavConfig;
use crate::conflict::{ConflictDecision, ConflictResolver};
use crate::error::CalDavError;
use crate::http::{HttpClient, populate_from_headers};
use crate::query::{CalendarMultiGet, CalendarQuery, QueryOptions};
use crate::request::{
    CalendarMultiGetRequest, CalendarQueryRequest, Prop, PropFindRequest, SyncCollectionRequest,
};
use crate::response::{CalendarObjectList, MultiStatusResponse};
use crate::sync::{SyncOptions, SyncResult};
use crate::types::{Calendar, CalendarObject, ConditionalMatch, Depth, Href};

type ResolverSlot = Arc<RwLock<Option<Arc<dyn ConflictResolver>>>>;

/// Conditional headers and local metadata for
/// [`CalDavClient::put_calendar_object`].
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Only write if the server copy still matches this tag.
    pub if_match: Option<ConditionalMatch>,
    /// Only write if no server copy matches this tag; `*` means "create only".
    pub if_none_match: Option<ConditionalMatch>,
    /// Modification time of the local copy, shown to the conflict resolver.
    /// Defaults to the time of the conflict.
    pub mod_time: Option<Timestamp>,
}

impl PutOptions {
    /// Options for an update that only succeeds while the server copy matches `token`.
    #[must_use]
    pub fn if_match(token: ConditionalMatch) -> Self {
        Self {
            if_match: Some(token),
            ..Self::default()
        }
    }

    /// Options for a create that fails if the resource exists.
    #[must_use]
    pub fn create_only() -> Self {
        Self {
            if_none_match: Some(ConditionalMatch::any()),
            ..Self::default()
        }
    }
}

/// `CalDAV` client for accessing and managing calendars on `CalDAV` servers.
///
/// Clones share the HTTP connection pool and the conflict resolver slot.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
///
/// use caldav_engine::{AuthMethod, CalDavClient, CalDavConfig, LastModifiedWins, PutOptions};
///
/// # async fn example(calendar: aimcal_ical::ICalendar<String>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = CalDavConfig {
///     base_url: "https://caldav.example.com".to_string(),
///     auth: AuthMethod::Basic {
///         username: "user".to_string(),
///         password: "pass".to_string(),
///     },
///     ..Default::default()
/// };
///
/// let client = CalDavClient::new(config)?;
/// client.set_conflict_resolver(Some(Arc::new(LastModifiedWins)));
///
/// let path = "/dav/calendars/user/work/event.ics".into();
/// let object = client
///     .put_calendar_object(&path, &calendar, &PutOptions::create_only())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CalDavClient {
    http: Arc<HttpClient>,
    config: CalDavConfig,
    resolver: ResolverSlot,
}

impl CalDavClient {
    /// Creates a new `CalDAV` client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
            resolver: Arc::default(),
        })
    }

    /// Returns the configuration of this client.
    #[must_use]
    pub fn config(&self) -> &CalDavConfig {
        &self.config
    }

    /// Returns the configured calendar home, if any.
    #[must_use]
    pub fn calendar_home(&self) -> Option<Href> {
        let home = self.config.calendar_home.as_str();
        (!home.is_empty()).then(|| Href::from(home))
    }

    /// Sets the strategy used when a conditional write is rejected.
    ///
    /// `None` disables automatic resolution, which is the default: rejected
    /// writes fail with [`CalDavError::PreconditionFailed`]. Writes already in
    /// flight keep the resolver they started with.
    pub fn set_conflict_resolver(&self, resolver: Option<Arc<dyn ConflictResolver>>) {
        *self.resolver.write().unwrap_or_else(PoisonError::into_inner) = resolver;
    }

    /// Returns the current conflict resolver.
    #[must_use]
    pub fn conflict_resolver(&self) -> Option<Arc<dyn ConflictResolver>> {
        self.resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves the `CalDAV` context URL of `domain` through
    /// `/.well-known/caldav` (RFC 6764), following redirects.
    ///
    /// `domain` is a host name, or an origin such as `http://localhost:8080`.
    ///
    /// # Errors
    ///
    /// Returns an error if the well-known URL does not answer successfully.
    pub async fn discover_context_url(&self, domain: &str) -> Result<String, CalDavError> {
        let origin = if domain.contains("://") {
            domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", domain.trim_end_matches('/'))
        };
        let url = format!("{origin}/.well-known/caldav");

        let resp = self
            .http
            .execute(self.http.build_request(Method::GET, &url)?)
            .await?;
        tracing::debug!(from = %url, to = %resp.url(), "resolved context url");
        Ok(resp.url().to_string())
    }

    /// Finds the principal of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if PROPFIND fails or the server reports no principal.
    pub async fn find_current_user_principal(&self) -> Result<Href, CalDavError> {
        let mut propfind = PropFindRequest::new();
        propfind.add_property(Prop::CurrentUserPrincipal);

        let ms = self.propfind("", Depth::Zero, &propfind).await?;
        ms.responses
            .iter()
            .find_map(|r| r.prop(|p| p.current_user_principal.clone()))
            .ok_or_else(|| {
                CalDavError::InvalidResponse("no current-user-principal in response".to_string())
            })
    }

    /// Finds the calendar home set of `principal`.
    ///
    /// # Errors
    ///
    /// Returns an error if PROPFIND fails or the property is missing.
    pub async fn find_calendar_home_set(&self, principal: &Href) -> Result<Href, CalDavError> {
        let mut propfind = PropFindRequest::new();
        propfind.add_property(Prop::CalendarHomeSet);

        let ms = self.propfind(principal, Depth::Zero, &propfind).await?;
        ms.responses
            .iter()
            .find_map(|r| r.prop(|p| p.calendar_home_set.clone()))
            .ok_or_else(|| {
                CalDavError::InvalidResponse(format!("no calendar-home-set for {principal}"))
            })
    }

    /// Lists the calendar collections under `home`.
    ///
    /// Members that are not calendars are skipped. Members with an unusable
    /// href are returned as errors next to the calendars.
    ///
    /// # Errors
    ///
    /// Returns an error if PROPFIND fails or a calendar advertises an invalid
    /// `max-resource-size`.
    pub async fn find_calendars(
        &self,
        home: &Href,
    ) -> Result<(Vec<Calendar>, Vec<CalDavError>), CalDavError> {
        let mut propfind = PropFindRequest::new();
        propfind
            .add_property(Prop::ResourceType)
            .add_property(Prop::DisplayName)
            .add_property(Prop::CalendarDescription)
            .add_property(Prop::MaxResourceSize)
            .add_property(Prop::SupportedCalendarComponents);

        let ms = self.propfind(home, Depth::One, &propfind).await?;
        ms.into_calendars()
    }

    /// Fetches a single calendar object.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::NotFound`] if the object does not exist, or an
    /// error if the request fails or the body is not an iCalendar document.
    pub async fn get_calendar_object(&self, path: &Href) -> Result<CalendarObject, CalDavError> {
        let req = self
            .http
            .build_request(Method::GET, path)?
            .header(ACCEPT, codec::MIME_TYPE);
        let resp = self.http.send(req).await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CalDavError::NotFound(path.clone()));
        } else if !status.is_success() {
            return Err(HttpClient::status_error(resp).await);
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        if !media_type.eq_ignore_ascii_case(codec::MIME_TYPE) {
            return Err(CalDavError::InvalidResponse(format!(
                "expected Content-Type {:?}, got {media_type:?}",
                codec::MIME_TYPE
            )));
        }

        let url = resp.url().clone();
        let mut object = CalendarObject::new(Href::from(url.path()));
        populate_from_headers(&mut object, resp.headers(), &url)?;

        let body = resp.text().await?;
        object.data = Some(codec::decode(&body)?);
        Ok(object)
    }

    /// Runs a `calendar-query` REPORT against `calendar`.
    ///
    /// A time range in `options` is applied to a copy of `query`; see
    /// [`CalendarQuery::with_options`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a returned calendar document
    /// cannot be decoded.
    pub async fn query_calendar(
        &self,
        calendar: &Href,
        query: &CalendarQuery,
        options: Option<&QueryOptions>,
    ) -> Result<CalendarObjectList, CalDavError> {
        let applied;
        let query = match options {
            Some(options) => {
                applied = query.with_options(options);
                &applied
            }
            None => query,
        };

        let body = CalendarQueryRequest::new(query).build()?;
        let req = self
            .http
            .build_xml_request("REPORT", calendar, Depth::One, body)?;
        let xml = self.http.execute_multistatus(req).await?;
        MultiStatusResponse::from_xml(&xml)?.into_calendar_objects()
    }

    /// Runs a `calendar-multiget` REPORT against `path`.
    ///
    /// With no explicit paths in `multiget`, `path` itself is fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a returned calendar document
    /// cannot be decoded.
    pub async fn multi_get_calendar(
        &self,
        path: &Href,
        multiget: &CalendarMultiGet,
    ) -> Result<CalendarObjectList, CalDavError> {
        let body = CalendarMultiGetRequest::new(multiget, path).build()?;
        let req = self
            .http
            .build_xml_request("REPORT", path, Depth::One, body)?;
        let xml = self.http.execute_multistatus(req).await?;
        MultiStatusResponse::from_xml(&xml)?.into_calendar_objects()
    }

    /// Creates or updates a calendar object.
    ///
    /// The returned object carries the metadata from the response headers
    /// but no `data`. When the server rejects the precondition (HTTP 412) and
    /// a conflict resolver is set, the resolver decides the outcome:
    ///
    /// - `UseLocal` writes again without preconditions, which may overwrite a
    ///   change made after the remote copy was fetched;
    /// - `UseRemote` returns the remote copy without writing;
    /// - `Skip` fails with [`CalDavError::PreconditionFailed`];
    /// - `Merge` fails with [`CalDavError::MergeNotSupported`].
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::PreconditionFailed`] if the precondition failed
    /// and was not overridden, or an error if encoding or the request fails.
    #[tracing::instrument(skip(self, calendar, options), fields(href = %path))]
    pub async fn put_calendar_object(
        &self,
        path: &Href,
        calendar: &ICalendar<String>,
        options: &PutOptions,
    ) -> Result<CalendarObject, CalDavError> {
        match self.put_once(path, calendar, options).await {
            Err(CalDavError::PreconditionFailed) => {
                let Some(resolver) = self.conflict_resolver() else {
                    tracing::debug!("precondition failed, no resolver set");
                    return Err(CalDavError::PreconditionFailed);
                };
                self.resolve_conflict(resolver.as_ref(), path, calendar, options.mod_time)
                    .await
            }
            result => result,
        }
    }

    /// Deletes a calendar object.
    ///
    /// Deleting an object that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::HttpStatus`] for any status other than 2xx or
    /// 404, or an error if the request fails.
    pub async fn delete_calendar_object(&self, path: &Href) -> Result<(), CalDavError> {
        let resp = self
            .http
            .send(self.http.build_request(Method::DELETE, path)?)
            .await?;

        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::debug!(href = %path, %status, "deleted");
            Ok(())
        } else {
            Err(HttpClient::status_error(resp).await)
        }
    }

    /// Fetches the changes of `calendar` since `sync_token`.
    ///
    /// An empty token requests a full listing. The new token is returned in
    /// [`SyncResult::sync_token`] and must be stored by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::SyncTokenExpired`] if the server no longer
    /// accepts the token; restart with an empty token. Returns an error if the
    /// request fails or a returned calendar document cannot be decoded.
    #[tracing::instrument(skip(self, sync_token, options), fields(href = %calendar, initial = sync_token.is_empty()))]
    pub async fn sync_calendar(
        &self,
        calendar: &Href,
        sync_token: &str,
        options: &SyncOptions,
    ) -> Result<SyncResult, CalDavError> {
        let body = SyncCollectionRequest::new(sync_token, options).build()?;
        let req = self
            .http
            .build_xml_request("REPORT", calendar, Depth::Zero, body)?;
        let resp = self.http.send(req).await?;

        let status = resp.status();
        if status == StatusCode::GONE {
            return Err(CalDavError::SyncTokenExpired);
        } else if !status.is_success() {
            let err = HttpClient::status_error(resp).await;
            // RFC 6578 signals an unknown token with 403 and DAV:valid-sync-token.
            return match err {
                CalDavError::HttpStatus { status: 403, ref body }
                    if body.contains("valid-sync-token") =>
                {
                    Err(CalDavError::SyncTokenExpired)
                }
                err => Err(err),
            };
        }

        let xml = resp.text().await?;
        let result = SyncResult::from_multistatus(MultiStatusResponse::from_xml(&xml)?, calendar)?;
        tracing::debug!(
            created = result.created.len(),
            updated = result.updated.len(),
            deleted = result.deleted.len(),
            "sync finished"
        );
        Ok(result)
    }

    async fn propfind(
        &self,
        href: &str,
        depth: Depth,
        propfind: &PropFindRequest,
    ) -> Result<MultiStatusResponse, CalDavError> {
        let req = self
            .http
            .build_xml_request("PROPFIND", href, depth, propfind.build()?)?;
        let xml = self.http.execute_multistatus(req).await?;
        MultiStatusResponse::from_xml(&xml)
    }

    /// Issues one PUT; a 412 becomes [`CalDavError::PreconditionFailed`].
    async fn put_once(
        &self,
        path: &Href,
        calendar: &ICalendar<String>,
        options: &PutOptions,
    ) -> Result<CalendarObject, CalDavError> {
        let body = codec::encode(calendar)?;
        let mut req = self
            .http
            .build_request(Method::PUT, path)?
            .header(CONTENT_TYPE, "text/calendar; charset=utf-8")
            .body(body);
        if let Some(token) = &options.if_match {
            req = HttpClient::if_match(req, token);
        }
        if let Some(token) = &options.if_none_match {
            req = HttpClient::if_none_match(req, token);
        }

        let resp = self.http.send(req).await?;
        let status = resp.status();
        if status == StatusCode::PRECONDITION_FAILED {
            return Err(CalDavError::PreconditionFailed);
        } else if !status.is_success() {
            return Err(HttpClient::status_error(resp).await);
        }

        let mut object = CalendarObject::new(path.clone());
        populate_from_headers(&mut object, resp.headers(), resp.url())?;
        Ok(object)
    }

    #[tracing::instrument(skip(self, resolver, calendar, local_mod_time), fields(href = %path))]
    async fn resolve_conflict(
        &self,
        resolver: &dyn ConflictResolver,
        path: &Href,
        calendar: &ICalendar<String>,
        local_mod_time: Option<Timestamp>,
    ) -> Result<CalendarObject, CalDavError> {
        let remote = match self.get_calendar_object(path).await {
            Ok(remote) => Some(remote),
            Err(CalDavError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };
        let local = CalendarObject::new(path.clone())
            .with_data(calendar.clone())
            .with_mod_time(local_mod_time.unwrap_or_else(Timestamp::now));

        let decision = resolver.resolve(Some(&local), remote.as_ref());
        tracing::debug!(%decision, ?resolver, "conflict resolved");

        match decision {
            ConflictDecision::UseLocal => {
                let options = PutOptions {
                    mod_time: local_mod_time,
                    ..PutOptions::default()
                };
                self.put_once(path, calendar, &options).await
            }
            ConflictDecision::UseRemote => remote.ok_or_else(|| CalDavError::NotFound(path.clone())),
            ConflictDecision::Skip => Err(CalDavError::PreconditionFailed),
            ConflictDecision::Merge => Err(CalDavError::MergeNotSupported),
        }
    }
}
