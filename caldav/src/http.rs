// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and `ETag` handling.

use jiff::Timestamp;
use reqwest::header::{CONTENT_LENGTH, ETAG, HeaderMap, LAST_MODIFIED, LOCATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};

use crate::config::{AuthMethod, CalDavConfig};
use crate::error::CalDavError;
use crate::types::{CalendarObject, ConditionalMatch, Depth, ETag, Href};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// HTTP client for `CalDAV` operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: CalDavConfig,
    base: Url,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL or HTTP client
    /// creation fails.
    pub fn new(config: CalDavConfig) -> Result<Self, CalDavError> {
        if config.base_url.is_empty() {
            return Err(CalDavError::Config("base_url must not be empty".to_string()));
        }
        let mut base = Url::parse(&config.base_url).map_err(|e| {
            CalDavError::Config(format!("Invalid base_url {:?}: {e}", config.base_url))
        })?;
        // Relative hrefs resolve inside the endpoint, not next to it.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            config,
            base,
        })
    }

    /// Resolves `href` against the base URL as a URL reference.
    ///
    /// Absolute paths replace the base path, so hrefs returned by the server
    /// can be passed back unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if `href` is not a valid URL reference.
    pub fn full_url(&self, href: &str) -> Result<Url, CalDavError> {
        self.base
            .join(href)
            .map_err(|e| CalDavError::InvalidHref(format!("{href}: {e}")))
    }

    /// Builds a request with authentication headers.
    ///
    /// # Errors
    ///
    /// Returns an error if `href` cannot be resolved against the base URL.
    pub fn build_request(
        &self,
        method: Method,
        href: &str,
    ) -> Result<RequestBuilder, CalDavError> {
        let mut req = self.client.request(method, self.full_url(href)?);

        match &self.config.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::Bearer { token } => {
                req = req.bearer_auth(token);
            }
            AuthMethod::None => {}
        }

        Ok(req)
    }

    /// Builds an XML-bodied request with a custom method such as `REPORT`.
    ///
    /// # Errors
    ///
    /// Returns an error if `method` is not a valid HTTP method token or `href`
    /// cannot be resolved.
    pub fn build_xml_request(
        &self,
        method: &str,
        href: &str,
        depth: Depth,
        body: String,
    ) -> Result<RequestBuilder, CalDavError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| CalDavError::Http(format!("Invalid method: {e}")))?;
        Ok(self
            .build_request(method, href)?
            .header("Content-Type", XML_CONTENT_TYPE)
            .header("Depth", depth.as_str())
            .body(body))
    }

    /// Sends a request without interpreting the status code.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or timeout.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response, CalDavError> {
        Ok(req.send().await?)
    }

    /// Executes a request and checks for HTTP errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute(&self, req: RequestBuilder) -> Result<Response, CalDavError> {
        let resp = self.send(req).await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Self::status_error(resp).await)
        }
    }

    /// Executes a request expecting a multistatus body and returns its text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute_multistatus(&self, req: RequestBuilder) -> Result<String, CalDavError> {
        let resp = self.execute(req).await?;
        if resp.status() != StatusCode::MULTI_STATUS {
            tracing::debug!(status = %resp.status(), "expected 207 Multi-Status");
        }
        Ok(resp.text().await?)
    }

    /// Turns an unexpected response into [`CalDavError::HttpStatus`].
    pub async fn status_error(resp: Response) -> CalDavError {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());
        CalDavError::HttpStatus { status, body }
    }

    /// Adds If-Match header for conditional updates.
    pub fn if_match(req: RequestBuilder, token: &ConditionalMatch) -> RequestBuilder {
        req.header("If-Match", token.as_str())
    }

    /// Adds If-None-Match header for conditional creation.
    pub fn if_none_match(req: RequestBuilder, token: &ConditionalMatch) -> RequestBuilder {
        req.header("If-None-Match", token.as_str())
    }
}

/// Parses an HTTP date (RFC 9110 IMF-fixdate, e.g. `Wed, 01 Jan 2025 12:00:00 GMT`).
///
/// # Errors
///
/// Returns an error if the value is not a valid date.
pub fn parse_http_date(value: &str) -> Result<Timestamp, CalDavError> {
    jiff::fmt::rfc2822::DateTimeParser::new()
        .parse_timestamp(value.trim())
        .map_err(|e| CalDavError::InvalidResponse(format!("Invalid HTTP date {value:?}: {e}")))
}

/// Fills `object` from response headers.
///
/// A `Location` header, resolved against `request_url`, replaces the path.
/// The `ETag` is kept exactly as sent.
///
/// # Errors
///
/// Returns an error if a present header is malformed.
pub fn populate_from_headers(
    object: &mut CalendarObject,
    headers: &HeaderMap,
    request_url: &Url,
) -> Result<(), CalDavError> {
    if let Some(loc) = header_str(headers, LOCATION.as_str())? {
        let url = request_url
            .join(loc)
            .map_err(|e| CalDavError::InvalidResponse(format!("Invalid Location {loc:?}: {e}")))?;
        object.href = Href::from(url.path());
    }
    if let Some(etag) = header_str(headers, ETAG.as_str())? {
        object.etag = Some(ETag::from(etag));
    }
    if let Some(length) = header_str(headers, CONTENT_LENGTH.as_str())? {
        object.content_length = length.trim().parse().map_err(|e| {
            CalDavError::InvalidResponse(format!("Invalid Content-Length {length:?}: {e}"))
        })?;
    }
    if let Some(last_modified) = header_str(headers, LAST_MODIFIED.as_str())? {
        object.mod_time = Some(parse_http_date(last_modified)?);
    }
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, CalDavError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map_err(|e| CalDavError::InvalidResponse(format!("Invalid {name} header: {e}")))
        })
        .transpose()
        .map(|v| v.filter(|s| !s.is_empty()))
}
