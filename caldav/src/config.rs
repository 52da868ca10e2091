// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// `CalDAV` authentication method.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// No authentication.
    #[serde(rename = "none")]
    #[default]
    None,
    /// Basic authentication (username/password).
    #[serde(rename = "basic")]
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
    /// Bearer token authentication (OAuth).
    #[serde(rename = "bearer")]
    Bearer {
        /// Bearer token.
        token: String,
    },
}

/// `CalDAV` server configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CalDavConfig {
    /// Base URL of the `CalDAV` server, e.g. `https://caldav.example.com/dav/`.
    ///
    /// Paths are resolved against it as URL references, so server-relative
    /// hrefs such as `/dav/calendars/user/` replace its path.
    pub base_url: String,
    /// Calendar home path (e.g., /dav/calendars/user/).
    ///
    /// May be left empty and resolved later with
    /// [`CalDavClient::find_calendar_home_set`](crate::CalDavClient::find_calendar_home_set).
    #[serde(default)]
    pub calendar_home: String,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds, applied to every round trip.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("caldav-engine/", env!("CARGO_PKG_VERSION")).to_string()
}

impl CalDavConfig {
    /// Creates a configuration for `base_url` with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for CalDavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            calendar_home: String::new(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_with_defaults() {
        let config: CalDavConfig = serde_json::from_str(
            r#"{"base_url":"https://dav.example.com","auth":{"type":"basic","username":"u","password":"p"}}"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://dav.example.com");
        assert_eq!(config.calendar_home, "");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("caldav-engine/"));
        assert!(matches!(config.auth, AuthMethod::Basic { ref username, .. } if username == "u"));
    }

    #[test]
    fn config_bearer_auth() {
        let config: CalDavConfig = serde_json::from_str(
            r#"{"base_url":"https://dav.example.com","auth":{"type":"bearer","token":"t0k"}}"#,
        )
        .unwrap();

        assert!(matches!(config.auth, AuthMethod::Bearer { ref token } if token == "t0k"));
    }
}
