// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of the Blueair cloud API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{AuthError, Error, ParseError, ProtocolError};
use crate::protocol::{Api, TokenCell};
use crate::response::{
    Attribute, Attributes, DataPoint, DataPointResponse, Device, DeviceInformation,
};

/// Header carrying the application API key.
const API_KEY_HEADER: &str = "X-API-KEY-TOKEN";

/// Header carrying the session token, on the login response and on requests.
const AUTH_TOKEN_HEADER: &str = "X-AUTH-TOKEN";

// ============================================================================
// HttpConfig - Configuration for the cloud client
// ============================================================================

/// Configuration for a Blueair cloud account.
///
/// # Examples
///
/// ```
/// use blueair_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("me@example.com", "secret", "api-key")
///     .with_base_url("https://api.blueair.io")
///     .with_timeout(Duration::from_secs(5))
///     .with_token_lifetime(Duration::from_secs(3600));
///
/// assert_eq!(config.username(), "me@example.com");
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct HttpConfig {
    username: String,
    password: String,
    api_key: String,
    base_url: String,
    timeout: Duration,
    token_lifetime: Duration,
}

impl HttpConfig {
    /// Default API entry point, used to look up the account's home host.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.blueair.io";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default session token lifetime.
    pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

    /// Creates a configuration for the given account and API key.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            token_lifetime: Self::DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Sets the API entry point.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how long a session token is trusted before renewal.
    #[must_use]
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Returns the account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the API entry point.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the session token lifetime.
    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Creates an `HttpClient` from this configuration without logging in.
    ///
    /// The first request logs in on demand.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is malformed or the HTTP client cannot
    /// be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProtocolError::InvalidAddress(self.base_url));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            client,
            session: Arc::new(TokenCell::new(self.token_lifetime)),
            config: Arc::new(self),
        })
    }
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("username", &self.username)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("token_lifetime", &self.token_lifetime)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HttpClient - Cloud API client
// ============================================================================

/// Authenticated session: the account's home API and its token.
#[derive(Debug, Clone)]
struct Session {
    api_url: String,
    token: String,
}

/// HTTP client for the Blueair cloud.
///
/// Cloning is cheap and clones share the session token, so one client can
/// serve every device of an account.
///
/// # Examples
///
/// ```no_run
/// use blueair_lib::protocol::{Api, HttpClient, HttpConfig};
///
/// # async fn example() -> blueair_lib::Result<()> {
/// let config = HttpConfig::new("me@example.com", "secret", "api-key");
/// let client = HttpClient::connect(config).await?;
///
/// for device in client.list_devices().await? {
///     let attributes = client.get_attributes(&device.uuid).await?;
///     println!("{}: {} attributes", device.name, attributes.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<HttpConfig>,
    session: Arc<TokenCell<Session>>,
}

impl HttpClient {
    /// Creates a client and logs in immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the credentials are rejected, or another
    /// error if the cloud cannot be reached.
    pub async fn connect(config: HttpConfig) -> Result<Self, Error> {
        let client = config.into_client()?;
        client.login().await?;
        Ok(client)
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Returns `true` if a valid session token is held.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.current().is_some()
    }

    /// Ensures a valid session exists, logging in if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the credentials are rejected.
    pub async fn login(&self) -> Result<(), Error> {
        self.session().await.map(|_| ())
    }

    async fn session(&self) -> Result<Session, Error> {
        self.session.get_or_renew(|| self.authenticate()).await
    }

    /// Looks up the home host and logs in against it.
    async fn authenticate(&self) -> Result<Session, Error> {
        let home_host = self.home_host().await?;
        let api_url = format!("{}/v2", home_url(&self.config.base_url, &home_host));
        let url = format!(
            "{api_url}/user/{}/login/",
            urlencoding::encode(&self.config.username)
        );

        tracing::debug!(url = %url, "Logging in");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::NOT_FOUND
        {
            return Err(AuthError::Rejected.into());
        }
        check_status(&response)?;

        let token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingToken)?
            .to_string();

        tracing::info!(home_host = %home_host, "Logged in to Blueair cloud");
        Ok(Session { api_url, token })
    }

    async fn home_host(&self) -> Result<String, Error> {
        let url = format!(
            "{}/v2/user/{}/homehost/",
            self.config.base_url,
            urlencoding::encode(&self.config.username)
        );

        tracing::debug!(url = %url, "Looking up home host");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::NOT_FOUND
        {
            return Err(AuthError::HomeHost(format!("HTTP {}", response.status().as_u16())).into());
        }
        check_status(&response)?;

        let body = response.text().await.map_err(ProtocolError::Http)?;
        let host: String = serde_json::from_str(&body).map_err(ParseError::Json)?;
        if host.trim().is_empty() {
            return Err(AuthError::HomeHost("empty host".to_string()).into());
        }
        Ok(host.trim().to_string())
    }

    /// Sends an authenticated request, logging in again once if the
    /// session was rejected.
    async fn send<F>(&self, build: F) -> Result<Response, Error>
    where
        F: Fn(&Client, &Session) -> RequestBuilder + Send + Sync,
    {
        let mut retried = false;
        loop {
            let session = self.session().await?;
            let response = build(&self.client, &session)
                .header(API_KEY_HEADER, &self.config.api_key)
                .header(AUTH_TOKEN_HEADER, &session.token)
                .send()
                .await
                .map_err(ProtocolError::Http)?;

            if response.status() == StatusCode::UNAUTHORIZED {
                if retried {
                    return Err(AuthError::Rejected.into());
                }
                tracing::debug!("Session rejected, logging in again");
                self.session.invalidate_if(|current| current.token == session.token);
                retried = true;
                continue;
            }

            check_status(&response)?;
            return Ok(response);
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self
            .send(|client, session| {
                let url = format!("{}{path}", session.api_url);
                tracing::debug!(url = %url, "Sending HTTP request");
                client.get(url)
            })
            .await?;

        let body = response.text().await.map_err(ProtocolError::Http)?;
        tracing::debug!(body = %body, "Received HTTP response");
        serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
    }
}

impl Api for HttpClient {
    async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let path = format!(
            "/owner/{}/device/",
            urlencoding::encode(&self.config.username)
        );
        self.get_json(&path).await
    }

    async fn get_info(&self, uuid: &str) -> Result<DeviceInformation, Error> {
        self.get_json(&format!("/device/{}/info/", urlencoding::encode(uuid)))
            .await
    }

    async fn get_data_point(&self, uuid: &str) -> Result<DataPoint, Error> {
        let response: DataPointResponse = self
            .get_json(&format!(
                "/device/{}/datapoint/0/last/0/",
                urlencoding::encode(uuid)
            ))
            .await?;
        response.into_latest().map_err(Into::into)
    }

    async fn get_attributes(&self, uuid: &str) -> Result<Attributes, Error> {
        self.get_json(&format!("/device/{}/attributes/", urlencoding::encode(uuid)))
            .await
    }

    async fn set_attribute(
        &self,
        uuid: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), Error> {
        let body = serde_json::json!({
            "currentValue": value,
            "scope": "device",
            "defaultValue": value,
            "name": attribute.name(),
            "uuid": uuid,
        });
        let path = format!(
            "/device/{}/attribute/{}/",
            urlencoding::encode(uuid),
            attribute.path_segment()
        );

        tracing::debug!(device = %uuid, %attribute, value = %value, "Setting attribute");

        self.send(|client, session| client.post(format!("{}{path}", session.api_url)).json(&body))
            .await?;
        Ok(())
    }
}

/// Builds the home API URL, reusing the entry point's scheme.
fn home_url(base_url: &str, home_host: &str) -> String {
    if home_host.starts_with("http://") || home_host.starts_with("https://") {
        return home_host.trim_end_matches('/').to_string();
    }
    let scheme = base_url.split_once("://").map_or("https", |(s, _)| s);
    format!("{scheme}://{}", home_host.trim_end_matches('/'))
}

fn check_status(response: &Response) -> Result<(), ProtocolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(ProtocolError::Status {
        status: status.as_u16(),
        message: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = HttpConfig::new("user@example.com", "pw", "key");
        assert_eq!(config.username(), "user@example.com");
        assert_eq!(config.base_url(), "https://api.blueair.io");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.token_lifetime(), Duration::from_secs(86_400));
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = HttpConfig::new("u", "p", "k").with_base_url("http://localhost:8080/");
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn config_debug_hides_secrets() {
        let config = HttpConfig::new("u", "hunter2", "secret-key");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn into_client_rejects_bad_url() {
        let result = HttpConfig::new("u", "p", "k")
            .with_base_url("api.blueair.io")
            .into_client();
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[test]
    fn into_client_is_logged_out() {
        let client = HttpConfig::new("u", "p", "k").into_client().unwrap();
        assert!(!client.is_logged_in());
    }

    #[test]
    fn home_url_uses_base_scheme() {
        assert_eq!(
            home_url("https://api.blueair.io", "api-eu.blueair.io"),
            "https://api-eu.blueair.io"
        );
        assert_eq!(
            home_url("http://127.0.0.1:9000", "127.0.0.1:9000"),
            "http://127.0.0.1:9000"
        );
        assert_eq!(
            home_url("https://api.blueair.io", "https://other.example/"),
            "https://other.example"
        );
    }
}
