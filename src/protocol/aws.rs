// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AWS-hosted Blueair API used by newer purifiers.
//!
//! Login is a three step exchange: Gigya `accounts.login` yields a session,
//! `accounts.getJWT` turns it into an id token, and the execute API's
//! `/login` trades that for the access token every other call carries.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AuthError, Error, ParseError, ProtocolError, ValueError};
use crate::protocol::{Api, TokenCell};
use crate::response::aws::{InitialResponse, RegisteredDevice, RegisteredDevices};
use crate::response::{
    Attribute, Attributes, AwsDeviceInfo, DataPoint, Device, DeviceInformation,
};
use crate::types::FanSpeed;

const USER_AGENT: &str = "Blueair/58 CFNetwork/1327.0.4 Darwin/21.2.0";

// ============================================================================
// AwsRegion - Regional endpoints
// ============================================================================

/// Account region; selects the Gigya and AWS endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AwsRegion {
    /// United States.
    #[default]
    Us,
    /// Europe.
    Eu,
}

impl AwsRegion {
    /// Returns the short region code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Eu => "eu",
        }
    }

    const fn gigya_region(self) -> &'static str {
        match self {
            Self::Us => "us1",
            Self::Eu => "eu1",
        }
    }

    const fn rest_api_id(self) -> &'static str {
        match self {
            Self::Us => "on1keymlmh",
            Self::Eu => "hkgmr8v960",
        }
    }

    const fn aws_region(self) -> &'static str {
        match self {
            Self::Us => "us-east-2",
            Self::Eu => "eu-west-1",
        }
    }

    /// Returns the Gigya application key of the region.
    #[must_use]
    pub const fn gigya_api_key(self) -> &'static str {
        match self {
            Self::Us => "3_-xUbbrIY8QCbHDWQs1tLXE-CZBQ50SGElcOY5hF1euE11wCoIlNbjMGAFQ6UwhMY",
            Self::Eu => "3_qRseYzrUJl1VyxvSJANalu_kNgQ83swB1B9uzgms58--5w1ClVNmrFdsDnWVQQCl",
        }
    }

    /// Returns the Gigya accounts endpoint.
    #[must_use]
    pub fn accounts_url(self) -> String {
        format!("https://accounts.{}.gigya.com", self.gigya_region())
    }

    /// Returns the execute API prefix.
    #[must_use]
    pub fn api_url(self) -> String {
        format!(
            "https://{}.execute-api.{}.amazonaws.com/prod/c",
            self.rest_api_id(),
            self.aws_region()
        )
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AwsRegion {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            _ => Err(ValueError::InvalidRegion(s.to_string())),
        }
    }
}

// ============================================================================
// AwsConfig - Configuration for the AWS client
// ============================================================================

/// Configuration for an account on the AWS-hosted API.
///
/// # Examples
///
/// ```
/// use blueair_lib::protocol::{AwsConfig, AwsRegion};
///
/// let config = AwsConfig::new("me@example.com", "secret", AwsRegion::Eu);
/// assert_eq!(config.accounts_url(), "https://accounts.eu1.gigya.com");
/// assert_eq!(
///     config.api_url(),
///     "https://hkgmr8v960.execute-api.eu-west-1.amazonaws.com/prod/c"
/// );
/// ```
#[derive(Clone)]
pub struct AwsConfig {
    username: String,
    password: String,
    region: AwsRegion,
    accounts_url: String,
    api_url: String,
    timeout: Duration,
    token_lifetime: Duration,
}

impl AwsConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default access token lifetime.
    pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

    /// Creates a configuration for the given account and region.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        region: AwsRegion,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            region,
            accounts_url: region.accounts_url(),
            api_url: region.api_url(),
            timeout: Self::DEFAULT_TIMEOUT,
            token_lifetime: Self::DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Overrides the Gigya accounts endpoint.
    #[must_use]
    pub fn with_accounts_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the execute API prefix.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how long an access token is trusted before renewal.
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

    /// Returns the account region.
    #[must_use]
    pub fn region(&self) -> AwsRegion {
        self.region
    }

    /// Returns the Gigya accounts endpoint.
    #[must_use]
    pub fn accounts_url(&self) -> &str {
        &self.accounts_url
    }

    /// Returns the execute API prefix.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the access token lifetime.
    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Creates an `AwsClient` from this configuration without logging in.
    ///
    /// # Errors
    ///
    /// Returns error if an endpoint URL is malformed or the HTTP client
    /// cannot be created.
    pub fn into_client(self) -> Result<AwsClient, ProtocolError> {
        for url in [&self.accounts_url, &self.api_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ProtocolError::InvalidAddress(url.clone()));
            }
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(AwsClient {
            client,
            session: Arc::new(TokenCell::new(self.token_lifetime)),
            devices: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(self),
        })
    }
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("username", &self.username)
            .field("region", &self.region)
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("token_lifetime", &self.token_lifetime)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Login responses
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GigyaLogin {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    session_info: Option<GigyaSession>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GigyaSession {
    session_token: String,
    session_secret: String,
}

#[derive(Debug, Deserialize)]
struct GigyaJwt {
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    #[serde(default)]
    access_token: Option<String>,
}

// ============================================================================
// Commands
// ============================================================================

/// A control state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Numeric state, sent as `v`.
    Value(&'static str, u8),
    /// Boolean state, sent as `vb`.
    Flag(&'static str, bool),
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Self::Value(name, _) | Self::Flag(name, _) => name,
        }
    }

    fn body(self) -> serde_json::Value {
        match self {
            Self::Value(name, value) => serde_json::json!({ "n": name, "v": value }),
            Self::Flag(name, value) => serde_json::json!({ "n": name, "vb": value }),
        }
    }
}

/// Translates a classic attribute write into control state writes.
fn commands_for(attribute: Attribute, value: &str) -> Result<Vec<Command>, Error> {
    match attribute {
        Attribute::FanSpeed => {
            let speed: FanSpeed = value.parse()?;
            if speed.is_on() {
                Ok(vec![
                    Command::Flag("standby", false),
                    Command::Value("fanspeed", speed.to_percentage()),
                ])
            } else {
                Ok(vec![Command::Flag("standby", true)])
            }
        }
        Attribute::Mode => Ok(vec![Command::Flag("automode", value == "auto")]),
        Attribute::ChildLock => Ok(vec![Command::Flag("childlock", value == "0")]),
        Attribute::FilterStatus => {
            Err(ProtocolError::Unsupported("filter_status is read-only".to_string()).into())
        }
    }
}

// ============================================================================
// AwsClient - AWS API client
// ============================================================================

/// Client for the AWS-hosted Blueair API.
///
/// Cloning is cheap; clones share the access token and the device name
/// cache filled by [`list_devices`](Api::list_devices).
///
/// # Examples
///
/// ```no_run
/// use blueair_lib::protocol::{Api, AwsClient, AwsConfig, AwsRegion};
///
/// # async fn example() -> blueair_lib::Result<()> {
/// let config = AwsConfig::new("me@example.com", "secret", AwsRegion::Us);
/// let client = AwsClient::connect(config).await?;
///
/// for device in client.list_devices().await? {
///     let info = client.get_info(&device.uuid).await?;
///     println!("{}: {:?}", device.name, info.firmware);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AwsClient {
    client: Client,
    config: Arc<AwsConfig>,
    session: Arc<TokenCell<String>>,
    devices: Arc<RwLock<HashMap<String, RegisteredDevice>>>,
}

impl AwsClient {
    /// Creates a client and logs in immediately.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the credentials are rejected, or another
    /// error if the cloud cannot be reached.
    pub async fn connect(config: AwsConfig) -> Result<Self, Error> {
        let client = config.into_client()?;
        client.login().await?;
        Ok(client)
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    /// Returns `true` if a valid access token is held.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.current().is_some()
    }

    /// Ensures a valid access token exists, logging in if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the credentials are rejected.
    pub async fn login(&self) -> Result<(), Error> {
        self.access_token().await.map(|_| ())
    }

    async fn access_token(&self) -> Result<String, Error> {
        self.session.get_or_renew(|| self.authenticate()).await
    }

    async fn authenticate(&self) -> Result<String, Error> {
        let accounts_url = &self.config.accounts_url;
        let api_key = self.config.region.gigya_api_key();

        tracing::debug!(url = %accounts_url, "Logging in to Gigya");
        let login: GigyaLogin = self
            .post_form(
                &format!("{accounts_url}/accounts.login"),
                &[
                    ("apikey", api_key),
                    ("loginID", self.config.username.as_str()),
                    ("password", self.config.password.as_str()),
                    ("targetEnv", "mobile"),
                ],
            )
            .await?;
        let session = match login.session_info {
            Some(session) if login.error_code == 0 => session,
            _ => {
                tracing::debug!(error_code = login.error_code, "Gigya login refused");
                return Err(AuthError::Rejected.into());
            }
        };

        let jwt: GigyaJwt = self
            .post_form(
                &format!("{accounts_url}/accounts.getJWT"),
                &[
                    ("oauth_token", session.session_token.as_str()),
                    ("secret", session.session_secret.as_str()),
                    ("targetEnv", "mobile"),
                ],
            )
            .await?;
        let id_token = jwt
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let url = format!("{}/login", self.config.api_url);
        tracing::debug!(url = %url, "Exchanging id token");
        let response = with_token(self.client.post(&url), &id_token)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::Rejected.into());
        }
        let access: AccessToken = read_json(response).await?;
        let token = access
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        tracing::info!(region = %self.config.region, "Logged in to Blueair AWS cloud");
        Ok(token)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, Error> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        read_json(response).await
    }

    /// Sends an authenticated request, logging in again once if the
    /// access token was rejected.
    async fn send<F>(&self, build: F) -> Result<Response, Error>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut retried = false;
        loop {
            let token = self.access_token().await?;
            let response = with_token(build(&self.client), &token)
                .send()
                .await
                .map_err(ProtocolError::Http)?;

            if response.status() == StatusCode::UNAUTHORIZED {
                if retried {
                    return Err(AuthError::Rejected.into());
                }
                tracing::debug!("Access token rejected, logging in again");
                self.session.invalidate_if(|current| *current == token);
                retried = true;
                continue;
            }

            return Ok(response);
        }
    }

    /// Returns the listing entry of `uuid`, listing devices if unknown.
    async fn registered(&self, uuid: &str) -> Result<RegisteredDevice, Error> {
        let cached = self.devices.read().get(uuid).cloned();
        if let Some(device) = cached {
            return Ok(device);
        }
        self.list_devices().await?;
        self.devices
            .read()
            .get(uuid)
            .cloned()
            .ok_or(Error::DeviceNotFound)
    }

    async fn initial(&self, uuid: &str) -> Result<(RegisteredDevice, AwsDeviceInfo), Error> {
        let device = self.registered(uuid).await?;
        let url = format!(
            "{}/{}/r/initial",
            self.config.api_url,
            urlencoding::encode(&device.name)
        );
        let body = serde_json::json!({
            "deviceconfigquery": [{"id": uuid, "r": {"r": ["sensors"]}}],
            "includestates": true,
            "eventsubscription": {"include": [{"filter": {"o": format!("= {uuid}")}}]},
        });

        tracing::debug!(url = %url, "Sending HTTP request");
        let response = self.send(|client| client.post(&url).json(&body)).await?;
        let initial: InitialResponse = read_json(response).await?;
        Ok((device, initial.into_device(uuid)?))
    }
}

impl Api for AwsClient {
    async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let url = format!("{}/registered-devices", self.config.api_url);
        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self.send(|client| client.get(&url)).await?;
        let listing: RegisteredDevices = read_json(response).await?;

        let devices = listing
            .devices
            .iter()
            .map(|device| Device::new(&device.uuid, &device.name))
            .collect();
        *self.devices.write() = listing
            .devices
            .into_iter()
            .map(|device| (device.uuid.clone(), device))
            .collect();
        Ok(devices)
    }

    async fn get_info(&self, uuid: &str) -> Result<DeviceInformation, Error> {
        let (device, info) = self.initial(uuid).await?;
        Ok(info.information(device.mac.as_deref()))
    }

    async fn get_data_point(&self, uuid: &str) -> Result<DataPoint, Error> {
        let (_, info) = self.initial(uuid).await?;
        info.data_point().map_err(Into::into)
    }

    async fn get_attributes(&self, uuid: &str) -> Result<Attributes, Error> {
        let (_, info) = self.initial(uuid).await?;
        Ok(info.attributes())
    }

    async fn set_attribute(
        &self,
        uuid: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<(), Error> {
        for command in commands_for(attribute, value)? {
            let url = format!(
                "{}/{}/a/{}",
                self.config.api_url,
                urlencoding::encode(uuid),
                command.name()
            );
            let body = command.body();

            tracing::debug!(device = %uuid, url = %url, body = %body, "Sending command");
            let response = self.send(|client| client.post(&url).json(&body)).await?;
            check_status(&response)?;
        }
        Ok(())
    }
}

/// Adds the token headers the execute API expects.
fn with_token(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("idtoken", token).bearer_auth(token)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    check_status(&response)?;
    let body = response.text().await.map_err(ProtocolError::Http)?;
    tracing::debug!(body = %body, "Received HTTP response");
    serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
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
