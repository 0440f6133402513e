//! Build-time environment for the coffee shop front end and API.
//!
//! Exactly one [`EnvironmentConfig`] is compiled into a binary. The
//! `production` cargo feature picks the production profile; without it the
//! development literals are used. Nothing here reads the process environment
//! at run time.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, net::SocketAddr, str::FromStr};
use thiserror::Error;
use tokio::net::lookup_host;
use url::{Host, Url};

/// Path of the front-end page Auth0 returns to after login.
pub const DEFAULT_CALLBACK_PATH: &str = "/tabs/user-page";

/// Replaces a production value with a variable set when the crate was compiled.
macro_rules! build_var {
    ($name:literal, $default:expr) => {
        match option_env!($name) {
            Some(value) => value,
            None => $default,
        }
    };
}

const DEV_API_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEV_AUTH0_URL: &str = "dev-rof0zfah257z8231.us.auth0.com";
const DEV_AUTH0_AUDIENCE: &str = "https://dev-rof0zfah257z8231.us.auth0.com/api/v2/";
const DEV_AUTH0_CLIENT_ID: &str = "CKpgux1QAgvEIL2R3BStTwtRFm5wwaGO";
const DEV_AUTH0_CALLBACK_URL: &str = "http://localhost:8100";

static DEVELOPMENT: EnvironmentConfig = EnvironmentConfig {
    production: false,
    api_server_url: Cow::Borrowed(DEV_API_SERVER_URL),
    auth0: Auth0Config {
        url: Cow::Borrowed(DEV_AUTH0_URL),
        audience: Cow::Borrowed(DEV_AUTH0_AUDIENCE),
        client_id: Cow::Borrowed(DEV_AUTH0_CLIENT_ID),
        callback_url: Cow::Borrowed(DEV_AUTH0_CALLBACK_URL),
    },
};

static PRODUCTION: EnvironmentConfig = EnvironmentConfig {
    production: true,
    api_server_url: Cow::Borrowed(build_var!(
        "COFFEE_SHOP_PROD_API_SERVER_URL",
        DEV_API_SERVER_URL
    )),
    auth0: Auth0Config {
        url: Cow::Borrowed(build_var!("COFFEE_SHOP_PROD_AUTH0_URL", DEV_AUTH0_URL)),
        audience: Cow::Borrowed(build_var!(
            "COFFEE_SHOP_PROD_AUTH0_AUDIENCE",
            DEV_AUTH0_AUDIENCE
        )),
        client_id: Cow::Borrowed(build_var!(
            "COFFEE_SHOP_PROD_AUTH0_CLIENT_ID",
            DEV_AUTH0_CLIENT_ID
        )),
        callback_url: Cow::Borrowed(build_var!(
            "COFFEE_SHOP_PROD_AUTH0_CALLBACK_URL",
            DEV_AUTH0_CALLBACK_URL
        )),
    },
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("`{field}` is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("`{0}` must have a scheme and a host")]
    MissingHost(&'static str),
    #[error("`auth0.url` must be a bare domain, got `{0}`")]
    NotBareDomain(String),
    #[error("`apiServerUrl` does not resolve: {0}")]
    Unresolvable(#[source] std::io::Error),
    #[error("`apiServerUrl` resolves to no socket address")]
    NoAddress,
    #[error("unknown environment profile `{0}`")]
    UnknownProfile(String),
}

/// Build target an [`EnvironmentConfig`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Development, Profile::Production];

    /// The profile this binary was built for.
    pub fn current() -> Self {
        if cfg!(feature = "production") {
            Profile::Production
        } else {
            Profile::Development
        }
    }

    pub fn config(self) -> &'static EnvironmentConfig {
        match self {
            Profile::Development => &DEVELOPMENT,
            Profile::Production => &PRODUCTION,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(ConfigError::UnknownProfile(s.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    production: bool,
    api_server_url: Cow<'static, str>,
    auth0: Auth0Config,
}

impl EnvironmentConfig {
    /// The configuration compiled into this binary.
    pub fn current() -> &'static EnvironmentConfig {
        Profile::current().config()
    }

    pub fn production(&self) -> bool {
        self.production
    }

    pub fn api_server_url(&self) -> &str {
        &self.api_server_url
    }

    pub fn auth0(&self) -> &Auth0Config {
        &self.auth0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_url("apiServerUrl", &self.api_server_url)?;
        self.auth0.validate()
    }

    /// Address the API listens on, taken from `apiServerUrl`.
    pub async fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let url = require_url("apiServerUrl", &self.api_server_url)?;
        let port = url.port_or_known_default().ok_or(ConfigError::NoAddress)?;

        match url.host() {
            Some(Host::Ipv4(ip)) => Ok(SocketAddr::from((ip, port))),
            Some(Host::Ipv6(ip)) => Ok(SocketAddr::from((ip, port))),
            Some(Host::Domain(domain)) => lookup_host((domain, port))
                .await
                .map_err(ConfigError::Unresolvable)?
                .next()
                .ok_or(ConfigError::NoAddress),
            None => Err(ConfigError::MissingHost("apiServerUrl")),
        }
    }
}

/// Auth0 tenant settings shared by the front end and the API.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Auth0Config {
    url: Cow<'static, str>,
    audience: Cow<'static, str>,
    client_id: Cow<'static, str>,
    #[serde(rename = "callbackURL")]
    callback_url: Cow<'static, str>,
}

impl Auth0Config {
    /// Tenant domain, without scheme or path.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_domain(&self.url)?;
        require_url("auth0.audience", &self.audience)?;
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Empty("auth0.clientId"));
        }
        require_url("auth0.callbackURL", &self.callback_url)?;
        Ok(())
    }

    /// Value of the `iss` claim in tokens minted by the tenant.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.url)
    }

    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.url)
    }

    /// Implicit-flow login page that sends the user back to `callbackURL`
    /// followed by `callback_path`.
    pub fn login_url(&self, callback_path: &str) -> Result<Url, ConfigError> {
        let redirect_uri = format!(
            "{}{}",
            self.callback_url.trim_end_matches('/'),
            callback_path
        );
        let login_url = format!(
            "https://{}/authorize?audience={}&response_type=token&client_id={}&redirect_uri={}",
            self.url,
            utf8_percent_encode(&self.audience, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.client_id, NON_ALPHANUMERIC),
            utf8_percent_encode(&redirect_uri, NON_ALPHANUMERIC),
        );

        Url::parse(&login_url).map_err(|source| ConfigError::InvalidUrl {
            field: "auth0.url",
            source,
        })
    }

    pub fn logout_url(&self) -> Result<Url, ConfigError> {
        let logout_url = format!(
            "https://{}/v2/logout?returnTo={}&client_id={}",
            self.url,
            utf8_percent_encode(&self.callback_url, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.client_id, NON_ALPHANUMERIC),
        );

        Url::parse(&logout_url).map_err(|source| ConfigError::InvalidUrl {
            field: "auth0.url",
            source,
        })
    }
}

fn require_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(field));
    }

    let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ConfigError::MissingHost(field)),
    }
}

fn require_domain(value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty("auth0.url"));
    }

    let has_extra = value
        .chars()
        .any(|c| matches!(c, ':' | '/' | '?' | '#' | '@') || c.is_whitespace());
    if has_extra || Host::parse(value).is_err() {
        return Err(ConfigError::NotBareDomain(value.to_owned()));
    }

    Ok(())
}
