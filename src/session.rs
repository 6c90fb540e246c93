//! Authenticated session against the Message Management REST API.

use crate::{Error, Result};
use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://emailapi.dynect.net/rest/json";
const USER_AGENT_VALUE: &str = concat!("dyn-mm-reports/", env!("CARGO_PKG_VERSION"));
const API_KEY_ENV: &str = "DYN_MM_API_KEY";

/// Shared session used by every report query.
///
/// Cloning is cheap: clones share the same connection pool. Use
/// [`Session::new`] for defaults or [`Session::builder`] for custom settings
/// like a proxy, a timeout or a different endpoint.
#[derive(Clone)]
pub struct Session {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    proxy: Option<String>,
}

impl Session {
    /// Create a builder for configuring the session.
    pub fn builder(api_key: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(api_key)
    }

    /// Create a session with default settings.
    ///
    /// # Examples
    /// ```no_run
    /// # use dyn_mm_reports::Session;
    /// # fn main() -> Result<(), dyn_mm_reports::Error> {
    /// let session = Session::new("my-api-key")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        SessionBuilder::new(api_key).build()
    }

    /// Base URL every resource path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the proxy URL if one was configured.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Send one request and return the parsed JSON body.
    ///
    /// The API key is appended to `params` as `apikey`. GET parameters go in
    /// the query string, anything else is sent as a urlencoded form. Non-2xx
    /// statuses surface as [`Error::Request`]; a `response.status` other than
    /// 200 inside the body surfaces as [`Error::Api`]. Nothing is retried.
    ///
    /// # Examples
    /// ```no_run
    /// # use dyn_mm_reports::{Method, Session};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), dyn_mm_reports::Error> {
    /// let session = Session::new("my-api-key")?;
    /// let params = [("starttime", "2024-01-01T00:00:00Z".to_string())];
    /// let body = session.execute("/reports/sent", Method::GET, &params).await?;
    /// println!("{body}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(
        &self,
        path: &str,
        method: Method,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        pairs.push(("apikey", self.api_key.as_str()));
        pairs.extend(params.iter().map(|(name, value)| (*name, value.as_str())));

        debug!(
            %method,
            path,
            params = ?params.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            "sending request"
        );

        let request = if method == Method::GET {
            self.http.get(&url).query(&pairs)
        } else {
            self.http.request(method, &url).form(&pairs)
        };

        let bytes = request.send().await?.error_for_status()?.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;

        check_envelope(path, &body)?;
        Ok(body)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

/// Reject bodies whose envelope reports a non-OK status.
fn check_envelope(path: &str, body: &Value) -> Result<()> {
    let Some(envelope) = body.get("response") else {
        return Ok(());
    };
    let Some(status) = envelope.get("status").and_then(Value::as_u64) else {
        return Ok(());
    };
    if status == 200 {
        return Ok(());
    }

    let message = envelope
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    warn!(path, status, %message, "API returned an error status");

    Err(Error::Api {
        status: u16::try_from(status).unwrap_or(u16::MAX),
        message,
    })
}

/// Builder for configuring a [`Session`].
///
/// Start with [`Session::builder`] or [`SessionBuilder::from_env`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    api_key: String,
    base_url: String,
    proxy: Option<String>,
    user_agent: String,
    timeout: Option<Duration>,
    danger_accept_invalid_certs: bool,
}

impl SessionBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Production Message Management endpoint
    /// - No proxy
    /// - No timeout beyond reqwest's own
    /// - `danger_accept_invalid_certs = false`
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            proxy: None,
            user_agent: USER_AGENT_VALUE.to_string(),
            timeout: None,
            danger_accept_invalid_certs: false,
        }
    }

    /// Create a builder with the API key taken from `DYN_MM_API_KEY`.
    ///
    /// Returns [`Error::MissingApiKey`] when the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(Error::MissingApiKey),
        }
    }

    /// Override the API endpoint.
    ///
    /// Useful for testing against a local server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a proxy URL (e.g., "socks5://127.0.0.1:1080").
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Abort any single request that takes longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Control whether to accept invalid TLS certificates (default: false).
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.danger_accept_invalid_certs = value;
        self
    }

    /// Build the session. No network request is made.
    pub fn build(self) -> Result<Session> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|_| Error::InvalidBaseUrl(self.base_url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(self.danger_accept_invalid_certs);

        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Session {
            http: builder.build()?,
            api_key: self.api_key,
            base_url,
            proxy: self.proxy,
        })
    }
}
