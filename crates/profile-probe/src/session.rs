//! Session building and validation.
//!
//! A [`ClientContext`] carries everything later requests need: the HTTP client
//! with its default header set, a cookie jar seeded with the session cookie,
//! and the CSRF token (supplied or discovered). It is built once per run.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderValue, SET_COOKIE};
use tracing::Instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::types::{snippet, Credentials, ProbeError, ProbeResult};

/// Name of the anti-forgery cookie set by the web origin.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";
/// Request header echoing the CSRF cookie.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Authenticated client state for one run.
pub struct ClientContext {
    credentials: Credentials,
    csrf_token: Option<String>,
    client: reqwest::Client,
    config: ClientConfig,
    web_url: Url,
    api_url: Url,
    span: tracing::Span,
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("credentials", &self.credentials)
            .field("csrf_less", &self.is_csrf_less())
            .field("web_url", &self.web_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl ClientContext {
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// CSRF token in effect: supplied by the caller or discovered.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// True when no CSRF token could be supplied or discovered.
    pub fn is_csrf_less(&self) -> bool {
        self.csrf_token.is_none()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn web_url(&self) -> &Url {
        &self.web_url
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Span that every request made through this context runs in.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Start a GET with the per-request timeout and the CSRF header, if any.
    pub fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(url).timeout(self.config.timeout());
        if let Some(token) = &self.csrf_token {
            builder = builder.header(CSRF_HEADER, token.as_str());
        }
        builder
    }

    /// Send a request, mapping reqwest failures onto [`ProbeError`].
    pub(crate) async fn send(&self, builder: reqwest::RequestBuilder) -> ProbeResult<reqwest::Response> {
        builder
            .send()
            .await
            .map_err(|e| request_error(e, self.config.request_timeout_ms))
    }

    /// Read a response body. The request timeout still applies here, so a
    /// stalled body is reported the same way as a stalled send.
    pub(crate) async fn read_body(&self, resp: reqwest::Response) -> ProbeResult<String> {
        let url = resp.url().clone();
        resp.text().await.map_err(|e| {
            let e = e.with_url(url);
            if e.is_timeout() {
                request_error(e, self.config.request_timeout_ms)
            } else {
                ProbeError::Transport(format!("failed to read response body: {e}"))
            }
        })
    }
}

/// Convert a reqwest error; timeouts become a status-less fetch failure.
pub(crate) fn request_error(e: reqwest::Error, timeout_ms: u64) -> ProbeError {
    if e.is_timeout() {
        let url = e.url().map(|u| u.as_str()).unwrap_or("<unknown>");
        ProbeError::Fetch {
            status: None,
            body: format!("request to {url} timed out after {timeout_ms}ms"),
        }
    } else {
        ProbeError::Transport(e.to_string())
    }
}

/// Build an authenticated [`ClientContext`].
///
/// With a CSRF token in `credentials` no request is made. Without one, the
/// web root is fetched once and the `csrftoken` cookie it sets is adopted.
/// When the server sets none, the context is still returned but flagged
/// CSRF-less; [`validate`] will then report it invalid.
pub async fn build_session(
    credentials: Credentials,
    config: ClientConfig,
) -> ProbeResult<ClientContext> {
    check_cookie_value(SESSION_COOKIE, credentials.session_id())?;
    if let Some(token) = credentials.csrf_token() {
        check_cookie_value(CSRF_COOKIE, token)?;
    }
    config.validate()?;

    let web_url = config.web_url()?;
    let api_url = config.api_url()?;

    let jar = Arc::new(Jar::default());
    for origin in [&web_url, &api_url] {
        jar.add_cookie_str(
            &format!("{SESSION_COOKIE}={}; Path=/", credentials.session_id()),
            origin,
        );
        jar.add_cookie_str("ig_nrcb=1; Path=/", origin);
    }

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(default_headers(&config, &web_url)?)
        .cookie_provider(Arc::clone(&jar))
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ProbeError::Transport(format!("failed to build HTTP client: {e}")))?;

    let mut ctx = ClientContext {
        csrf_token: credentials.csrf_token().map(str::to_string),
        credentials,
        client,
        config,
        web_url,
        api_url,
        span: tracing::Span::none(),
    };

    if ctx.csrf_token.is_none() {
        ctx.csrf_token = discover_csrf(&ctx).await?;
    }

    if let Some(token) = &ctx.csrf_token {
        for origin in [&ctx.web_url, &ctx.api_url] {
            jar.add_cookie_str(&format!("{CSRF_COOKIE}={token}; Path=/"), origin);
        }
    }

    let csrf_mode = match (&ctx.csrf_token, ctx.credentials.csrf_token()) {
        (Some(_), Some(_)) => "supplied",
        (Some(_), None) => "discovered",
        (None, _) => "none",
    };
    ctx.span = tracing::info_span!("client", csrf = csrf_mode);

    Ok(ctx)
}

async fn discover_csrf(ctx: &ClientContext) -> ProbeResult<Option<String>> {
    let url = ctx.web_url.clone();
    async {
        tracing::info!("No CSRF token supplied, requesting {url} to discover one...");
        let resp = ctx.send(ctx.get(url.clone())).await?;
        let status = resp.status().as_u16();

        let token = csrf_from_set_cookie(
            resp.headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        match &token {
            Some(_) => tracing::info!("CSRF token discovered (status {status})"),
            None => tracing::warn!(
                "Server did not set a {CSRF_COOKIE} cookie (status {status}); continuing without CSRF token"
            ),
        }
        Ok::<_, ProbeError>(token)
    }
    .instrument(tracing::info_span!("csrf_discovery"))
    .await
}

/// Pick the `csrftoken` value out of a set of `Set-Cookie` header values.
///
/// Empty values (cookie deletions) are ignored; the last non-empty one wins.
pub fn csrf_from_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    values
        .into_iter()
        .filter_map(|raw| {
            let pair = raw.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            if name.trim() != CSRF_COOKIE {
                return None;
            }
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        })
        .last()
}

fn default_headers(config: &ClientConfig, web_url: &Url) -> ProbeResult<HeaderMap> {
    let origin = web_url.origin().ascii_serialization();
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header_value("Accept-Language", &config.accept_language)?,
    );
    headers.insert(header::ORIGIN, header_value("Origin", &origin)?);
    headers.insert(header::REFERER, header_value("Referer", web_url.as_str())?);
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> ProbeResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ProbeError::Config(format!("invalid value for {name} header")))
}

fn check_cookie_value(name: &str, value: &str) -> ProbeResult<()> {
    if value.is_empty() {
        return Err(ProbeError::Auth(format!("{name} is empty")));
    }
    let bad = value
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || matches!(c, ';' | ',' | '"' | '\\'));
    if bad || !value.is_ascii() {
        return Err(ProbeError::Auth(format!(
            "{name} contains characters that cannot be sent in a cookie"
        )));
    }
    Ok(())
}

/// Check that the server still accepts the session.
///
/// Returns `true` only for a 2xx answer from the validation endpoint. A
/// CSRF-less context is reported invalid without a request. Failures are
/// logged here and never propagate.
pub async fn validate(ctx: &ClientContext) -> bool {
    async {
        if ctx.is_csrf_less() {
            tracing::error!("Session has no CSRF token; authenticated requests would be rejected");
            return false;
        }

        let path = ctx.config.validation_path.trim_start_matches('/');
        let url = match ctx.web_url.join(path) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Invalid validation path {path:?}: {e}");
                return false;
            }
        };

        tracing::info!("Loading {url} to validate session...");
        match ctx.send(ctx.get(url)).await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Session accepted (status {})", resp.status().as_u16());
                true
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(
                    "Session validation failed. Status code: {status}. Response: {}",
                    snippet(&body)
                );
                false
            }
            Err(e) => {
                tracing::error!("Session validation request failed: {e}");
                false
            }
        }
    }
    .instrument(ctx.span.clone())
    .await
}
