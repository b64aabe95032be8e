//! Profile document fetching.

use tracing::Instrument;
use url::Url;

use crate::config::ProfileEndpoint;
use crate::session::ClientContext;
use crate::types::{snippet, ProbeError, ProbeResult, RawProfileDocument};

const MAX_USERNAME_LEN: usize = 30;

/// Reject usernames the platform could never have issued.
pub fn check_username(username: &str) -> ProbeResult<()> {
    let ok = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ProbeError::InvalidUsername(username.to_string()))
    }
}

/// URL of the profile document for `username` under the configured endpoint.
pub fn profile_url(ctx: &ClientContext, username: &str) -> ProbeResult<Url> {
    match ctx.config().endpoint {
        ProfileEndpoint::WebProfileInfo => {
            let mut url = ctx.api_url().join("api/v1/users/web_profile_info/")?;
            url.query_pairs_mut().append_pair("username", username);
            Ok(url)
        }
        ProfileEndpoint::ProfilePage => Ok(ctx.web_url().join(&format!("{username}/"))?),
    }
}

/// Fetch the raw profile document for `username`.
///
/// A 2xx body that parses as JSON comes back as [`RawProfileDocument::Json`];
/// anything else that succeeded comes back as [`RawProfileDocument::Text`] so
/// the pattern extractor can have a go at it. Non-2xx answers and timeouts
/// are [`ProbeError::Fetch`]. There is no retry.
pub async fn fetch_profile(ctx: &ClientContext, username: &str) -> ProbeResult<RawProfileDocument> {
    let username = username.trim().trim_start_matches('@');
    check_username(username)?;
    let url = profile_url(ctx, username)?;

    async {
        tracing::info!("Fetching profile information for '{username}'...");
        let resp = ctx.send(ctx.get(url)).await?;
        let status = resp.status();
        let body = ctx.read_body(resp).await?;

        if !status.is_success() {
            tracing::error!(
                "Failed to fetch profile info. Status code: {}. Response: {}",
                status.as_u16(),
                snippet(&body)
            );
            return Err(ProbeError::Fetch {
                status: Some(status.as_u16()),
                body,
            });
        }

        match parse_document(&body) {
            Ok(value) => Ok(RawProfileDocument::Json(value)),
            Err(e) => {
                tracing::debug!("{e}; falling back to pattern extraction");
                Ok(RawProfileDocument::Text(body))
            }
        }
    }
    .instrument(tracing::info_span!(parent: ctx.span(), "fetch_profile", username))
    .await
}

/// Parse a response body as a JSON document.
pub fn parse_document(body: &str) -> ProbeResult<serde_json::Value> {
    serde_json::from_str(body)
        .map_err(|e| ProbeError::Parse(format!("response body is not JSON: {e}")))
}
