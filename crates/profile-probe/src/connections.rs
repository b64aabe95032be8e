//! Follower / following listing.
//!
//! Full enumeration needs cursor pagination and rate-limit handling, which is
//! out of scope here; [`HttpConnectionSource`] returns a single page.

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use crate::session::ClientContext;
use crate::types::{snippet, ConnectionKind, ProbeError, ProbeResult};

/// Something that can list the accounts on one side of a user's follow graph.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    async fn list(
        &self,
        ctx: &ClientContext,
        user_id: &str,
        kind: ConnectionKind,
        limit: u32,
    ) -> ProbeResult<Vec<String>>;
}

/// Lists connections through the private web API friendships endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnectionSource;

#[async_trait]
impl ConnectionSource for HttpConnectionSource {
    async fn list(
        &self,
        ctx: &ClientContext,
        user_id: &str,
        kind: ConnectionKind,
        limit: u32,
    ) -> ProbeResult<Vec<String>> {
        if user_id.is_empty() || !user_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProbeError::MissingProfileId(format!(
                "cannot list {} without a numeric profile id (got {user_id:?})",
                kind.path_segment()
            )));
        }

        let mut url = ctx.api_url().join(&format!(
            "api/v1/friendships/{user_id}/{}/",
            kind.path_segment()
        ))?;
        url.query_pairs_mut().append_pair("count", &limit.to_string());

        async {
            tracing::info!("Fetching {} for user {user_id}...", kind.path_segment());
            let resp = ctx.send(ctx.get(url)).await?;
            let status = resp.status();
            let body = ctx.read_body(resp).await?;

            if !status.is_success() {
                tracing::error!(
                    "Failed to fetch {}. Status code: {}. Response: {}",
                    kind.path_segment(),
                    status.as_u16(),
                    snippet(&body)
                );
                return Err(ProbeError::Fetch {
                    status: Some(status.as_u16()),
                    body,
                });
            }

            let doc: Value = serde_json::from_str(&body)
                .map_err(|e| ProbeError::Parse(format!("friendships response is not JSON: {e}")))?;
            let mut names = usernames(&doc);
            names.truncate(limit as usize);
            Ok(names)
        }
        .instrument(tracing::info_span!(parent: ctx.span(), "list_connections", kind = kind.path_segment()))
        .await
    }
}

/// Usernames from a friendships page (`{"users": [{"username": ...}]}`).
pub fn usernames(doc: &Value) -> Vec<String> {
    doc.get("users")
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .filter_map(|u| u.get("username").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
