//! Orchestration: session → validation → fetch → extraction → report.

use std::io::Write;

use serde_json::{json, Map, Value};

use profile_probe::{
    build_session, extract, fetch_profile, validate, ClientConfig, ClientContext,
    ConnectionKind, ConnectionSource, FieldValue, ProfileField, ProfileRecord,
};

use crate::cli::Target;
use crate::interactive::Action;
use crate::report;

/// Outcome of a run that got past session validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub operations: usize,
    pub failed: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Run one action for one target and write the report to `out`.
///
/// Building or validating the session failing is an error. After that, each
/// operation that fails is logged and counted in the summary, and its output
/// degrades to placeholders instead of aborting the remaining operations.
pub async fn execute<W: Write>(
    target: Target,
    action: Action,
    config: ClientConfig,
    source: &dyn ConnectionSource,
    json_output: bool,
    out: &mut W,
) -> anyhow::Result<Summary> {
    let ctx = build_session(target.credentials, config).await?;
    if !validate(&ctx).await {
        anyhow::bail!("Failed to validate session. Please check credentials.");
    }
    tracing::info!("Session validated. Proceeding to fetch data...");

    let mut summary = Summary::default();
    let mut json_report = Map::new();

    let record = profile_or_placeholders(&ctx, &target.username, &mut summary).await;
    if action.wants_profile() {
        if json_output {
            json_report.insert("profile".into(), serde_json::to_value(&record)?);
        } else {
            out.write_all(report::render_text(&record).as_bytes())?;
        }
    }

    if action.wants_connections() {
        for kind in [ConnectionKind::Followers, ConnectionKind::Following] {
            summary.operations += 1;
            let names = match record[ProfileField::ProfileId].as_str() {
                Some(user_id) => {
                    let limit = ctx.config().connection_limit;
                    match source.list(&ctx, user_id, kind, limit).await {
                        Ok(names) => Some(names),
                        Err(e) => {
                            tracing::error!("Could not list {}: {e}", kind.path_segment());
                            None
                        }
                    }
                }
                None => {
                    tracing::error!(
                        "Profile id for '{}' is unknown; cannot list {}",
                        target.username,
                        kind.path_segment()
                    );
                    None
                }
            };
            if names.is_none() {
                summary.failed += 1;
            }

            if json_output {
                let value = names.map(|n| json!(n)).unwrap_or(Value::Null);
                json_report.insert(kind.path_segment().into(), value);
            } else {
                let text = match &names {
                    Some(names) => report::render_connections(kind, names),
                    None => format!(
                        "\n--- {} ---\nCould not fetch {}\n",
                        kind.label(),
                        kind.path_segment()
                    ),
                };
                out.write_all(text.as_bytes())?;
            }
        }
    }

    if json_output {
        let doc = if action == Action::Profile {
            json_report.remove("profile").unwrap_or(Value::Null)
        } else {
            Value::Object(json_report)
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
    }
    out.flush()?;

    Ok(summary)
}

async fn profile_or_placeholders(
    ctx: &ClientContext,
    username: &str,
    summary: &mut Summary,
) -> ProfileRecord {
    summary.operations += 1;
    match fetch_profile(ctx, username).await {
        Ok(doc) => extract(&doc, username),
        Err(e) => {
            tracing::error!("Could not fetch profile for '{username}': {e}");
            summary.failed += 1;
            let mut record = ProfileRecord::empty();
            record.set(
                ProfileField::Username,
                FieldValue::Text(username.trim_start_matches('@').to_string()),
            );
            record
        }
    }
}
