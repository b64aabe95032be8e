//! Field extraction: raw profile document to [`ProfileRecord`].
//!
//! Two strategies sit behind [`extract`], picked by document shape. JSON
//! documents go through [`structured`], which walks a known user node. Text
//! bodies go through [`pattern`], a best-effort substring scraper. Neither
//! can fail: a field that cannot be recovered is left as
//! [`FieldValue::Missing`].

pub mod pattern;
pub mod structured;

use crate::types::{FieldValue, ProfileField, ProfileRecord, RawProfileDocument};

/// Reduce a raw document to a placeholder-complete record.
pub fn extract(doc: &RawProfileDocument, username: &str) -> ProfileRecord {
    let mut record = match doc {
        RawProfileDocument::Json(value) => structured::extract(value),
        RawProfileDocument::Text(body) => pattern::extract(body),
    };
    record.set(
        ProfileField::Username,
        FieldValue::Text(username.trim().trim_start_matches('@').to_string()),
    );

    let strategy = if doc.is_json() { "structured" } else { "pattern" };
    tracing::debug!(
        strategy,
        "extracted {} of {} fields",
        record.found_count(),
        record.len()
    );
    record
}
