//! Report rendering for profile records and connection listings.

use profile_probe::{ConnectionKind, FieldValue, ProfileRecord};

pub const PROFILE_HEADER: &str = "--- Profile Information ---";

/// One `Label: value` line per field, placeholders for missing values.
pub fn render_text(record: &ProfileRecord) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(PROFILE_HEADER);
    out.push('\n');
    for (field, value) in record.iter() {
        let shown = match value {
            FieldValue::Missing => field.placeholder(),
            FieldValue::List(items) if items.is_empty() => field.placeholder(),
            other => other.to_string(),
        };
        out.push_str(&format!("{}: {shown}\n", field.label()));
    }
    out
}

/// Header plus one username per line.
pub fn render_connections(kind: ConnectionKind, names: &[String]) -> String {
    let mut out = format!("\n--- {} ({}) ---\n", kind.label(), names.len());
    if names.is_empty() {
        out.push_str(&format!("No {} found\n", kind.label().to_lowercase()));
    }
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    out
}
