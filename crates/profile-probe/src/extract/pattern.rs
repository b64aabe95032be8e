//! Regex-marker extraction for bodies that are not JSON.
//!
//! Profile pages embed the user object as JSON inside script tags. Rather than
//! parse the page, each field has one pattern anchored on a known opening
//! token such as `"edge_followed_by":{"count":` and captures the value that
//! follows. It is best-effort: it depends on undocumented page markup and
//! stops working whenever that markup changes. Fields whose marker is absent
//! are left missing.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{FieldValue, ProfileField, ProfileRecord};

/// How the captured text is turned into a value.
#[derive(Debug, Clone, Copy)]
enum Capture {
    /// JSON string contents, still escaped.
    Quoted,
    /// Signed integer.
    Count,
    /// `true` or `false`.
    Flag,
    /// A run of digits kept as text (identifiers).
    Digits,
}

const QUOTED: &str = r#"\s*"((?:[^"\\]|\\.)*)""#;
const COUNT: &str = r"\s*(-?\d+)";
const FLAG: &str = r"\s*(true|false)\b";

/// Field, capture kind, then the marker as a regex prefix.
const MARKERS: &[(ProfileField, Capture, &str)] = &[
    (ProfileField::ProfileId, Capture::Digits, r#""profilePage_(\d+)"#),
    (ProfileField::ProfilePictureUrl, Capture::Quoted, r#""profile_pic_url_hd":"#),
    (ProfileField::Bio, Capture::Quoted, r#""biography":"#),
    (ProfileField::FullName, Capture::Quoted, r#""full_name":"#),
    (ProfileField::Website, Capture::Quoted, r#""external_url":"#),
    (ProfileField::PrivateAccount, Capture::Flag, r#""is_private":"#),
    (ProfileField::VerifiedAccount, Capture::Flag, r#""is_verified":"#),
    (ProfileField::BusinessAccount, Capture::Flag, r#""is_business_account":"#),
    (ProfileField::Category, Capture::Quoted, r#""category_name":"#),
    (ProfileField::HighlightsCount, Capture::Count, r#""highlight_reel_count":"#),
    (ProfileField::StoryHighlightsCount, Capture::Count, r#""highlight_reel_count":"#),
    (ProfileField::PhoneNumber, Capture::Quoted, r#""business_contact_phone":"#),
    (ProfileField::Email, Capture::Quoted, r#""public_email":"#),
    (ProfileField::FollowersCount, Capture::Count, r#""edge_followed_by":\{"count":"#),
    (ProfileField::FollowingCount, Capture::Count, r#""edge_follow":\{"count":"#),
    (ProfileField::MediaCount, Capture::Count, r#""edge_owner_to_timeline_media":\{"count":"#),
    (ProfileField::MutualFriendsCount, Capture::Count, r#""edge_mutual_followed_by":\{"count":"#),
    (ProfileField::PinnedPostsCount, Capture::Count, r#""pinned_post_count":"#),
];

struct CompiledMarker {
    field: ProfileField,
    capture: Capture,
    regex: Regex,
}

fn compiled() -> &'static [CompiledMarker] {
    static COMPILED: OnceLock<Vec<CompiledMarker>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        MARKERS
            .iter()
            .map(|&(field, capture, marker)| {
                let value = match capture {
                    Capture::Quoted => QUOTED,
                    Capture::Count => COUNT,
                    Capture::Flag => FLAG,
                    Capture::Digits => "",
                };
                CompiledMarker {
                    field,
                    capture,
                    regex: Regex::new(&format!("{marker}{value}")).expect("marker regex is valid"),
                }
            })
            .collect()
    })
}

/// Recover what can be recovered from a text body.
pub fn extract(body: &str) -> ProfileRecord {
    let mut record = ProfileRecord::empty();
    for marker in compiled() {
        if let Some(value) = find_value(body, marker) {
            record.set(marker.field, value);
        }
    }
    record
}

/// Value after the first occurrence of the marker, if any.
fn find_value(body: &str, marker: &CompiledMarker) -> Option<FieldValue> {
    let raw = marker.regex.captures(body)?.get(1)?.as_str();
    match marker.capture {
        Capture::Quoted => {
            let text = unescape(raw);
            (!text.is_empty()).then_some(FieldValue::Text(text))
        }
        Capture::Count => raw.parse().ok().map(FieldValue::Integer),
        Capture::Flag => Some(FieldValue::Bool(raw == "true")),
        Capture::Digits => Some(FieldValue::Text(raw.to_string())),
    }
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}
