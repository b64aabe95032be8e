//! Core data types for credentials, raw documents and normalized profiles.

use std::fmt;
use std::ops::Index;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Pre-obtained credentials for an already-authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    session_id: String,
    csrf_token: Option<String>,
}

impl Credentials {
    pub fn new(session_id: impl Into<String>, csrf_token: Option<String>) -> Self {
        Self {
            session_id: session_id.into().trim().to_string(),
            csrf_token: csrf_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("session_id", &"<redacted>")
            .field(
                "csrf_token",
                &self.csrf_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// A profile document as returned by the upstream, before extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProfileDocument {
    /// Body parsed as JSON.
    Json(Value),
    /// Body that did not parse as JSON (usually an HTML page).
    Text(String),
}

impl RawProfileDocument {
    pub fn is_json(&self) -> bool {
        matches!(self, RawProfileDocument::Json(_))
    }
}

/// Value of a single profile field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
    /// Placeholder for a field the upstream did not provide.
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
            FieldValue::Missing => Ok(()),
        }
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<bool> for FieldValue {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<i64> for FieldValue {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::List(items) if !items.is_empty() => items.serialize(serializer),
            FieldValue::List(_) | FieldValue::Missing => serializer.serialize_none(),
        }
    }
}

macro_rules! profile_fields {
    ($($variant:ident => $label:literal,)*) => {
        /// The fixed, ordered set of fields every profile record carries.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ProfileField {
            $($variant,)*
        }

        impl ProfileField {
            /// All fields in presentation order.
            pub const ALL: &'static [ProfileField] = &[$(ProfileField::$variant,)*];

            /// Human-readable label used in reports.
            pub fn label(self) -> &'static str {
                match self {
                    $(ProfileField::$variant => $label,)*
                }
            }
        }
    };
}

profile_fields! {
    Username => "Username",
    ProfileId => "Profile ID",
    ProfilePictureUrl => "Profile Picture URL",
    Bio => "Bio",
    FullName => "Full Name",
    Website => "Website",
    PrivateAccount => "Private Account",
    VerifiedAccount => "Verified Account",
    BusinessAccount => "Business Account",
    Gender => "Gender",
    Category => "Category",
    JoinedDate => "Joined Date",
    HighlightsCount => "Highlights Count",
    StoryViewsCount => "Story Views Count",
    IgtvVideosCount => "IGTV Videos Count",
    TaggedPostsCount => "Tagged Posts Count",
    ActivityStatus => "Activity Status",
    PhoneNumber => "Phone Number",
    Email => "Email",
    FollowersCount => "Followers Count",
    FollowingCount => "Following Count",
    MediaCount => "Media Count",
    Birthday => "Birthday",
    BioLinks => "Bio Links",
    MutualFriendsCount => "Mutual Friends Count",
    RecentStories => "Recent Stories",
    SavedCollections => "Saved Collections",
    StoryHighlightsCount => "Story Highlights Count",
    PinnedPostsCount => "Pinned Posts Count",
    BusinessContactInfo => "Business Contact Info",
    AdPreferences => "Ad Preferences",
    ActivityLog => "Activity Log",
    ShoppingBehavior => "Shopping Behavior",
}

impl ProfileField {
    /// Look a field up by its report label (case-insensitive).
    pub fn from_label(label: &str) -> Option<ProfileField> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Text shown in place of a value the upstream did not provide.
    pub fn placeholder(self) -> String {
        format!("Could not find {}", self.label().to_lowercase())
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized profile: every [`ProfileField`] present, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    values: Vec<FieldValue>,
}

impl ProfileRecord {
    /// A record with every field set to [`FieldValue::Missing`].
    pub fn empty() -> Self {
        Self {
            values: vec![FieldValue::Missing; ProfileField::ALL.len()],
        }
    }

    pub fn set(&mut self, field: ProfileField, value: FieldValue) {
        self.values[field as usize] = value;
    }

    pub fn field(&self, field: ProfileField) -> &FieldValue {
        &self.values[field as usize]
    }

    /// Look a value up by report label, e.g. `record.get("Profile ID")`.
    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        ProfileField::from_label(label).map(|f| self.field(f))
    }

    /// Iterate over `(field, value)` pairs in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (ProfileField, &FieldValue)> {
        ProfileField::ALL.iter().copied().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of fields the upstream actually provided.
    pub fn found_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_missing()).count()
    }
}

impl Default for ProfileRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<ProfileField> for ProfileRecord {
    type Output = FieldValue;

    fn index(&self, field: ProfileField) -> &FieldValue {
        self.field(field)
    }
}

impl Index<&str> for ProfileRecord {
    type Output = FieldValue;

    /// Panics when `label` is not one of the enumerated labels.
    fn index(&self, label: &str) -> &FieldValue {
        match ProfileField::from_label(label) {
            Some(field) => self.field(field),
            None => panic!("unknown profile field label: {label}"),
        }
    }
}

impl Serialize for ProfileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.label(), value)?;
        }
        map.end()
    }
}

/// Which side of the follow graph to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Followers,
    Following,
}

impl ConnectionKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            ConnectionKind::Followers => "followers",
            ConnectionKind::Following => "following",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionKind::Followers => "Followers",
            ConnectionKind::Following => "Following",
        }
    }
}

/// Errors that can occur while talking to the upstream.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Fetch failed ({}): {}", status_label(.status), snippet(.body))]
    Fetch { status: Option<u16>, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Profile id unavailable: {0}")]
    MissingProfileId(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// HTTP status observed by a failed fetch, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeError::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    /// The request ran out of time before a status or a full body arrived.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Fetch { status: None, .. })
    }
}

impl From<url::ParseError> for ProbeError {
    fn from(e: url::ParseError) -> Self {
        ProbeError::Config(format!("invalid URL: {e}"))
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no status".to_string(),
    }
}

/// Maximum number of body characters carried into error messages and logs.
pub const BODY_SNIPPET_CHARS: usize = 200;

/// First [`BODY_SNIPPET_CHARS`] characters of a body, for diagnostics.
pub fn snippet(body: &str) -> String {
    let mut out: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
    if body.chars().count() > BODY_SNIPPET_CHARS {
        out.push_str("...");
    }
    out
}

/// Convenience result type.
pub type ProbeResult<T> = Result<T, ProbeError>;
