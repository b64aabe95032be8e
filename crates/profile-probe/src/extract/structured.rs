//! Structured extraction from a parsed JSON profile document.

use serde_json::Value;

use crate::types::{FieldValue, ProfileField, ProfileRecord};

/// Paths at which the user node is looked for, in order.
const USER_NODE_PATHS: &[&[&str]] = &[&["data", "user"], &["graphql", "user"], &["user"]];

/// How a field is read from the user node.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// The value at a key path.
    Path(&'static [&'static str]),
    /// The length of the array at a key path.
    Len(&'static [&'static str]),
    /// Hashtag names from the biography entities.
    BioHashtags,
    /// Filled in by the caller, not the document.
    External,
}

fn source(field: ProfileField) -> Source {
    use ProfileField::*;
    use Source::*;
    match field {
        Username => External,
        ProfileId => Path(&["id"]),
        ProfilePictureUrl => Path(&["profile_pic_url_hd"]),
        Bio => Path(&["biography"]),
        FullName => Path(&["full_name"]),
        Website => Path(&["external_url"]),
        PrivateAccount => Path(&["is_private"]),
        VerifiedAccount => Path(&["is_verified"]),
        BusinessAccount => Path(&["is_business_account"]),
        Gender => Path(&["gender"]),
        Category => Path(&["category_name"]),
        JoinedDate => Path(&["joined_date"]),
        HighlightsCount => Path(&["highlight_reel_count"]),
        StoryViewsCount => Path(&["story_views_count"]),
        IgtvVideosCount => Path(&["total_igtv_videos"]),
        TaggedPostsCount => Path(&["tagged_posts_count"]),
        ActivityStatus => Path(&["activity_status"]),
        PhoneNumber => Path(&["business_contact_phone"]),
        Email => Path(&["public_email"]),
        FollowersCount => Path(&["edge_followed_by", "count"]),
        FollowingCount => Path(&["edge_follow", "count"]),
        MediaCount => Path(&["edge_owner_to_timeline_media", "count"]),
        Birthday => Path(&["birthday"]),
        BioLinks => BioHashtags,
        MutualFriendsCount => Path(&["edge_mutual_followed_by", "count"]),
        RecentStories => Len(&["edge_felix_video_timeline", "edges"]),
        SavedCollections => Len(&["edge_saved_media", "edges"]),
        StoryHighlightsCount => Path(&["highlight_reel_count"]),
        PinnedPostsCount => Path(&["pinned_post_count"]),
        BusinessContactInfo => Path(&["business_contact_method"]),
        AdPreferences => Path(&["ads_preferences"]),
        ActivityLog => Path(&["activity_feed"]),
        ShoppingBehavior => Path(&["shopping_tags"]),
    }
}

/// Null-safe walk down a key path. Any missing or non-object step yields `None`.
pub fn lookup<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(node, |cur, key| cur.get(*key))
}

/// Locate the user node in a profile document.
pub fn user_node(doc: &Value) -> Option<&Value> {
    USER_NODE_PATHS
        .iter()
        .filter_map(|path| lookup(doc, path))
        .find(|node| node.is_object())
}

/// Convert a JSON value to a field value. Null and empty strings are missing.
pub fn to_field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Missing,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Text(n.to_string()),
        },
        Value::String(s) if s.is_empty() => FieldValue::Missing,
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Array(items) => FieldValue::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}

fn bio_hashtags(user: &Value) -> FieldValue {
    let Some(entities) = lookup(user, &["biography_with_entities", "entities"])
        .and_then(Value::as_array)
    else {
        return FieldValue::Missing;
    };
    let tags: Vec<String> = entities
        .iter()
        .filter_map(|entity| lookup(entity, &["hashtag", "name"]))
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    FieldValue::List(tags)
}

fn read_field(user: &Value, field: ProfileField) -> FieldValue {
    match source(field) {
        Source::Path(path) => lookup(user, path)
            .map(to_field_value)
            .unwrap_or(FieldValue::Missing),
        Source::Len(path) => lookup(user, path)
            .and_then(Value::as_array)
            .map(|items| FieldValue::Integer(items.len() as i64))
            .unwrap_or(FieldValue::Missing),
        Source::BioHashtags => bio_hashtags(user),
        Source::External => FieldValue::Missing,
    }
}

/// Read every enumerated field from a JSON profile document.
pub fn extract(doc: &Value) -> ProfileRecord {
    let mut record = ProfileRecord::empty();
    let Some(user) = user_node(doc) else {
        tracing::warn!("No user node at data.user or graphql.user; every field will be missing");
        return record;
    };
    for &field in ProfileField::ALL {
        record.set(field, read_field(user, field));
    }
    record
}
