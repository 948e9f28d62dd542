//! Best-effort mapping from raw dataset items to [`CommentRecord`]s.
//!
//! Scraper actors disagree on field names, so each logical field has an
//! ordered list of candidate keys. The first candidate that is present,
//! non-null and convertible wins. Keys may be dotted paths (`author.name`).

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::types::CommentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    AuthorName,
    AuthorId,
    CommentId,
    CommentText,
    ReactionCount,
    PostUrl,
    ParentId,
    PostTitle,
}

pub const FIELD_ALIASES: &[(CommentField, &[&str])] = &[
    (
        CommentField::AuthorName,
        &["userName", "authorName", "profileName", "author.name", "name"],
    ),
    (
        CommentField::AuthorId,
        &["userId", "authorId", "profileId", "author.id"],
    ),
    (CommentField::CommentId, &["commentId", "id"]),
    (
        CommentField::CommentText,
        &["commentText", "text", "message", "body"],
    ),
    (
        CommentField::ReactionCount,
        &["reactionCount", "likesCount", "likes", "reactionsCount"],
    ),
    (
        CommentField::PostUrl,
        &["facebookUrl", "postUrl", "inputUrl", "url"],
    ),
    (CommentField::ParentId, &["parentId", "replyToCommentId"]),
    (CommentField::PostTitle, &["postTitle", "title"]),
];

pub fn aliases_for(field: CommentField) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

/// Follow a dotted path through nested objects.
pub fn lookup<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(item, |current, segment| current.as_object()?.get(segment))
}

/// Resolve a field: walk its candidates in order, return the first that converts.
pub fn first_present<T>(
    item: &Value,
    keys: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter()
        .filter_map(|key| lookup(item, key))
        .filter(|value| !value.is_null())
        .find_map(convert)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            // Blank strings are absent; anything else is kept as sent.
            (!s.trim().is_empty()).then(|| s.clone())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().replace(',', "").parse::<i64>().ok(),
        _ => None,
    }
}

fn text_field(item: &Value, field: CommentField) -> Option<String> {
    first_present(item, aliases_for(field), as_text)
}

/// Map one raw item. Never fails: missing fields default to `None` / 0.
pub fn normalize_item(
    raw: Value,
    run_id: &str,
    dataset_id: &str,
    fetched_at: DateTime<Utc>,
) -> CommentRecord {
    CommentRecord {
        id: Uuid::new_v4(),
        run_id: run_id.to_string(),
        dataset_id: dataset_id.to_string(),
        fetched_at,
        author_name: text_field(&raw, CommentField::AuthorName),
        author_id: text_field(&raw, CommentField::AuthorId),
        comment_id: text_field(&raw, CommentField::CommentId),
        comment_text: text_field(&raw, CommentField::CommentText),
        reaction_count: first_present(&raw, aliases_for(CommentField::ReactionCount), as_count)
            .unwrap_or(0),
        post_url: text_field(&raw, CommentField::PostUrl),
        parent_id: text_field(&raw, CommentField::ParentId),
        post_title: text_field(&raw, CommentField::PostTitle),
        raw,
    }
}

/// Map a whole dataset with one shared fetch timestamp.
pub fn normalize_items(
    items: Vec<Value>,
    run_id: &str,
    dataset_id: &str,
    fetched_at: DateTime<Utc>,
) -> Vec<CommentRecord> {
    items
        .into_iter()
        .map(|item| normalize_item(item, run_id, dataset_id, fetched_at))
        .collect()
}
