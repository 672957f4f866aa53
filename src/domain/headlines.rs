use serde_json::Value;
use tracing::warn;

use crate::domain::Article;

/// Coerce a `/articles` response into a list of headlines.
///
/// Accepts a bare array or an object carrying the array under `articles`.
/// Any other shape yields an empty list; items that fail to decode are skipped.
pub fn normalize_headlines(value: Value) -> Vec<Article> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("articles") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Article>(item) {
            Ok(article) => Some(article),
            Err(e) => {
                warn!(error = %e, "skipping malformed headline");
                None
            }
        })
        .collect()
}
