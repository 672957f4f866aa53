use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::null_as_default;

/// An advertisement creative served by `/ads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default, alias = "url")]
    pub link: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ad {
    pub fn label(&self) -> &str {
        self.alt
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("Sponsored Content")
    }
}
