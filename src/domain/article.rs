use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{null_as_default, Author};

/// A top-level section such as `sports` or `world`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
}

/// A category field that the API sends either as a bare id or as the
/// populated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Reference(String),
    Embedded(Category),
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Reference(id) => id,
            CategoryRef::Embedded(category) => &category.id,
        }
    }

    /// Only known when the category was embedded.
    pub fn slug(&self) -> Option<&str> {
        match self {
            CategoryRef::Reference(_) => None,
            CategoryRef::Embedded(category) => Some(&category.slug),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            CategoryRef::Reference(_) => None,
            CategoryRef::Embedded(category) => Some(&category.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubcategoryRef {
    Reference(String),
    Embedded(Subcategory),
}

impl SubcategoryRef {
    pub fn id(&self) -> &str {
        match self {
            SubcategoryRef::Reference(id) => id,
            SubcategoryRef::Embedded(subcategory) => &subcategory.id,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        match self {
            SubcategoryRef::Reference(_) => None,
            SubcategoryRef::Embedded(subcategory) => Some(&subcategory.slug),
        }
    }
}

/// Byline: a plain name or a populated author document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Name(String),
    Embedded(Author),
}

impl AuthorRef {
    pub fn name(&self) -> &str {
        match self {
            AuthorRef::Name(name) => name,
            AuthorRef::Embedded(author) => &author.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub subcategory: Option<SubcategoryRef>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Fields this crate does not model, kept so payloads pass through intact.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(CategoryRef::id)
    }

    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().and_then(CategoryRef::slug)
    }

    pub fn subcategory_slug(&self) -> Option<&str> {
        self.subcategory.as_ref().and_then(SubcategoryRef::slug)
    }

    /// Route path `category/subcategory/slug-id`, available only when both
    /// category and subcategory were embedded.
    pub fn seo_path(&self) -> Option<String> {
        let category = self.category_slug().filter(|s| !s.is_empty())?;
        let subcategory = self.subcategory_slug().filter(|s| !s.is_empty())?;
        Some(format!("{}/{}/{}-{}", category, subcategory, self.slug, self.id))
    }

    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            "(Untitled)".to_string()
        } else {
            decode_html_entities(&self.title).to_string()
        }
    }

    /// Best available body text: full content, then description.
    pub fn display_content(&self) -> String {
        let raw = self
            .content
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("");
        decode_html_entities(raw).to_string()
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().map(AuthorRef::name)
    }
}
