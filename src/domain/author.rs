use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

impl SocialLinks {
    /// Present links as `(network, url)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("twitter", self.twitter.as_deref()),
            ("linkedin", self.linkedin.as_deref()),
            ("facebook", self.facebook.as_deref()),
            ("instagram", self.instagram.as_deref()),
        ]
        .into_iter()
        .filter_map(|(network, url)| url.filter(|u| !u.is_empty()).map(|u| (network, u)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub article_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_links: SocialLinks,
}

impl Author {
    /// Profile image, or a generated initials avatar when none is set.
    pub fn avatar_url(&self) -> String {
        if let Some(image) = self.profile_image.as_deref().filter(|s| !s.is_empty()) {
            return image.to_string();
        }

        Url::parse_with_params(
            "https://ui-avatars.com/api/",
            &[
                ("name", self.name.as_str()),
                ("size", "200"),
                ("background", "random"),
            ],
        )
        .map(String::from)
        .unwrap_or_default()
    }

    pub fn display_bio(&self) -> &str {
        self.bio
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("Professional journalist and content creator.")
    }
}
