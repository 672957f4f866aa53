pub mod ad;
pub mod article;
pub mod author;
pub mod headlines;

pub use ad::Ad;
pub use article::{Article, AuthorRef, Category, CategoryRef, Subcategory, SubcategoryRef};
pub use author::{Author, SocialLinks};
pub use headlines::normalize_headlines;

use serde::{Deserialize, Deserializer};

/// Read an explicit `null` as the field's default. Used on fields that are
/// optional on the wire but modeled as plain values.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
