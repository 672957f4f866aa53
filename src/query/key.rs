use std::fmt;

/// One primitive component of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Str(value.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(i64::from(value))
    }
}

impl From<usize> for KeyPart {
    fn from(value: usize) -> Self {
        KeyPart::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => match serde_json::to_string(s) {
                Ok(quoted) => f.write_str(&quoted),
                Err(_) => write!(f, "{:?}", s),
            },
            KeyPart::Int(n) => write!(f, "{}", n),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Null => f.write_str("null"),
        }
    }
}

/// Ordered tuple identifying a cached query result, e.g.
/// `["articles","category","sports",20]`.
///
/// Keys compare by value: two keys built from equal parts in the same order
/// are the same key, which matches equality of their serialized forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<KeyPart>);

impl CacheKey {
    pub fn new(root: impl Into<KeyPart>) -> Self {
        Self(vec![root.into()])
    }

    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// True when `prefix` matches the leading parts of this key.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", part)?;
        }
        f.write_str("]")
    }
}

/// Build a [`CacheKey`] from a list of parts.
///
/// ```
/// use newsdesk::cache_key;
///
/// let key = cache_key!["articles", "category", "sports", 20usize];
/// assert_eq!(key.to_string(), r#"["articles","category","sports",20]"#);
/// ```
#[macro_export]
macro_rules! cache_key {
    ($root:expr $(, $part:expr)* $(,)?) => {
        $crate::query::CacheKey::new($root)$(.with($part))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_form() {
        let key = CacheKey::new("articles")
            .with("category")
            .with("sports")
            .with(20usize);
        assert_eq!(key.to_string(), r#"["articles","category","sports",20]"#);
    }

    #[test]
    fn test_value_equality() {
        let a = crate::cache_key!["articles", "tag", String::from("rust"), 20usize];
        let b = crate::cache_key!["articles", "tag", "rust", 20i64];
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_string_and_number_parts_differ() {
        let a = crate::cache_key!["authors", "1"];
        let b = crate::cache_key!["authors", 1i64];
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_order_matters() {
        let a = crate::cache_key!["articles", "a", "b"];
        let b = crate::cache_key!["articles", "b", "a"];
        assert_ne!(a, b);
    }

    #[test]
    fn test_null_and_escaping() {
        let key = crate::cache_key!["articles", "related", None::<String>, "say \"hi\""];
        assert_eq!(key.to_string(), r#"["articles","related",null,"say \"hi\""]"#);
    }

    #[test]
    fn test_starts_with() {
        let key = crate::cache_key!["articles", "category", "sports", 20usize];
        assert!(key.starts_with(&crate::cache_key!["articles"]));
        assert!(!key.starts_with(&crate::cache_key!["categories"]));
    }
}
