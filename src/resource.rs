use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

/// Static key/value metadata describing the running service instance
/// (version, namespace, environment, ...).
///
/// Built once at startup from an `OTEL_RESOURCE_ATTRIBUTES`-style string
/// and never mutated afterwards, so it can be shared freely across
/// threads behind an `Arc` or a plain reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAttributes {
    attrs: HashMap<String, String>,
}

impl ResourceAttributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Value for `key`, or `""` when it is not set.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse a comma-separated `key=value` list into [`ResourceAttributes`].
///
/// **Behavior**
/// - segments are trimmed; empty segments and segments without `=` are
///   skipped silently;
/// - only the first `=` splits, so values may themselves contain `=`;
/// - a later duplicate key overwrites an earlier one.
///
/// Never fails: malformed input simply yields fewer attributes.
pub fn parse_resource_attributes(raw: &str) -> ResourceAttributes {
    let mut attrs = HashMap::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        attrs.insert(key.trim().to_string(), value.trim().to_string());
    }
    ResourceAttributes { attrs }
}

impl FromStr for ResourceAttributes {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_resource_attributes(s))
    }
}

impl<K, V> FromIterator<(K, V)> for ResourceAttributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ResourceAttributes {
            attrs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
