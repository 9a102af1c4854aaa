use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite cache key: resource identity plus a canonical query shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCacheKey")]
pub struct CacheKey {
    resource: String,
    query: String,
}

impl CacheKey {
    pub fn new(resource: impl Into<String>, query: impl Into<String>) -> Result<Self, String> {
        let resource = resource.into();
        if resource.trim().is_empty() {
            return Err("Cache key resource cannot be empty".to_string());
        }
        Ok(Self {
            resource,
            query: query.into(),
        })
    }

    pub fn resource_only(resource: impl Into<String>) -> Result<Self, String> {
        Self::new(resource, String::new())
    }

    /// Builds the query part from any serializable filter. `serde_json` keeps
    /// map keys sorted, so equal filters produce equal keys.
    pub fn for_query<Q: Serialize>(resource: impl Into<String>, query: &Q) -> Result<Self, String> {
        let value = serde_json::to_value(query).map_err(|e| format!("Invalid cache query: {e}"))?;
        Self::new(resource, value.to_string())
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Deserialize)]
struct RawCacheKey {
    resource: String,
    #[serde(default)]
    query: String,
}

impl TryFrom<RawCacheKey> for CacheKey {
    type Error = String;

    fn try_from(raw: RawCacheKey) -> Result<Self, Self::Error> {
        Self::new(raw.resource, raw.query)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}:{}", self.resource, self.query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_filters_build_equal_keys() {
        let a = CacheKey::for_query("projects", &json!({"status": "open", "page": 1})).unwrap();
        let b = CacheKey::for_query("projects", &json!({"page": 1, "status": "open"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.resource(), "projects");
    }

    #[test]
    fn empty_resource_is_rejected() {
        assert!(CacheKey::new("  ", "q").is_err());
        assert!(serde_json::from_str::<CacheKey>(r#"{"resource":"","query":"q"}"#).is_err());

        let key: CacheKey = serde_json::from_str(r#"{"resource":"budgets"}"#).unwrap();
        assert_eq!(key, CacheKey::resource_only("budgets").unwrap());
    }
}
