//! Case-insensitive header sets and the dynamic header provider hook

use crate::error::BoxError;
use async_trait::async_trait;
use clientgen_common::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headers keyed by lowercased name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// Overlay `other`; its values win on conflicts
    pub fn merge(&mut self, other: &HeaderSet) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for HeaderSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HeaderSet> for BTreeMap<String, String> {
    fn from(headers: HeaderSet) -> Self {
        headers.0
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderSet::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// What a header provider knows about the call it is producing headers for
#[derive(Debug, Clone)]
pub struct CallInfo {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    /// Headers of the inbound request the call is made on behalf of
    pub incoming: HeaderSet,
}

/// Produces headers per call, e.g. a token forwarded from the inbound request
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    async fn headers(&self, call: &CallInfo) -> Result<HeaderSet, BoxError>;
}

/// [`HeaderProvider`] backed by a synchronous closure
pub struct FnHeaderProvider<F>(F);

/// Wrap a closure as a [`HeaderProvider`]
pub fn provider_fn<F>(f: F) -> FnHeaderProvider<F>
where
    F: Fn(&CallInfo) -> Result<HeaderSet, BoxError> + Send + Sync,
{
    FnHeaderProvider(f)
}

#[async_trait]
impl<F> HeaderProvider for FnHeaderProvider<F>
where
    F: Fn(&CallInfo) -> Result<HeaderSet, BoxError> + Send + Sync,
{
    async fn headers(&self, call: &CallInfo) -> Result<HeaderSet, BoxError> {
        (self.0)(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_case_insensitive() {
        let mut headers = HeaderSet::new().with("X-Api-Key", "one");
        assert_eq!(headers.get("x-api-key"), Some("one"));
        assert_eq!(headers.get("X-API-KEY"), Some("one"));

        headers.insert("x-api-KEY", "two");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-api-key"), Some("two"));
        assert_eq!(headers.remove("X-Api-Key"), Some("two".to_string()));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_merge_overrides() {
        let mut base: HeaderSet = [("accept", "text/plain"), ("x-a", "1")].into_iter().collect();
        base.merge(&HeaderSet::new().with("Accept", "application/json"));
        assert_eq!(base.get("accept"), Some("application/json"));
        assert_eq!(base.get("x-a"), Some("1"));
    }

    #[test]
    fn test_serde_lowercases() {
        let headers: HeaderSet = serde_json::from_str(r#"{"Authorization": "Bearer t"}"#).unwrap();
        assert_eq!(headers.get("authorization"), Some("Bearer t"));
        assert_eq!(
            serde_json::to_string(&headers).unwrap(),
            r#"{"authorization":"Bearer t"}"#
        );
    }

    #[tokio::test]
    async fn test_provider_fn() {
        let provider = provider_fn(|call: &CallInfo| {
            Ok(HeaderSet::new().with("x-operation", call.operation_id.clone()))
        });
        let call = CallInfo {
            operation_id: "getMovies".to_string(),
            method: HttpMethod::Get,
            path: "/movies".to_string(),
            incoming: HeaderSet::new(),
        };
        let headers = provider.headers(&call).await.unwrap();
        assert_eq!(headers.get("x-operation"), Some("getMovies"));
    }
}
