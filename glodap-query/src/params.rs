use std::collections::BTreeMap;

/// Raw string-keyed query parameters, as handed over by the serving layer.
///
/// # Example
///
/// ```
/// use glodap_query::RawParams;
///
/// let mut params = RawParams::new();
/// params.insert("cruise", "21OR19910626");
/// params.insert("append", "temperature,salinity");
/// assert_eq!(params.get("cruise"), Some("21OR19910626"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RawParams {
    inner: BTreeMap<String, String>,
}

impl RawParams {
    /// Creates an empty parameter map.
    pub fn new() -> RawParams {
        RawParams::default()
    }

    /// Inserts a parameter, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Returns the raw value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> RawParams {
        RawParams {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
