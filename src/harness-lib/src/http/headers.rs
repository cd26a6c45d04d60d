use serde::Serialize;

/// Ordered header list with case-insensitive lookup and override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<(String, String)>);

impl HeaderSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets `name`, replacing any existing header with the same name regardless of case.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(i) = self
            .0
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            self.0[i] = (name, value);
        } else {
            self.0.push((name, value));
        }
    }

    /// Adds a value for `name`; a repeated header keeps every value, joined by `", "`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .0
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => self.0.push((name, value)),
        }
    }

    /// Sets `name` only when it is not present yet.
    pub fn set_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.0.push((name.to_string(), value.into()));
        }
    }

    /// Applies every header of `other` on top of this set; `other` wins on conflict.
    pub fn extend_override(&mut self, other: &HeaderSet) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
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
}

impl<K, V> FromIterator<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_case_insensitively() {
        let mut headers = HeaderSet::new();
        headers.set("Authorization", "Bearer a");
        headers.set("authorization", "Bearer b");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("AUTHORIZATION"), Some("Bearer b"));
    }

    #[test]
    fn test_extend_override_caller_wins() {
        let mut headers: HeaderSet = [("Authorization", "Bearer auth"), ("tenant-id", "1")]
            .into_iter()
            .collect();
        let caller: HeaderSet = [("AUTHORIZATION", "Bearer caller")].into_iter().collect();

        headers.extend_override(&caller);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("authorization"), Some("Bearer caller"));
        assert_eq!(headers.get("tenant-id"), Some("1"));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut headers = HeaderSet::new();
        headers.set("Content-Type", "text/plain");
        headers.set_default("content-type", "application/json");
        headers.set_default("Accept", "*/*");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("accept"), Some("*/*"));
    }

    #[test]
    fn test_append_joins_repeated_values() {
        let mut headers = HeaderSet::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("set-cookie", "b=2");
        headers.append("X-Id", "7");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("SET-COOKIE"), Some("a=1, b=2"));
        assert_eq!(headers.get("x-id"), Some("7"));
    }
}
