//! The shared request header set.
//!
//! Built once at startup from static values plus the cookie secret and
//! then shared read-only by every concurrent probe. One historical client
//! variant iterated an uninitialized map and silently attached nothing;
//! constructing the set here, once, makes that impossible.

/// Ordered header name/value pairs attached to every check request.
#[derive(Debug, Clone)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Build the standard set: user id, session cookie, JSON content type.
    pub fn new(user_id: &str, cookie: &str) -> Self {
        Self {
            entries: vec![
                ("X-User-Id".to_string(), user_id.to_string()),
                ("Cookie".to_string(), cookie.to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
