use std::fmt;

use wiredesk_shared::ListParams;

/// Hierarchical cache key. Invalidation matches on prefix, so `["wires"]`
/// covers every list page while leaving `["wire", id]` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Prefix of every wire-list page.
    pub fn wires() -> Self {
        Self::new(["wires"])
    }

    /// One page of the wire list, as `["wires", page, page_size, status]`.
    /// An absent filter is the empty string.
    pub fn wire_list(params: &ListParams) -> Self {
        Self(vec![
            "wires".to_string(),
            params.page.to_string(),
            params.page_size.to_string(),
            params
                .status
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        ])
    }

    pub fn wire(id: i64) -> Self {
        Self(vec!["wire".to_string(), id.to_string()])
    }

    pub fn current_user() -> Self {
        Self::new(["currentUser"])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
