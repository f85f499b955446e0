use std::fmt;

/// Classification of a watched configuration unit: a whole configuration
/// file or a single configuration entry. The two live in separate subtrees
/// (`.../file/...` vs `.../item/...`) of the remote path layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    File,
    Item,
}

impl Domain {
    /// Path segment of this domain's subtree
    pub fn path_segment(&self) -> &'static str {
        match self {
            Domain::File => "file",
            Domain::Item => "item",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Identity of one logical configuration unit, used as the registry key.
/// Value equality and hashing: two keys with the same domain and name are
/// the same watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub domain: Domain,
    pub name: String,
}

impl WatchKey {
    pub fn new(
        domain: Domain,
        name: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            name: name.into(),
        }
    }
}

impl fmt::Display for WatchKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.name)
    }
}
