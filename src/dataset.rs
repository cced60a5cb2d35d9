use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque name of a backend-persisted dataset.
///
/// Created by an import and never mutated afterwards; the client only ever
/// compares, displays and sends it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for DatasetId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for DatasetId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl PartialEq<str> for DatasetId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DatasetId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
