use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker-assigned local order identifier.
///
/// Returned by every submission and bulk-cancel call; the registry keys its
/// handles by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(pub u32);

impl From<u32> for LocalId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
