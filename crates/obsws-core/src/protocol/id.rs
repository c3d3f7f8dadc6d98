//! Correlation identifiers for in-flight requests.
//!
//! # What is a correlation id? (for beginners)
//!
//! Many requests can be in flight on the same connection at once, and the
//! server may answer them in any order.  Every request therefore carries a
//! `message-id` that the server echoes back in its response.  The client keeps
//! a table from id to waiting caller and uses the echoed id to find who the
//! reply belongs to.
//!
//! Two in-flight requests must never share an id, or one caller would receive
//! the other's reply.  Ids here are random version-4 UUIDs: 122 random bits
//! make a collision practically impossible without any shared counter between
//! threads.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `message-id` attached to a request and echoed in its response.
///
/// # Examples
///
/// ```rust
/// use obsws_core::RequestId;
///
/// let a = RequestId::generate();
/// let b = RequestId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Returns a fresh random id in canonical hyphenated UUID form.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}
