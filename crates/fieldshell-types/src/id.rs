//! Identifier types for fieldshell.
//!
//! All identifiers wrap a random UUID v4. Display output carries a short
//! kind prefix so that ids stay readable in logs:
//!
//! | Type | Display |
//! |------|---------|
//! | [`FieldId`] | `field:<uuid>` |
//! | [`FrameId`] | `frame:<uuid>` |
//! | [`EventId`] | `evt:<uuid>` |
//! | [`RequestId`] | `req:<uuid>` |
//! | [`ExecutionId`] | `exec:<uuid>` |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a live field in the field store.
///
/// Fields are keyed by this id for their whole lifetime. Callers that
/// hold an id as text can parse it back with [`FromStr`]; both the
/// prefixed display form and a bare UUID are accepted.
///
/// # Example
///
/// ```
/// use fieldshell_types::FieldId;
///
/// let id = FieldId::new();
/// let text = id.to_string();
/// assert!(text.starts_with("field:"));
///
/// let parsed: FieldId = text.parse().unwrap();
/// assert_eq!(parsed, id);
///
/// let bare: FieldId = id.uuid().to_string().parse().unwrap();
/// assert_eq!(bare, id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub Uuid);

// Default is not implemented: a fresh FieldId is never registered in a
// store. Use FieldStore::create() to obtain one.
#[allow(clippy::new_without_default)]
impl FieldId {
    /// Creates a new random [`FieldId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field:{}", self.0)
    }
}

impl FromStr for FieldId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("field:").unwrap_or(s);
        Uuid::parse_str(raw).map(Self)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[doc = concat!("Creates a new random [`", stringify!($name), "`].")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the inner UUID.
            #[must_use]
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a context frame (TTL-bounded memory record).
    FrameId,
    "frame"
);

uuid_id!(
    /// Identifier of a published field event.
    ///
    /// Events are write-once; the id only serves log correlation.
    EventId,
    "evt"
);

uuid_id!(
    /// Correlation id for a request sent to an external collaborator.
    ///
    /// Replies carry the same id; a request whose id never comes back
    /// within the step timeout is treated as unavailable.
    RequestId,
    "req"
);

uuid_id!(
    /// Identifier of one protocol run.
    ExecutionId,
    "exec"
);
