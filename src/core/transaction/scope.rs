// src/core/transaction/scope.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// One entry of the coordinator's scope stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The outermost transaction, opened with `begin`.
    Root,
    /// A nested savepoint and the id it was created with.
    Savepoint(String),
}

impl Scope {
    #[must_use]
    pub fn savepoint_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Savepoint(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Savepoint(id) => write!(f, "savepoint {id}"),
        }
    }
}

/// How savepoint ids are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavepointNaming {
    /// The stack depth the savepoint will occupy. Sibling savepoints at the
    /// same depth reuse an id.
    #[default]
    Depth,
    /// A per-coordinator counter; ids are never reused.
    Counter,
}
