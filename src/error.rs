//! Error types for the AVL engine and the bidirectional map.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a pair was already present when an insertion was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duplicated {
    Key,
    /// The value is already mapped. This is the map's duplicate-value
    /// condition; the value tree itself reports [`Error::DuplicateKey`].
    Value,
    Both,
}

impl Duplicated {
    pub(crate) fn from_presence(key: bool, value: bool) -> Option<Self> {
        match (key, value) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Key),
            (false, true) => Some(Self::Value),
            (false, false) => None,
        }
    }
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The tree already holds a key comparing equal to the inserted one
    #[error("duplicate key")]
    DuplicateKey,

    /// One or both elements of an inserted pair are already mapped
    #[error("duplicate pair element: {0:?} already present")]
    DuplicatePairElement(Duplicated),

    /// Lookup or deletion target absent
    #[error("key not found")]
    KeyNotFound,

    /// Lookup or deletion target absent on the value side
    #[error("value not found")]
    ValueNotFound,

    /// Minimum or maximum requested on an empty tree
    #[error("structure is empty")]
    EmptyStructure,

    /// Node storage could not be obtained
    #[error("allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),

    /// A tree ran out of node indices
    #[error("node capacity exceeded")]
    CapacityExceeded,

    /// Text input exceeds the configured limit under the reject policy
    #[error("text of {len} bytes exceeds the limit of {max} bytes")]
    TextTooLong { len: usize, max: usize },
}
