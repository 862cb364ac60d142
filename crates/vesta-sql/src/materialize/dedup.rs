//! Deduplication strategy selection.

use std::fmt;

use vesta_storage::KeyKind;

/// How a materialized result enforces distinctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeduplicationStrategy {
    /// Every row is kept (ALL semantics).
    NoDeduplication,
    /// The storage layer's unique index rejects duplicates.
    NativeUniqueKey,
    /// A hidden hash column plus a lookup before every write.
    HashPseudoKey,
}

impl DeduplicationStrategy {
    /// Chooses the strategy for one query expression.
    ///
    /// A native unique key may return rows in key order, which recursive
    /// evaluation cannot accept, and it cannot be switched off for the ALL
    /// branches of a mixed expression. Both cases fall back to the hash
    /// pseudo-key.
    pub fn select(distinct: bool, recursive: bool, mixed_distinct_and_all: bool) -> Self {
        if !distinct {
            Self::NoDeduplication
        } else if recursive || mixed_distinct_and_all {
            Self::HashPseudoKey
        } else {
            Self::NativeUniqueKey
        }
    }

    /// Returns the table key needed to implement this strategy.
    pub fn key_kind(self) -> KeyKind {
        match self {
            Self::NoDeduplication => KeyKind::None,
            Self::NativeUniqueKey => KeyKind::Unique,
            Self::HashPseudoKey => KeyKind::Hash,
        }
    }

    /// Returns true if rows are deduplicated at all.
    pub fn is_deduplicating(self) -> bool {
        self != Self::NoDeduplication
    }
}

impl fmt::Display for DeduplicationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDeduplication => write!(f, "none"),
            Self::NativeUniqueKey => write!(f, "unique key"),
            Self::HashPseudoKey => write!(f, "hash key"),
        }
    }
}
