//! Table descriptions handed to the engine.

use std::fmt;

/// Uniqueness mechanism of a temporary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// No uniqueness is enforced.
    None,
    /// Native unique key over the whole record.
    Unique,
    /// Non-unique index over a hidden trailing hash column.
    Hash,
}

impl KeyKind {
    /// Returns true if records of this table carry the hidden hash column.
    pub fn has_hash_column(self) -> bool {
        matches!(self, KeyKind::Hash)
    }
}

/// Physical representation of a temporary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Rows are held in memory.
    InMemory,
    /// Rows are held in a temporary file.
    OnDisk,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::InMemory => write!(f, "in-memory"),
            Representation::OnDisk => write!(f, "on-disk"),
        }
    }
}

/// Description of a temporary table to allocate.
///
/// The engine uses the sizing fields to pick the initial representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Table alias, used in log lines.
    pub name: String,
    /// Uniqueness mechanism.
    pub key: KeyKind,
    /// Number of stored columns, hidden hash column excluded.
    pub column_count: usize,
    /// Estimated width of one encoded record in bytes.
    pub record_width: usize,
    /// Whether any column holds large objects.
    pub has_blobs: bool,
    /// Skip the in-memory representation entirely.
    pub force_on_disk: bool,
}

impl TableSpec {
    /// Creates a new table spec with no key.
    pub fn new(name: impl Into<String>, column_count: usize) -> Self {
        Self {
            name: name.into(),
            key: KeyKind::None,
            column_count,
            record_width: 0,
            has_blobs: false,
            force_on_disk: false,
        }
    }

    /// Sets the uniqueness mechanism.
    pub fn with_key(mut self, key: KeyKind) -> Self {
        self.key = key;
        self
    }

    /// Sets the estimated record width.
    pub fn with_record_width(mut self, width: usize) -> Self {
        self.record_width = width;
        self
    }

    /// Marks the table as holding large objects.
    pub fn with_blobs(mut self, has_blobs: bool) -> Self {
        self.has_blobs = has_blobs;
        self
    }

    /// Forces the on-disk representation.
    pub fn with_force_on_disk(mut self, force: bool) -> Self {
        self.force_on_disk = force;
        self
    }

    /// Returns true if the table must start on disk.
    pub fn requires_disk(&self) -> bool {
        self.force_on_disk || self.has_blobs
    }
}
