//! Uniqueness indexes shared by every table representation.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use vesta_common::RowId;

use crate::error::{HandlerError, HandlerResult};
use crate::record::split_hash_column;
use crate::spec::KeyKind;

/// Index state of one table.
///
/// A native unique key maps the whole record to its row; a hash index maps
/// the hidden hash column to every row carrying it. Only one of the two is
/// populated, according to the table's [`KeyKind`].
#[derive(Debug)]
pub(crate) struct TableIndexes {
    kind: KeyKind,
    unique: BTreeMap<Bytes, RowId>,
    hash: HashMap<u64, Vec<RowId>>,
    /// Whether the hash index has been opened for lookups.
    hash_active: bool,
}

impl TableIndexes {
    pub(crate) fn new(kind: KeyKind) -> Self {
        Self {
            kind,
            unique: BTreeMap::new(),
            hash: HashMap::new(),
            hash_active: false,
        }
    }

    /// Rejects `record` if it violates the unique key or lacks its hash column.
    pub(crate) fn check(&self, record: &[u8]) -> HandlerResult<()> {
        match self.kind {
            KeyKind::None => Ok(()),
            KeyKind::Unique => {
                if self.unique.contains_key(record) {
                    Err(HandlerError::DuplicateKey)
                } else {
                    Ok(())
                }
            }
            KeyKind::Hash => split_hash_column(record).map(|_| ()),
        }
    }

    /// Adds an already checked record.
    pub(crate) fn insert(&mut self, record: &Bytes, row: RowId) -> HandlerResult<()> {
        match self.kind {
            KeyKind::None => {}
            KeyKind::Unique => {
                self.unique.insert(record.clone(), row);
            }
            KeyKind::Hash => {
                let (_, hash) = split_hash_column(record)?;
                self.hash.entry(hash).or_default().push(row);
            }
        }
        Ok(())
    }

    pub(crate) fn init(&mut self) -> HandlerResult<()> {
        if self.kind != KeyKind::Hash {
            return Err(HandlerError::not_supported(
                "index_init on a table without a hash index",
            ));
        }
        self.hash_active = true;
        Ok(())
    }

    pub(crate) fn end(&mut self) {
        self.hash_active = false;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.hash_active
    }

    /// Returns the rows whose hidden hash equals `hash`.
    pub(crate) fn probe(&self, hash: u64) -> HandlerResult<&[RowId]> {
        if !self.hash_active {
            return Err(HandlerError::IndexNotInitialized);
        }
        Ok(self.hash.get(&hash).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Rows in unique key order, if the table has a unique key.
    pub(crate) fn key_order(&self) -> Option<Vec<RowId>> {
        match self.kind {
            KeyKind::Unique => Some(self.unique.values().copied().collect()),
            _ => None,
        }
    }

    /// Drops every entry; the open/closed state of the hash index is kept.
    pub(crate) fn clear(&mut self) {
        self.unique.clear();
        self.hash.clear();
    }
}
