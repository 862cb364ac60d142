//! The table handler capability.

use std::fmt;

use bytes::Bytes;
use vesta_common::TableId;

use crate::error::{ErrorClass, HandlerError, HandlerResult};
use crate::spec::{Representation, TableSpec};

/// Behavior switches applied to an open handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFlag {
    /// Duplicate-key rejections become ignorable errors.
    IgnoreDupKey,
    /// Duplicate-key rejections are ordinary errors again.
    NoIgnoreDupKey,
}

/// Row storage for one temporary table.
///
/// Handlers store opaque encoded records. Callers never branch on the
/// concrete type: every decision is made through this trait, including how
/// an error must be treated ([`TableHandler::classify_error`]).
///
/// # Errors
///
/// Writes fail with [`HandlerError::DuplicateKey`] when a native unique key
/// is violated and with [`HandlerError::TableFull`] when the representation
/// is out of room.
pub trait TableHandler: Send + fmt::Debug {
    /// Returns the id assigned by the engine.
    fn id(&self) -> TableId;

    /// Returns the description the table was created from.
    fn spec(&self) -> &TableSpec;

    /// Returns the current physical representation.
    fn representation(&self) -> Representation;

    /// Appends one record.
    ///
    /// Under a hash key the record must end with the hidden hash column.
    fn write_row(&mut self, record: Bytes) -> HandlerResult<()>;

    /// Opens the hash index for lookups.
    fn index_init(&mut self) -> HandlerResult<()>;

    /// Closes the hash index.
    fn index_end(&mut self);

    /// Returns true if the hash index is open.
    fn index_active(&self) -> bool;

    /// Returns every stored record whose hidden hash equals `hash`.
    fn index_read_hash(&mut self, hash: u64) -> HandlerResult<Vec<Bytes>>;

    /// Applies a behavior switch.
    fn extra(&mut self, flag: ExtraFlag);

    /// Returns true once [`ExtraFlag::IgnoreDupKey`] is in effect.
    fn ignores_duplicates(&self) -> bool;

    /// Classifies an error returned by this handler.
    fn classify_error(&self, error: &HandlerError) -> ErrorClass {
        ErrorClass::of(error, self.ignores_duplicates())
    }

    /// Returns true if `error` is an expected, non-failing outcome.
    fn is_ignorable_error(&self, error: &HandlerError) -> bool {
        self.classify_error(error) == ErrorClass::Ignorable
    }

    /// Removes all rows, keeping schema, key and flags.
    fn delete_all_rows(&mut self) -> HandlerResult<()>;

    /// Returns every stored record in scan order.
    ///
    /// Scan order is insertion order, except for on-disk tables with a native
    /// unique key, which are clustered on that key.
    fn scan(&mut self) -> HandlerResult<Vec<Bytes>>;

    /// Returns the number of stored rows.
    fn row_count(&self) -> u64;

    /// Returns the number of record bytes stored.
    fn data_bytes(&self) -> u64;
}
