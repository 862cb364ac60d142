//! The set-operation result sink.

use std::sync::Arc;

use bytes::Bytes;
use vesta_storage::{append_hash_column, hash_payload, ErrorClass, TempTableEngine};

use super::dedup::DeduplicationStrategy;
use super::error::{SinkError, SinkResult};
use super::params::{ColumnDescriptor, CreateOptions, MaterializationParameters, QueryShape};
use super::provision::{provision, MaterializedTable};
use crate::executor::Row;

/// Result of handing one row to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was stored.
    Inserted,
    /// An equal row is already stored; nothing was written.
    DuplicateRejected,
}

/// Materializes the rows of a compound query expression.
///
/// One sink serves every execution of its expression: `reset` empties the
/// table between executions without provisioning it again.
#[derive(Debug)]
pub struct SetOpSink {
    engine: Arc<dyn TempTableEngine>,
    shape: QueryShape,
    table: Option<MaterializedTable>,
    /// Rows stored in the current episode.
    rows_in_table: u64,
    /// Hash lookups are skipped while false (ALL branches).
    dedup_enabled: bool,
}

impl SetOpSink {
    /// Creates a sink allocating its table from `engine`.
    pub fn new(engine: Arc<dyn TempTableEngine>) -> Self {
        Self {
            engine,
            shape: QueryShape::default(),
            table: None,
            rows_in_table: 0,
            dedup_enabled: true,
        }
    }

    /// Records the shape of the expression this sink serves.
    pub fn prepare(&mut self, shape: QueryShape) {
        self.shape = shape;
    }

    /// The recorded query shape.
    pub fn shape(&self) -> QueryShape {
        self.shape
    }

    /// Provisions the result table.
    ///
    /// # Errors
    ///
    /// `InvalidState` if a table is already provisioned, `AllocationFailure`
    /// if the engine cannot create it.
    pub fn create_result_table(
        &mut self,
        columns: &[ColumnDescriptor],
        distinct: bool,
        options: &CreateOptions,
        alias: &str,
        bit_fields_as_long: bool,
        create_table: bool,
    ) -> SinkResult<()> {
        if self.table.is_some() {
            return Err(SinkError::invalid_state(format!(
                "result table for '{alias}' is already provisioned"
            )));
        }

        let params = MaterializationParameters::resolve(
            columns,
            distinct,
            self.shape,
            options,
            alias,
            bit_fields_as_long,
            create_table,
        );
        self.table = Some(provision(self.engine.as_ref(), params)?);
        self.rows_in_table = 0;
        self.dedup_enabled = true;
        Ok(())
    }

    /// Allocates a table provisioned with `create_table = false`.
    ///
    /// # Errors
    ///
    /// `InvalidState` if nothing is provisioned or the table already exists,
    /// `AllocationFailure` if the engine cannot create it.
    pub fn instantiate_result_table(&mut self) -> SinkResult<()> {
        let table = self
            .table
            .as_mut()
            .ok_or_else(|| SinkError::invalid_state("no result table provisioned"))?;
        table.instantiate(self.engine.as_ref())
    }

    /// Drops the result table so the sink can be provisioned again.
    pub fn free_result_table(&mut self) {
        self.table = None;
        self.rows_in_table = 0;
        self.dedup_enabled = true;
    }

    /// Stores one row.
    ///
    /// A full in-memory table is moved to disk once and the write retried;
    /// a second capacity failure is fatal.
    ///
    /// # Errors
    ///
    /// `Projection` if a value does not fit its column (the episode may go
    /// on), `StorageFatal` for storage failures, `InvalidState` if no table
    /// is instantiated.
    pub fn insert(&mut self, row: &Row) -> SinkResult<InsertOutcome> {
        let dedup_enabled = self.dedup_enabled;
        let table = self
            .table
            .as_mut()
            .ok_or_else(|| SinkError::invalid_state("no result table provisioned"))?;

        let payload = table.project(row)?;
        let record = if table.strategy() == DeduplicationStrategy::HashPseudoKey {
            let hash = hash_payload(&payload);
            if dedup_enabled && table.contains(&payload, hash)? {
                return Ok(InsertOutcome::DuplicateRejected);
            }
            append_hash_column(&payload, hash)
        } else {
            payload
        };

        let outcome = write_with_promotion(table, self.engine.as_ref(), record)?;
        if outcome == InsertOutcome::Inserted {
            self.rows_in_table += 1;
        }
        Ok(outcome)
    }

    /// Turns hash deduplication on or off for the following rows.
    ///
    /// Rows written while it is off are still hashed, so later `DISTINCT`
    /// rows are checked against them.
    ///
    /// # Errors
    ///
    /// `InvalidState` when disabling it under a native unique key, which
    /// cannot be switched off per row.
    pub fn set_duplicate_elimination(&mut self, enabled: bool) -> SinkResult<()> {
        let strategy = self.table.as_ref().map(MaterializedTable::strategy);
        if !enabled && strategy == Some(DeduplicationStrategy::NativeUniqueKey) {
            return Err(SinkError::invalid_state(
                "a unique key cannot be disabled for part of the rows",
            ));
        }
        self.dedup_enabled = enabled;
        Ok(())
    }

    /// Returns true if hash deduplication is on.
    pub fn duplicate_elimination(&self) -> bool {
        self.dedup_enabled
    }

    /// Ends the row stream of one episode.
    pub fn send_eof(&mut self) -> SinkResult<()> {
        tracing::debug!(rows = self.rows_in_table, "result table complete");
        Ok(())
    }

    /// Nothing is buffered outside the table.
    pub fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }

    /// Empties the table and zeroes the row count.
    ///
    /// The schema, key and index state are kept, and deduplication is
    /// switched back on.
    ///
    /// # Errors
    ///
    /// `StorageFatal` if the storage layer cannot empty the table.
    pub fn reset(&mut self) -> SinkResult<()> {
        self.rows_in_table = 0;
        self.dedup_enabled = true;
        match self.table.as_mut() {
            Some(table) => table.empty(),
            None => Ok(()),
        }
    }

    /// Resets the sink, discarding any error.
    pub fn cleanup(&mut self) {
        if let Err(e) = self.reset() {
            tracing::debug!(error = %e, "ignoring reset failure during cleanup");
        }
    }

    /// Rows stored in the current episode.
    pub fn row_count(&self) -> u64 {
        self.rows_in_table
    }

    /// The provisioned table, if any.
    pub fn table(&self) -> Option<&MaterializedTable> {
        self.table.as_ref()
    }

    /// The deduplication strategy of the provisioned table.
    pub fn strategy(&self) -> Option<DeduplicationStrategy> {
        self.table.as_ref().map(MaterializedTable::strategy)
    }

    /// Decodes the stored rows in scan order.
    ///
    /// # Errors
    ///
    /// Fails if no table is instantiated or the table cannot be read.
    pub fn rows(&mut self) -> SinkResult<Vec<Row>> {
        self.table_mut()?.rows()
    }

    fn table_mut(&mut self) -> SinkResult<&mut MaterializedTable> {
        self.table
            .as_mut()
            .ok_or_else(|| SinkError::invalid_state("no result table provisioned"))
    }
}

/// Writes `record`, promoting the table once if it is full.
fn write_with_promotion(
    table: &mut MaterializedTable,
    engine: &dyn TempTableEngine,
    record: Bytes,
) -> SinkResult<InsertOutcome> {
    let handler = table.handler_mut()?;
    let err = match handler.write_row(record.clone()) {
        Ok(()) => return Ok(InsertOutcome::Inserted),
        Err(err) => err,
    };

    match handler.classify_error(&err) {
        ErrorClass::Ignorable => return Ok(InsertOutcome::DuplicateRejected),
        ErrorClass::CapacityExceeded => {}
        ErrorClass::Other => return Err(table.storage_fatal(err)),
    }

    table.promote(engine)?;

    let handler = table.handler_mut()?;
    match handler.write_row(record) {
        Ok(()) => Ok(InsertOutcome::Inserted),
        Err(err) if handler.is_ignorable_error(&err) => Ok(InsertOutcome::DuplicateRejected),
        Err(err) => Err(table.storage_fatal(err)),
    }
}
