//! Result table provisioning.

use bytes::Bytes;
use vesta_storage::{
    split_hash_column, ExtraFlag, HandlerError, Representation, TableHandler, TempTableEngine,
};

use super::dedup::DeduplicationStrategy;
use super::error::{SinkError, SinkResult};
use super::params::MaterializationParameters;
use crate::encoder::{RecordDecoder, RecordEncoder};
use crate::executor::{Row, Value};

/// Provisions the result table described by `params`.
///
/// The physical table is only allocated when the parameters ask for it; see
/// [`MaterializedTable::instantiate`].
///
/// # Errors
///
/// Returns [`SinkError::AllocationFailure`] if the engine cannot create the
/// table.
pub fn provision(
    engine: &dyn TempTableEngine,
    params: MaterializationParameters,
) -> SinkResult<MaterializedTable> {
    tracing::debug!(
        table = %params.alias(),
        strategy = %params.strategy(),
        columns = params.columns().len(),
        create_table = params.create_table(),
        "provisioning result table"
    );

    let mut table = MaterializedTable {
        params,
        handler: None,
        encoder: RecordEncoder::new(),
    };
    if table.params.create_table() {
        table.instantiate(engine)?;
    }
    Ok(table)
}

/// A provisioned result table.
///
/// Holds the resolved parameters and, once allocated, the storage handler.
/// Promotion replaces the handler as a whole.
#[derive(Debug)]
pub struct MaterializedTable {
    params: MaterializationParameters,
    handler: Option<Box<dyn TableHandler>>,
    encoder: RecordEncoder,
}

impl MaterializedTable {
    /// Allocates the physical table.
    ///
    /// Duplicate key errors are made ignorable and, under the hash key, the
    /// hash index is opened for lookups.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the table already exists, `AllocationFailure` if the
    /// engine cannot create it.
    pub fn instantiate(&mut self, engine: &dyn TempTableEngine) -> SinkResult<()> {
        if self.handler.is_some() {
            return Err(SinkError::invalid_state(format!(
                "result table '{}' is already instantiated",
                self.params.alias()
            )));
        }

        let spec = self.params.table_spec();
        let mut handler = engine
            .create(&spec)
            .map_err(|source| self.allocation_failure(source))?;
        handler.extra(ExtraFlag::IgnoreDupKey);
        if self.strategy() == DeduplicationStrategy::HashPseudoKey {
            handler
                .index_init()
                .map_err(|source| self.allocation_failure(source))?;
        }

        tracing::debug!(
            table = %self.params.alias(),
            id = %handler.id(),
            representation = %handler.representation(),
            "result table instantiated"
        );
        self.handler = Some(handler);
        Ok(())
    }

    /// Resolved parameters.
    pub fn params(&self) -> &MaterializationParameters {
        &self.params
    }

    /// The deduplication strategy.
    pub fn strategy(&self) -> DeduplicationStrategy {
        self.params.strategy()
    }

    /// Returns true once the physical table exists.
    pub fn is_instantiated(&self) -> bool {
        self.handler.is_some()
    }

    /// The storage handler, if allocated.
    pub fn handler(&self) -> Option<&dyn TableHandler> {
        self.handler.as_deref()
    }

    /// The current storage representation, if allocated.
    pub fn representation(&self) -> Option<Representation> {
        self.handler.as_ref().map(|h| h.representation())
    }

    /// Casts the stored columns of `row` and encodes them.
    pub(crate) fn project(&mut self, row: &Row) -> SinkResult<Bytes> {
        if row.num_columns() != self.params.source_width() {
            return Err(SinkError::projection(
                "*",
                format!(
                    "expected {} values, got {}",
                    self.params.source_width(),
                    row.num_columns()
                ),
            ));
        }

        let mut values = Vec::with_capacity(self.params.columns().len());
        for (col, &pos) in self.params.columns().iter().zip(self.params.positions()) {
            let value = row
                .get(pos)
                .unwrap_or(&Value::Null)
                .cast(&col.data_type)
                .map_err(|reason| SinkError::projection(&col.name, reason))?;
            if value.is_null() && !col.nullable {
                return Err(SinkError::projection(&col.name, "column cannot be null"));
            }
            values.push(value);
        }
        Ok(self.encoder.encode(&Row::new(values)))
    }

    pub(crate) fn handler_mut(&mut self) -> SinkResult<&mut dyn TableHandler> {
        match self.handler.as_deref_mut() {
            Some(handler) => Ok(handler),
            None => Err(SinkError::invalid_state(format!(
                "result table '{}' is not instantiated",
                self.params.alias()
            ))),
        }
    }

    /// Returns true if a row with this payload is already stored.
    pub(crate) fn contains(&mut self, payload: &[u8], hash: u64) -> SinkResult<bool> {
        let lookup = self.handler_mut()?.index_read_hash(hash);
        let candidates = lookup.map_err(|e| self.storage_fatal(e))?;
        for candidate in &candidates {
            let (stored, _) = split_hash_column(candidate).map_err(|e| self.storage_fatal(e))?;
            if stored == payload {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Moves the table to disk.
    ///
    /// The promoted handler replaces the current one only once it is fully
    /// built; its hash index is reopened.
    pub(crate) fn promote(&mut self, engine: &dyn TempTableEngine) -> SinkResult<()> {
        let current = self.handler_mut()?;
        let promoted = engine.promote(current).and_then(|mut promoted| {
            if promoted.spec().key.has_hash_column() {
                promoted.index_init()?;
            }
            Ok(promoted)
        });

        match promoted {
            Ok(promoted) => {
                self.handler = Some(promoted);
                Ok(())
            }
            Err(source) => Err(self.storage_fatal(source)),
        }
    }

    /// Empties the table, keeping its schema and key.
    pub(crate) fn empty(&mut self) -> SinkResult<()> {
        let Some(handler) = self.handler.as_deref_mut() else {
            return Ok(());
        };
        match handler.delete_all_rows() {
            Ok(()) => Ok(()),
            Err(source) => Err(self.storage_fatal(source)),
        }
    }

    /// Decodes every stored row, in scan order.
    ///
    /// # Errors
    ///
    /// Fails if the table is not instantiated, the scan fails or a record
    /// cannot be decoded.
    pub fn rows(&mut self) -> SinkResult<Vec<Row>> {
        let hashed = self.strategy() == DeduplicationStrategy::HashPseudoKey;
        let scan = self.handler_mut()?.scan();
        let records = scan.map_err(|e| self.storage_fatal(e))?;

        records
            .iter()
            .map(|record| -> SinkResult<Row> {
                let payload = if hashed {
                    split_hash_column(record)
                        .map_err(|e| self.storage_fatal(e))?
                        .0
                } else {
                    &record[..]
                };
                Ok(RecordDecoder.decode(payload)?)
            })
            .collect()
    }

    pub(crate) fn storage_fatal(&self, source: HandlerError) -> SinkError {
        SinkError::StorageFatal {
            table: self.params.alias().to_string(),
            source,
        }
    }

    fn allocation_failure(&self, source: HandlerError) -> SinkError {
        SinkError::AllocationFailure {
            table: self.params.alias().to_string(),
            source,
        }
    }
}
