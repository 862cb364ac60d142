//! Temporary table engine: allocation and promotion.

use std::fmt;

use parking_lot::Mutex;
use vesta_common::{TableId, TempTableConfig, HEAP_ROW_OVERHEAD};

use crate::disk::DiskTable;
use crate::error::{HandlerError, HandlerResult};
use crate::handler::{ExtraFlag, TableHandler};
use crate::heap::HeapTable;
use crate::spec::{Representation, TableSpec};

/// Factory for temporary tables.
///
/// `promote` builds a complete on-disk copy of an in-memory table and hands
/// it back; the caller swaps it in for the old handler, so no caller ever
/// sees a half-promoted table.
pub trait TempTableEngine: Send + Sync + fmt::Debug {
    /// Allocates a new, empty table.
    ///
    /// # Errors
    ///
    /// Fails if the storage cannot construct the requested representation.
    fn create(&self, spec: &TableSpec) -> HandlerResult<Box<dyn TableHandler>>;

    /// Builds the on-disk representation of `from`.
    ///
    /// The returned handler holds every row of `from`, has the same table id,
    /// key and duplicate handling, and has its hash index closed.
    ///
    /// # Errors
    ///
    /// Fails if `from` cannot be promoted further or the copy fails.
    fn promote(&self, from: &mut dyn TableHandler) -> HandlerResult<Box<dyn TableHandler>>;
}

/// Counters kept by [`DefaultEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Tables created in memory.
    pub heap_tables_created: u64,
    /// Tables created directly on disk.
    pub disk_tables_created: u64,
    /// Successful promotions.
    pub promotions: u64,
}

#[derive(Debug)]
struct EngineState {
    next_id: TableId,
    stats: EngineStats,
}

/// Engine backed by [`HeapTable`] and [`DiskTable`].
#[derive(Debug)]
pub struct DefaultEngine {
    config: TempTableConfig,
    state: Mutex<EngineState>,
}

impl DefaultEngine {
    /// Creates an engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::ConfigError`] if the configuration is invalid.
    pub fn new(config: TempTableConfig) -> HandlerResult<Self> {
        config.validate().map_err(HandlerError::config_error)?;
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: TempTableConfig) -> Self {
        Self {
            config,
            state: Mutex::new(EngineState {
                next_id: TableId::FIRST,
                stats: EngineStats::default(),
            }),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &TempTableConfig {
        &self.config
    }

    /// Returns a snapshot of the engine counters.
    pub fn stats(&self) -> EngineStats {
        self.state.lock().stats
    }

    fn allocate_id(&self) -> TableId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id = id.next();
        id
    }

    /// Returns true if a single row of the spec's width cannot fit in memory.
    fn too_wide_for_heap(&self, spec: &TableSpec) -> bool {
        spec.record_width + HEAP_ROW_OVERHEAD > self.config.max_heap_table_size
    }
}

impl Default for DefaultEngine {
    fn default() -> Self {
        Self::with_validated(TempTableConfig::default())
    }
}

impl TempTableEngine for DefaultEngine {
    fn create(&self, spec: &TableSpec) -> HandlerResult<Box<dyn TableHandler>> {
        let id = self.allocate_id();

        if spec.requires_disk() || self.too_wide_for_heap(spec) {
            let table = DiskTable::create(id, spec.clone(), &self.config).map_err(|e| {
                HandlerError::out_of_resources(format!("cannot create on-disk table {id}: {e}"))
            })?;
            self.state.lock().stats.disk_tables_created += 1;
            tracing::debug!(table = %id, name = %spec.name, "created on-disk temporary table");
            return Ok(Box::new(table));
        }

        self.state.lock().stats.heap_tables_created += 1;
        tracing::debug!(table = %id, name = %spec.name, "created in-memory temporary table");
        Ok(Box::new(HeapTable::new(id, spec.clone(), &self.config)))
    }

    fn promote(&self, from: &mut dyn TableHandler) -> HandlerResult<Box<dyn TableHandler>> {
        if from.representation() == Representation::OnDisk {
            return Err(HandlerError::not_supported(format!(
                "table {} is already on disk",
                from.id()
            )));
        }

        let mut table = DiskTable::create(from.id(), from.spec().clone(), &self.config)?;
        if from.ignores_duplicates() {
            table.extra(ExtraFlag::IgnoreDupKey);
        }
        for record in from.scan()? {
            table.write_row(record)?;
        }

        self.state.lock().stats.promotions += 1;
        tracing::info!(
            table = %from.id(),
            rows = table.row_count(),
            bytes = table.data_bytes(),
            "promoted temporary table to disk"
        );
        Ok(Box::new(table))
    }
}
