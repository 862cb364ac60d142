//! In-memory temporary table.

use bytes::Bytes;
use vesta_common::{RowId, TableId, TempTableConfig, HEAP_ROW_OVERHEAD, MAX_RECORD_SIZE};

use crate::error::{HandlerError, HandlerResult};
use crate::handler::{ExtraFlag, TableHandler};
use crate::index::TableIndexes;
use crate::spec::{Representation, TableSpec};

/// Temporary table held entirely in memory.
///
/// Rows are kept in insertion order. The table refuses writes with
/// [`HandlerError::TableFull`] once the configured byte or row capacity
/// would be exceeded; capacity is checked before the unique key, so a full
/// table reports `TableFull` even for a row it already holds.
#[derive(Debug)]
pub struct HeapTable {
    id: TableId,
    spec: TableSpec,
    rows: Vec<Bytes>,
    /// Record bytes plus per-row overhead currently charged.
    used_bytes: usize,
    data_bytes: u64,
    max_bytes: usize,
    max_rows: Option<u64>,
    indexes: TableIndexes,
    ignore_dup_key: bool,
}

impl HeapTable {
    /// Creates an empty in-memory table.
    pub fn new(id: TableId, spec: TableSpec, config: &TempTableConfig) -> Self {
        let indexes = TableIndexes::new(spec.key);
        Self {
            id,
            spec,
            rows: Vec::new(),
            used_bytes: 0,
            data_bytes: 0,
            max_bytes: config.max_heap_table_size,
            max_rows: config.max_heap_rows,
            indexes,
            ignore_dup_key: false,
        }
    }

    /// Returns true if a record of `len` bytes still fits.
    fn has_room_for(&self, len: usize) -> bool {
        if let Some(max_rows) = self.max_rows {
            if self.rows.len() as u64 >= max_rows {
                return false;
            }
        }
        self.used_bytes + len + HEAP_ROW_OVERHEAD <= self.max_bytes
    }

    fn record(&self, row: RowId) -> HandlerResult<Bytes> {
        self.rows
            .get(row.as_index())
            .cloned()
            .ok_or_else(|| HandlerError::corrupted(format!("dangling index entry {row:?}")))
    }
}

impl TableHandler for HeapTable {
    fn id(&self) -> TableId {
        self.id
    }

    fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn representation(&self) -> Representation {
        Representation::InMemory
    }

    fn write_row(&mut self, record: Bytes) -> HandlerResult<()> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(HandlerError::RecordTooLarge {
                size: record.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        if !self.has_room_for(record.len()) {
            return Err(HandlerError::TableFull {
                representation: Representation::InMemory,
                rows: self.rows.len() as u64,
                bytes: self.data_bytes,
            });
        }

        self.indexes.check(&record)?;

        let row = RowId::from(self.rows.len());
        self.indexes.insert(&record, row)?;
        self.used_bytes += record.len() + HEAP_ROW_OVERHEAD;
        self.data_bytes += record.len() as u64;
        self.rows.push(record);
        Ok(())
    }

    fn index_init(&mut self) -> HandlerResult<()> {
        self.indexes.init()
    }

    fn index_end(&mut self) {
        self.indexes.end();
    }

    fn index_active(&self) -> bool {
        self.indexes.is_active()
    }

    fn index_read_hash(&mut self, hash: u64) -> HandlerResult<Vec<Bytes>> {
        self.indexes
            .probe(hash)?
            .iter()
            .map(|&row| self.record(row))
            .collect()
    }

    fn extra(&mut self, flag: ExtraFlag) {
        self.ignore_dup_key = matches!(flag, ExtraFlag::IgnoreDupKey);
    }

    fn ignores_duplicates(&self) -> bool {
        self.ignore_dup_key
    }

    fn delete_all_rows(&mut self) -> HandlerResult<()> {
        self.rows.clear();
        self.indexes.clear();
        self.used_bytes = 0;
        self.data_bytes = 0;
        Ok(())
    }

    fn scan(&mut self) -> HandlerResult<Vec<Bytes>> {
        Ok(self.rows.clone())
    }

    fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn data_bytes(&self) -> u64 {
        self.data_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::record::{append_hash_column, hash_payload};
    use crate::spec::KeyKind;

    fn table(key: KeyKind, max_rows: u64) -> HeapTable {
        let config = TempTableConfig::for_testing().with_max_heap_rows(max_rows);
        HeapTable::new(TableId::new(1), TableSpec::new("t", 1).with_key(key), &config)
    }

    #[test]
    fn test_insert_and_scan_in_order() {
        let mut heap = table(KeyKind::None, 10);
        heap.write_row(Bytes::from_static(b"b")).unwrap();
        heap.write_row(Bytes::from_static(b"a")).unwrap();
        heap.write_row(Bytes::from_static(b"b")).unwrap();

        assert_eq!(heap.row_count(), 3);
        assert_eq!(heap.data_bytes(), 3);
        let rows = heap.scan().unwrap();
        assert_eq!(
            rows,
            vec![
                Bytes::from_static(b"b"),
                Bytes::from_static(b"a"),
                Bytes::from_static(b"b"),
            ]
        );
    }

    #[test]
    fn test_unique_key_duplicate() {
        let mut heap = table(KeyKind::Unique, 10);
        heap.write_row(Bytes::from_static(b"a")).unwrap();

        let err = heap.write_row(Bytes::from_static(b"a")).unwrap_err();
        assert!(matches!(err, HandlerError::DuplicateKey));
        assert_eq!(heap.classify_error(&err), ErrorClass::Other);

        heap.extra(ExtraFlag::IgnoreDupKey);
        assert!(heap.is_ignorable_error(&err));
        assert_eq!(heap.row_count(), 1);
    }

    #[test]
    fn test_row_capacity() {
        let mut heap = table(KeyKind::Unique, 2);
        heap.write_row(Bytes::from_static(b"a")).unwrap();
        heap.write_row(Bytes::from_static(b"b")).unwrap();

        // Full wins over duplicate.
        let err = heap.write_row(Bytes::from_static(b"a")).unwrap_err();
        assert!(matches!(err, HandlerError::TableFull { rows: 2, .. }));
        assert_eq!(heap.classify_error(&err), ErrorClass::CapacityExceeded);
    }

    #[test]
    fn test_byte_capacity() {
        let config = TempTableConfig::for_testing();
        let mut heap = HeapTable::new(TableId::new(1), TableSpec::new("t", 1), &config);
        let big = Bytes::from(vec![7u8; config.max_heap_table_size]);
        let err = heap.write_row(big).unwrap_err();
        assert!(matches!(err, HandlerError::TableFull { rows: 0, .. }));
    }

    #[test]
    fn test_hash_index_lookup() {
        let mut heap = table(KeyKind::Hash, 10);
        let hash = hash_payload(b"x");
        heap.write_row(append_hash_column(b"x", hash)).unwrap();

        assert!(matches!(
            heap.index_read_hash(hash),
            Err(HandlerError::IndexNotInitialized)
        ));

        heap.index_init().unwrap();
        assert!(heap.index_active());
        let found = heap.index_read_hash(hash).unwrap();
        assert_eq!(found.len(), 1);
        assert!(heap.index_read_hash(hash_payload(b"y")).unwrap().is_empty());

        heap.index_end();
        assert!(!heap.index_active());
    }

    #[test]
    fn test_hash_key_requires_hash_column() {
        let mut heap = table(KeyKind::Hash, 10);
        let err = heap.write_row(Bytes::from_static(b"abc")).unwrap_err();
        assert!(matches!(err, HandlerError::Corrupted(_)));
        assert_eq!(heap.row_count(), 0);
    }

    #[test]
    fn test_delete_all_rows_keeps_flags() {
        let mut heap = table(KeyKind::Hash, 10);
        heap.extra(ExtraFlag::IgnoreDupKey);
        heap.index_init().unwrap();
        let hash = hash_payload(b"x");
        heap.write_row(append_hash_column(b"x", hash)).unwrap();

        heap.delete_all_rows().unwrap();
        assert_eq!(heap.row_count(), 0);
        assert_eq!(heap.data_bytes(), 0);
        assert!(heap.ignores_duplicates());
        assert!(heap.index_read_hash(hash).unwrap().is_empty());
    }
}
