//! File-backed temporary table.
//!
//! Records are appended to an anonymous temporary file as a 4-byte
//! little-endian length followed by the record bytes. Offsets and index
//! entries stay in memory; the file disappears when the table is dropped.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;
use vesta_common::{RowId, TableId, TempTableConfig, MAX_RECORD_SIZE, RECORD_LENGTH_PREFIX};

use crate::error::{HandlerError, HandlerResult};
use crate::handler::{ExtraFlag, TableHandler};
use crate::index::TableIndexes;
use crate::spec::{Representation, TableSpec};

/// Temporary table stored in a temporary file.
///
/// Without a native unique key, scans return rows in insertion order. With
/// one, the table is clustered on the key and scans return key order.
#[derive(Debug)]
pub struct DiskTable {
    id: TableId,
    spec: TableSpec,
    file: File,
    /// Start offset of each record's length prefix.
    offsets: Vec<u64>,
    file_len: u64,
    data_bytes: u64,
    max_file_len: Option<u64>,
    indexes: TableIndexes,
    ignore_dup_key: bool,
}

impl DiskTable {
    /// Creates an empty on-disk table.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the temporary file cannot be created.
    pub fn create(id: TableId, spec: TableSpec, config: &TempTableConfig) -> HandlerResult<Self> {
        let file = match &config.tmp_dir {
            Some(dir) => Self::open_in(dir)?,
            None => tempfile::tempfile()?,
        };
        let indexes = TableIndexes::new(spec.key);

        Ok(Self {
            id,
            spec,
            file,
            offsets: Vec::new(),
            file_len: 0,
            data_bytes: 0,
            max_file_len: config.max_disk_table_size,
            indexes,
            ignore_dup_key: false,
        })
    }

    fn open_in(dir: &Path) -> HandlerResult<File> {
        tempfile::tempfile_in(dir).map_err(HandlerError::from)
    }

    fn read_record(&mut self, row: RowId) -> HandlerResult<Bytes> {
        let offset = *self
            .offsets
            .get(row.as_index())
            .ok_or_else(|| HandlerError::corrupted(format!("dangling index entry {row:?}")))?;

        self.file.seek(SeekFrom::Start(offset))?;
        let mut prefix = [0u8; RECORD_LENGTH_PREFIX];
        self.file.read_exact(&mut prefix)?;
        let len = u32::from_le_bytes(prefix) as usize;
        if offset + (RECORD_LENGTH_PREFIX + len) as u64 > self.file_len {
            return Err(HandlerError::corrupted(format!(
                "record at offset {offset} runs past end of file"
            )));
        }

        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn read_rows(&mut self, rows: &[RowId]) -> HandlerResult<Vec<Bytes>> {
        rows.iter().map(|&row| self.read_record(row)).collect()
    }
}

impl TableHandler for DiskTable {
    fn id(&self) -> TableId {
        self.id
    }

    fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn representation(&self) -> Representation {
        Representation::OnDisk
    }

    fn write_row(&mut self, record: Bytes) -> HandlerResult<()> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(HandlerError::RecordTooLarge {
                size: record.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        let needed = (RECORD_LENGTH_PREFIX + record.len()) as u64;
        if let Some(max) = self.max_file_len {
            if self.file_len + needed > max {
                return Err(HandlerError::TableFull {
                    representation: Representation::OnDisk,
                    rows: self.offsets.len() as u64,
                    bytes: self.data_bytes,
                });
            }
        }

        self.indexes.check(&record)?;

        #[allow(clippy::cast_possible_truncation)]
        let prefix = (record.len() as u32).to_le_bytes();
        self.file.seek(SeekFrom::Start(self.file_len))?;
        self.file.write_all(&prefix)?;
        self.file.write_all(&record)?;

        let row = RowId::from(self.offsets.len());
        self.indexes.insert(&record, row)?;
        self.offsets.push(self.file_len);
        self.file_len += needed;
        self.data_bytes += record.len() as u64;
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
        let rows = self.indexes.probe(hash)?.to_vec();
        self.read_rows(&rows)
    }

    fn extra(&mut self, flag: ExtraFlag) {
        self.ignore_dup_key = matches!(flag, ExtraFlag::IgnoreDupKey);
    }

    fn ignores_duplicates(&self) -> bool {
        self.ignore_dup_key
    }

    fn delete_all_rows(&mut self) -> HandlerResult<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.offsets.clear();
        self.indexes.clear();
        self.file_len = 0;
        self.data_bytes = 0;
        Ok(())
    }

    fn scan(&mut self) -> HandlerResult<Vec<Bytes>> {
        let rows = match self.indexes.key_order() {
            Some(rows) => rows,
            None => (0..self.offsets.len()).map(RowId::from).collect(),
        };
        self.read_rows(&rows)
    }

    fn row_count(&self) -> u64 {
        self.offsets.len() as u64
    }

    fn data_bytes(&self) -> u64 {
        self.data_bytes
    }
}
