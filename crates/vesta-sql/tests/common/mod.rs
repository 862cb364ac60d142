//! Shared helpers for the materialization integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use bytes::Bytes;
use parking_lot::Mutex;
use vesta_common::TableId;
use vesta_sql::executor::{Row, Value};
use vesta_sql::materialize::{ColumnDescriptor, CreateOptions, QueryShape, SetOpSink};
use vesta_sql::types::DataType;
use vesta_storage::{
    split_hash_column, ExtraFlag, HandlerError, HandlerResult, Representation, TableHandler,
    TableSpec, TempTableEngine,
};

static TRACING: Once = Once::new();

/// Installs a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Two nullable INT columns.
pub fn int_pair() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("a", DataType::Int),
        ColumnDescriptor::new("b", DataType::Int),
    ]
}

/// A row of two INT values.
pub fn pair(a: i32, b: i32) -> Row {
    Row::new(vec![Value::int(a), Value::int(b)])
}

/// Creates a sink over `engine` and provisions an `int_pair` table.
pub fn provisioned_sink(
    engine: Arc<dyn TempTableEngine>,
    shape: QueryShape,
    distinct: bool,
) -> SetOpSink {
    init_tracing();
    let mut sink = SetOpSink::new(engine);
    sink.prepare(shape);
    sink.create_result_table(
        &int_pair(),
        distinct,
        &CreateOptions::default(),
        "result",
        false,
        true,
    )
    .expect("provisioning failed");
    sink
}

/// How a [`ScriptedHandler`] answers writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteScript {
    /// Store every row.
    Accept,
    /// Report the table as full on every write.
    AlwaysFull,
    /// Report corrupted data on every write.
    Corrupt,
}

/// Behavior of a [`ScriptedEngine`].
#[derive(Debug, Clone, Copy)]
pub struct Script {
    pub create_fails: bool,
    pub heap_writes: WriteScript,
    pub disk_writes: WriteScript,
    pub promote_fails: bool,
    pub delete_fails: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            create_fails: false,
            heap_writes: WriteScript::Accept,
            disk_writes: WriteScript::Accept,
            promote_fails: false,
            delete_fails: false,
        }
    }
}

/// Calls observed by a [`ScriptedEngine`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub creates: u32,
    pub promotions: u32,
}

/// Engine whose tables fail on demand.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    script: Script,
    calls: Mutex<Calls>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Calls::default()),
        })
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock()
    }
}

impl TempTableEngine for ScriptedEngine {
    fn create(&self, spec: &TableSpec) -> HandlerResult<Box<dyn TableHandler>> {
        let mut calls = self.calls.lock();
        calls.creates += 1;
        if self.script.create_fails {
            return Err(HandlerError::out_of_resources("scripted allocation failure"));
        }
        Ok(Box::new(ScriptedHandler::new(
            TableId::new(u64::from(calls.creates)),
            spec.clone(),
            Representation::InMemory,
            self.script.heap_writes,
            self.script.delete_fails,
        )))
    }

    fn promote(&self, from: &mut dyn TableHandler) -> HandlerResult<Box<dyn TableHandler>> {
        self.calls.lock().promotions += 1;
        if self.script.promote_fails {
            return Err(HandlerError::Io(std::io::Error::other("scripted promotion failure")));
        }

        let mut table = ScriptedHandler::new(
            from.id(),
            from.spec().clone(),
            Representation::OnDisk,
            WriteScript::Accept,
            self.script.delete_fails,
        );
        if from.ignores_duplicates() {
            table.extra(ExtraFlag::IgnoreDupKey);
        }
        table.records = from.scan()?;
        table.writes = self.script.disk_writes;
        Ok(Box::new(table))
    }
}

/// In-memory handler driven by a [`WriteScript`].
#[derive(Debug)]
pub struct ScriptedHandler {
    id: TableId,
    spec: TableSpec,
    representation: Representation,
    writes: WriteScript,
    delete_fails: bool,
    ignore_dup: bool,
    index_active: bool,
    records: Vec<Bytes>,
}

impl ScriptedHandler {
    fn new(
        id: TableId,
        spec: TableSpec,
        representation: Representation,
        writes: WriteScript,
        delete_fails: bool,
    ) -> Self {
        Self {
            id,
            spec,
            representation,
            writes,
            delete_fails,
            ignore_dup: false,
            index_active: false,
            records: Vec::new(),
        }
    }
}

impl TableHandler for ScriptedHandler {
    fn id(&self) -> TableId {
        self.id
    }

    fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn representation(&self) -> Representation {
        self.representation
    }

    fn write_row(&mut self, record: Bytes) -> HandlerResult<()> {
        match self.writes {
            WriteScript::Accept => {
                self.records.push(record);
                Ok(())
            }
            WriteScript::AlwaysFull => Err(HandlerError::TableFull {
                representation: self.representation,
                rows: self.row_count(),
                bytes: self.data_bytes(),
            }),
            WriteScript::Corrupt => Err(HandlerError::corrupted("scripted write failure")),
        }
    }

    fn index_init(&mut self) -> HandlerResult<()> {
        self.index_active = true;
        Ok(())
    }

    fn index_end(&mut self) {
        self.index_active = false;
    }

    fn index_active(&self) -> bool {
        self.index_active
    }

    fn index_read_hash(&mut self, hash: u64) -> HandlerResult<Vec<Bytes>> {
        if !self.index_active {
            return Err(HandlerError::IndexNotInitialized);
        }
        let mut matches = Vec::new();
        for record in &self.records {
            if split_hash_column(record)?.1 == hash {
                matches.push(record.clone());
            }
        }
        Ok(matches)
    }

    fn extra(&mut self, flag: ExtraFlag) {
        self.ignore_dup = flag == ExtraFlag::IgnoreDupKey;
    }

    fn ignores_duplicates(&self) -> bool {
        self.ignore_dup
    }

    fn delete_all_rows(&mut self) -> HandlerResult<()> {
        if self.delete_fails {
            return Err(HandlerError::Io(std::io::Error::other("scripted truncate failure")));
        }
        self.records.clear();
        Ok(())
    }

    fn scan(&mut self) -> HandlerResult<Vec<Bytes>> {
        Ok(self.records.clone())
    }

    fn row_count(&self) -> u64 {
        self.records.len() as u64
    }

    fn data_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.len() as u64).sum()
    }
}
