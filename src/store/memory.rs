// In-memory store shared across sessions; used by tests and dry runs.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{ContainerKind, TableDefinition};
use crate::core::value::{Row, Value};
use crate::store::{ImportTx, Store, StoreConnector};

type TableKey = (ContainerKind, String);

/// Called with the table name and the number of rows staged so far.
#[derive(Clone)]
struct InsertHook(Arc<dyn Fn(&str, usize) + Send + Sync>);

impl fmt::Debug for InsertHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InsertHook")
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<TableKey, Vec<Row>>,
    insert_failures: BTreeMap<String, usize>,
    refused: Vec<ContainerKind>,
    resets: usize,
    on_insert: Option<InsertHook>,
}

/// Cloneable handle; every clone and every session sees the same tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, kind: ContainerKind, table: &str, rows: Vec<Row>) {
        self.lock().tables.insert((kind, table.to_string()), rows);
    }

    /// Rows of a table, or `None` when the table was never created.
    pub fn rows(&self, kind: ContainerKind, table: &str) -> Option<Vec<Row>> {
        self.lock().tables.get(&(kind, table.to_string())).cloned()
    }

    pub fn has_table(&self, kind: ContainerKind, table: &str) -> bool {
        self.lock().tables.contains_key(&(kind, table.to_string()))
    }

    /// Make inserts into `table` fail once `after` records went in within one transaction.
    pub fn fail_inserts(&self, table: &str, after: usize) {
        self.lock().insert_failures.insert(table.to_string(), after);
    }

    /// Run `hook` after every staged insert, outside the store lock.
    ///
    /// Applies to transactions begun after the call.
    pub fn on_insert(&self, hook: impl Fn(&str, usize) + Send + Sync + 'static) {
        self.lock().on_insert = Some(InsertHook(Arc::new(hook)));
    }

    /// Make `connect` fail for `kind`.
    pub fn refuse_connections(&self, kind: ContainerKind) {
        self.lock().refused.push(kind);
    }

    pub fn reset_count(&self) -> usize {
        self.lock().resets
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StoreConnector for MemoryStore {
    fn connect(&self, kind: ContainerKind) -> Result<Box<dyn Store>, Error> {
        if self.lock().refused.contains(&kind) {
            return Err(Error::new(ErrorKind::Store)
                .with_message(format!("{} store refused the connection", kind.label())));
        }
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            kind,
        }))
    }
}

struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    kind: ContainerKind,
}

impl MemorySession {
    fn key(&self, table: &TableDefinition) -> TableKey {
        (self.kind, table.name.clone())
    }
}

impl Store for MemorySession {
    fn ensure_table(&mut self, table: &TableDefinition) -> Result<(), Error> {
        let key = self.key(table);
        lock_state(&self.state).tables.entry(key).or_default();
        Ok(())
    }

    fn table_exists(&mut self, table: &TableDefinition) -> Result<bool, Error> {
        let key = self.key(table);
        Ok(lock_state(&self.state).tables.contains_key(&key))
    }

    fn read_rows(&mut self, table: &TableDefinition) -> Result<Vec<Row>, Error> {
        let key = self.key(table);
        lock_state(&self.state)
            .tables
            .get(&key)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::Store)
                    .with_message("no such table")
                    .with_table(&table.name)
            })
    }

    fn begin_import<'s>(
        &'s mut self,
        table: &TableDefinition,
    ) -> Result<Box<dyn ImportTx + 's>, Error> {
        let (fail_after, on_insert) = {
            let state = lock_state(&self.state);
            (
                state.insert_failures.get(&table.name).copied(),
                state.on_insert.clone(),
            )
        };
        Ok(Box::new(MemoryTx {
            state: &self.state,
            key: self.key(table),
            table: table.clone(),
            staged: Vec::new(),
            fail_after,
            on_insert,
        }))
    }

    fn reset(&mut self) -> Result<(), Error> {
        let mut state = lock_state(&self.state);
        let kind = self.kind;
        state.tables.retain(|(table_kind, _), _| *table_kind != kind);
        state.resets += 1;
        Ok(())
    }
}

struct MemoryTx<'s> {
    state: &'s Mutex<MemoryState>,
    key: TableKey,
    table: TableDefinition,
    staged: Vec<Row>,
    fail_after: Option<usize>,
    on_insert: Option<InsertHook>,
}

impl ImportTx for MemoryTx<'_> {
    fn insert(&mut self, values: &[Value]) -> Result<(), Error> {
        if self.fail_after.is_some_and(|after| self.staged.len() >= after) {
            return Err(Error::new(ErrorKind::Store)
                .with_message("injected insert failure")
                .with_table(&self.table.name));
        }
        self.staged.push(Row::from_positional(&self.table, values));
        if let Some(InsertHook(hook)) = &self.on_insert {
            hook(&self.table.name, self.staged.len());
        }
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), Error> {
        let this = *self;
        lock_state(this.state)
            .tables
            .entry(this.key)
            .or_default()
            .extend(this.staged);
        Ok(())
    }
}
