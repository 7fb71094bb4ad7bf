//! Purpose: Relational store seam used by import and export jobs.
//! Exports: `Store`, `ImportTx`, `StoreConnector`, `MemoryStore`, `SqliteStore`, `SqliteConnector`.
//! Role: Rows in and out of tables whose columns are the flattened schema columns.
//! Invariants: One session per table; sessions are never shared across threads.
//! Invariants: An `ImportTx` dropped without `commit` leaves the table as it was.
use crate::core::error::Error;
use crate::core::schema::{ContainerKind, TableDefinition};
use crate::core::value::{Row, Value};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteConnector, SqliteStore};

/// Opens store sessions; legacy and extended tables live in separate stores.
pub trait StoreConnector {
    fn connect(&self, kind: ContainerKind) -> Result<Box<dyn Store>, Error>;
}

pub trait Store {
    /// Create the table if missing: one column per slot, primary key on the index field.
    fn ensure_table(&mut self, table: &TableDefinition) -> Result<(), Error>;

    fn table_exists(&mut self, table: &TableDefinition) -> Result<bool, Error>;

    /// Every row of the table; array fields come back as `StringArray`, NULL as "".
    fn read_rows(&mut self, table: &TableDefinition) -> Result<Vec<Row>, Error>;

    fn begin_import<'s>(
        &'s mut self,
        table: &TableDefinition,
    ) -> Result<Box<dyn ImportTx + 's>, Error>;

    /// Drop every table in the store.
    fn reset(&mut self) -> Result<(), Error>;
}

pub trait ImportTx {
    /// Insert one record given positionally in flattened column order.
    fn insert(&mut self, values: &[Value]) -> Result<(), Error>;

    fn commit(self: Box<Self>) -> Result<(), Error>;
}
