//! Purpose: SQLite-backed store, one database file per container kind.
//! Exports: `SqliteStore`, `SqliteConnector`.
//! Role: Default store for the CLI; tables mirror the flattened schema columns.
//! Invariants: Identifiers are always quoted; values are always bound, never inlined.
//! Invariants: One SQLite transaction per imported table.
use std::path::{Path, PathBuf};

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Transaction, params_from_iter};

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{ContainerKind, ScalarType, TableDefinition};
use crate::core::value::{Row, Value};
use crate::store::{ImportTx, Store, StoreConnector};

#[derive(Clone, Debug)]
pub struct SqliteConnector {
    legacy: PathBuf,
    extended: PathBuf,
}

impl SqliteConnector {
    pub fn new(legacy: impl Into<PathBuf>, extended: impl Into<PathBuf>) -> Self {
        Self {
            legacy: legacy.into(),
            extended: extended.into(),
        }
    }

    pub fn path_for(&self, kind: ContainerKind) -> &Path {
        match kind {
            ContainerKind::Legacy => &self.legacy,
            ContainerKind::Extended => &self.extended,
        }
    }
}

impl StoreConnector for SqliteConnector {
    fn connect(&self, kind: ContainerKind) -> Result<Box<dyn Store>, Error> {
        Ok(Box::new(SqliteStore::open(self.path_for(kind))?))
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, Error> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| Error::io(err, parent))?;
        }
        let conn = Connection::open(path).map_err(|err| {
            store_error("failed to open store", err).with_path(path)
        })?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .map_err(|err| store_error("failed to open in-memory store", err))?;
        Ok(Self { conn })
    }

    fn table_names(&self) -> Result<Vec<String>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .map_err(|err| store_error("failed to list tables", err))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|err| store_error("failed to list tables", err))?;
        Ok(names)
    }
}

impl Store for SqliteStore {
    fn ensure_table(&mut self, table: &TableDefinition) -> Result<(), Error> {
        let sql = create_table_sql(table);
        tracing::trace!(table = %table.name, %sql, "ensure table");
        self.conn
            .execute_batch(&sql)
            .map_err(|err| store_error("failed to create table", err).with_table(&table.name))
    }

    fn table_exists(&mut self, table: &TableDefinition) -> Result<bool, Error> {
        Ok(self.table_names()?.iter().any(|name| name == &table.name))
    }

    fn read_rows(&mut self, table: &TableDefinition) -> Result<Vec<Row>, Error> {
        let columns = table.column_names();
        let sql = format!(
            "SELECT {} FROM {}",
            columns.iter().map(|name| quote(name)).collect::<Vec<_>>().join(", "),
            quote(&table.name)
        );
        let read_err =
            |err: rusqlite::Error| store_error("failed to read rows", err).with_table(&table.name);
        let mut stmt = self.conn.prepare(&sql).map_err(read_err)?;
        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    values.push(from_sql(row.get_ref(index)?));
                }
                Ok(values)
            })
            .map_err(read_err)?;
        let mut out = Vec::new();
        for values in rows {
            out.push(Row::from_positional(table, &values.map_err(read_err)?));
        }
        Ok(out)
    }

    fn begin_import<'s>(
        &'s mut self,
        table: &TableDefinition,
    ) -> Result<Box<dyn ImportTx + 's>, Error> {
        let tx = self.conn.transaction().map_err(|err| {
            store_error("failed to begin transaction", err).with_table(&table.name)
        })?;
        Ok(Box::new(SqliteImport {
            tx,
            sql: insert_sql(table),
            table: table.name.clone(),
        }))
    }

    fn reset(&mut self) -> Result<(), Error> {
        for name in self.table_names()? {
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {}", quote(&name)))
                .map_err(|err| store_error("failed to drop table", err).with_table(&name))?;
        }
        Ok(())
    }
}

struct SqliteImport<'s> {
    tx: Transaction<'s>,
    sql: String,
    table: String,
}

impl ImportTx for SqliteImport<'_> {
    fn insert(&mut self, values: &[Value]) -> Result<(), Error> {
        let mut stmt = self
            .tx
            .prepare_cached(&self.sql)
            .map_err(|err| store_error("failed to prepare insert", err).with_table(&self.table))?;
        stmt.execute(params_from_iter(values.iter()))
            .map_err(|err| store_error("failed to insert record", err).with_table(&self.table))?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), Error> {
        let this = *self;
        let table = this.table;
        this.tx
            .commit()
            .map_err(|err| store_error("failed to commit", err).with_table(table))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Byte(value) => ToSqlOutput::Owned(Sql::Integer(i64::from(*value))),
            Value::Short(value) => ToSqlOutput::Owned(Sql::Integer(i64::from(*value))),
            Value::Int(value) => ToSqlOutput::Owned(Sql::Integer(i64::from(*value))),
            Value::UInt(value) => ToSqlOutput::Owned(Sql::Integer(i64::from(*value))),
            Value::Long(value) => ToSqlOutput::Owned(Sql::Integer(*value)),
            Value::Float(value) => ToSqlOutput::Owned(Sql::Real(f64::from(*value))),
            Value::String(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            Value::StringArray(items) => ToSqlOutput::Borrowed(ValueRef::Text(
                items.first().map(String::as_bytes).unwrap_or_default(),
            )),
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::String(String::new()),
        ValueRef::Integer(value) => Value::Long(value),
        ValueRef::Real(value) => Value::Float(value as f32),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn sql_type(scalar_type: ScalarType) -> &'static str {
    match scalar_type {
        ScalarType::Byte => "TINYINT UNSIGNED",
        ScalarType::Short => "SMALLINT",
        ScalarType::Int => "INT",
        ScalarType::UInt => "INT UNSIGNED",
        ScalarType::Long => "BIGINT",
        ScalarType::Float => "FLOAT",
        ScalarType::String => "TEXT",
    }
}

fn create_table_sql(table: &TableDefinition) -> String {
    let mut columns = Vec::new();
    for field in &table.fields {
        for name in field.column_names() {
            columns.push(format!("{} {}", quote(&name), sql_type(field.scalar_type)));
        }
    }
    if let Some(key) = table.primary_key_column() {
        columns.push(format!("PRIMARY KEY ({})", quote(&key)));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(&table.name),
        columns.join(", ")
    )
}

fn insert_sql(table: &TableDefinition) -> String {
    let columns = table.column_names();
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(&table.name),
        columns.iter().map(|name| quote(name)).collect::<Vec<_>>().join(", "),
        placeholders.join(", ")
    )
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn store_error(message: &str, err: rusqlite::Error) -> Error {
    Error::new(ErrorKind::Store)
        .with_message(message)
        .with_source(err)
}
