//! Purpose: Bulk import (files to store) and export (store to files) over a schema.
//! Exports: `Importer`, `Exporter`, `ImportOptions`, `ExportOptions`, `JobReport`, `TableOutcome`.
//! Role: Drives the codec table by table on the calling thread.
//! Invariants: Tables run in schema order; one store session and one transaction per table.
//! Invariants: A failing table is rolled back and logged; the job moves on to the next one.
//! Invariants: Cancellation rolls back the current table and ends the job with `Cancelled`.
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::container::ContainerFile;
use crate::core::control::TransferControl;
use crate::core::encode::RecordEncoder;
use crate::core::error::{Error, ErrorKind};
use crate::core::header::ExtendedMeta;
use crate::core::log::Logger;
use crate::core::schema::{ContainerKind, DatabaseDefinition, TableDefinition};
use crate::store::{Store, StoreConnector};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TableOutcome {
    Transferred { records: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableReport {
    pub table: String,
    pub kind: ContainerKind,
    pub outcome: TableOutcome,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JobReport {
    pub tables: Vec<TableReport>,
}

impl JobReport {
    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables
            .iter()
            .find(|report| report.table == table)
            .map(|report| &report.outcome)
    }

    pub fn transferred(&self) -> usize {
        self.count(|outcome| matches!(outcome, TableOutcome::Transferred { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, TableOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TableOutcome::Failed { .. }))
    }

    pub fn total_records(&self) -> usize {
        self.tables
            .iter()
            .map(|report| match report.outcome {
                TableOutcome::Transferred { records } => records,
                _ => 0,
            })
            .sum()
    }

    pub fn summary(&self, verb: &str) -> String {
        format!(
            "{verb} finished: {} tables transferred ({} records), {} skipped, {} failed.",
            self.transferred(),
            self.total_records(),
            self.skipped(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&TableOutcome) -> bool) -> usize {
        self.tables.iter().filter(|report| pred(&report.outcome)).count()
    }

    fn push(&mut self, table: &TableDefinition, outcome: TableOutcome) {
        self.tables.push(TableReport {
            table: table.name.clone(),
            kind: table.container_kind,
            outcome,
        });
    }
}

#[derive(Clone, Debug)]
pub struct ImportOptions {
    pub input_dir: PathBuf,
    /// Drop every table in both stores before the first table.
    pub reset: bool,
    /// Log each decoded header.
    pub log_headers: bool,
}

impl ImportOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            reset: false,
            log_headers: false,
        }
    }

    pub fn reset(mut self, enabled: bool) -> Self {
        self.reset = enabled;
        self
    }

    pub fn log_headers(mut self, enabled: bool) -> Self {
        self.log_headers = enabled;
        self
    }

    /// Both `reset` and `log_headers`.
    pub fn developer_mode(self, enabled: bool) -> Self {
        self.reset(enabled).log_headers(enabled)
    }
}

#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub export_dir: PathBuf,
    pub carry_over_dir: Option<PathBuf>,
}

impl ExportOptions {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            carry_over_dir: None,
        }
    }

    pub fn carry_over_from(mut self, dir: impl Into<PathBuf>) -> Self {
        self.carry_over_dir = Some(dir.into());
        self
    }
}

fn connect(
    connector: &dyn StoreConnector,
    table: &TableDefinition,
    logger: &dyn Logger,
) -> Result<Box<dyn Store>, TableOutcome> {
    connector.connect(table.container_kind).map_err(|err| {
        failed(
            logger,
            format!(
                "Error: could not open {} store for table {}: {err}",
                table.container_kind.label(),
                table.name
            ),
        )
    })
}

fn failed(logger: &dyn Logger, message: String) -> TableOutcome {
    logger.log(&message);
    TableOutcome::Failed { error: message }
}

fn skipped(logger: &dyn Logger, message: String) -> TableOutcome {
    logger.log(&message);
    TableOutcome::Skipped { reason: message }
}

pub struct Importer<'a> {
    connector: &'a dyn StoreConnector,
    logger: &'a dyn Logger,
    control: &'a TransferControl,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    pub fn new(
        connector: &'a dyn StoreConnector,
        logger: &'a dyn Logger,
        control: &'a TransferControl,
        options: ImportOptions,
    ) -> Self {
        Self {
            connector,
            logger,
            control,
            options,
        }
    }

    pub fn import_all(&self, db: &DatabaseDefinition) -> Result<JobReport, Error> {
        if self.options.reset {
            self.reset_stores()?;
        }
        let mut report = JobReport::default();
        for table in &db.tables {
            self.control.checkpoint()?;
            tracing::debug!(table = %table.name, "import table");
            let outcome = self.import_table(table)?;
            report.push(table, outcome);
        }
        self.logger.log(&report.summary("Import"));
        Ok(report)
    }

    fn reset_stores(&self) -> Result<(), Error> {
        for kind in ContainerKind::ALL {
            self.connector.connect(kind)?.reset()?;
            self.logger.log(&format!("{} store reset.", kind.label()));
        }
        Ok(())
    }

    /// `Err` only for job-fatal conditions; per-table problems become outcomes.
    fn import_table(&self, table: &TableDefinition) -> Result<TableOutcome, Error> {
        let logger = self.logger;
        let path = self.options.input_dir.join(table.file_name());
        if !path.is_file() {
            return Ok(skipped(
                logger,
                format!(
                    "File not found: {}. Skipping table {}.",
                    path.display(),
                    table.name
                ),
            ));
        }

        let mut store = match connect(self.connector, table, logger) {
            Ok(store) => store,
            Err(outcome) => return Ok(outcome),
        };
        if let Err(err) = store.ensure_table(table) {
            return Ok(failed(
                logger,
                format!("Error: could not create table {}: {err}", table.name),
            ));
        }
        logger.log(&format!("Table {} ensured in store.", table.name));

        let file = ContainerFile::read(&path, table).and_then(|file| {
            file.require_complete_records()
                .map(|()| file)
                .map_err(|err| err.with_path(&path).with_table(&table.name))
        });
        let file = match file {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::Format => {
                return Ok(skipped(
                    logger,
                    format!(
                        "Invalid file format in {}. {}",
                        path.display(),
                        err.message().unwrap_or("unreadable header")
                    ),
                ));
            }
            Err(err) => {
                return Ok(failed(
                    logger,
                    format!("Error: could not read {}: {err}", path.display()),
                ));
            }
        };

        let decoder = file.decoder(table);
        for warning in decoder.structural_warnings() {
            logger.log(&warning.message(&table.name));
        }
        if self.options.log_headers {
            logger.log(&format!(
                "Field Count Read: ({}) -> {}",
                file.header.slot_count,
                table.file_name()
            ));
            logger.log(&file.header.summary(&table.name));
        }

        let mut tx = match store.begin_import(table) {
            Ok(tx) => tx,
            Err(err) => {
                return Ok(failed(
                    logger,
                    format!("Error: could not start import of {}: {err}", table.name),
                ));
            }
        };
        let record_count = decoder.record_count();
        for index in 0..record_count {
            if let Err(err) = self.control.checkpoint() {
                drop(tx);
                logger.log(&format!(
                    "Warning: import of {} cancelled; changes to this table were rolled back.",
                    table.name
                ));
                return Err(err.with_table(&table.name));
            }
            if let Err(err) = tx.insert(&decoder.decode_record(index)) {
                drop(tx);
                return Ok(failed(
                    logger,
                    format!(
                        "Error: insert of record {index} into {} failed, table rolled back: {err}",
                        table.name
                    ),
                ));
            }
        }
        if let Err(err) = tx.commit() {
            return Ok(failed(
                logger,
                format!("Error: could not commit {}: {err}", table.name),
            ));
        }

        logger.log(&format!(
            "Successfully imported {record_count} records into {}.",
            table.name
        ));
        Ok(TableOutcome::Transferred {
            records: record_count,
        })
    }
}

pub struct Exporter<'a> {
    connector: &'a dyn StoreConnector,
    logger: &'a dyn Logger,
    control: &'a TransferControl,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(
        connector: &'a dyn StoreConnector,
        logger: &'a dyn Logger,
        control: &'a TransferControl,
        options: ExportOptions,
    ) -> Self {
        Self {
            connector,
            logger,
            control,
            options,
        }
    }

    pub fn export_all(&self, db: &DatabaseDefinition) -> Result<JobReport, Error> {
        let mut report = JobReport::default();
        for table in &db.tables {
            self.control.checkpoint()?;
            tracing::debug!(table = %table.name, "export table");
            let outcome = self.export_table(table)?;
            report.push(table, outcome);
        }
        self.logger.log(&report.summary("Export"));
        Ok(report)
    }

    fn export_table(&self, table: &TableDefinition) -> Result<TableOutcome, Error> {
        let logger = self.logger;
        let mut store = match connect(self.connector, table, logger) {
            Ok(store) => store,
            Err(outcome) => return Ok(outcome),
        };
        match store.table_exists(table) {
            Ok(true) => {}
            Ok(false) => {
                return Ok(skipped(
                    logger,
                    format!(
                        "Skipping export for table {} as it does not exist in the store.",
                        table.name
                    ),
                ));
            }
            Err(err) => {
                return Ok(failed(
                    logger,
                    format!("Error: could not look up table {}: {err}", table.name),
                ));
            }
        }
        let rows = match store.read_rows(table) {
            Ok(rows) => rows,
            Err(err) => {
                return Ok(failed(
                    logger,
                    format!("Error: could not read rows of {}: {err}", table.name),
                ));
            }
        };
        drop(store);
        if rows.is_empty() {
            return Ok(skipped(
                logger,
                format!(
                    "Skipping export for table {} as it contains 0 rows.",
                    table.name
                ),
            ));
        }

        let mut encoder = RecordEncoder::new(table);
        for row in &rows {
            if let Err(err) = self.control.checkpoint() {
                logger.log(&format!(
                    "Warning: export of {} cancelled; no file was written.",
                    table.name
                ));
                return Err(err.with_table(&table.name));
            }
            encoder.push_row(row);
        }

        let meta = match (table.container_kind, &self.options.carry_over_dir) {
            (ContainerKind::Extended, Some(dir)) => {
                Some(ExtendedMeta::carry_over(dir, &table.file_name(), logger))
            }
            _ => None,
        };
        let file = encoder.finish().into_container(meta);
        let path = self.options.export_dir.join(table.file_name());
        if let Err(err) = write_container(&file, &self.options.export_dir, &path) {
            return Ok(failed(
                logger,
                format!("Error: could not write {}: {err}", path.display()),
            ));
        }

        logger.log(&format!(
            "Exported {} records from {} to {}",
            rows.len(),
            table.name,
            path.display()
        ));
        Ok(TableOutcome::Transferred {
            records: rows.len(),
        })
    }
}

fn write_container(file: &ContainerFile, dir: &Path, path: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|err| Error::io(err, dir))?;
    file.write(path)
}

#[cfg(test)]
mod tests {
    use super::{ExportOptions, Exporter, ImportOptions, Importer, JobReport, TableOutcome};
    use crate::core::control::TransferControl;
    use crate::core::error::ErrorKind;
    use crate::core::log::MemoryLogger;
    use crate::core::schema::{
        ContainerKind, DatabaseDefinition, FieldDefinition, ScalarType, TableDefinition,
    };
    use crate::core::value::{Row, Value};
    use crate::store::MemoryStore;

    fn db() -> DatabaseDefinition {
        DatabaseDefinition::new(vec![
            TableDefinition::new(
                "Spell",
                ContainerKind::Legacy,
                vec![
                    FieldDefinition::scalar("ID", ScalarType::Int).index(),
                    FieldDefinition::scalar("Name", ScalarType::String),
                ],
            ),
            TableDefinition::new(
                "Item",
                ContainerKind::Extended,
                vec![FieldDefinition::scalar("ID", ScalarType::Int).index()],
            ),
        ])
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = JobReport::default();
        let db = db();
        report.push(&db.tables[0], TableOutcome::Transferred { records: 4 });
        report.push(&db.tables[1], TableOutcome::Skipped { reason: "empty".to_string() });
        assert_eq!(report.transferred(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.total_records(), 4);
        assert_eq!(
            report.summary("Export"),
            "Export finished: 1 tables transferred (4 records), 1 skipped, 0 failed."
        );
    }

    #[test]
    fn export_then_import_restores_rows() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = MemoryStore::new();
        source.seed(
            ContainerKind::Legacy,
            "Spell",
            vec![
                Row::new().with("ID", 1).with("Name", "Blink"),
                Row::new().with("ID", 2).with("Name", "Frost Nova"),
            ],
        );
        source.seed(ContainerKind::Extended, "Item", vec![Row::new().with("ID", 40)]);
        let logger = MemoryLogger::new();
        let control = TransferControl::new();
        let db = db();

        let report = Exporter::new(&source, &logger, &control, ExportOptions::new(temp.path()))
            .export_all(&db)
            .expect("export");
        assert_eq!(report.transferred(), 2);
        assert!(temp.path().join("Spell.dbc").is_file());
        assert!(temp.path().join("Item.db2").is_file());

        let target = MemoryStore::new();
        let report = Importer::new(&target, &logger, &control, ImportOptions::new(temp.path()))
            .import_all(&db)
            .expect("import");
        assert_eq!(report.outcome("Spell"), Some(&TableOutcome::Transferred { records: 2 }));
        let rows = target.rows(ContainerKind::Legacy, "Spell").expect("rows");
        assert_eq!(rows[1].get("ID"), Some(&Value::Int(2)));
        assert_eq!(rows[1].get("Name"), Some(&Value::from("Frost Nova")));
        assert!(logger.contains("Successfully imported 2 records into Spell."));
    }

    #[test]
    fn missing_files_skip_the_table() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = MemoryStore::new();
        let logger = MemoryLogger::new();
        let control = TransferControl::new();
        let report = Importer::new(&store, &logger, &control, ImportOptions::new(temp.path()))
            .import_all(&db())
            .expect("import");
        assert_eq!(report.skipped(), 2);
        assert!(logger.contains("File not found: "));
        assert!(logger.contains("Skipping table Spell."));
        assert!(!store.has_table(ContainerKind::Legacy, "Spell"));
    }

    #[test]
    fn cancelled_job_stops_before_the_first_table() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = MemoryStore::new();
        let logger = MemoryLogger::new();
        let control = TransferControl::new();
        control.cancel();
        let err = Exporter::new(&store, &logger, &control, ExportOptions::new(temp.path()))
            .export_all(&db())
            .expect_err("cancelled");
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn developer_mode_resets_and_logs_headers() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = MemoryStore::new();
        source.seed(ContainerKind::Legacy, "Spell", vec![Row::new().with("ID", 1)]);
        let logger = MemoryLogger::new();
        let control = TransferControl::new();
        let db = db();
        Exporter::new(&source, &logger, &control, ExportOptions::new(temp.path()))
            .export_all(&db)
            .expect("export");

        let target = MemoryStore::new();
        target.seed(ContainerKind::Extended, "Stale", Vec::new());
        Importer::new(
            &target,
            &logger,
            &control,
            ImportOptions::new(temp.path()).developer_mode(true),
        )
        .import_all(&db)
        .expect("import");
        assert_eq!(target.reset_count(), 2);
        assert!(!target.has_table(ContainerKind::Extended, "Stale"));
        assert!(logger.contains("Field Count Read: (2) -> Spell.dbc"));
        assert!(logger.contains("Header: [Spell] recordCount=1, fieldCount=2, recordSize=8"));
    }
}
