//! Purpose: Hold top-level CLI command dispatch for `dbcycle`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Config file values are defaults; explicit flags always win.
//! Invariants: Helpers in `main.rs` remain the source of rendering and error shaping.

use super::*;

use dbcycle::api::{
    ContainerFile, ExportOptions, Exporter, ImportOptions, Importer, Row, SqliteConnector,
    TableLayout, check_file,
};
use dbcycle::config::required;
use dbcycle::schema_fmt::format_schema;

pub(super) fn dispatch_command(
    command: Command,
    config_path: &Path,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "dbcycle", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Import(args) => run_import(args, config_path, color_mode),
        Command::Export(args) => run_export(args, config_path, color_mode),
        Command::View {
            file,
            target,
            json,
        } => {
            let logger = ConsoleLogger::new("view", color_mode);
            let db = schema_for(target.schema, config_path, &logger)?;
            let table = table_for_file(&db, &file, target.table.as_deref())?;
            let container = ContainerFile::read(&file, table)?;
            let decoder = container.decoder(table);
            for warning in decoder.structural_warnings() {
                logger.log(&warning.message(&table.name));
            }
            if decoder.record_count() == 0 {
                logger.log("No records found in file!");
                return Ok(RunOutcome::ok());
            }

            if json {
                for values in decoder.records() {
                    let row = Row::from_positional(table, &values);
                    let object = row
                        .iter()
                        .map(|(name, value)| (name.to_string(), value.to_json()))
                        .collect::<Map<_, _>>();
                    println!("{}", Value::Object(object));
                }
                return Ok(RunOutcome::ok());
            }

            let headers = table.column_names();
            let rows = decoder
                .records()
                .map(|values| values.iter().map(|value| value.to_text()).collect())
                .collect::<Vec<Vec<String>>>();
            emit_table(&headers, &rows);
            println!("Rows: {}, Columns: {}", rows.len(), headers.len());
            Ok(RunOutcome::ok())
        }
        Command::Check {
            file,
            target,
            json,
        } => {
            let logger = ConsoleLogger::new("check", color_mode);
            let db = schema_for(target.schema, config_path, &logger)?;
            let table = table_for_file(&db, &file, target.table.as_deref())?;
            let report = check_file(&file, table)?;
            if json {
                emit_json(report.to_json(), color_mode);
            } else {
                emit_check_human(&report);
            }
            Ok(RunOutcome::ok())
        }
        Command::Schema { command } => match command {
            SchemaCommand::Fmt { schema, output } => {
                let logger = ConsoleLogger::new("schema", color_mode);
                let db = schema_for(schema, config_path, &logger)?;
                let text = format_schema(&db);
                match output {
                    Some(path) => {
                        std::fs::write(&path, text).map_err(|err| {
                            Error::new(ErrorKind::Io)
                                .with_message("failed to write formatted schema")
                                .with_path(&path)
                                .with_source(err)
                        })?;
                    }
                    None => print!("{text}"),
                }
                Ok(RunOutcome::ok())
            }
            SchemaCommand::Show {
                table,
                schema,
                json,
            } => {
                let logger = ConsoleLogger::new("schema", color_mode);
                let db = schema_for(schema, config_path, &logger)?;
                let definition = db.find_table(&table).ok_or_else(|| {
                    Error::new(ErrorKind::NotFound)
                        .with_message("table is not in the schema")
                        .with_table(&table)
                })?;
                emit_table_definition(definition, json, color_mode);
                Ok(RunOutcome::ok())
            }
        },
        Command::Config { command } => match command {
            ConfigCommand::Init { force } => {
                let config = Config::default();
                config.write(config_path, force)?;
                if io::stdout().is_terminal() {
                    println!("Wrote {}", config_path.display());
                } else {
                    emit_json(
                        json!({ "config": config_path.display().to_string(), "created": true }),
                        color_mode,
                    );
                }
                Ok(RunOutcome::ok())
            }
            ConfigCommand::Show => {
                let logger = ConsoleLogger::new("config", color_mode);
                let config = load_config(config_path, &logger)?;
                print!("{}", config.to_json_pretty());
                Ok(RunOutcome::ok())
            }
        },
    }
}

fn run_import(
    args: ImportArgs,
    config_path: &Path,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let logger = ConsoleLogger::new("import", color_mode);
    let config = load_config(config_path, &logger)?;
    let input_dir = args.input_dir.or(config.input_dir);
    let input_dir = required(input_dir.as_deref(), "input_dir", "--input-dir")?;
    let db = load_schema(args.store.schema.as_deref().unwrap_or(&config.schema_file))?;
    let connector = SqliteConnector::new(
        args.store.legacy_store.unwrap_or(config.legacy_store),
        args.store.extended_store.unwrap_or(config.extended_store),
    );

    let control = TransferControl::new();
    install_signal_handlers(&control, logger)?;
    let options = ImportOptions::new(input_dir)
        .reset(args.reset)
        .log_headers(args.verbose);
    let report = Importer::new(&connector, &logger, &control, options).import_all(&db)?;
    if args.json {
        emit_json(report_json(&report), color_mode);
    }
    Ok(job_exit(&report))
}

fn run_export(
    args: ExportArgs,
    config_path: &Path,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    let logger = ConsoleLogger::new("export", color_mode);
    let config = load_config(config_path, &logger)?;
    let export_dir = args.export_dir.or(config.export_dir);
    let export_dir = required(export_dir.as_deref(), "export_dir", "--export-dir")?;
    let db = load_schema(args.store.schema.as_deref().unwrap_or(&config.schema_file))?;
    let connector = SqliteConnector::new(
        args.store.legacy_store.unwrap_or(config.legacy_store),
        args.store.extended_store.unwrap_or(config.extended_store),
    );

    let control = TransferControl::new();
    install_signal_handlers(&control, logger)?;
    let mut options = ExportOptions::new(export_dir);
    if let Some(dir) = args
        .carry_over
        .or(config.carry_over_dir)
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        options = options.carry_over_from(dir);
    }
    let report = Exporter::new(&connector, &logger, &control, options).export_all(&db)?;
    if args.json {
        emit_json(report_json(&report), color_mode);
    }
    Ok(job_exit(&report))
}

fn emit_table_definition(table: &TableDefinition, json: bool, color_mode: ColorMode) {
    let layout = TableLayout::of(table);
    if json {
        let fields = table
            .fields
            .iter()
            .map(|field| {
                json!({
                    "name": field.name,
                    "type": field.scalar_type.as_str(),
                    "is_index": field.is_index,
                    "array_size": field.array_size,
                    "columns": field.column_names(),
                })
            })
            .collect::<Vec<_>>();
        emit_json(
            json!({
                "table": table.name,
                "file": table.file_name(),
                "kind": table.container_kind.label(),
                "slot_count": layout.slot_count,
                "record_size": layout.declared_record_size,
                "natural_size": layout.natural_byte_size,
                "fields": fields,
            }),
            color_mode,
        );
        return;
    }

    println!("{} ({})", table.name, table.file_name());
    println!(
        "slots: {}  record size: {}  natural size: {}",
        layout.slot_count, layout.declared_record_size, layout.natural_byte_size
    );
    let headers = ["NAME", "TYPE", "INDEX", "SLOTS"]
        .iter()
        .map(|header| header.to_string())
        .collect::<Vec<_>>();
    let rows = table
        .fields
        .iter()
        .map(|field| {
            vec![
                field.name.clone(),
                field.scalar_type.as_str().to_string(),
                if field.is_index { "yes" } else { "" }.to_string(),
                field.slots().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    emit_table(&headers, &rows);
}
