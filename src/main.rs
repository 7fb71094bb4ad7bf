//! Purpose: `dbcycle` CLI entry point and command definitions.
//! Role: Binary crate root; parses args, loads config, runs commands, renders output.
//! Invariants: Job logs and diagnostics go to stderr; stdout carries only command payloads.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Transfers run under one `TransferControl` wired to SIGINT/SIGTERM (and SIGUSR1).
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;

mod command_dispatch;

use dbcycle::api::{
    DatabaseDefinition, Error, ErrorKind, JobReport, LogLevel, Logger, TableDefinition,
    TableOutcome, TransferControl, ValidationReport, classify, to_exit_code,
};
use dbcycle::config::{Config, DEFAULT_CONFIG_PATH};
use dbcycle::notice::{Notice, notice_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let result = command_dispatch::dispatch_command(cli.command, &cli.config, color_mode);

    result
        .map_err(add_format_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "dbcycle",
    version,
    about = "Move game-client tables between WDBC/WDB2 files and a relational store",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Tables are described by a JSON schema; each table maps to one
`<Name>.dbc` (WDBC) or `<Name>.db2` (WDB2) file.

Mental model:
  - `import` reads container files into the store
  - `export` writes store tables back out as container files
  - `view` and `check` inspect a single file
"#,
    after_help = r#"EXAMPLES
  $ dbcycle config init
  $ dbcycle import --input-dir client/dbc
  $ dbcycle export --export-dir out --carry-over client/db2
  $ dbcycle view client/dbc/Spell.dbc
  $ dbcycle check client/db2/Item.db2 --json

LEARN MORE
  $ dbcycle <command> --help
  Logs go to stderr; set RUST_LOG=debug for internal diagnostics."#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Config file (created with defaults when missing)",
        value_hint = ValueHint::FilePath
    )]
    config: PathBuf,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Import container files into the store",
        long_about = r#"Read every schema table's `<Name>.<ext>` file from the input directory
and insert its records into the store, one transaction per table.

Missing files are skipped. A table whose insert fails is rolled back and the
job continues. Ctrl-C cancels: the current table is rolled back, earlier
tables stay committed. On unix, SIGUSR1 pauses and resumes."#,
        after_help = r#"EXAMPLES
  $ dbcycle import --input-dir client/dbc
  $ dbcycle import --reset --verbose"#
    )]
    Import(ImportArgs),
    #[command(
        about = "Export store tables as container files",
        long_about = r#"Write every schema table that has rows to `<Name>.<ext>` in the export
directory. Empty tables are skipped. Files are written atomically.

With --carry-over, WDB2 files reuse the table hash, build, id range, locale
and copy-table size of a same-named file in that directory."#,
        after_help = r#"EXAMPLES
  $ dbcycle export --export-dir out
  $ dbcycle export --export-dir out --carry-over client/db2"#
    )]
    Export(ExportArgs),
    #[command(
        arg_required_else_help = true,
        about = "Print the records of one container file",
        after_help = r#"EXAMPLES
  $ dbcycle view client/dbc/Spell.dbc
  $ dbcycle view Spell.dbc --json | head"#
    )]
    View {
        #[arg(help = "Container file (.dbc or .db2)", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        target: FileTargetArgs,
        #[arg(long, help = "Emit one JSON object per record")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Check one container file against the schema",
        long_about = r#"Decode the header and report structural mismatches (slot count, record
size, truncated blocks). Mismatches are warnings and exit 0; an unreadable
file or wrong magic is an error."#
    )]
    Check {
        #[arg(help = "Container file (.dbc or .db2)", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        target: FileTargetArgs,
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },
    #[command(arg_required_else_help = true, about = "Inspect and format the schema file")]
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },
    #[command(arg_required_else_help = true, about = "Create or print the config file")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completion scripts",
        after_help = r#"EXAMPLES
  $ dbcycle completion bash > ~/.local/share/bash-completion/completions/dbcycle
  $ dbcycle completion zsh > ~/.zfunc/_dbcycle"#
    )]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

#[derive(Args)]
struct StoreArgs {
    #[arg(long, help = "Schema file (overrides config)", value_hint = ValueHint::FilePath)]
    schema: Option<PathBuf>,
    #[arg(long, help = "SQLite file for .dbc tables (overrides config)", value_hint = ValueHint::FilePath)]
    legacy_store: Option<PathBuf>,
    #[arg(long, help = "SQLite file for .db2 tables (overrides config)", value_hint = ValueHint::FilePath)]
    extended_store: Option<PathBuf>,
}

#[derive(Args)]
struct ImportArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long, help = "Directory holding the container files", value_hint = ValueHint::DirPath)]
    input_dir: Option<PathBuf>,
    #[arg(long, help = "Drop every table in both stores first")]
    reset: bool,
    #[arg(long, help = "Log each decoded header")]
    verbose: bool,
    #[arg(long, help = "Print the job report as JSON on stdout")]
    json: bool,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long, help = "Directory to write container files to", value_hint = ValueHint::DirPath)]
    export_dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Directory of reference .db2 files for header carry-over",
        value_hint = ValueHint::DirPath
    )]
    carry_over: Option<PathBuf>,
    #[arg(long, help = "Print the job report as JSON on stdout")]
    json: bool,
}

#[derive(Args)]
struct FileTargetArgs {
    #[arg(long, help = "Schema table name (default: file stem)")]
    table: Option<String>,
    #[arg(long, help = "Schema file (overrides config)", value_hint = ValueHint::FilePath)]
    schema: Option<PathBuf>,
}

#[derive(Subcommand)]
enum SchemaCommand {
    #[command(about = "Rewrite the schema with one line per field")]
    Fmt {
        #[arg(long, help = "Schema file (overrides config)", value_hint = ValueHint::FilePath)]
        schema: Option<PathBuf>,
        #[arg(long, help = "Write here instead of stdout", value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    #[command(arg_required_else_help = true, about = "Show one table's columns and sizes")]
    Show {
        table: String,
        #[arg(long, help = "Schema file (overrides config)", value_hint = ValueHint::FilePath)]
        schema: Option<PathBuf>,
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    #[command(about = "Write a default config file")]
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
    #[command(about = "Print the effective config file")]
    Show,
}

/// Renders job log lines on stderr: colored text on a TTY, JSON notices otherwise.
#[derive(Clone, Copy, Debug)]
struct ConsoleLogger {
    cmd: &'static str,
    color_mode: ColorMode,
}

impl ConsoleLogger {
    fn new(cmd: &'static str, color_mode: ColorMode) -> Self {
        Self { cmd, color_mode }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        let notice = Notice::from_log(self.cmd, notice_time_now().unwrap_or_default(), message);
        emit_notice(&notice, self.color_mode);
    }
}

fn load_config(path: &Path, logger: &dyn Logger) -> Result<Config, Error> {
    Config::load_or_create(path, logger)
}

fn load_schema(path: &Path) -> Result<DatabaseDefinition, Error> {
    DatabaseDefinition::load(path).map_err(|err| {
        if err.hint().is_some() {
            return err;
        }
        err.with_hint("Check the schema path (--schema or `schema_file` in the config).")
    })
}

/// Schema from `--schema`, else from the config's `schema_file`.
fn schema_for(
    explicit: Option<PathBuf>,
    config_path: &Path,
    logger: &dyn Logger,
) -> Result<DatabaseDefinition, Error> {
    let path = match explicit {
        Some(path) => path,
        None => load_config(config_path, logger)?.schema_file,
    };
    load_schema(&path)
}

/// Table for a single file: `--table`, else the file stem, matched case-insensitively.
fn table_for_file<'a>(
    db: &'a DatabaseDefinition,
    file: &Path,
    explicit: Option<&str>,
) -> Result<&'a TableDefinition, Error> {
    let name = match explicit {
        Some(name) => name.to_string(),
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    db.find_table(&name).ok_or_else(|| {
        Error::new(ErrorKind::NotFound)
            .with_message("No matching schema found for this file.")
            .with_path(file)
            .with_table(name)
            .with_hint("Pass --table NAME or add the table to the schema.")
    })
}

fn install_signal_handlers(control: &TransferControl, logger: ConsoleLogger) -> Result<(), Error> {
    use signal_hook::consts::{SIGINT, SIGTERM};

    let signal_err = |err: io::Error| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to install signal handler")
            .with_source(err)
    };
    let flag = control.cancel_flag();
    for signal in [SIGINT, SIGTERM] {
        // A second signal while already cancelling terminates immediately.
        signal_hook::flag::register_conditional_shutdown(signal, 1, flag.clone())
            .map_err(signal_err)?;
        signal_hook::flag::register(signal, flag.clone()).map_err(signal_err)?;
    }

    #[cfg(unix)]
    {
        let mut signals = signal_hook::iterator::Signals::new([signal_hook::consts::SIGUSR1])
            .map_err(signal_err)?;
        let control = control.clone();
        std::thread::spawn(move || {
            for _ in signals.forever() {
                if control.toggle_pause() {
                    logger.log("Transfer paused. Send SIGUSR1 again to resume.");
                } else {
                    logger.log("Transfer resumed.");
                }
            }
        });
    }
    #[cfg(not(unix))]
    let _ = logger;
    Ok(())
}

fn job_exit(report: &JobReport) -> RunOutcome {
    if report.failed() > 0 {
        RunOutcome::with_code(to_exit_code(ErrorKind::Store))
    } else {
        RunOutcome::ok()
    }
}

fn report_json(report: &JobReport) -> Value {
    let tables = report
        .tables
        .iter()
        .map(|table| {
            let mut entry = Map::new();
            entry.insert("table".to_string(), json!(table.table));
            entry.insert("kind".to_string(), json!(table.kind.label()));
            match &table.outcome {
                TableOutcome::Transferred { records } => {
                    entry.insert("outcome".to_string(), json!("transferred"));
                    entry.insert("records".to_string(), json!(records));
                }
                TableOutcome::Skipped { reason } => {
                    entry.insert("outcome".to_string(), json!("skipped"));
                    entry.insert("reason".to_string(), json!(reason));
                }
                TableOutcome::Failed { error } => {
                    entry.insert("outcome".to_string(), json!("failed"));
                    entry.insert("error".to_string(), json!(error));
                }
            }
            Value::Object(entry)
        })
        .collect::<Vec<_>>();
    json!({
        "tables": tables,
        "transferred": report.transferred(),
        "skipped": report.skipped(),
        "failed": report.failed(),
        "records": report.total_records(),
    })
}

fn emit_check_human(report: &ValidationReport) {
    println!("{}", report.summary());
    println!("status: {}", report.status.as_str());
    for issue in &report.issues {
        println!("  {}  {}", issue.code, issue.message);
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint("Check the path and the configured directories."),
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        ErrorKind::Store => err.with_hint("Check the store paths and that no other process holds them."),
        _ => err,
    }
}

fn add_format_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Format || err.hint().is_some() {
        return err;
    }
    err.with_hint("File is not a valid container for this table. Run `dbcycle check` on it.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and share command/context if it persists.",
    )
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("dbcycle {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            json!({
                "name": "dbcycle",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

fn emit_table(headers: &[String], rows: &[Vec<String>]) {
    println!("{}", render_table(headers, rows));
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let column_count = headers.len();
    let mut sanitized_rows = Vec::with_capacity(rows.len());
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        let mut sanitized = Vec::with_capacity(column_count);
        for (idx, width) in widths.iter_mut().enumerate() {
            let value = row.get(idx).map(String::as_str).unwrap_or("");
            let cleaned = sanitize_table_cell(value);
            *width = (*width).max(cleaned.chars().count());
            sanitized.push(cleaned);
        }
        sanitized_rows.push(sanitized);
    }

    let mut lines = Vec::with_capacity(sanitized_rows.len() + 1);
    lines.push(format_table_line(headers, &widths));
    for row in sanitized_rows {
        lines.push(format_table_line(&row, &widths));
    }
    lines.join("\n")
}

fn sanitize_table_cell(value: &str) -> String {
    value.replace('\n', "\\n").replace('\r', "\\r")
}

fn format_table_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(idx).map(String::as_str).unwrap_or("");
        line.push_str(cell);
        let cell_len = cell.chars().count();
        if *width > cell_len {
            line.push_str(&" ".repeat(*width - cell_len));
        }
    }
    line.trim_end().to_string()
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let pretty = is_tty || color_mode.use_color(is_tty);
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
    Green,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let use_color = color_mode.use_color(is_tty);
        let line = match classify(&notice.message) {
            LogLevel::Info => notice.message.clone(),
            LogLevel::Success => colorize_label(&notice.message, use_color, AnsiColor::Green),
            LogLevel::Warning => colorize_label(&notice.message, use_color, AnsiColor::Yellow),
            LogLevel::Error => colorize_label(&notice.message, use_color, AnsiColor::Red),
        };
        eprintln!("{line}");
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Schema => "invalid schema".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Format => "invalid container format".to_string(),
        ErrorKind::Cancelled => "operation cancelled".to_string(),
        ErrorKind::Store => "store error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(table) = err.table() {
        inner.insert("table".to_string(), json!(table));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(table) = err.table() {
        lines.push(format!(
            "{} {table}",
            colorize_label("table:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!(
            "{} {offset}",
            colorize_label("offset:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `dbcycle --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "dbcycle") else {
        return "Try `dbcycle --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `dbcycle --help`.".to_string();
    }
    format!("Try `dbcycle {} --help`.", parts.join(" "))
}
