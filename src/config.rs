//! Purpose: Load, create and validate the `config.json` job settings file.
//! Exports: `Config`, `DEFAULT_CONFIG_PATH`.
//! Role: Single source of paths for import/export; CLI flags override it.
//! Invariants: A missing config file is created with defaults, never treated as an error.
//! Invariants: Unset paths are `None`; commands that need them fail with `Usage`.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::log::Logger;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_file: PathBuf,
    pub input_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    /// SQLite database holding legacy (`.dbc`) tables.
    pub legacy_store: PathBuf,
    /// SQLite database holding extended (`.db2`) tables.
    pub extended_store: PathBuf,
    pub carry_over_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_file: PathBuf::from("schema.json"),
            input_dir: None,
            export_dir: None,
            legacy_store: PathBuf::from("dbc.sqlite"),
            extended_store: PathBuf::from("db2.sqlite"),
            carry_over_dir: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|err| Error::io(err, path).with_message("failed to read config file"))?;
        serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("failed to parse config file: {err}"))
                .with_path(path)
                .with_hint("Fix the JSON or regenerate it with `dbcycle config init --force`.")
        })
    }

    /// Load `path`, writing a default config there first if it does not exist.
    pub fn load_or_create(path: &Path, logger: &dyn Logger) -> Result<Self, Error> {
        if !path.exists() {
            let config = Config::default();
            config.write(path, false)?;
            logger.log(&format!("Created default config file at {}", path.display()));
            return Ok(config);
        }
        Config::load(path)
    }

    pub fn write(&self, path: &Path, force: bool) -> Result<(), Error> {
        if path.exists() && !force {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("config file already exists")
                .with_path(path)
                .with_hint("Re-run with --force to overwrite it."));
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::io(err, parent))?;
        }
        fs::write(path, self.to_json_pretty())
            .map_err(|err| Error::io(err, path).with_message("failed to write config file"))
    }

    pub fn to_json_pretty(&self) -> String {
        let mut text = serde_json::to_string_pretty(self).unwrap_or_default();
        text.push('\n');
        text
    }
}

/// Resolve an optional setting, failing with a usage error naming the key and flag.
pub fn required<'a>(value: Option<&'a Path>, key: &str, flag: &str) -> Result<&'a Path, Error> {
    value
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("`{key}` is not set"))
                .with_hint(format!("Set `{key}` in config.json or pass {flag}."))
        })
}

#[cfg(test)]
mod tests {
    use super::{Config, required};
    use crate::core::error::ErrorKind;
    use crate::core::log::MemoryLogger;
    use std::path::{Path, PathBuf};

    #[test]
    fn missing_file_is_created_with_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        let logger = MemoryLogger::new();
        let config = Config::load_or_create(&path, &logger).expect("load");
        assert_eq!(config, Config::default());
        assert!(path.is_file());
        assert!(logger.contains("Created default config file at "));

        let again = Config::load_or_create(&path, &logger).expect("reload");
        assert_eq!(again, config);
        assert_eq!(logger.count_containing("Created default config file"), 1);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"input_dir": "client/dbc"}"#).expect("write");
        let config = Config::load(&path).expect("load");
        assert_eq!(config.input_dir, Some(PathBuf::from("client/dbc")));
        assert_eq!(config.schema_file, PathBuf::from("schema.json"));
        assert_eq!(config.legacy_store, PathBuf::from("dbc.sqlite"));
    }

    #[test]
    fn bad_json_is_a_usage_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{").expect("write");
        let err = Config::load(&path).expect_err("bad json");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn write_refuses_to_clobber_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.json");
        Config::default().write(&path, false).expect("first write");
        let err = Config::default().write(&path, false).expect_err("exists");
        assert_eq!(err.kind(), ErrorKind::Usage);
        Config::default().write(&path, true).expect("forced write");
    }

    #[test]
    fn unset_or_empty_values_are_usage_errors() {
        let err = required(None, "input_dir", "--input-dir").expect_err("unset");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(required(Some(Path::new("")), "input_dir", "--input-dir").is_err());
        assert_eq!(
            required(Some(Path::new("dbc")), "input_dir", "--input-dir").expect("set"),
            Path::new("dbc")
        );
    }
}
