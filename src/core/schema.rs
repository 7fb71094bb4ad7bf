//! Purpose: Describe tables and fields the codec lays out in binary containers.
//! Exports: `ScalarType`, `ContainerKind`, `FieldDefinition`, `TableDefinition`, `DatabaseDefinition`.
//! Role: Read-only input for the codec; loaded once per job from the JSON schema file.
//! Invariants: Field order is binary layout order and is never reordered.
//! Invariants: `array_size` of `None` and `Some(1)` both mean a scalar field.
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::layout::{MAX_RECORD_SIZE, TableLayout};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScalarType {
    Byte,
    Short,
    Int,
    UInt,
    Long,
    Float,
    String,
}

impl ScalarType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Byte => "byte",
            ScalarType::Short => "short",
            ScalarType::Int => "int",
            ScalarType::UInt => "uint",
            ScalarType::Long => "long",
            ScalarType::Float => "float",
            ScalarType::String => "string",
        }
    }
}

impl FromStr for ScalarType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "byte" => Ok(ScalarType::Byte),
            "short" => Ok(ScalarType::Short),
            "int" => Ok(ScalarType::Int),
            "uint" => Ok(ScalarType::UInt),
            "long" => Ok(ScalarType::Long),
            "float" => Ok(ScalarType::Float),
            "string" => Ok(ScalarType::String),
            _ => Err(Error::new(ErrorKind::Schema)
                .with_message(format!("unknown field type '{value}'"))
                .with_hint("Use one of: byte, short, int, uint, long, float, string.")),
        }
    }
}

impl TryFrom<String> for ScalarType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScalarType> for String {
    fn from(value: ScalarType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContainerKind {
    Legacy,
    Extended,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 2] = [ContainerKind::Legacy, ContainerKind::Extended];

    pub fn magic(self) -> [u8; 4] {
        match self {
            ContainerKind::Legacy => *b"WDBC",
            ContainerKind::Extended => *b"WDB2",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContainerKind::Legacy => "dbc",
            ContainerKind::Extended => "db2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContainerKind::Legacy => "legacy",
            ContainerKind::Extended => "extended",
        }
    }
}

impl FromStr for ContainerKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "dbc" => Ok(ContainerKind::Legacy),
            "db2" => Ok(ContainerKind::Extended),
            _ => Err(Error::new(ErrorKind::Schema)
                .with_message(format!("unknown table extension '{value}'"))
                .with_hint("Use \"dbc\" for legacy tables or \"db2\" for extended tables.")),
        }
    }
}

impl TryFrom<String> for ContainerKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContainerKind> for String {
    fn from(value: ContainerKind) -> Self {
        value.extension().to_string()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "Type")]
    pub scalar_type: ScalarType,
    #[serde(default)]
    pub is_index: bool,
    #[serde(default)]
    pub array_size: Option<u32>,
}

impl FieldDefinition {
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
            is_index: false,
            array_size: None,
        }
    }

    pub fn array(name: impl Into<String>, scalar_type: ScalarType, array_size: u32) -> Self {
        Self {
            array_size: Some(array_size),
            ..Self::scalar(name, scalar_type)
        }
    }

    pub fn index(mut self) -> Self {
        self.is_index = true;
        self
    }

    /// Number of slots the field occupies in a record.
    pub fn slots(&self) -> u32 {
        self.array_size.unwrap_or(1)
    }

    pub fn is_array(&self) -> bool {
        self.slots() > 1
    }

    /// Flattened store column names: `name` for scalars, `name_1..name_n` for arrays.
    pub fn column_names(&self) -> Vec<String> {
        if !self.is_array() {
            return vec![self.name.clone()];
        }
        (1..=self.slots())
            .map(|slot| format!("{}_{slot}", self.name))
            .collect()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    pub name: String,
    #[serde(rename = "Extension")]
    pub container_kind: ContainerKind,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl TableDefinition {
    pub fn new(
        name: impl Into<String>,
        container_kind: ContainerKind,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            container_kind,
            fields,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.container_kind.extension())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(FieldDefinition::column_names)
            .collect()
    }

    /// Column holding the primary key: first slot of the first index field.
    pub fn primary_key_column(&self) -> Option<String> {
        self.fields
            .iter()
            .find(|field| field.is_index)
            .and_then(|field| field.column_names().into_iter().next())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::new(ErrorKind::Schema).with_message("table name is empty"));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::new(ErrorKind::Schema)
                    .with_message("field name is empty")
                    .with_table(&self.name));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::new(ErrorKind::Schema)
                    .with_message(format!("duplicate field name '{}'", field.name))
                    .with_table(&self.name));
            }
            if field.array_size == Some(0) {
                return Err(Error::new(ErrorKind::Schema)
                    .with_message(format!("field '{}' has ArraySize 0", field.name))
                    .with_table(&self.name)
                    .with_hint("ArraySize must be at least 1; omit it for scalar fields."));
            }
        }
        let layout = TableLayout::of(self);
        if !layout.fits_header() {
            return Err(Error::new(ErrorKind::Schema)
                .with_message(format!(
                    "record of {} slots does not fit a container header",
                    layout.slot_count
                ))
                .with_table(&self.name)
                .with_hint(format!(
                    "Record size is limited to {MAX_RECORD_SIZE} bytes; reduce ArraySize."
                )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseDefinition {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl DatabaseDefinition {
    pub fn new(tables: Vec<TableDefinition>) -> Self {
        Self { tables }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Schema)
                .with_message("failed to read schema file")
                .with_path(path)
                .with_source(err)
        })?;
        Self::from_json(&text).map_err(|err| err.with_path(path))
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        let definition: DatabaseDefinition = serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Schema)
                .with_message(format!("invalid schema: {err}"))
                .with_source(err)
        })?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.tables.iter().try_for_each(TableDefinition::validate)
    }

    /// Case-insensitive lookup, as used when a table is located by file stem.
    pub fn find_table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }
}
