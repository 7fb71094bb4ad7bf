//! Purpose: Provide a stable, serializable validation report for container files.
//! Exports: `ValidationReport`, `ValidationStatus`, `ValidationIssue`, `check_file`.
//! Role: Shared contract for `dbcycle check` and library users.
//! Invariants: Structural mismatches are issues, never errors; decoding still works.
//! Invariants: Only unreadable files or a wrong magic fail the check itself.

use crate::core::container::ContainerFile;
use crate::core::decode::StructuralWarning;
use crate::core::error::Error;
use crate::core::header::ContainerHeader;
use crate::core::schema::TableDefinition;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationStatus {
    Ok,
    Warning,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Ok => "ok",
            ValidationStatus::Warning => "warning",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub expected: u64,
    pub actual: u64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationReport {
    pub table: String,
    pub path: PathBuf,
    pub status: ValidationStatus,
    pub header: ContainerHeader,
    pub issues: Vec<ValidationIssue>,
    pub issue_count: usize,
}

impl ValidationReport {
    pub fn ok(table: impl Into<String>, path: PathBuf, header: ContainerHeader) -> Self {
        Self {
            table: table.into(),
            path,
            status: ValidationStatus::Ok,
            header,
            issues: Vec::new(),
            issue_count: 0,
        }
    }

    pub fn set_issues(mut self, issues: Vec<ValidationIssue>) -> Self {
        self.issue_count = issues.len();
        self.issues = issues;
        self.status = if self.issue_count == 0 {
            ValidationStatus::Ok
        } else {
            ValidationStatus::Warning
        };
        self
    }

    pub fn summary(&self) -> String {
        self.header.summary(&self.table)
    }

    pub fn to_json(&self) -> Value {
        let issues = self
            .issues
            .iter()
            .map(|issue| {
                json!({
                    "code": issue.code,
                    "message": issue.message,
                    "expected": issue.expected,
                    "actual": issue.actual,
                })
            })
            .collect::<Vec<_>>();
        json!({
            "table": self.table,
            "path": self.path.display().to_string(),
            "status": self.status.as_str(),
            "header": {
                "magic": String::from_utf8_lossy(&self.header.kind.magic()),
                "record_count": self.header.record_count,
                "field_count": self.header.slot_count,
                "record_size": self.header.declared_record_size,
                "string_block_size": self.header.string_block_len,
            },
            "issues": issues,
            "issue_count": self.issue_count,
        })
    }
}

/// Read `path` as a container for `table` and report structural mismatches.
pub fn check_file(path: &Path, table: &TableDefinition) -> Result<ValidationReport, Error> {
    let file = ContainerFile::read(path, table)?;
    let issues = file
        .decoder(table)
        .structural_warnings()
        .iter()
        .map(|warning| issue(warning, &table.name))
        .collect();
    Ok(ValidationReport::ok(&table.name, path.to_path_buf(), file.header).set_issues(issues))
}

fn issue(warning: &StructuralWarning, table: &str) -> ValidationIssue {
    let (expected, actual) = match *warning {
        StructuralWarning::SlotCount { expected, actual }
        | StructuralWarning::RecordSize { expected, actual }
        | StructuralWarning::NaturalSize { expected, actual } => {
            (u64::from(expected), u64::from(actual))
        }
        StructuralWarning::TruncatedRecords { expected, actual }
        | StructuralWarning::TruncatedStrings { expected, actual } => (expected, actual),
    };
    ValidationIssue {
        code: warning.code().to_string(),
        message: warning.message(table),
        expected,
        actual,
    }
}
