// Whole-file container read/write: header, record block, string block.
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::decode::RecordDecoder;
use crate::core::error::{Error, ErrorKind};
use crate::core::header::ContainerHeader;
use crate::core::schema::{ContainerKind, TableDefinition};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerFile {
    pub header: ContainerHeader,
    pub records: Vec<u8>,
    pub strings: Vec<u8>,
}

impl ContainerFile {
    pub fn read(path: impl AsRef<Path>, table: &TableDefinition) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| {
            Error::io(err, path)
                .with_message("failed to read container file")
                .with_table(&table.name)
        })?;
        Self::from_bytes(&bytes, table.container_kind)
            .map_err(|err| err.with_path(path).with_table(&table.name))
    }

    /// Split a file image into its blocks.
    ///
    /// Blocks shorter than the header announces are kept short; the decoder
    /// reports them and defaults the missing slots.
    pub fn from_bytes(bytes: &[u8], kind: ContainerKind) -> Result<Self, Error> {
        let header = ContainerHeader::decode(bytes, kind)?;
        let body = &bytes[header.encoded_len()..];
        let records_len = clamp_len(header.record_block_len(), body.len());
        let (records, rest) = body.split_at(records_len);
        let strings_len = clamp_len(u64::from(header.string_block_len), rest.len());
        Ok(Self {
            header,
            records: records.to_vec(),
            strings: rest[..strings_len].to_vec(),
        })
    }

    /// `Format` error when the record block is shorter than the header announces.
    pub fn require_complete_records(&self) -> Result<(), Error> {
        let expected = self.header.record_block_len();
        let actual = self.records.len() as u64;
        if actual < expected {
            return Err(Error::new(ErrorKind::Format).with_message(format!(
                "Record block truncated. Expected {expected} bytes, got {actual} bytes."
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.header.encode();
        buf.extend_from_slice(&self.records);
        buf.extend_from_slice(&self.strings);
        buf
    }

    pub fn decoder<'a>(&'a self, table: &'a TableDefinition) -> RecordDecoder<'a> {
        RecordDecoder::new(table, &self.header, &self.records, &self.strings)
    }

    /// Write via a sibling temp file and rename so readers never see a partial file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let tmp_path = temp_path(path);
        let result = self.write_tmp(&tmp_path).and_then(|()| {
            fs::rename(&tmp_path, path).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to move container into place")
                    .with_path(path)
                    .with_source(err)
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn write_tmp(&self, tmp_path: &Path) -> Result<(), Error> {
        let io_err = |err: std::io::Error| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write container file")
                .with_path(tmp_path)
                .with_source(err)
        };
        let file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)
            .map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.header.write_to(&mut writer).map_err(io_err)?;
        writer.write_all(&self.records).map_err(io_err)?;
        writer.write_all(&self.strings).map_err(io_err)?;
        let file = writer.into_inner().map_err(|err| io_err(err.into_error()))?;
        file.sync_all().map_err(io_err)?;
        Ok(())
    }
}

fn clamp_len(announced: u64, available: usize) -> usize {
    usize::try_from(announced).map_or(available, |len| len.min(available))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
