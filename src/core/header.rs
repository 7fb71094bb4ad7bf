//! Purpose: Encode and decode the legacy (WDBC) and extended (WDB2) container headers.
//! Exports: `ContainerHeader`, `ExtendedMeta`, header length and default constants.
//! Role: Fixed-layout header codec used by container read/write and carry-over.
//! Invariants: All integers are little-endian; legacy is 20 bytes, extended 48.
//! Invariants: Magic must match the table's container kind byte for byte on read.
//! Invariants: Carry-over never fails; any problem falls back to defaults with a warning.
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use bstr::ByteSlice;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::core::error::{Error, ErrorKind};
use crate::core::log::Logger;
use crate::core::schema::ContainerKind;

pub const LEGACY_HEADER_LEN: usize = 20;
pub const EXTENDED_HEADER_LEN: usize = 48;
pub const DEFAULT_BUILD: u32 = 18414;

/// Extended-only header fields; opaque to the codec apart from carry-over.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExtendedMeta {
    pub table_hash: u32,
    pub build: u32,
    pub timestamp: u32,
    pub min_id: i32,
    pub max_id: i32,
    pub locale: u32,
    pub copy_table_size: u32,
}

impl Default for ExtendedMeta {
    fn default() -> Self {
        Self {
            table_hash: 0,
            build: DEFAULT_BUILD,
            timestamp: 0,
            min_id: 0,
            max_id: 0,
            locale: 0,
            copy_table_size: 0,
        }
    }
}

impl ExtendedMeta {
    pub fn stamped(mut self) -> Self {
        self.timestamp = unix_now();
        self
    }

    /// Reuse metadata from `dir/file_name` when it is a readable WDB2 file.
    ///
    /// Record count, slot count, record size, string block length and
    /// timestamp of the reference file are never reused.
    pub fn carry_over(dir: &Path, file_name: &str, logger: &dyn Logger) -> Self {
        let path = dir.join(file_name);
        if !path.is_file() {
            logger.log(&format!(
                "Warning: carry-over file not found at {}. Using default header values.",
                path.display()
            ));
            return Self::default();
        }
        match read_reference_header(&path) {
            Ok(Some(meta)) => {
                tracing::debug!(
                    path = %path.display(),
                    build = meta.build,
                    table_hash = meta.table_hash,
                    "carried over extended header"
                );
                meta
            }
            Ok(None) => {
                logger.log(&format!(
                    "Warning: carry-over file {} does not have expected WDB2 magic. Using default header values.",
                    path.display()
                ));
                Self::default()
            }
            Err(err) => {
                logger.log(&format!(
                    "Warning: error reading WDB2 header from {}: {err}. Using default header values.",
                    path.display()
                ));
                Self::default()
            }
        }
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            table_hash: reader.read_u32::<LittleEndian>()?,
            build: reader.read_u32::<LittleEndian>()?,
            timestamp: reader.read_u32::<LittleEndian>()?,
            min_id: reader.read_i32::<LittleEndian>()?,
            max_id: reader.read_i32::<LittleEndian>()?,
            locale: reader.read_u32::<LittleEndian>()?,
            copy_table_size: reader.read_u32::<LittleEndian>()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.table_hash)?;
        writer.write_u32::<LittleEndian>(self.build)?;
        writer.write_u32::<LittleEndian>(self.timestamp)?;
        writer.write_i32::<LittleEndian>(self.min_id)?;
        writer.write_i32::<LittleEndian>(self.max_id)?;
        writer.write_u32::<LittleEndian>(self.locale)?;
        writer.write_u32::<LittleEndian>(self.copy_table_size)?;
        Ok(())
    }
}

fn read_reference_header(path: &Path) -> io::Result<Option<ExtendedMeta>> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if magic != ContainerKind::Extended.magic() {
        return Ok(None);
    }
    // record count, slot count, record size, string block length
    let mut skipped = [0u8; 16];
    file.read_exact(&mut skipped)?;
    ExtendedMeta::read_from(&mut file).map(Some)
}

fn unix_now() -> u32 {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    u32::try_from(now).unwrap_or(u32::MAX)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContainerHeader {
    pub kind: ContainerKind,
    pub record_count: u32,
    pub slot_count: u32,
    pub declared_record_size: u32,
    pub string_block_len: u32,
    pub extended: Option<ExtendedMeta>,
}

impl ContainerHeader {
    pub fn encoded_len(&self) -> usize {
        header_len(self.kind)
    }

    /// Byte length of the record block the header announces.
    pub fn record_block_len(&self) -> u64 {
        u64::from(self.record_count) * u64::from(self.declared_record_size)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.kind.magic())?;
        writer.write_u32::<LittleEndian>(self.record_count)?;
        writer.write_u32::<LittleEndian>(self.slot_count)?;
        writer.write_u32::<LittleEndian>(self.declared_record_size)?;
        writer.write_u32::<LittleEndian>(self.string_block_len)?;
        if self.kind == ContainerKind::Extended {
            self.extended.unwrap_or_default().write_to(writer)?;
        }
        Ok(())
    }

    pub fn decode(buf: &[u8], expected: ContainerKind) -> Result<Self, Error> {
        let expected_magic = expected.magic();
        if buf.len() < 4 || buf[0..4] != expected_magic {
            let got = &buf[..buf.len().min(4)];
            return Err(Error::new(ErrorKind::Format)
                .with_message(format!(
                    "Expected {}, got {}.",
                    expected_magic[..].as_bstr(),
                    got.as_bstr()
                ))
                .with_hint(format!("not a {} container", expected_magic[..].as_bstr()))
                .with_offset(0));
        }
        if buf.len() < header_len(expected) {
            return Err(Error::new(ErrorKind::Format)
                .with_message(format!(
                    "file too short for {} header ({} of {} bytes)",
                    expected_magic[..].as_bstr(),
                    buf.len(),
                    header_len(expected)
                )));
        }

        let mut cursor = Cursor::new(&buf[4..]);
        let record_count = read_count(&mut cursor, "record count", 4)?;
        let slot_count = read_count(&mut cursor, "field count", 8)?;
        let declared_record_size = read_count(&mut cursor, "record size", 12)?;
        let string_block_len = read_count(&mut cursor, "string block size", 16)?;
        let extended = match expected {
            ContainerKind::Legacy => None,
            ContainerKind::Extended => Some(ExtendedMeta::read_from(&mut cursor).map_err(
                |err| {
                    Error::new(ErrorKind::Format)
                        .with_message("truncated extended header")
                        .with_source(err)
                },
            )?),
        };

        Ok(Self {
            kind: expected,
            record_count,
            slot_count,
            declared_record_size,
            string_block_len,
            extended,
        })
    }

    pub fn summary(&self, table: &str) -> String {
        format!(
            "Header: [{table}] recordCount={}, fieldCount={}, recordSize={}, stringBlockSize={}",
            self.record_count, self.slot_count, self.declared_record_size, self.string_block_len
        )
    }
}

pub fn header_len(kind: ContainerKind) -> usize {
    match kind {
        ContainerKind::Legacy => LEGACY_HEADER_LEN,
        ContainerKind::Extended => EXTENDED_HEADER_LEN,
    }
}

fn read_count(cursor: &mut Cursor<&[u8]>, label: &str, offset: u64) -> Result<u32, Error> {
    let value = cursor.read_i32::<LittleEndian>().map_err(|err| {
        Error::new(ErrorKind::Format)
            .with_message(format!("truncated header reading {label}"))
            .with_offset(offset)
            .with_source(err)
    })?;
    u32::try_from(value).map_err(|_| {
        Error::new(ErrorKind::Format)
            .with_message(format!("negative {label} in header: {value}"))
            .with_offset(offset)
    })
}
