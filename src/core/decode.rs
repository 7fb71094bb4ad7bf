//! Purpose: Turn a container's record and string blocks back into per-column values.
//! Exports: `RecordDecoder`, `StructuralWarning`.
//! Role: Inverse of the encoder, plus the header-vs-schema consistency checks.
//! Invariants: The header's record size is the stride; slots are read at natural width.
//! Invariants: Mismatches are reported as warnings and never stop decoding.
//! Invariants: Slots outside a record's window or the available bytes decode to defaults.
//! Invariants: Only records whose full stride is present are yielded.
use byteorder::{ByteOrder, LittleEndian};

use crate::core::header::ContainerHeader;
use crate::core::layout::{TableLayout, width_of};
use crate::core::schema::{ScalarType, TableDefinition};
use crate::core::strings::read_string;
use crate::core::value::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StructuralWarning {
    SlotCount { expected: u32, actual: u32 },
    RecordSize { expected: u32, actual: u32 },
    NaturalSize { expected: u32, actual: u32 },
    TruncatedRecords { expected: u64, actual: u64 },
    TruncatedStrings { expected: u64, actual: u64 },
}

impl StructuralWarning {
    pub fn code(&self) -> &'static str {
        match self {
            StructuralWarning::SlotCount { .. } => "slot_count",
            StructuralWarning::RecordSize { .. } => "record_size",
            StructuralWarning::NaturalSize { .. } => "natural_size",
            StructuralWarning::TruncatedRecords { .. } => "truncated_records",
            StructuralWarning::TruncatedStrings { .. } => "truncated_strings",
        }
    }

    pub fn message(&self, table: &str) -> String {
        match self {
            StructuralWarning::SlotCount { expected, actual } => format!(
                "Warning: Field count mismatch in {table}. Expected {expected}, got {actual}."
            ),
            StructuralWarning::RecordSize { expected, actual } => format!(
                "Warning: Record size mismatch in {table}. Expected {expected}, got {actual}."
            ),
            StructuralWarning::NaturalSize { expected, actual } => format!(
                "Warning: Record size mismatch for {table}. Expected {expected} bytes, got {actual} bytes."
            ),
            StructuralWarning::TruncatedRecords { expected, actual } => format!(
                "Warning: Record block truncated in {table}. Expected {expected} bytes, got {actual} bytes."
            ),
            StructuralWarning::TruncatedStrings { expected, actual } => format!(
                "Warning: String block truncated in {table}. Expected {expected} bytes, got {actual} bytes."
            ),
        }
    }
}

pub struct RecordDecoder<'a> {
    table: &'a TableDefinition,
    header: &'a ContainerHeader,
    records: &'a [u8],
    strings: &'a [u8],
    layout: TableLayout,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(
        table: &'a TableDefinition,
        header: &'a ContainerHeader,
        records: &'a [u8],
        strings: &'a [u8],
    ) -> Self {
        Self {
            table,
            header,
            records,
            strings,
            layout: TableLayout::of(table),
        }
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    /// Records the header announces, capped to the full strides actually present.
    pub fn record_count(&self) -> usize {
        let announced = self.header.record_count as usize;
        match self.header.declared_record_size as usize {
            0 => 0,
            stride => announced.min(self.records.len() / stride),
        }
    }

    pub fn structural_warnings(&self) -> Vec<StructuralWarning> {
        let mut warnings = Vec::new();
        let header = self.header;
        if header.slot_count != self.layout.slot_count {
            warnings.push(StructuralWarning::SlotCount {
                expected: self.layout.slot_count,
                actual: header.slot_count,
            });
        }
        if header.declared_record_size != self.layout.declared_record_size {
            warnings.push(StructuralWarning::RecordSize {
                expected: self.layout.declared_record_size,
                actual: header.declared_record_size,
            });
        }
        if header.declared_record_size != self.layout.natural_byte_size {
            warnings.push(StructuralWarning::NaturalSize {
                expected: self.layout.natural_byte_size,
                actual: header.declared_record_size,
            });
        }
        let records_len = self.records.len() as u64;
        if records_len < header.record_block_len() {
            warnings.push(StructuralWarning::TruncatedRecords {
                expected: header.record_block_len(),
                actual: records_len,
            });
        }
        let strings_len = self.strings.len() as u64;
        if strings_len < u64::from(header.string_block_len) {
            warnings.push(StructuralWarning::TruncatedStrings {
                expected: u64::from(header.string_block_len),
                actual: strings_len,
            });
        }
        warnings
    }

    /// Values of record `index` in flattened column order.
    pub fn decode_record(&self, index: usize) -> Vec<Value> {
        let stride = self.header.declared_record_size as usize;
        let start = index.saturating_mul(stride);
        let window_end = start.saturating_add(stride);
        let mut cursor = start;
        let mut values = Vec::with_capacity(self.layout.slot_count as usize);
        for field in &self.table.fields {
            let width = width_of(field.scalar_type) as usize;
            for _ in 0..field.slots() {
                values.push(self.read_slot(field.scalar_type, cursor, window_end));
                cursor = cursor.saturating_add(width);
            }
        }
        values
    }

    pub fn records(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.record_count()).map(|index| self.decode_record(index))
    }

    fn read_slot(&self, scalar_type: ScalarType, at: usize, window_end: usize) -> Value {
        let width = width_of(scalar_type) as usize;
        let end = at.saturating_add(width);
        if end > window_end || end > self.records.len() {
            return Value::default_for(scalar_type);
        }
        let bytes = &self.records[at..end];
        match scalar_type {
            ScalarType::Byte => Value::Byte(bytes[0]),
            ScalarType::Short => Value::Short(LittleEndian::read_i16(bytes)),
            ScalarType::Int => Value::Int(LittleEndian::read_i32(bytes)),
            ScalarType::UInt => Value::UInt(LittleEndian::read_u32(bytes)),
            ScalarType::Long => Value::Long(LittleEndian::read_i64(bytes)),
            ScalarType::Float => Value::Float(LittleEndian::read_f32(bytes)),
            ScalarType::String => {
                let offset = LittleEndian::read_i32(bytes);
                Value::String(read_string(self.strings, i64::from(offset)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordDecoder, StructuralWarning};
    use crate::core::encode::RecordEncoder;
    use crate::core::header::ContainerHeader;
    use crate::core::schema::{ContainerKind, FieldDefinition, ScalarType, TableDefinition};
    use crate::core::value::{Row, Value};

    fn table(fields: Vec<FieldDefinition>) -> TableDefinition {
        TableDefinition::new("Spell", ContainerKind::Legacy, fields)
    }

    fn header(record_count: u32, slot_count: u32, record_size: u32) -> ContainerHeader {
        ContainerHeader {
            kind: ContainerKind::Legacy,
            record_count,
            slot_count,
            declared_record_size: record_size,
            string_block_len: 0,
            extended: None,
        }
    }

    #[test]
    fn decodes_what_the_encoder_wrote() {
        let table = table(vec![
            FieldDefinition::scalar("ID", ScalarType::Int).index(),
            FieldDefinition::scalar("Mask", ScalarType::UInt),
            FieldDefinition::scalar("Scale", ScalarType::Float),
            FieldDefinition::array("Name", ScalarType::String, 3),
        ]);
        let mut encoder = RecordEncoder::new(&table);
        let names = vec!["a".to_string(), "b".to_string()];
        encoder.push_row(
            &Row::new()
                .with("ID", "10")
                .with("Mask", "3000000000")
                .with("Scale", "0.25")
                .with("Name", names),
        );
        let file = encoder.finish().into_container(None);
        let decoder = file.decoder(&table);
        assert!(decoder.structural_warnings().is_empty());
        let values = decoder.decode_record(0);
        assert_eq!(
            values,
            vec![
                Value::Int(10),
                Value::UInt(3_000_000_000),
                Value::Float(0.25),
                Value::from("a"),
                Value::from("b"),
                Value::from(""),
            ]
        );
    }

    #[test]
    fn slot_count_mismatch_warns_but_decodes_every_record() {
        let table = table(vec![FieldDefinition::scalar("ID", ScalarType::Int)]);
        let mut records = Vec::new();
        for id in 0..3i32 {
            records.extend_from_slice(&id.to_le_bytes());
        }
        let header = header(3, 2, 4);
        let decoder = RecordDecoder::new(&table, &header, &records, &[0]);
        assert_eq!(
            decoder.structural_warnings(),
            vec![StructuralWarning::SlotCount { expected: 1, actual: 2 }]
        );
        let ids = decoder.records().map(|values| values[0].clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn narrow_fields_report_both_size_checks() {
        let table = table(vec![
            FieldDefinition::scalar("Flag", ScalarType::Byte),
            FieldDefinition::scalar("Level", ScalarType::Short),
        ]);
        let header = header(1, 2, 8);
        let records = [7u8, 0x02, 0x01, 0, 0, 0, 0, 0];
        let decoder = RecordDecoder::new(&table, &header, &records, &[0]);
        let warnings = decoder.structural_warnings();
        assert_eq!(
            warnings,
            vec![StructuralWarning::NaturalSize { expected: 3, actual: 8 }]
        );
        assert_eq!(
            warnings[0].message("Spell"),
            "Warning: Record size mismatch for Spell. Expected 3 bytes, got 8 bytes."
        );
        assert_eq!(
            decoder.decode_record(0),
            vec![Value::Byte(7), Value::Short(0x0102)]
        );
    }

    #[test]
    fn stride_comes_from_the_header() {
        let table = table(vec![FieldDefinition::scalar("Flag", ScalarType::Byte)]);
        // One byte field, four-byte stride: records start at 0 and 4.
        let records = [1u8, 9, 9, 9, 2, 9, 9, 9];
        let header = header(2, 1, 4);
        let decoder = RecordDecoder::new(&table, &header, &records, &[0]);
        let flags = decoder.records().map(|values| values[0].clone()).collect::<Vec<_>>();
        assert_eq!(flags, vec![Value::Byte(1), Value::Byte(2)]);
    }

    #[test]
    fn slots_past_the_record_window_default() {
        let table = table(vec![
            FieldDefinition::scalar("ID", ScalarType::Int),
            FieldDefinition::scalar("Guid", ScalarType::Long),
        ]);
        let mut records = Vec::new();
        records.extend_from_slice(&5i32.to_le_bytes());
        records.extend_from_slice(&6i32.to_le_bytes());
        records.extend_from_slice(&7i32.to_le_bytes());
        records.extend_from_slice(&8i32.to_le_bytes());
        let header = header(2, 2, 8);
        let decoder = RecordDecoder::new(&table, &header, &records, &[0]);
        assert_eq!(decoder.decode_record(0), vec![Value::Int(5), Value::Long(0)]);
        assert_eq!(decoder.decode_record(1), vec![Value::Int(7), Value::Long(0)]);
    }

    #[test]
    fn truncated_blocks_warn_and_default() {
        let table = table(vec![FieldDefinition::scalar("Name", ScalarType::String)]);
        let mut header = header(2, 1, 4);
        header.string_block_len = 10;
        let records = 1i32.to_le_bytes();
        let strings = b"\0ab";
        let decoder = RecordDecoder::new(&table, &header, &records, strings);
        let codes = decoder
            .structural_warnings()
            .iter()
            .map(|warning| warning.code())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["truncated_records", "truncated_strings"]);
        assert_eq!(decoder.record_count(), 1);
        assert_eq!(decoder.decode_record(0), vec![Value::from("ab")]);
        assert_eq!(decoder.decode_record(1), vec![Value::from("")]);
    }

    #[test]
    fn announced_count_is_capped_to_records_present() {
        let table = table(vec![FieldDefinition::scalar("ID", ScalarType::Int)]);
        let mut records = Vec::new();
        records.extend_from_slice(&41i32.to_le_bytes());
        records.extend_from_slice(&42i32.to_le_bytes());
        // A partial third record does not count.
        records.extend_from_slice(&[1, 2]);
        let announced = header(u32::MAX, 1, 4);
        let decoder = RecordDecoder::new(&table, &announced, &records, &[0]);
        assert_eq!(decoder.record_count(), 2);
        let ids = decoder.records().map(|values| values[0].clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![Value::Int(41), Value::Int(42)]);

        let zero_stride = header(3, 0, 0);
        let decoder = RecordDecoder::new(&table, &zero_stride, &records, &[0]);
        assert_eq!(decoder.record_count(), 0);
    }

    #[test]
    fn bad_string_offsets_read_as_empty() {
        let table = table(vec![FieldDefinition::scalar("Name", ScalarType::String)]);
        let header = header(2, 1, 4);
        let mut records = Vec::new();
        records.extend_from_slice(&(-5i32).to_le_bytes());
        records.extend_from_slice(&400i32.to_le_bytes());
        let decoder = RecordDecoder::new(&table, &header, &records, b"\0x\0");
        assert_eq!(decoder.decode_record(0), vec![Value::from("")]);
        assert_eq!(decoder.decode_record(1), vec![Value::from("")]);
    }
}
