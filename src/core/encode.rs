// Row to fixed-width record encoding plus string block construction.
use byteorder::{LittleEndian, WriteBytesExt};

use crate::core::container::ContainerFile;
use crate::core::header::{ContainerHeader, ExtendedMeta};
use crate::core::layout::TableLayout;
use crate::core::schema::{ContainerKind, ScalarType, TableDefinition};
use crate::core::strings::StringTable;
use crate::core::value::{Row, Value};

pub struct RecordEncoder<'a> {
    table: &'a TableDefinition,
    layout: TableLayout,
    records: Vec<u8>,
    strings: StringTable,
    record_count: u32,
}

impl<'a> RecordEncoder<'a> {
    pub fn new(table: &'a TableDefinition) -> Self {
        let layout = TableLayout::of(table);
        Self {
            table,
            layout,
            records: Vec::new(),
            strings: StringTable::new(),
            record_count: 0,
        }
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Append one record; fields are written in schema order at natural width.
    pub fn push_row(&mut self, row: &Row) {
        let table = self.table;
        for field in &table.fields {
            let value = row.get(&field.name);
            if !field.is_array() {
                self.write_slot(field.scalar_type, value);
                continue;
            }
            let items = match value {
                Some(Value::StringArray(items)) => items.as_slice(),
                _ => &[],
            };
            for slot in 0..field.slots() as usize {
                let item = items.get(slot).map(|text| Value::String(text.clone()));
                self.write_slot(field.scalar_type, item.as_ref());
            }
        }
        self.record_count += 1;
    }

    fn write_slot(&mut self, scalar_type: ScalarType, value: Option<&Value>) {
        let value = value.cloned().unwrap_or_else(|| Value::default_for(scalar_type));
        let records = &mut self.records;
        // Writing into a Vec cannot fail.
        let _ = match scalar_type {
            ScalarType::Byte => records.write_u8(value.to_u8()),
            ScalarType::Short => records.write_i16::<LittleEndian>(value.to_i16()),
            ScalarType::Int => records.write_i32::<LittleEndian>(value.to_i32()),
            ScalarType::UInt => records.write_u32::<LittleEndian>(value.to_u32()),
            ScalarType::Long => records.write_i64::<LittleEndian>(value.to_i64()),
            ScalarType::Float => records.write_f32::<LittleEndian>(value.to_f32()),
            ScalarType::String => {
                let text = value.to_text();
                let offset = self.strings.intern(text.trim());
                records.write_u32::<LittleEndian>(offset)
            }
        };
    }

    pub fn finish(self) -> EncodedTable {
        tracing::debug!(
            table = %self.table.name,
            records = self.record_count,
            record_bytes = self.records.len(),
            distinct_strings = self.strings.distinct(),
            "encoded table"
        );
        EncodedTable {
            kind: self.table.container_kind,
            layout: self.layout,
            record_count: self.record_count,
            records: self.records,
            strings: self.strings.into_bytes(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EncodedTable {
    pub kind: ContainerKind,
    pub layout: TableLayout,
    pub record_count: u32,
    pub records: Vec<u8>,
    pub strings: Vec<u8>,
}

impl EncodedTable {
    /// Header for this table; `meta` applies to extended containers only.
    pub fn header(&self, meta: Option<ExtendedMeta>) -> ContainerHeader {
        let extended = match self.kind {
            ContainerKind::Legacy => None,
            ContainerKind::Extended => Some(meta.unwrap_or_default().stamped()),
        };
        ContainerHeader {
            kind: self.kind,
            record_count: self.record_count,
            slot_count: self.layout.slot_count,
            declared_record_size: self.layout.declared_record_size,
            string_block_len: self.strings.len() as u32,
            extended,
        }
    }

    pub fn into_container(self, meta: Option<ExtendedMeta>) -> ContainerFile {
        let header = self.header(meta);
        ContainerFile {
            header,
            records: self.records,
            strings: self.strings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RecordEncoder;
    use crate::core::header::{DEFAULT_BUILD, ExtendedMeta};
    use crate::core::schema::{ContainerKind, FieldDefinition, ScalarType, TableDefinition};
    use crate::core::value::{Row, Value};

    fn spell() -> TableDefinition {
        TableDefinition::new(
            "Spell",
            ContainerKind::Legacy,
            vec![
                FieldDefinition::scalar("ID", ScalarType::Int).index(),
                FieldDefinition::scalar("Name", ScalarType::String),
                FieldDefinition::array("Tag", ScalarType::String, 3),
            ],
        )
    }

    fn strings(values: &[&str]) -> Value {
        Value::StringArray(values.iter().map(|value| value.to_string()).collect())
    }

    #[test]
    fn records_are_written_in_schema_order() {
        let table = spell();
        let mut encoder = RecordEncoder::new(&table);
        encoder.push_row(&Row::new().with("ID", "7").with("Name", "Fireball"));
        let encoded = encoder.finish();
        assert_eq!(encoded.record_count, 1);
        assert_eq!(encoded.records.len(), 20);
        assert_eq!(&encoded.records[0..4], &7i32.to_le_bytes());
        assert_eq!(&encoded.records[4..8], &1u32.to_le_bytes());
        assert_eq!(&encoded.strings[..], b"\0Fireball\0\0");
    }

    #[test]
    fn short_arrays_pad_with_empty_strings() {
        let table = spell();
        let mut encoder = RecordEncoder::new(&table);
        encoder.push_row(
            &Row::new()
                .with("ID", 1)
                .with("Name", "x")
                .with("Tag", strings(&["a", "b"])),
        );
        let encoded = encoder.finish();
        let slot = |index: usize| {
            let start = 8 + index * 4;
            u32::from_le_bytes(encoded.records[start..start + 4].try_into().expect("slot"))
        };
        // "x" at 1, "a" at 3, "b" at 5, "" at 7
        assert_eq!((slot(0), slot(1), slot(2)), (3, 5, 7));
        assert_eq!(&encoded.strings[..], b"\0x\0a\0b\0\0");
    }

    #[test]
    fn long_arrays_are_truncated_and_values_trimmed() {
        let table = spell();
        let mut encoder = RecordEncoder::new(&table);
        encoder.push_row(&Row::new().with("Tag", strings(&[" a ", "b", "c", "d"])));
        let encoded = encoder.finish();
        assert_eq!(encoded.records.len(), 20);
        assert!(!encoded.strings.windows(3).any(|window| window == b"\0d\0"));
        assert!(encoded.strings.windows(3).any(|window| window == b"\0a\0"));
    }

    #[test]
    fn duplicate_strings_across_fields_and_rows_share_offsets() {
        let table = spell();
        let mut encoder = RecordEncoder::new(&table);
        for _ in 0..3 {
            encoder.push_row(
                &Row::new()
                    .with("Name", "Frost")
                    .with("Tag", strings(&["Frost", "Frost", "Frost"])),
            );
        }
        let encoded = encoder.finish();
        let copies = encoded
            .strings
            .windows(5)
            .filter(|window| *window == b"Frost")
            .count();
        assert_eq!(copies, 1);
        for record in encoded.records.chunks(20) {
            for slot in record[4..].chunks(4) {
                assert_eq!(u32::from_le_bytes(slot.try_into().expect("slot")), 1);
            }
        }
    }

    #[test]
    fn narrow_types_use_natural_width() {
        let table = TableDefinition::new(
            "Mixed",
            ContainerKind::Extended,
            vec![
                FieldDefinition::scalar("Flag", ScalarType::Byte),
                FieldDefinition::scalar("Level", ScalarType::Short),
                FieldDefinition::scalar("Guid", ScalarType::Long),
                FieldDefinition::scalar("Mask", ScalarType::UInt),
                FieldDefinition::scalar("Scale", ScalarType::Float),
            ],
        );
        let mut encoder = RecordEncoder::new(&table);
        encoder.push_row(
            &Row::new()
                .with("Flag", "255")
                .with("Level", "-3")
                .with("Guid", "not a number")
                .with("Mask", "4294967295")
                .with("Scale", "1.5"),
        );
        let encoded = encoder.finish();
        let mut expected = vec![255u8];
        expected.extend_from_slice(&(-3i16).to_le_bytes());
        expected.extend_from_slice(&0i64.to_le_bytes());
        expected.extend_from_slice(&u32::MAX.to_le_bytes());
        expected.extend_from_slice(&1.5f32.to_le_bytes());
        assert_eq!(encoded.records, expected);

        let header = encoded.header(None);
        assert_eq!(header.slot_count, 5);
        assert_eq!(header.declared_record_size, 20);
        assert_eq!(encoded.records.len(), 19);
    }

    #[test]
    fn extended_header_gets_defaults_and_fresh_timestamp() {
        let table = TableDefinition::new(
            "Item",
            ContainerKind::Extended,
            vec![FieldDefinition::scalar("ID", ScalarType::Int)],
        );
        let mut encoder = RecordEncoder::new(&table);
        encoder.push_row(&Row::new().with("ID", 1));
        let encoded = encoder.finish();
        let meta = encoded.header(None).extended.expect("extended meta");
        assert_eq!(meta.build, DEFAULT_BUILD);
        assert!(meta.timestamp > 0);

        let carried = ExtendedMeta {
            build: 18200,
            timestamp: 1,
            ..ExtendedMeta::default()
        };
        let meta = encoded.header(Some(carried)).extended.expect("extended meta");
        assert_eq!(meta.build, 18200);
        assert!(meta.timestamp > 1);
    }

    #[test]
    fn legacy_header_ignores_extended_meta() {
        let table = spell();
        let encoded = RecordEncoder::new(&table).finish();
        assert!(encoded.header(Some(ExtendedMeta::default())).extended.is_none());
    }
}
