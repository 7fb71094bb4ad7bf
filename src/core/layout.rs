// Per-table record geometry derived from the schema.
//
// The header's record size always counts every slot as 4 bytes, while the
// bytes actually written per record follow each type's natural width. Both
// numbers are kept; they disagree whenever a table has byte, short or long
// fields.
use crate::core::schema::{ScalarType, TableDefinition};

pub const SLOT_ACCOUNTING_WIDTH: u32 = 4;
/// Header size fields are read back as signed 32-bit values.
pub const MAX_RECORD_SIZE: u32 = i32::MAX as u32;

pub fn width_of(scalar_type: ScalarType) -> u32 {
    match scalar_type {
        ScalarType::Byte => 1,
        ScalarType::Short => 2,
        ScalarType::Int => 4,
        ScalarType::UInt => 4,
        ScalarType::Long => 8,
        ScalarType::Float => 4,
        ScalarType::String => 4,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableLayout {
    pub slot_count: u32,
    pub declared_record_size: u32,
    pub natural_byte_size: u32,
}

impl TableLayout {
    /// Sizes saturate at `u32::MAX`; schema validation rejects anything past `MAX_RECORD_SIZE`.
    pub fn of(table: &TableDefinition) -> Self {
        let slot_count = table
            .fields
            .iter()
            .fold(0u32, |total, field| total.saturating_add(field.slots()));
        let natural_byte_size = table.fields.iter().fold(0u32, |total, field| {
            total.saturating_add(field.slots().saturating_mul(width_of(field.scalar_type)))
        });
        Self {
            slot_count,
            declared_record_size: slot_count.saturating_mul(SLOT_ACCOUNTING_WIDTH),
            natural_byte_size,
        }
    }

    /// Both sizes fit the signed 32-bit header fields.
    pub fn fits_header(&self) -> bool {
        self.declared_record_size <= MAX_RECORD_SIZE && self.natural_byte_size <= MAX_RECORD_SIZE
    }

    pub fn sizes_agree(&self) -> bool {
        self.declared_record_size == self.natural_byte_size
    }
}

#[cfg(test)]
mod tests {
    use super::TableLayout;
    use crate::core::schema::{ContainerKind, FieldDefinition, ScalarType, TableDefinition};

    #[test]
    fn four_byte_fields_agree() {
        let table = TableDefinition::new(
            "Spell",
            ContainerKind::Legacy,
            vec![
                FieldDefinition::scalar("ID", ScalarType::Int),
                FieldDefinition::array("Name", ScalarType::String, 3),
                FieldDefinition::scalar("Speed", ScalarType::Float),
            ],
        );
        let layout = TableLayout::of(&table);
        assert_eq!(layout.slot_count, 5);
        assert_eq!(layout.declared_record_size, 20);
        assert_eq!(layout.natural_byte_size, 20);
        assert!(layout.sizes_agree());
    }

    #[test]
    fn narrow_and_wide_fields_diverge() {
        let table = TableDefinition::new(
            "Mixed",
            ContainerKind::Extended,
            vec![
                FieldDefinition::scalar("Flag", ScalarType::Byte),
                FieldDefinition::array("Level", ScalarType::Short, 2),
                FieldDefinition::scalar("Guid", ScalarType::Long),
            ],
        );
        let layout = TableLayout::of(&table);
        assert_eq!(layout.slot_count, 4);
        assert_eq!(layout.declared_record_size, 16);
        assert_eq!(layout.natural_byte_size, 1 + 4 + 8);
        assert!(!layout.sizes_agree());
    }

    #[test]
    fn oversized_arrays_saturate_instead_of_overflowing() {
        let table = TableDefinition::new(
            "Huge",
            ContainerKind::Legacy,
            vec![
                FieldDefinition::array("Blob", ScalarType::Int, 1 << 30),
                FieldDefinition::array("More", ScalarType::Long, u32::MAX),
            ],
        );
        let layout = TableLayout::of(&table);
        assert_eq!(layout.declared_record_size, u32::MAX);
        assert_eq!(layout.natural_byte_size, u32::MAX);
        assert!(!layout.fits_header());
    }

    #[test]
    fn explicit_array_size_one_counts_as_scalar() {
        let scalar = TableDefinition::new(
            "A",
            ContainerKind::Legacy,
            vec![FieldDefinition::scalar("X", ScalarType::Long)],
        );
        let single = TableDefinition::new(
            "A",
            ContainerKind::Legacy,
            vec![FieldDefinition::array("X", ScalarType::Long, 1)],
        );
        assert_eq!(TableLayout::of(&scalar), TableLayout::of(&single));
    }
}
