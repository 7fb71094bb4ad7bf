// Deduplicating string block shared by every string slot of one table.
use std::collections::HashMap;

use bstr::ByteSlice;

#[derive(Clone, Debug)]
pub struct StringTable {
    buf: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            buf: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Returns the block offset of `value`, appending it on first sight.
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(offset) = self.offsets.get(value) {
            return *offset;
        }
        let offset = self.buf.len() as u32;
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
        self.offsets.insert(value.to_string(), offset);
        offset
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() <= 1
    }

    pub fn distinct(&self) -> usize {
        self.offsets.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a string slot: bytes from `offset` up to NUL or the end of the block.
pub fn read_string(block: &[u8], offset: i64) -> String {
    let Ok(start) = usize::try_from(offset) else {
        return String::new();
    };
    if start >= block.len() {
        return String::new();
    }
    let tail = &block[start..];
    let end = tail.find_byte(0).unwrap_or(tail.len());
    tail[..end].to_str_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::{StringTable, read_string};

    #[test]
    fn offset_zero_is_the_empty_string() {
        let mut table = StringTable::new();
        assert_eq!(table.as_bytes(), &[0]);
        assert_eq!(read_string(table.as_bytes(), 0), "");
        let offset = table.intern("Fireball");
        assert_eq!(offset, 1);
    }

    #[test]
    fn equal_strings_share_one_copy() {
        let mut table = StringTable::new();
        let first = table.intern("Frostbolt");
        let other = table.intern("Arcane");
        let again = table.intern("Frostbolt");
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(table.distinct(), 2);
        assert_eq!(table.as_bytes(), b"\0Frostbolt\0Arcane\0");
    }

    #[test]
    fn empty_value_is_interned_after_the_sentinel() {
        let mut table = StringTable::new();
        let offset = table.intern("");
        assert_eq!(offset, 1);
        assert_eq!(table.as_bytes(), &[0, 0]);
        assert_eq!(table.intern(""), 1);
    }

    #[test]
    fn multibyte_text_round_trips() {
        let mut table = StringTable::new();
        let offset = table.intern("Épée");
        assert_eq!(read_string(table.as_bytes(), i64::from(offset)), "Épée");
    }

    #[test]
    fn out_of_range_offsets_read_as_empty() {
        let block = b"\0abc\0";
        assert_eq!(read_string(block, -1), "");
        assert_eq!(read_string(block, 5), "");
        assert_eq!(read_string(block, 500), "");
    }

    #[test]
    fn unterminated_tail_reads_to_end_of_block() {
        let block = b"\0abc";
        assert_eq!(read_string(block, 1), "abc");
        assert_eq!(read_string(block, 2), "bc");
    }
}
