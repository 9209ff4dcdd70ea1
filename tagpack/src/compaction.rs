//! Tag compaction: qualified names replaced by small integer codes on the wire.

use bimap::BiHashMap;

/// Bidirectional qualified-name <-> code table.
///
/// Codes are assigned densely from zero in enumeration order; a name that
/// appears twice keeps its first code. Tables are immutable, activating a
/// new enumeration replaces the whole table.
#[derive(Debug, Clone, Default)]
pub struct CompactionTable {
    table: BiHashMap<String, u32>,
}

impl CompactionTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = BiHashMap::new();
        for name in names {
            let name = name.into();
            if table.contains_left(&name) {
                continue;
            }
            let code = table.len() as u32;
            table.insert(name, code);
        }
        Self { table }
    }

    pub fn code_of(&self, name: &str) -> Option<u32> {
        self.table.get_by_left(name).copied()
    }

    pub fn name_of(&self, code: u32) -> Option<&str> {
        self.table.get_by_right(&code).map(String::as_str)
    }

    /// Names in code order
    pub fn names(&self) -> Vec<&str> {
        (0..self.table.len() as u32)
            .filter_map(|code| self.name_of(code))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
