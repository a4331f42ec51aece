use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::addr;

/// Declared role of a section inside the executable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SectionKind {
    Text,
    Data,
    Rodata,
    Bss,
    Unknown,
}

/// One contiguous load range with distinct on-disk and in-memory addresses.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub file_offset: u64,
    pub mem_start: u64,
    pub mem_end: u64,
    pub size: u64,
}

impl Section {
    /// Build a section. Zero-size sections are dropped here, so a table can
    /// never contain one.
    pub fn new(kind: SectionKind, file_offset: u64, mem_start: u64, size: u64) -> Option<Self> {
        if size == 0 {
            return None;
        }
        Some(Self {
            kind,
            file_offset,
            mem_start,
            mem_end: mem_start + size,
            size,
        })
    }

    /// Constant translation between memory and file address for this section.
    pub fn offset_diff(&self) -> i64 {
        self.mem_start as i64 - self.file_offset as i64
    }

    /// Whether the (already normalized) memory address falls in this section.
    pub fn contains(&self, address: u64) -> bool {
        self.mem_start <= address && address < self.mem_end
    }

    /// File offset of a memory address inside this section.
    pub fn file_offset_of(&self, address: u64) -> Option<u64> {
        let address = addr::normalize(address);
        if !self.contains(address) {
            return None;
        }
        Some((address as i64 - self.offset_diff()) as u64)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mem=0x{:X}-0x{:X} file=0x{:X} diff=0x{:X}",
            self.kind,
            self.mem_start,
            self.mem_end,
            self.file_offset,
            self.offset_diff()
        )
    }
}

/// Ordered, immutable list of sections for exactly one executable.
///
/// Built once per (file, platform) pair; plain owned data, safe to share
/// read-only across threads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionTable {
    sections: Vec<Section>,
}

impl SectionTable {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section containing the memory address, if any.
    pub fn section_for(&self, address: u64) -> Option<&Section> {
        let address = addr::normalize(address);
        self.sections.iter().find(|s| s.contains(address))
    }

    /// Translate a memory address to its file offset.
    ///
    /// `None` means no section contains the address. That is a normal miss,
    /// not an error; see [`SectionTable::nearest_section`] for diagnostics.
    pub fn file_offset_of(&self, address: u64) -> Option<u64> {
        self.section_for(address)?.file_offset_of(address)
    }

    /// Translate a file offset back to its memory address.
    pub fn memory_address_of(&self, file_offset: u64) -> Option<u64> {
        let section = self
            .sections
            .iter()
            .find(|s| s.file_offset <= file_offset && file_offset < s.file_offset + s.size)?;
        Some((file_offset as i64 + section.offset_diff()) as u64)
    }

    /// Closest section to a memory address that missed every section, with
    /// the signed distance in bytes (negative: address precedes the section).
    pub fn nearest_section(&self, address: u64) -> Option<(&Section, i64)> {
        let address = addr::normalize(address) as i64;
        self.sections
            .iter()
            .map(|s| {
                let distance = if address < s.mem_start as i64 {
                    address - s.mem_start as i64
                } else if address >= s.mem_end as i64 {
                    address - (s.mem_end as i64 - 1)
                } else {
                    0
                };
                (s, distance)
            })
            .min_by_key(|(_, distance)| distance.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> SectionTable {
        SectionTable::new(vec![
            Section::new(SectionKind::Text, 0x4A0, 0x34A0, 0x1000).unwrap(),
            Section::new(SectionKind::Data, 0x14A0, 0x10_0000, 0x2000).unwrap(),
        ])
    }

    #[test]
    fn test_zero_size_section_is_dropped() {
        assert!(Section::new(SectionKind::Text, 0, 0x1000, 0).is_none());
    }

    #[test]
    fn test_resolve_inside_section() {
        let table = sample_table();
        let section = &table.sections()[0];
        for address in [0x34A0, 0x34A4, 0x449F] {
            let file_offset = table.file_offset_of(address).unwrap();
            assert_eq!(file_offset as i64, address as i64 - section.offset_diff());
            assert!(file_offset >= section.file_offset);
            assert!(file_offset < section.file_offset + section.size);
        }
    }

    #[test]
    fn test_resolve_outside_every_section() {
        let table = sample_table();
        assert_eq!(table.file_offset_of(0x100), None);
        assert_eq!(table.file_offset_of(0x44A0), None);
        assert_eq!(table.file_offset_of(0x10_2000), None);
    }

    #[test]
    fn test_round_trip() {
        let table = sample_table();
        for address in [0x34A0, 0x3FFF, 0x10_0010] {
            let file_offset = table.file_offset_of(address).unwrap();
            assert_eq!(table.memory_address_of(file_offset), Some(address));
        }
    }

    #[test]
    fn test_ram_base_normalization_is_transparent() {
        let table = sample_table();
        assert_eq!(
            table.file_offset_of(0x8000_34A0),
            table.file_offset_of(0x34A0)
        );
        assert_eq!(
            table.file_offset_of(0x8010_0000),
            table.file_offset_of(0x10_0000)
        );
    }

    #[test]
    fn test_nearest_section_on_miss() {
        let table = sample_table();
        let (section, distance) = table.nearest_section(0x44B0).unwrap();
        assert_eq!(section.kind, SectionKind::Text);
        assert_eq!(distance, 0x11);

        let (section, distance) = table.nearest_section(0x3400).unwrap();
        assert_eq!(section.kind, SectionKind::Text);
        assert_eq!(distance, -0xA0);
    }
}
