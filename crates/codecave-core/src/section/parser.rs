//! Section-table construction from raw tool output.
//!
//! The text handed in here comes from an out-of-process tool runner
//! (`doltool -i` for GameCube/Wii, `ee-objdump -x` for PS2); this module
//! never spawns anything itself. PS1 executables need no tool at all.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::section::{Section, SectionKind, SectionTable};

/// Fixed header size of a PS1 executable.
pub const PS1_HEADER_SIZE: u64 = 0x800;

/// Parse `doltool -i` output into a section table.
///
/// Section lines look like:
///
/// ```text
/// Text Section  1:  Offset=000004A0  Address=800034A0  Size=003B0B00
/// ```
///
/// The `80` RAM prefix is stripped from the address field. Malformed
/// candidate lines are skipped with a warning, never fatal.
pub fn parse_dol_sections(output: &str) -> Result<SectionTable> {
    let mut sections = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if !line.contains("Section") || !line.contains(':') {
            continue;
        }

        let Some((kind, file_offset, mem_start, size)) = parse_dol_line(line) else {
            warn!("Skipping unparseable doltool line: {line}");
            continue;
        };

        match Section::new(kind, file_offset, mem_start, size) {
            Some(section) => sections.push(section),
            None => debug!("Dropping zero-size section: {line}"),
        }
    }

    if sections.is_empty() {
        return Err(Error::EmptySectionTable);
    }

    debug!("Parsed {} DOL sections", sections.len());
    Ok(SectionTable::new(sections))
}

fn parse_dol_line(line: &str) -> Option<(SectionKind, u64, u64, u64)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let kind = parts
        .first()?
        .parse::<SectionKind>()
        .unwrap_or(SectionKind::Unknown);

    let mut file_offset = None;
    let mut mem_start = None;
    let mut size = None;

    for part in &parts {
        if let Some(hex) = part.strip_prefix("Offset=") {
            file_offset = u64::from_str_radix(hex, 16).ok();
        } else if let Some(hex) = part.strip_prefix("Address=") {
            // Console RAM convention: the address field carries a leading 80
            // byte which is not part of the load address.
            let hex = hex.strip_prefix("80").or_else(|| hex.strip_prefix("0x80")).unwrap_or(hex);
            mem_start = u64::from_str_radix(hex, 16).ok();
        } else if let Some(hex) = part.strip_prefix("Size=") {
            size = u64::from_str_radix(hex, 16).ok();
        }
    }

    Some((kind, file_offset?, mem_start?, size?))
}

/// Parse `ee-objdump -x` output into a section table.
///
/// Only the tabular region after the `Idx Name` header is read. Rows come in
/// two shapes, both of which must be supported:
///
/// ```text
/// Idx Name          Size      VMA       LMA       File off  Algn
///   0 .text         001ac628  00100000  00100000  00001000  2**6
///   0 .text         001ac628  00100000  00001000  2**6
/// ```
pub fn parse_elf_sections(output: &str) -> Result<SectionTable> {
    let Some((_, table_region)) = output.split_once("Idx Name") else {
        return Err(Error::SectionParse(
            "missing `Idx Name` section header".to_string(),
        ));
    };

    let mut sections = Vec::new();

    for line in table_region.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.starts_with("Idx") {
            continue;
        }

        let mut parts: Vec<&str> = line.split_whitespace().collect();

        // A row can lack the name column entirely; the first data token is
        // then numeric where a name should be.
        if parts.len() > 1 && parts[1].chars().next().is_some_and(|c| c.is_ascii_digit()) {
            parts.insert(1, "(unnamed)");
        }

        if parts.len() < 6 {
            continue;
        }

        let name = parts[1];
        let Ok(size) = u64::from_str_radix(parts[2], 16) else {
            continue;
        };
        let Ok(vma) = u64::from_str_radix(parts[3], 16) else {
            continue;
        };

        // With seven columns the fifth is the LMA and the sixth the file
        // offset; with six the file offset comes right after the VMA.
        let file_offset_token = if parts.len() >= 7 { parts[5] } else { parts[4] };
        let Ok(file_offset) = u64::from_str_radix(file_offset_token, 16) else {
            continue;
        };

        match Section::new(classify_section_name(name), file_offset, vma, size) {
            Some(section) => sections.push(section),
            None => debug!("Dropping zero-size section: {name}"),
        }
    }

    if sections.is_empty() {
        return Err(Error::EmptySectionTable);
    }

    debug!("Parsed {} ELF sections", sections.len());
    Ok(SectionTable::new(sections))
}

fn classify_section_name(name: &str) -> SectionKind {
    if name.contains(".text") {
        SectionKind::Text
    } else if name.contains(".rodata") {
        SectionKind::Rodata
    } else if name.contains(".data") {
        SectionKind::Data
    } else if name.contains(".bss") {
        SectionKind::Bss
    } else {
        SectionKind::Unknown
    }
}

/// Build the fixed PS1 section table.
///
/// PS1 executables have a fixed 0x800-byte header and a single load range:
/// exactly one section with `file_offset == mem_start == 0x800`.
pub fn ps1_sections(file_size: u64) -> Result<SectionTable> {
    if file_size <= PS1_HEADER_SIZE {
        return Err(Error::EmptySectionTable);
    }

    let size = file_size - PS1_HEADER_SIZE;
    let section = Section::new(SectionKind::Text, PS1_HEADER_SIZE, PS1_HEADER_SIZE, size)
        .ok_or(Error::EmptySectionTable)?;
    Ok(SectionTable::new(vec![section]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOLTOOL_OUTPUT: &str = "\
DOL file: game.dol
Text Section  0:  Offset=00000100  Address=80003100  Size=00002400
Text Section  1:  Offset=000004A0  Address=800034A0  Size=003B0B00
Data Section  0:  Offset=003B0FA0  Address=803B4FA0  Size=00052260
Data Section  1:  Offset=00403200  Address=80407200  Size=00000000
Text Section  2:  Offset=garbage   Address=80003100  Size=00002400
bss: Address=80460000 Size=00080000
Entry point: 800056A0
";

    #[test]
    fn test_parse_dol_sections() {
        let table = parse_dol_sections(DOLTOOL_OUTPUT).unwrap();
        // Zero-size and malformed rows are gone.
        assert_eq!(table.len(), 3);

        let first = &table.sections()[1];
        assert_eq!(first.kind, SectionKind::Text);
        assert_eq!(first.file_offset, 0x4A0);
        // The leading 80 byte is stripped from the address field.
        assert_eq!(first.mem_start, 0x34A0);
        assert_eq!(first.size, 0x3B0B00);
        assert_eq!(first.offset_diff(), 0x3000);
    }

    #[test]
    fn test_parse_dol_sections_empty() {
        assert!(matches!(
            parse_dol_sections("no sections here\n"),
            Err(Error::EmptySectionTable)
        ));
    }

    const OBJDUMP_SIX_COLUMN: &str = "\
game.elf:     file format elf32-littlemips

Sections:
Idx Name          Size      VMA       File off  Algn
  0 .text         001ac628  00100000  00001000  2**6
                  CONTENTS, ALLOC, LOAD, READONLY, CODE
  1 .rodata       00012340  002ac640  001ad640  2**4
  2 .data         00045000  002bf000  001bfa00  2**7
  3 .bss          00100000  00304000  00204a00  2**7
  4 .comment      00000000  00000000  00204a00  2**0
";

    const OBJDUMP_SEVEN_COLUMN: &str = "\
Sections:
Idx Name          Size      VMA       LMA       File off  Algn
  0 .text         001ac628  00100000  00100000  00001000  2**6
  1 00012340      002ac640  002ac640  001ad640  2**4
";

    #[test]
    fn test_parse_elf_sections_without_lma() {
        let table = parse_elf_sections(OBJDUMP_SIX_COLUMN).unwrap();
        // The zero-size .comment row is dropped.
        assert_eq!(table.len(), 4);

        let text = &table.sections()[0];
        assert_eq!(text.kind, SectionKind::Text);
        assert_eq!(text.mem_start, 0x10_0000);
        assert_eq!(text.file_offset, 0x1000);
        assert_eq!(text.offset_diff(), 0xFF000);

        assert_eq!(table.sections()[1].kind, SectionKind::Rodata);
        assert_eq!(table.sections()[2].kind, SectionKind::Data);
        assert_eq!(table.sections()[3].kind, SectionKind::Bss);
    }

    #[test]
    fn test_parse_elf_sections_with_lma_and_unnamed_row() {
        let table = parse_elf_sections(OBJDUMP_SEVEN_COLUMN).unwrap();
        assert_eq!(table.len(), 2);

        let text = &table.sections()[0];
        assert_eq!(text.file_offset, 0x1000);
        assert_eq!(text.mem_start, 0x10_0000);

        // The unnamed row still parses, with an unknown kind.
        let unnamed = &table.sections()[1];
        assert_eq!(unnamed.kind, SectionKind::Unknown);
        assert_eq!(unnamed.size, 0x12340);
        assert_eq!(unnamed.file_offset, 0x1AD640);
    }

    #[test]
    fn test_parse_elf_sections_missing_header() {
        assert!(matches!(
            parse_elf_sections("not objdump output"),
            Err(Error::SectionParse(_))
        ));
    }

    #[test]
    fn test_ps1_fixed_rule() {
        let table = ps1_sections(0x4_0800).unwrap();
        assert_eq!(table.len(), 1);

        let section = &table.sections()[0];
        assert_eq!(section.file_offset, 0x800);
        assert_eq!(section.mem_start, 0x800);
        assert_eq!(section.mem_end, 0x4_0800);
        assert_eq!(section.offset_diff(), 0);
    }

    #[test]
    fn test_ps1_header_only_file() {
        assert!(matches!(
            ps1_sections(0x800),
            Err(Error::EmptySectionTable)
        ));
    }
}
