use crate::addr;
use crate::platform::Platform;
use crate::section::SectionTable;

/// Memory ⇄ file address translation strategy for one executable.
///
/// The section table is the accurate path. The scalar arm is the legacy
/// single-offset fallback (`file_offset = normalized_address - base`) used
/// when no table could be built; it stays a first-class variant rather than
/// being silently folded into the table path. `Unavailable` resolves
/// nothing: callers get `None` and must report "file-offset only", never a
/// made-up zero address.
#[derive(Debug, Clone)]
pub enum AddressResolver {
    Sections(SectionTable),
    Scalar(u64),
    Unavailable,
}

impl AddressResolver {
    /// Translate a memory address to a file offset.
    pub fn file_offset_of(&self, address: u64) -> Option<u64> {
        match self {
            AddressResolver::Sections(table) => table.file_offset_of(address),
            AddressResolver::Scalar(base) => addr::normalize(address).checked_sub(*base),
            AddressResolver::Unavailable => None,
        }
    }

    /// Translate a file offset to the in-memory address a hook would use.
    ///
    /// GameCube and Wii tables are built from RAM-stripped addresses, so the
    /// RAM base is put back on for presentation; PS1/PS2 addresses come out
    /// in whatever space the table or scalar base defines.
    pub fn memory_address_of(&self, platform: Platform, file_offset: u64) -> Option<u64> {
        match self {
            AddressResolver::Sections(table) => {
                let mem = table.memory_address_of(file_offset)?;
                if platform.uses_ram_base() {
                    Some(addr::RAM_BASE + mem)
                } else {
                    Some(mem)
                }
            }
            AddressResolver::Scalar(base) => Some(platform.memory_address(*base, file_offset)),
            AddressResolver::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, AddressResolver::Unavailable)
    }

    pub fn table(&self) -> Option<&SectionTable> {
        match self {
            AddressResolver::Sections(table) => Some(table),
            _ => None,
        }
    }
}
