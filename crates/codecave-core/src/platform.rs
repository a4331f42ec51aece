//! Target console platforms and their address conventions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::addr;

/// Console platform of the executable being worked on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Platform {
    #[strum(to_string = "PS1", serialize = "psx", ascii_case_insensitive)]
    #[serde(rename = "PS1")]
    Ps1,
    #[strum(to_string = "PS2", ascii_case_insensitive)]
    #[serde(rename = "PS2")]
    Ps2,
    #[strum(to_string = "Gamecube", serialize = "gc", ascii_case_insensitive)]
    Gamecube,
    #[strum(ascii_case_insensitive)]
    Wii,
}

impl Platform {
    /// Scalar base offset used when no section table could be built.
    ///
    /// These are the historical defaults observed across real game builds;
    /// they are only a last resort and a correct section table always wins.
    pub fn fallback_base(self) -> u64 {
        match self {
            Platform::Ps1 => 0x8000_F800,
            Platform::Ps2 => 0x10_0000,
            Platform::Gamecube | Platform::Wii => 0x3000,
        }
    }

    /// Convert a file offset plus a scalar base into an in-memory address.
    ///
    /// GameCube and Wii addresses live under the console RAM base; PS1 and
    /// PS2 bases already carry whatever prefix the platform uses.
    pub fn memory_address(self, base: u64, file_offset: u64) -> u64 {
        match self {
            Platform::Ps1 | Platform::Ps2 => base + file_offset,
            Platform::Gamecube | Platform::Wii => addr::RAM_BASE + base + file_offset,
        }
    }

    /// Whether in-memory addresses on this platform are presented under the
    /// `0x80000000` RAM base.
    pub fn uses_ram_base(self) -> bool {
        matches!(self, Platform::Gamecube | Platform::Wii)
    }
}
