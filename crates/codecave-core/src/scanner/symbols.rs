//! Library-symbol sweeps: plain byte fingerprints of OS/SDK functions.
//!
//! Unlike hook patterns these carry no hook offset; a hit just names a
//! function at an address so it can be written into a symbols file and
//! called from injected code.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pattern::{PatternSegment, parse_pattern};
use crate::platform::Platform;
use crate::scanner::HookScanner;
use crate::section::AddressResolver;

/// A labeled literal byte fingerprint.
#[derive(Debug, Clone)]
pub struct SymbolPattern {
    pub label: String,
    pub bytes: Vec<u8>,
}

impl SymbolPattern {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes,
        }
    }

    /// Build from the textual pattern form. Symbol fingerprints are fully
    /// literal; wildcards are rejected.
    pub fn from_text(label: impl Into<String>, text: &str) -> Result<Self> {
        let segments = parse_pattern(text)?;
        let [PatternSegment::Bytes(bytes)] = segments.as_slice() else {
            return Err(Error::InvalidPattern(
                "symbol patterns cannot contain wildcards".to_string(),
            ));
        };
        Ok(Self::new(label, bytes.clone()))
    }
}

/// One symbol found in an executable.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolHit {
    pub label: String,
    pub file_offset: u64,
    pub memory_address: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymbolPatternEntry {
    label: String,
    pattern: String,
}

/// Load symbol patterns from a JSON file of `{label, pattern}` entries.
pub fn load_symbol_patterns<P: AsRef<Path>>(path: P) -> Result<Vec<SymbolPattern>> {
    let content = fs::read_to_string(&path)?;
    let entries: Vec<SymbolPatternEntry> = serde_json::from_str(&content)?;
    entries
        .iter()
        .map(|e| SymbolPattern::from_text(&e.label, &e.pattern))
        .collect()
}

static OSREPORT_GAMECUBE: LazyLock<SymbolPattern> = LazyLock::new(|| {
    SymbolPattern::new(
        "OSReport",
        vec![
            0x7C, 0x08, 0x02, 0xA6, 0x90, 0x01, 0x00, 0x04, 0x94, 0x21, 0xFF, 0x88, 0x40, 0x86,
            0x00, 0x24, 0xD8, 0x21, 0x00, 0x28, 0xD8, 0x41, 0x00, 0x30,
        ],
    )
});

static OSREPORT_WII: LazyLock<SymbolPattern> = LazyLock::new(|| {
    SymbolPattern::new(
        "OSReport",
        vec![
            0x94, 0x21, 0xFF, 0x80, 0x7C, 0x08, 0x02, 0xA6, 0x90, 0x01, 0x00, 0x84, 0x93, 0xE1,
            0x00, 0x7C, 0x40, 0x86, 0x00, 0x24, 0xD8, 0x21, 0x00, 0x28, 0xD8, 0x41, 0x00, 0x30,
            0xD8, 0x61, 0x00, 0x38, 0xD8, 0x81, 0x00, 0x40, 0xD8, 0xA1, 0x00, 0x48, 0xD8, 0xC1,
            0x00, 0x50, 0xD8, 0xE1, 0x00, 0x58, 0xD9, 0x01, 0x00, 0x60,
        ],
    )
});

/// Fingerprint of the platform's debug-print function, where one is known.
/// Finding it lets injected code log to the emulator console.
pub fn osreport_pattern(platform: Platform) -> Option<&'static SymbolPattern> {
    match platform {
        Platform::Gamecube => Some(&OSREPORT_GAMECUBE),
        Platform::Wii => Some(&OSREPORT_WII),
        Platform::Ps1 | Platform::Ps2 => None,
    }
}

impl HookScanner {
    /// Sweep `data` for labeled symbol fingerprints.
    ///
    /// Hits are deduplicated by label, first occurrence kept; noise labels
    /// are suppressed with the same substring list as the hook scan.
    pub fn scan_symbols(
        &self,
        data: &[u8],
        patterns: &[SymbolPattern],
        resolver: &AddressResolver,
    ) -> Vec<SymbolHit> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut hits = Vec::new();

        for pattern in patterns {
            if self.is_noise(&pattern.label) {
                debug!("Skipping noise symbol: {}", pattern.label);
                continue;
            }
            if pattern.bytes.is_empty() || seen.contains(pattern.label.as_str()) {
                continue;
            }

            let Some(at) = memchr::memmem::find(data, &pattern.bytes) else {
                continue;
            };

            seen.insert(pattern.label.as_str());
            let file_offset = at as u64;
            hits.push(SymbolHit {
                label: pattern.label.clone(),
                file_offset,
                memory_address: resolver.memory_address_of(self.platform(), file_offset),
            });
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternCatalog;

    fn scanner(platform: Platform) -> HookScanner {
        HookScanner::with_catalog(platform, PatternCatalog::new(platform, Vec::new()))
    }

    #[test]
    fn test_symbol_pattern_rejects_wildcards() {
        assert!(SymbolPattern::from_text("strlen", "AA BB ?? CC").is_err());
        assert!(SymbolPattern::from_text("strlen", "AA BB CC").is_ok());
    }

    #[test]
    fn test_scan_symbols_dedups_by_label() {
        let patterns = vec![
            SymbolPattern::new("strlen", vec![0xAA, 0xBB]),
            SymbolPattern::new("strlen", vec![0xCC, 0xDD]),
            SymbolPattern::new("memcpy", vec![0xCC, 0xDD]),
        ];
        let data = [0xCC, 0xDD, 0xAA, 0xBB];

        let hits = scanner(Platform::Ps1).scan_symbols(
            &data,
            &patterns,
            &AddressResolver::Scalar(0x8000_F800),
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].label, "strlen");
        assert_eq!(hits[0].file_offset, 2);
        assert_eq!(hits[0].memory_address, Some(0x8000_F802));
        assert_eq!(hits[1].label, "memcpy");
        assert_eq!(hits[1].file_offset, 0);
    }

    #[test]
    fn test_scan_symbols_skips_noise_labels() {
        let patterns = vec![
            SymbolPattern::new("RFU000", vec![0xAA]),
            SymbolPattern::new("jump_to_00000000", vec![0xAA]),
            SymbolPattern::new("printf", vec![0xAA]),
        ];
        let data = [0xAA];

        let hits = scanner(Platform::Ps2).scan_symbols(&data, &patterns, &AddressResolver::Unavailable);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "printf");
        assert_eq!(hits[0].memory_address, None);
    }

    #[test]
    fn test_osreport_patterns_exist_for_gamecube_and_wii() {
        assert!(osreport_pattern(Platform::Gamecube).is_some());
        assert!(osreport_pattern(Platform::Wii).is_some());
        assert!(osreport_pattern(Platform::Ps1).is_none());

        let gc = osreport_pattern(Platform::Gamecube).unwrap();
        let wii = osreport_pattern(Platform::Wii).unwrap();
        assert_eq!(gc.bytes.len(), 24);
        assert_eq!(wii.bytes.len(), 52);
    }
}
