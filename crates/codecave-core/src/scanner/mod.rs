//! Hook-site discovery over raw executable bytes.
//!
//! The scanner runs a platform's pattern catalog over an executable image
//! that a caller has already loaded, and converts each match's file offset
//! into a memory address through an [`AddressResolver`]. It never touches
//! the filesystem and never aborts a sweep because one pattern failed.

mod report;
mod symbols;

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::mips;
use crate::pattern::{PatternCatalog, builtin_catalog};
use crate::platform::Platform;
use crate::section::AddressResolver;

pub use report::*;
pub use symbols::*;

/// Labels that never mark a useful hook or symbol: reserved slots, catch-all
/// stubs and other uninformative names, suppressed by substring.
pub const DEFAULT_SKIP_LABELS: &[&str] = &["jump_to_00000000", "RFU", "possiblefuncstart"];

/// One discovered hookable site.
#[derive(Debug, Clone, Serialize)]
pub struct PatternMatch {
    pub pattern_name: String,
    pub description: String,
    /// File offset of the hookable instruction, hook offset already applied.
    pub file_offset: u64,
    /// `None` when address resolution is unavailable; the match is then
    /// file-offset only. Never a made-up zero.
    pub memory_address: Option<u64>,
    pub asm_template: String,
    pub original_function: Option<String>,
    /// Callee displaced by the hook, recovered when the hook site holds a
    /// decodable `jal`.
    pub call_target: Option<u64>,
}

/// Sweeps a platform's pattern catalog over executable bytes.
pub struct HookScanner {
    platform: Platform,
    catalog: PatternCatalog,
    skip_labels: Vec<String>,
}

impl HookScanner {
    /// Scanner with the compiled-in catalog for the platform.
    pub fn new(platform: Platform) -> Self {
        Self::with_catalog(platform, builtin_catalog(platform).clone())
    }

    /// Scanner over a caller-supplied catalog (for example one loaded from a
    /// catalog file).
    pub fn with_catalog(platform: Platform, catalog: PatternCatalog) -> Self {
        Self {
            platform,
            catalog,
            skip_labels: DEFAULT_SKIP_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the noise-label substrings.
    pub fn with_skip_labels(mut self, labels: Vec<String>) -> Self {
        self.skip_labels = labels;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    fn is_noise(&self, label: &str) -> bool {
        self.skip_labels.iter().any(|skip| label.contains(skip))
    }

    /// Run every catalog pattern over `data` and return the hook candidates.
    ///
    /// Matches are deduplicated by pattern name, first occurrence kept. The
    /// sweep is sequential in catalog order; were it ever parallelized,
    /// per-name ties must resolve to the lowest file offset to keep the same
    /// results.
    pub fn scan(&self, data: &[u8], resolver: &AddressResolver) -> Vec<PatternMatch> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut matches = Vec::new();

        debug!(
            "Scanning {} bytes against {} {} pattern(s)",
            data.len(),
            self.catalog.len(),
            self.platform
        );

        for pattern in self.catalog.patterns() {
            if self.is_noise(&pattern.name) {
                debug!("Skipping noise pattern: {}", pattern.name);
                continue;
            }

            let Some(start) = pattern.matcher().search(data) else {
                debug!("No match for {}", pattern.name);
                continue;
            };

            if seen.contains(pattern.name.as_str()) {
                continue;
            }

            // The hook offset is signed: a negative value points at an
            // instruction before the anchor, e.g. a prologue located from a
            // distinctive tail.
            let hook_file_offset = start as i64 + pattern.hook_offset;
            let Ok(hook_file_offset) = u64::try_from(hook_file_offset) else {
                warn!(
                    "Hook point for {} precedes the start of the buffer (match at 0x{:X}, offset {:#X})",
                    pattern.name, start, pattern.hook_offset
                );
                continue;
            };

            seen.insert(pattern.name.as_str());

            let memory_address = resolver.memory_address_of(self.platform, hook_file_offset);
            let call_target = if pattern.original_function.is_some() {
                self.decode_call_target(data, hook_file_offset, memory_address)
            } else {
                None
            };

            match memory_address {
                Some(address) => info!(
                    "Found {} at file offset 0x{:X}, memory 0x{:X}",
                    pattern.name, hook_file_offset, address
                ),
                None => info!(
                    "Found {} at file offset 0x{:X} (address unresolved)",
                    pattern.name, hook_file_offset
                ),
            }

            matches.push(PatternMatch {
                pattern_name: pattern.name.clone(),
                description: pattern.description.clone(),
                file_offset: hook_file_offset,
                memory_address,
                asm_template: pattern.asm_template.clone(),
                original_function: pattern.original_function.clone(),
                call_target,
            });
        }

        if matches.is_empty() {
            info!("No patterns found in executable");
        }

        matches
    }

    /// Recover the callee a hook displaces when the hook site is a `jal`.
    /// Decode failure is the normal case for non-call sites and is silent.
    fn decode_call_target(
        &self,
        data: &[u8],
        file_offset: u64,
        memory_address: Option<u64>,
    ) -> Option<u64> {
        let address = memory_address?;
        let start = usize::try_from(file_offset).ok()?;
        let end = start.checked_add(4)?;
        let opcode: [u8; 4] = data.get(start..end)?.try_into().ok()?;
        match mips::jal_target(opcode, address as u32) {
            Ok(target) => Some(target as u64),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Pattern, parse_pattern};

    fn test_pattern(name: &str, hook_offset: i64, text: &str) -> Pattern {
        Pattern::new(name, format!("{name} description"), hook_offset, "", parse_pattern(text).unwrap())
            .unwrap()
    }

    fn scanner_with(patterns: Vec<Pattern>) -> HookScanner {
        HookScanner::with_catalog(Platform::Ps2, PatternCatalog::new(Platform::Ps2, patterns))
    }

    #[test]
    fn test_scan_applies_hook_offset_and_address_rule() {
        let scanner = scanner_with(vec![test_pattern("hookA", 0x4, "AA BB ?? ?? CC")]);
        let mut data = vec![0u8; 0x40];
        data[0x10] = 0xAA;
        data[0x11] = 0xBB;
        data[0x14] = 0xCC;

        let matches = scanner.scan(&data, &AddressResolver::Scalar(0xFF000));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file_offset, 0x14);
        assert_eq!(matches[0].memory_address, Some(0xFF014));
    }

    #[test]
    fn test_scan_with_negative_hook_offset() {
        let scanner = scanner_with(vec![test_pattern("tailA", -0x8, "AA BB CC DD")]);
        let mut data = vec![0u8; 0x40];
        data[0x20..0x24].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let matches = scanner.scan(&data, &AddressResolver::Unavailable);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file_offset, 0x18);
        assert_eq!(matches[0].memory_address, None);
    }

    #[test]
    fn test_scan_drops_hook_before_buffer_start() {
        let scanner = scanner_with(vec![test_pattern("early", -0x10, "AA BB CC DD")]);
        let mut data = vec![0u8; 0x40];
        data[..4].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        assert!(scanner.scan(&data, &AddressResolver::Unavailable).is_empty());
    }

    #[test]
    fn test_scan_suppresses_noise_labels() {
        let scanner = scanner_with(vec![
            test_pattern("RFU003", 0, "AA BB"),
            test_pattern("realHook", 0, "AA BB"),
        ]);
        let data = [0xAA, 0xBB];

        let matches = scanner.scan(&data, &AddressResolver::Unavailable);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pattern_name, "realHook");
    }

    #[test]
    fn test_scan_dedups_by_name_keeping_first() {
        let scanner = scanner_with(vec![
            test_pattern("dup", 0, "AA BB"),
            test_pattern("dup", 0, "CC DD"),
        ]);
        let data = [0xCC, 0xDD, 0xAA, 0xBB];

        let matches = scanner.scan(&data, &AddressResolver::Unavailable);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].file_offset, 2);
    }

    #[test]
    fn test_scan_continues_after_unmatched_pattern() {
        let scanner = scanner_with(vec![
            test_pattern("absent", 0, "11 22 33"),
            test_pattern("present", 0, "AA BB"),
        ]);
        let data = [0xAA, 0xBB];

        let matches = scanner.scan(&data, &AddressResolver::Unavailable);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pattern_name, "present");
    }

    #[test]
    fn test_scan_recovers_jal_call_target() {
        let pattern = test_pattern("callsite", 0x4, "AA BB CC DD").with_original_function("someFunc");
        let scanner = scanner_with(vec![pattern]);

        // jal 0x00100400 encoded at the hook site.
        let word: u32 = (0b000011 << 26) | (0x0010_0400 >> 2);
        let mut data = vec![0u8; 0x10];
        data[..4].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        data[4..8].copy_from_slice(&word.to_le_bytes());

        let matches = scanner.scan(&data, &AddressResolver::Scalar(0xFFFFC));
        assert_eq!(matches.len(), 1);
        // Instruction address is 0xFFFFC + 4 = 0x100000.
        assert_eq!(matches[0].memory_address, Some(0x10_0000));
        assert_eq!(matches[0].call_target, Some(0x10_0400));
    }

    #[test]
    fn test_scan_skips_call_target_on_non_jal() {
        let pattern = test_pattern("callsite", 0x4, "AA BB CC DD").with_original_function("someFunc");
        let scanner = scanner_with(vec![pattern]);

        let mut data = vec![0u8; 0x10];
        data[..4].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let matches = scanner.scan(&data, &AddressResolver::Scalar(0));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].call_target, None);
    }
}
