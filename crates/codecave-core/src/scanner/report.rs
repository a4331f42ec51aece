use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::addr;
use crate::platform::Platform;
use crate::scanner::{PatternMatch, SymbolHit};
use crate::section::AddressResolver;

/// Serializable summary of a scan, for hand-off to the patch-planning layer.
///
/// Addresses are rendered in the storage convention: uppercase hex with no
/// `0x` prefix, console RAM addresses keeping their `80` prefix.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub platform: String,
    pub executable: String,
    pub resolution: String,
    pub matches: Vec<MatchSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<SymbolSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub name: String,
    pub description: String,
    pub file_offset: String,
    pub memory_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_function: Option<String>,
    pub asm_template: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolSummary {
    pub label: String,
    pub file_offset: String,
    pub memory_address: Option<String>,
}

impl ScanReport {
    pub fn new(
        platform: Platform,
        executable: &str,
        resolver: &AddressResolver,
        matches: &[PatternMatch],
    ) -> Self {
        let resolution = match resolver {
            AddressResolver::Sections(table) => format!("sections ({})", table.len()),
            AddressResolver::Scalar(base) => {
                format!("scalar base {}", addr::format_address(*base))
            }
            AddressResolver::Unavailable => "unavailable".to_string(),
        };

        Self {
            platform: platform.to_string(),
            executable: executable.to_string(),
            resolution,
            matches: matches
                .iter()
                .map(|m| MatchSummary {
                    name: m.pattern_name.clone(),
                    description: m.description.clone(),
                    file_offset: addr::format_address(m.file_offset),
                    memory_address: m.memory_address.map(addr::format_address),
                    call_target: m.call_target.map(addr::format_address),
                    original_function: m.original_function.clone(),
                    asm_template: m.asm_template.clone(),
                })
                .collect(),
            symbols: Vec::new(),
        }
    }

    pub fn with_symbols(mut self, symbols: &[SymbolHit]) -> Self {
        self.symbols = symbols
            .iter()
            .map(|s| SymbolSummary {
                label: s.label.clone(),
                file_offset: addr::format_address(s.file_offset),
                memory_address: s.memory_address.map(addr::format_address),
            })
            .collect();
        self
    }

    /// Save the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> PatternMatch {
        PatternMatch {
            pattern_name: "OSSleepThread".to_string(),
            description: "OSSleepThread (Every Frame Hook)".to_string(),
            file_offset: 0x4A0,
            memory_address: Some(0x8000_34A0),
            asm_template: "b ModMain\n".to_string(),
            original_function: None,
            call_target: None,
        }
    }

    #[test]
    fn test_report_uses_address_text_convention() {
        let report = ScanReport::new(
            Platform::Gamecube,
            "game.dol",
            &AddressResolver::Scalar(0x3000),
            &[sample_match()],
        );

        assert_eq!(report.matches[0].file_offset, "4A0");
        // RAM addresses keep their 80 prefix and carry no 0x.
        assert_eq!(
            report.matches[0].memory_address.as_deref(),
            Some("800034A0")
        );
    }

    #[test]
    fn test_report_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut unresolved = sample_match();
        unresolved.memory_address = None;

        let report = ScanReport::new(
            Platform::Gamecube,
            "game.dol",
            &AddressResolver::Unavailable,
            &[unresolved],
        );
        report.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["resolution"], "unavailable");
        // An unresolved address serializes as null, never as zero.
        assert!(value["matches"][0]["memory_address"].is_null());
    }
}
