//! Symbols command implementation.
//!
//! Output lines use the symbols-file format consumed by the mod linker:
//!
//! ```text
//! OSReport = 0x80123456;
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use codecave_core::{HookScanner, Platform, addr, load_symbol_patterns, osreport_pattern};
use owo_colors::OwoColorize;

use crate::tools::{ToolPaths, resolver_for};

pub fn run(
    exe: &Path,
    platform: Platform,
    patterns_path: Option<&Path>,
    base: Option<&str>,
    tools: &ToolPaths,
) -> Result<()> {
    let data = fs::read(exe).with_context(|| format!("reading {}", exe.display()))?;
    let base = base.map(addr::parse_address).transpose()?;
    let resolver = resolver_for(platform, exe, tools, base);

    let mut patterns = Vec::new();
    if let Some(osreport) = osreport_pattern(platform) {
        patterns.push(osreport.clone());
    }
    if let Some(path) = patterns_path {
        patterns.extend(
            load_symbol_patterns(path)
                .with_context(|| format!("loading symbol patterns {}", path.display()))?,
        );
    }

    if patterns.is_empty() {
        println!(
            "{}",
            "No symbol patterns available for this platform; pass --patterns.".yellow()
        );
        return Ok(());
    }

    let scanner = HookScanner::new(platform);
    let hits = scanner.scan_symbols(&data, &patterns, &resolver);

    if hits.is_empty() {
        println!("{}", "No symbols found.".yellow());
        return Ok(());
    }

    for hit in &hits {
        match hit.memory_address {
            Some(address) => println!("{} = 0x{:X};", hit.label, address),
            None => println!(
                "# {} at file offset 0x{:X} (address unresolved)",
                hit.label, hit.file_offset
            ),
        }
    }

    Ok(())
}
