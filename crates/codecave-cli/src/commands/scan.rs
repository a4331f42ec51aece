//! Scan command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use codecave_core::{HookScanner, Platform, ScanReport, addr, load_catalog};
use owo_colors::OwoColorize;

use crate::tools::{ToolPaths, resolver_for};

pub fn run(
    exe: &Path,
    platform: Platform,
    base: Option<&str>,
    catalog: Option<&Path>,
    json: Option<&Path>,
    tools: &ToolPaths,
) -> Result<()> {
    let data = fs::read(exe).with_context(|| format!("reading {}", exe.display()))?;
    let base = base.map(addr::parse_address).transpose()?;
    let resolver = resolver_for(platform, exe, tools, base);

    let scanner = match catalog {
        Some(path) => {
            let catalog = load_catalog(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            HookScanner::with_catalog(platform, catalog)
        }
        None => HookScanner::new(platform),
    };

    println!(
        "Scanning {} ({} bytes, {} pattern(s))...",
        exe.display(),
        data.len(),
        scanner.catalog().len()
    );

    let matches = scanner.scan(&data, &resolver);

    if matches.is_empty() {
        println!("{}", "No hook patterns found.".yellow());
    }
    for m in &matches {
        println!("{} {}", "Found".green().bold(), m.description);
        println!("  file offset:    {}", addr::format_address(m.file_offset));
        match m.memory_address {
            Some(address) => {
                println!("  memory address: {}", addr::format_address(address));
            }
            None => {
                println!(
                    "  memory address: {}",
                    "(unresolved, file-offset only)".yellow()
                );
            }
        }
        if let (Some(function), Some(target)) = (&m.original_function, m.call_target) {
            println!(
                "  displaced call: _{function} = 0x{};",
                addr::format_address(target)
            );
        }
    }

    if let Some(path) = json {
        let executable = exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| exe.display().to_string());
        ScanReport::new(platform, &executable, &resolver, &matches)
            .save(path)
            .with_context(|| format!("writing report {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
