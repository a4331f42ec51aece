//! Resolve command implementation.

use std::path::Path;

use anyhow::Result;
use codecave_core::{Platform, addr};
use owo_colors::OwoColorize;

use crate::tools::{ToolPaths, resolver_for};

pub fn run(
    exe: &Path,
    platform: Platform,
    address_text: &str,
    base: Option<&str>,
    tools: &ToolPaths,
) -> Result<()> {
    let address = addr::parse_address(address_text)?;
    let base = base.map(addr::parse_address).transpose()?;
    let resolver = resolver_for(platform, exe, tools, base);

    match resolver.file_offset_of(address) {
        Some(file_offset) => {
            println!("Memory address: {}", addr::format_address(address));
            println!("File offset:    {}", addr::format_address(file_offset));
        }
        None => {
            println!("{}", "Address is not inside any section.".yellow());
            if let Some((section, distance)) = resolver
                .table()
                .and_then(|table| table.nearest_section(address))
            {
                let direction = if distance < 0 { "before" } else { "past" };
                println!(
                    "Nearest: {section} ({:#X} bytes {direction})",
                    distance.abs()
                );
            }
        }
    }

    Ok(())
}
