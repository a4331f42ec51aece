//! Decode command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use codecave_core::{Error, Platform, addr, mips};
use owo_colors::OwoColorize;

use crate::tools::{ToolPaths, resolver_for};

pub fn run(
    exe: &Path,
    platform: Platform,
    offset_text: &str,
    base: Option<&str>,
    tools: &ToolPaths,
) -> Result<()> {
    if platform.uses_ram_base() {
        anyhow::bail!("jal decoding is MIPS-only (PS1/PS2); PowerPC branches are not decoded");
    }

    let file_offset = addr::parse_address(offset_text)?;
    let data = fs::read(exe).with_context(|| format!("reading {}", exe.display()))?;

    let start = usize::try_from(file_offset).context("file offset out of range")?;
    let end = start.checked_add(4).context("file offset out of range")?;
    let opcode: [u8; 4] = data
        .get(start..end)
        .with_context(|| format!("file offset {offset_text} is past the end of the file"))?
        .try_into()?;

    let base = base.map(addr::parse_address).transpose()?;
    let resolver = resolver_for(platform, exe, tools, base);
    let address = resolver
        .memory_address_of(platform, file_offset)
        .context("cannot resolve addresses for this file")?;

    match mips::jal_target(opcode, address as u32) {
        Ok(target) => {
            println!(
                "jal at {} calls {}",
                addr::format_address(address),
                addr::format_address(target as u64)
            );
        }
        Err(Error::NotAJalInstruction(word)) => {
            println!(
                "{}",
                format!(
                    "Instruction {word:#010X} at {} is not a jal.",
                    addr::format_address(address)
                )
                .yellow()
            );
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
