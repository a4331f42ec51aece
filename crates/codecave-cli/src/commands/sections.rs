//! Sections command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use codecave_core::Platform;

use crate::tools::{ToolPaths, build_section_table};

pub fn run(exe: &Path, platform: Platform, tools: &ToolPaths) -> Result<()> {
    let table = build_section_table(platform, exe, tools)
        .with_context(|| format!("building section table for {}", exe.display()))?;

    println!("{} section(s) in {}:", table.len(), exe.display());
    for section in table.sections() {
        println!("  {section}");
    }

    Ok(())
}
