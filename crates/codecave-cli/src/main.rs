use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use codecave_core::Platform;
use tracing_subscriber::EnvFilter;

mod commands;
mod tools;

use tools::ToolPaths;

#[derive(Parser)]
#[command(name = "codecave")]
#[command(about = "Hook discovery and address resolution for console-game executables")]
struct Args {
    /// doltool binary used for GameCube/Wii section listings
    #[arg(long, env = "CODECAVE_DOLTOOL", default_value = "doltool", global = true)]
    doltool: String,

    /// ee-objdump binary used for PS2 section listings
    #[arg(long, env = "CODECAVE_OBJDUMP", default_value = "ee-objdump", global = true)]
    objdump: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan an executable for hookable call sites
    Scan {
        exe: PathBuf,

        #[arg(short, long)]
        platform: Platform,

        /// Skip section parsing and resolve through this scalar base offset
        #[arg(long)]
        base: Option<String>,

        /// Load a pattern catalog file instead of the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write a JSON scan report to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print the executable's section table
    Sections {
        exe: PathBuf,

        #[arg(short, long)]
        platform: Platform,
    },

    /// Resolve a memory address to its file offset
    Resolve {
        exe: PathBuf,

        /// Memory address, hex (a leading 0x or 80 RAM prefix is fine)
        address: String,

        #[arg(short, long)]
        platform: Platform,

        /// Skip section parsing and resolve through this scalar base offset
        #[arg(long)]
        base: Option<String>,
    },

    /// Decode the MIPS jal at a file offset and print its call target
    /// (PS1/PS2 only; PowerPC branches are not decoded)
    Decode {
        exe: PathBuf,

        /// File offset of the instruction, hex
        offset: String,

        #[arg(short, long)]
        platform: Platform,

        /// Skip section parsing and resolve through this scalar base offset
        #[arg(long)]
        base: Option<String>,
    },

    /// Sweep for known library symbols and print symbols-file lines
    Symbols {
        exe: PathBuf,

        #[arg(short, long)]
        platform: Platform,

        /// JSON file of additional {label, pattern} symbol fingerprints
        #[arg(long)]
        patterns: Option<PathBuf>,

        /// Skip section parsing and resolve through this scalar base offset
        #[arg(long)]
        base: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("codecave=info".parse()?)
                .add_directive("codecave_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let tools = ToolPaths {
        doltool: args.doltool,
        objdump: args.objdump,
    };

    match args.command {
        Command::Scan {
            exe,
            platform,
            base,
            catalog,
            json,
        } => commands::scan::run(
            &exe,
            platform,
            base.as_deref(),
            catalog.as_deref(),
            json.as_deref(),
            &tools,
        ),
        Command::Sections { exe, platform } => commands::sections::run(&exe, platform, &tools),
        Command::Resolve {
            exe,
            address,
            platform,
            base,
        } => commands::resolve::run(&exe, platform, &address, base.as_deref(), &tools),
        Command::Decode {
            exe,
            offset,
            platform,
            base,
        } => commands::decode::run(&exe, platform, &offset, base.as_deref(), &tools),
        Command::Symbols {
            exe,
            platform,
            patterns,
            base,
        } => commands::symbols::run(&exe, platform, patterns.as_deref(), base.as_deref(), &tools),
    }
}
