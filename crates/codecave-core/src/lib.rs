//! # codecave-core
//!
//! Core library for the codecave injection toolkit.
//!
//! This crate provides:
//! - Section-table construction from doltool / ee-objdump output
//! - Memory address ⇄ file offset resolution, with a legacy scalar fallback
//! - Wildcard-tolerant byte-signature scanning for hookable call sites
//! - Library-symbol sweeps and MIPS `jal` call-target decoding
//!
//! Everything here is pure computation over in-memory buffers and
//! already-fetched tool text. Spawning the external tools and loading
//! executable bytes belong to the caller (see the `codecave` CLI).

pub mod addr;
pub mod error;
pub mod mips;
pub mod pattern;
pub mod platform;
pub mod scanner;
pub mod section;

pub use error::{Error, Result};
pub use pattern::{
    FlexiblePattern, Pattern, PatternCatalog, PatternCatalogFile, PatternEntry, PatternSegment,
    builtin_catalog, format_pattern, load_catalog, parse_pattern, save_catalog,
};
pub use platform::Platform;
pub use scanner::{
    DEFAULT_SKIP_LABELS, HookScanner, MatchSummary, PatternMatch, ScanReport, SymbolHit,
    SymbolPattern, SymbolSummary, load_symbol_patterns, osreport_pattern,
};
pub use section::{
    AddressResolver, PS1_HEADER_SIZE, Section, SectionKind, SectionTable, parse_dol_sections,
    parse_elf_sections, ps1_sections,
};
