//! Named pattern catalogs, one per platform.
//!
//! Catalogs are either compiled in (see [`crate::pattern::builtin`]) or
//! loaded from a JSON file in which each pattern is written in the textual
//! form `"AA BB ?? ?? CC"`: whitespace-separated tokens, each a two-digit hex
//! byte or a `??` wildcard. Consecutive wildcards compile into a single gap.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pattern::{FlexiblePattern, PatternSegment};
use crate::platform::Platform;

/// A named, hookable byte signature.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub description: String,
    /// Offset of the hookable instruction relative to the match start.
    /// Negative means the hook point precedes the anchor (for example a
    /// function prologue found from its tail).
    pub hook_offset: i64,
    /// Injection stub fed to the downstream patch planner.
    pub asm_template: String,
    /// Name of the function the hook displaces, when the hook site is a call
    /// whose target is worth recovering as a symbol.
    pub original_function: Option<String>,
    matcher: FlexiblePattern,
}

impl Pattern {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        hook_offset: i64,
        asm_template: impl Into<String>,
        segments: Vec<PatternSegment>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            description: description.into(),
            hook_offset,
            asm_template: asm_template.into(),
            original_function: None,
            matcher: FlexiblePattern::new(segments)?,
        })
    }

    pub fn with_original_function(mut self, function: impl Into<String>) -> Self {
        self.original_function = Some(function.into());
        self
    }

    pub fn matcher(&self) -> &FlexiblePattern {
        &self.matcher
    }
}

/// The full set of named patterns for one platform.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    platform: Platform,
    patterns: Vec<Pattern>,
}

impl PatternCatalog {
    pub fn new(platform: Platform, patterns: Vec<Pattern>) -> Self {
        Self { platform, patterns }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Parse the textual pattern form into segments.
pub fn parse_pattern(text: &str) -> Result<Vec<PatternSegment>> {
    let mut segments: Vec<PatternSegment> = Vec::new();

    for token in text.split_whitespace() {
        if token == "??" || token == "?" {
            match segments.last_mut() {
                Some(PatternSegment::Skip(count)) => *count += 1,
                _ => segments.push(PatternSegment::Skip(1)),
            }
            continue;
        }

        let value = u8::from_str_radix(token, 16)
            .map_err(|e| Error::InvalidPattern(format!("bad token '{token}': {e}")))?;
        match segments.last_mut() {
            Some(PatternSegment::Bytes(bytes)) => bytes.push(value),
            _ => segments.push(PatternSegment::Bytes(vec![value])),
        }
    }

    if segments.is_empty() {
        return Err(Error::InvalidPattern("pattern is empty".to_string()));
    }

    Ok(segments)
}

/// Render segments back into the textual pattern form.
pub fn format_pattern(segments: &[PatternSegment]) -> String {
    let mut tokens = Vec::new();
    for segment in segments {
        match segment {
            PatternSegment::Bytes(bytes) => {
                tokens.extend(bytes.iter().map(|b| format!("{b:02X}")));
            }
            PatternSegment::Skip(count) => {
                tokens.extend(std::iter::repeat_n("??".to_string(), *count as usize));
            }
        }
    }
    tokens.join(" ")
}

/// On-disk form of one catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub pattern: String,
    pub hook_offset: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asm_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_function: Option<String>,
}

impl PatternEntry {
    pub fn compile(&self) -> Result<Pattern> {
        let mut pattern = Pattern::new(
            &self.name,
            &self.description,
            self.hook_offset,
            &self.asm_template,
            parse_pattern(&self.pattern)?,
        )?;
        pattern.original_function = self.original_function.clone();
        Ok(pattern)
    }
}

impl From<&Pattern> for PatternEntry {
    fn from(pattern: &Pattern) -> Self {
        Self {
            name: pattern.name.clone(),
            pattern: format_pattern(pattern.matcher().segments()),
            hook_offset: pattern.hook_offset,
            description: pattern.description.clone(),
            asm_template: pattern.asm_template.clone(),
            original_function: pattern.original_function.clone(),
        }
    }
}

/// On-disk form of a whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternCatalogFile {
    pub platform: Platform,
    pub entries: Vec<PatternEntry>,
}

/// Load a pattern catalog from a JSON file.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<PatternCatalog> {
    let content = fs::read_to_string(&path)?;
    let file: PatternCatalogFile = serde_json::from_str(&content)?;
    let patterns = file
        .entries
        .iter()
        .map(PatternEntry::compile)
        .collect::<Result<Vec<_>>>()?;
    Ok(PatternCatalog::new(file.platform, patterns))
}

/// Save a pattern catalog to a JSON file.
pub fn save_catalog<P: AsRef<Path>>(path: P, catalog: &PatternCatalog) -> Result<()> {
    let file = PatternCatalogFile {
        platform: catalog.platform(),
        entries: catalog.patterns().iter().map(PatternEntry::from).collect(),
    };
    let content = serde_json::to_string_pretty(&file)?;
    fs::write(path, content)?;
    Ok(())
}
