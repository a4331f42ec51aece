//! External tool invocation and resolver construction.
//!
//! This is the tool-runner collaborator the core deliberately does not
//! contain: it spawns `doltool`/`ee-objdump` with a bounded timeout and
//! hands their raw stdout to the core parsers.

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use codecave_core::{
    AddressResolver, Error, Platform, Result, SectionTable, parse_dol_sections,
    parse_elf_sections, ps1_sections,
};
use tracing::{debug, warn};

/// External tool binaries used to list executable sections.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub doltool: String,
    pub objdump: String,
}

/// Observed upper bound for a section listing run; anything longer is hung.
const TOOL_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Build a section table for the executable.
///
/// PS1 needs no tool at all; PS2 and GameCube/Wii go through their
/// respective section-listing tools.
pub fn build_section_table(
    platform: Platform,
    exe: &Path,
    tools: &ToolPaths,
) -> Result<SectionTable> {
    match platform {
        Platform::Ps1 => {
            let file_size = std::fs::metadata(exe)?.len();
            ps1_sections(file_size)
        }
        Platform::Ps2 => {
            let output = run_tool(&tools.objdump, &[exe.as_os_str(), OsStr::new("-x")])?;
            parse_elf_sections(&output)
        }
        Platform::Gamecube | Platform::Wii => {
            let output = run_tool(&tools.doltool, &[OsStr::new("-i"), exe.as_os_str()])?;
            parse_dol_sections(&output)
        }
    }
}

/// Build the best available resolver for the executable.
///
/// An explicit base always wins: that is the legacy single-offset path and
/// it stays selectable on purpose. Otherwise the section table is tried
/// first, and recoverable failures fall back to the platform's historical
/// scalar base.
pub fn resolver_for(
    platform: Platform,
    exe: &Path,
    tools: &ToolPaths,
    base: Option<u64>,
) -> AddressResolver {
    if let Some(base) = base {
        return AddressResolver::Scalar(base);
    }

    match build_section_table(platform, exe, tools) {
        Ok(table) => AddressResolver::Sections(table),
        Err(e) if e.is_recoverable() => {
            let base = platform.fallback_base();
            warn!("No section table ({e}); falling back to scalar base {base:X}");
            AddressResolver::Scalar(base)
        }
        Err(e) => {
            warn!("No section table ({e}); addresses will be unresolved");
            AddressResolver::Unavailable
        }
    }
}

fn run_tool(tool: &str, args: &[&OsStr]) -> Result<String> {
    debug!("Running {tool} {args:?}");

    let mut child = Command::new(tool)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ToolMissing(tool.to_string()),
            _ => Error::Io(e),
        })?;

    // Drain the pipes on their own threads so a chatty tool cannot fill the
    // pipe buffer and stall while the parent is only polling.
    let stdout = child.stdout.take();
    let stdout_reader = thread::spawn(move || read_all(stdout));
    let stderr = child.stderr.take();
    let stderr_reader = thread::spawn(move || read_all(stderr));

    let deadline = Instant::now() + TOOL_TIMEOUT;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!("{tool} exceeded {TOOL_TIMEOUT:?}, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::ToolTimedOut(tool.to_string()));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(Error::ToolFailed {
            tool: tool.to_string(),
            status: status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(stdout)
}

fn read_all(pipe: Option<impl Read>) -> String {
    let mut text = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut text);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ps1_table_needs_no_tool() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 0x1000]).unwrap();

        let tools = ToolPaths {
            doltool: "unused".to_string(),
            objdump: "unused".to_string(),
        };
        let table = build_section_table(Platform::Ps1, file.path(), &tools).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.sections()[0].file_offset, 0x800);
        assert_eq!(table.sections()[0].size, 0x800);
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let result = run_tool("codecave-no-such-tool", &[]);
        assert!(matches!(result, Err(Error::ToolMissing(_))));
    }

    #[test]
    fn test_failing_tool_is_reported() {
        let result = run_tool("false", &[]);
        assert!(matches!(result, Err(Error::ToolFailed { .. })));
    }

    #[test]
    fn test_tool_stdout_is_captured() {
        let output = run_tool("echo", &[OsStr::new("hello")]).unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[test]
    fn test_explicit_base_wins() {
        let tools = ToolPaths {
            doltool: "unused".to_string(),
            objdump: "unused".to_string(),
        };
        let resolver = resolver_for(
            Platform::Ps2,
            Path::new("/nonexistent"),
            &tools,
            Some(0xFF000),
        );
        assert!(matches!(resolver, AddressResolver::Scalar(0xFF000)));
    }

    #[test]
    fn test_fallback_base_when_tool_missing() {
        let tools = ToolPaths {
            doltool: "codecave-no-such-tool".to_string(),
            objdump: "codecave-no-such-tool".to_string(),
        };
        let resolver = resolver_for(Platform::Gamecube, Path::new("/nonexistent"), &tools, None);
        assert!(matches!(resolver, AddressResolver::Scalar(0x3000)));
    }
}
