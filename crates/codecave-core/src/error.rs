use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not parse section listing: {0}")]
    SectionParse(String),

    #[error("Section listing contained no usable sections")]
    EmptySectionTable,

    #[error("Pattern must begin with a literal byte segment")]
    PatternNeedsAnchor,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Opcode {0:#010X} is not a jal instruction")]
    NotAJalInstruction(u32),

    #[error("External tool not found: {0}")]
    ToolMissing(String),

    #[error("External tool {tool} exited with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error("External tool timed out: {0}")]
    ToolTimedOut(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check whether the caller may fall back to scalar-offset resolution.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::SectionParse(_)
                | Error::EmptySectionTable
                | Error::ToolMissing(_)
                | Error::ToolFailed { .. }
                | Error::ToolTimedOut(_)
        )
    }
}
