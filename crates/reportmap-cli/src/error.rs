//! CLI error handling with semantic exit codes.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed (issues may have been recorded) |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or configuration |
//! | 3 | `NotFound` | A named file or folder does not exist |
//! | 4 | `NoInput` | Bookmarks, pages and visuals were all unavailable |
//! | 5 | `Export` | The output could not be written |
//! | 6 | `Warnings` | `--strict` and at least one warning was recorded |
//!
//! # Usage
//!
//! ```bash
//! reportmap reconcile --project ./Sales.Report --capture console.log --strict
//! case $? in
//!     0) echo "clean" ;;
//!     6) echo "inspect the Diagnostics sheet" ;;
//!     *) echo "failed" ;;
//! esac
//! ```

use std::fmt;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    Usage = 2,

    /// A named file or folder does not exist (exit code 3).
    NotFound = 3,

    /// No input collection could be loaded (exit code 4).
    NoInput = 4,

    /// The workbook or its rendering could not be written (exit code 5).
    Export = 5,

    /// Warnings were recorded and `--strict` was given (exit code 6).
    Warnings = 6,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::NoInput => "no usable input",
            Self::Export => "export error",
            Self::Warnings => "warnings recorded",
        }
    }

    /// Category for an error raised by `reportmap-core`.
    #[must_use]
    pub const fn from_core(err: &reportmap_core::Error) -> Self {
        use reportmap_core::Error;
        match err {
            Error::NotFound(_) | Error::SourceUnavailable { .. } => Self::NotFound,
            Error::Config(_) => Self::Usage,
            Error::NoUsableInput => Self::NoInput,
            Error::Export(_) => Self::Export,
            Error::Io(_) => Self::Internal,
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that were not categorized where they were raised.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("not found")
            || msg_lower.contains("no such")
            || msg_lower.contains("does not exist")
        {
            return Self::NotFound;
        }

        if msg_lower.contains("no usable input") {
            return Self::NoInput;
        }

        if msg_lower.contains("invalid argument")
            || msg_lower.contains("missing required")
            || msg_lower.contains("invalid value")
            || msg_lower.contains("cannot use")
        {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// Wraps an `anyhow::Error` so context chains survive while the exit code
/// stays deterministic.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Create a not-found error.
    pub fn not_found(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::NotFound, source)
    }

    /// Create an export error.
    pub fn export(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Export, source)
    }

    /// Create the error returned by `--strict` runs with warnings.
    pub fn warnings(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Warnings, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl From<reportmap_core::Error> for CliError {
    fn from(err: reportmap_core::Error) -> Self {
        Self::new(ErrorCategory::from_core(&err), err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// Uses the category of a wrapped `CliError` or core error when present,
/// otherwise infers one from the message.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(core_err) = err.downcast_ref::<reportmap_core::Error>() {
        return ErrorCategory::from_core(core_err).exit_code();
    }
    ErrorCategory::infer_from_message(&err.to_string()).exit_code()
}
