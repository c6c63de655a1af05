//! Error types and handling for reportmap-core operations.
//!
//! Most data-quality problems are *not* errors: malformed entries, duplicate
//! identifiers and unmatched references are recorded as issues in
//! [`Diagnostics`](crate::Diagnostics) and the run continues. The [`Error`]
//! type covers the failures that stop a stage outright.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: reading definition folders and capture logs
//! - **Source Errors**: a whole input collection is unavailable
//! - **Configuration Errors**: invalid settings or config files
//! - **Export Errors**: the consolidated workbook cannot be produced
//!
//! ```rust
//! use reportmap_core::Error;
//!
//! let err = Error::NoUsableInput;
//! assert_eq!(err.category(), "no_input");
//! assert!(err.is_fatal());
//! ```

use thiserror::Error;

/// The main error type for reportmap-core operations.
///
/// All fallible public functions return `Result<T, Error>`. Errors keep their
/// source chain so callers can render the full context.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading definition files, walking project folders and opening
    /// capture logs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A requested path or resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entire input collection could not be obtained.
    ///
    /// Non-fatal on its own: the pipeline records it and produces an empty
    /// table for that source.
    #[error("Source unavailable ({source_name}): {reason}")]
    SourceUnavailable {
        /// Which collection was unavailable (`bookmarks`, `pages`, `visuals`).
        source_name: String,
        /// Why it could not be loaded.
        reason: String,
    },

    /// None of the three sources could be obtained.
    ///
    /// The only condition that aborts a reconciliation run.
    #[error("No usable input: bookmarks, pages and visuals are all unavailable")]
    NoUsableInput,

    /// The enriched tables could not be exported.
    #[error("Export error: {0}")]
    Export(String),
}

impl Error {
    /// Whether this error aborts a whole run.
    ///
    /// Everything except [`Error::NoUsableInput`] is recovered somewhere in the
    /// pipeline (a source becomes unavailable, an entry is dropped).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NoUsableInput)
    }

    /// Get the error category as a string identifier.
    ///
    /// - `"io"` - File system and I/O operations
    /// - `"config"` - Configuration and settings
    /// - `"not_found"` - Missing paths or resources
    /// - `"source_unavailable"` - One input collection missing
    /// - `"no_input"` - All input collections missing
    /// - `"export"` - Output assembly
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::NoUsableInput => "no_input",
            Self::Export(_) => "export",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        // Given: Different error variants
        let errors = vec![
            Error::Config("missing field".to_string()),
            Error::NotFound("definition/pages".to_string()),
            Error::Export("sheet name too long".to_string()),
        ];

        for error in errors {
            // When: Converting to string
            let error_string = error.to_string();

            // Then: Should contain descriptive information
            assert!(!error_string.is_empty());
            match error {
                Error::Config(msg) => {
                    assert!(error_string.contains("Configuration error"));
                    assert!(error_string.contains(&msg));
                },
                Error::NotFound(msg) => {
                    assert!(error_string.contains("Not found"));
                    assert!(error_string.contains(&msg));
                },
                Error::Export(msg) => {
                    assert!(error_string.contains("Export error"));
                    assert!(error_string.contains(&msg));
                },
                _ => {},
            }
        }
    }

    #[test]
    fn test_source_unavailable_names_the_source() {
        let err = Error::SourceUnavailable {
            source_name: "visuals".to_string(),
            reason: "capture log missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("visuals"));
        assert!(msg.contains("capture log missing"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_from_io_error() {
        let error: Error = io::Error::new(io::ErrorKind::NotFound, "file not found").into();
        match error {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_error_categories() {
        let error_categories = vec![
            (Error::Io(io::Error::other("test")), "io"),
            (Error::Config("test".to_string()), "config"),
            (Error::NotFound("test".to_string()), "not_found"),
            (
                Error::SourceUnavailable {
                    source_name: "pages".to_string(),
                    reason: "test".to_string(),
                },
                "source_unavailable",
            ),
            (Error::NoUsableInput, "no_input"),
            (Error::Export("test".to_string()), "export"),
        ];

        for (error, expected_category) in error_categories {
            assert_eq!(error.category(), expected_category);
        }
    }

    #[test]
    fn test_only_no_usable_input_is_fatal() {
        assert!(Error::NoUsableInput.is_fatal());
        assert!(!Error::Config("x".to_string()).is_fatal());
        assert!(!Error::Io(io::Error::other("x")).is_fatal());
    }

    proptest! {
        #[test]
        fn test_not_found_display_keeps_path(path in "[a-zA-Z0-9 ./]{1,40}") {
            let err = Error::NotFound(path.clone());
            prop_assert_eq!(err.to_string(), format!("Not found: {path}"));
        }
    }
}
