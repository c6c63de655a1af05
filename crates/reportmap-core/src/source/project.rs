//! Locating definition folders inside a PBIP project and walking them.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::bookmarks::BookmarkFolder;
use super::pages::PageFolder;
use super::{BookmarkSource, PageSource, Unavailable};
use crate::config::ScanConfig;
use crate::{Error, Result};

/// Definition folders found under a report project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportProject {
    /// Folder the search started from.
    pub root: PathBuf,
    /// The `definition` folder, when one was found.
    pub definition: Option<PathBuf>,
    /// `definition/bookmarks`, when present.
    pub bookmarks_dir: Option<PathBuf>,
    /// `definition/pages`, when present.
    pub pages_dir: Option<PathBuf>,
}

impl ReportProject {
    /// Find the definition folder of the report at or below `root`.
    ///
    /// Accepts the `definition` folder itself, a `*.Report` folder, or a PBIP
    /// root containing one or more `*.Report` folders (the first in sorted
    /// order wins).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when `root` does not exist or is not a
    /// directory.
    pub fn discover(root: &Path, scan: &ScanConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "report folder {}",
                root.display()
            )));
        }

        let definition = definition_candidates(root, scan)?
            .into_iter()
            .find(|candidate| has_definition_content(candidate));

        let bookmarks_dir = definition
            .as_ref()
            .map(|def| def.join("bookmarks"))
            .filter(|dir| dir.is_dir());
        let pages_dir = definition
            .as_ref()
            .map(|def| def.join("pages"))
            .filter(|dir| dir.is_dir());

        debug!(
            root = %root.display(),
            definition = ?definition,
            bookmarks = bookmarks_dir.is_some(),
            pages = pages_dir.is_some(),
            "discovered report project"
        );

        Ok(Self {
            root: root.to_path_buf(),
            definition,
            bookmarks_dir,
            pages_dir,
        })
    }

    /// Bookmark source for this project; unavailable when the folder is missing.
    pub fn bookmark_source(&self, scan: &ScanConfig) -> Box<dyn BookmarkSource> {
        match &self.bookmarks_dir {
            Some(dir) => Box::new(BookmarkFolder::new(dir, scan.clone())),
            None => Box::new(Unavailable::new(
                "bookmarks",
                format!("no definition/bookmarks folder under {}", self.root.display()),
            )),
        }
    }

    /// Page source for this project; unavailable when the folder is missing.
    pub fn page_source(&self, scan: &ScanConfig) -> Box<dyn PageSource> {
        match &self.pages_dir {
            Some(dir) => Box::new(PageFolder::new(dir, scan.clone())),
            None => Box::new(Unavailable::new(
                "pages",
                format!("no definition/pages folder under {}", self.root.display()),
            )),
        }
    }
}

fn has_definition_content(dir: &Path) -> bool {
    dir.join("pages").is_dir() || dir.join("bookmarks").is_dir()
}

fn definition_candidates(root: &Path, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    let mut candidates = vec![root.to_path_buf(), root.join("definition")];
    for dir in sorted_subdirs(root, scan)? {
        let is_report = dir
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".Report"));
        if is_report {
            candidates.push(dir.join("definition"));
        }
    }
    Ok(candidates)
}

/// Immediate sub-directories of `dir` in sorted order, minus ignored names.
pub(crate) fn sorted_subdirs(dir: &Path, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        if is_ignored(&path, scan) {
            continue;
        }
        dirs.push(path);
    }
    dirs.sort();
    Ok(dirs)
}

/// Every file below `root` accepted by `keep`, in sorted path order.
pub(crate) fn collect_files(
    root: &Path,
    scan: &ScanConfig,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if !is_ignored(&path, scan) {
                    stack.push(path);
                }
                continue;
            }
            if file_type.is_file() && keep(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_ignored(path: &Path, scan: &ScanConfig) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| scan.is_ignored(name))
}

/// `true` for `*.json` files (case-insensitive extension).
pub(crate) fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Read and parse one definition file, enforcing the size cap. The error is a
/// human-readable reason suitable for a `MalformedRecord` issue.
pub(crate) fn read_json(path: &Path, scan: &ScanConfig) -> std::result::Result<Value, String> {
    let meta = std::fs::metadata(path)
        .map_err(|e| format!("failed to read metadata: {e}"))?;
    if meta.len() > scan.max_file_bytes {
        return Err(format!(
            "file too large to read ({} bytes > {} bytes cap)",
            meta.len(),
            scan.max_file_bytes
        ));
    }
    let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read as UTF-8 text: {e}"))?;
    serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| format!("invalid JSON: {e}"))
}
