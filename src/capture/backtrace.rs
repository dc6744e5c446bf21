//! Call-site frames
//!
//! Frames are plain strings, most recent first. Only frames inside the
//! application's own tree count towards "has a backtrace"; vendored
//! dependencies nested under that tree are excluded.

use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};

/// Vendored subdirectory excluded by default
pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Selects the frames that belong to the application itself
#[derive(Debug, Clone)]
pub struct BacktraceFilter {
    root_prefix: String,
    vendor_prefixes: Vec<String>,
}

impl BacktraceFilter {
    /// Filter rooted at `app_root` excluding `app_root/vendor`
    pub fn new(app_root: impl AsRef<Path>) -> Self {
        Self::with_vendor_dirs(app_root, &[DEFAULT_VENDOR_DIR])
    }

    /// Filter rooted at `app_root` excluding each `app_root/<dir>`
    pub fn with_vendor_dirs<S: AsRef<str>>(app_root: impl AsRef<Path>, vendor_dirs: &[S]) -> Self {
        let root = app_root.as_ref();
        let vendor_prefixes = vendor_dirs
            .iter()
            .map(|dir| dir_prefix(&root.join(dir.as_ref())))
            .collect();
        Self {
            root_prefix: dir_prefix(root),
            vendor_prefixes,
        }
    }

    /// Filter rooted at the current working directory
    pub fn from_current_dir() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(root)
    }

    /// Whether a single frame lies in the application tree.
    ///
    /// Frames are absolute `file:line:col` locations; a path that merely
    /// contains the root further down lies outside it.
    pub fn keeps(&self, frame: &str) -> bool {
        frame.starts_with(&self.root_prefix)
            && !self
                .vendor_prefixes
                .iter()
                .any(|vendor| frame.starts_with(vendor.as_str()))
    }

    /// Frames of `backtrace` that lie in the application tree, order kept
    pub fn filter<'a>(&self, backtrace: &'a [String]) -> Vec<&'a str> {
        backtrace
            .iter()
            .map(String::as_str)
            .filter(|frame| self.keeps(frame))
            .collect()
    }
}

/// Directory prefix with exactly one trailing separator, so `/app` does
/// not match `/application`
fn dir_prefix(path: &Path) -> String {
    let mut prefix = path.to_string_lossy().trim_end_matches('/').to_string();
    prefix.push('/');
    prefix
}

/// Capture the current call stack as absolute `file:line:col` locations,
/// most recent first. Frames without source information are skipped.
pub fn capture_frames() -> Vec<String> {
    let base = std::env::current_dir().ok();
    parse_frames(&Backtrace::force_capture().to_string(), base.as_deref())
}

/// The short backtrace form prints files under the working directory as
/// `./relative` paths; those are resolved against `base`.
fn parse_frames(rendered: &str, base: Option<&Path>) -> Vec<String> {
    rendered
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("at "))
        .map(|location| absolute_location(location.trim(), base))
        .collect()
}

fn absolute_location(location: &str, base: Option<&Path>) -> String {
    match base {
        Some(base) if !location.starts_with('/') => {
            let relative = location.strip_prefix("./").unwrap_or(location);
            format!("{}{}", dir_prefix(base), relative)
        }
        _ => location.to_string(),
    }
}
