//! Resource copying: place referenced images and stylesheets next to
//! generated output.
//!
//! References come from scanning generated HTML (CSS `<link>`s and
//! `<img>`s) or are supplied directly (EPUB manifest items). Relative
//! references are copied from the source document's directory into the
//! destination; when not found there, the configured resource directories
//! are searched recursively by file name. Missing resources are reported
//! but never abort the run.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::error::Result;
use crate::scan;
use crate::shell::Shell;

/// Outcome of a [`copy_resources`] pass.
#[derive(Debug, Default)]
pub struct CopyReport {
    /// Destination paths written during this pass.
    pub copied: Vec<PathBuf>,
    /// Missing-resource messages, already logged at warn level.
    pub warnings: Vec<String>,
}

/// Search `html_files` for image and CSS stylesheet URIs and copy the
/// referenced files from `src_dir` to `dst_dir`.
///
/// `extra` supplies additional references that are not discovered by
/// scanning (for example EPUB manifest entries). Absolute references are
/// verified but never copied. A relative reference missing from `src_dir`
/// is looked up recursively in each of `resource_dirs` by file name, first
/// match wins. A destination file whose content already matches its source
/// is left untouched, so a repeated pass performs no file operations.
pub fn copy_resources(
    html_files: &[PathBuf],
    src_dir: &Path,
    dst_dir: &Path,
    extra: &[String],
    resource_dirs: &[PathBuf],
    shell: &Shell,
) -> Result<CopyReport> {
    let mut references: BTreeSet<String> = extra.iter().cloned().collect();
    references.extend(scan::find_resources_with(
        html_files,
        "link",
        "href",
        |attrs| attrs.get("type").is_some_and(|t| t == "text/css"),
    )?);
    references.extend(scan::find_resources(html_files, "img", "src")?);

    let mut report = CopyReport::default();
    for reference in &references {
        let path = normalize(Path::new(reference));
        if path.is_absolute() {
            // Assumed already in place; just check it.
            if !path.is_file() {
                missing(&mut report, &path);
            }
            continue;
        }

        let dst = dst_dir.join(&path);
        let mut src = src_dir.join(&path);
        if !src.is_file() {
            let Some(basename) = path.file_name() else {
                missing(&mut report, &path);
                continue;
            };
            match resource_dirs.iter().find_map(|d| find_file(d, basename)) {
                Some(found) => src = found,
                None if dst.is_file() => continue, // already satisfied
                None => {
                    missing(&mut report, &path);
                    continue;
                }
            }
        }

        if normalize(&src) == normalize(&dst) {
            continue;
        }
        if dst.is_file() && same_contents(&src, &dst)? {
            continue;
        }
        if let Some(parent) = dst.parent() {
            shell.makedirs(parent)?;
        }
        shell.copy(&src, &dst)?;
        report.copied.push(dst);
    }
    Ok(report)
}

fn missing(report: &mut CopyReport, path: &Path) {
    let message = format!("missing resource: {}", path.display());
    warn!("{message}");
    report.warnings.push(message);
}

/// First file under `dir` (recursively, in directory-walk order) whose
/// name equals `basename`.
fn find_file(dir: &Path, basename: &OsStr) -> Option<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == basename)
        .map(|e| e.into_path())
}

fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a)?, fs::metadata(b)?);
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

/// Lexical path normalization: drops `.` components and resolves `..`
/// against preceding components where possible.
fn normalize(path: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::RootDir) => {}
                Some(Component::ParentDir) | None => stack.push(component),
                Some(_) => {
                    stack.pop();
                }
            },
            _ => stack.push(component),
        }
    }
    stack.iter().collect()
}
