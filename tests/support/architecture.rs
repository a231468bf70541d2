//! Source scanning helpers for layering contracts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One offending source line.
pub struct Hit {
    pub file: String,
    pub line: usize,
    pub text: String,
}

impl fmt::Debug for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text.trim())
    }
}

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn relative_path(path: &Path) -> String {
    path.strip_prefix(root())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("failed to read dir {}: {e}", dir.display()));

    for entry in entries {
        let path = entry
            .unwrap_or_else(|e| panic!("failed to read dir entry: {e}"))
            .path();
        if path.is_dir() {
            collect(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
}

/// Every `.rs` file under `relative_dir`, sorted.
pub fn rust_files(relative_dir: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let target = root().join(relative_dir);
    if target.is_file() {
        files.push(target);
        return files;
    }
    collect(&target, &mut files);
    files.sort();
    files
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

/// Code lines (comments skipped) under `relative_dir` containing any pattern.
pub fn code_lines_containing(relative_dir: &str, patterns: &[&str]) -> Vec<Hit> {
    let mut hits = Vec::new();
    for file in rust_files(relative_dir) {
        for (idx, text) in read(&file).lines().enumerate() {
            if text.trim_start().starts_with("//") {
                continue;
            }
            if patterns.iter().any(|p| text.contains(p)) {
                hits.push(Hit {
                    file: relative_path(&file),
                    line: idx + 1,
                    text: text.to_string(),
                });
            }
        }
    }
    hits
}

pub fn path_exists(relative_path: &str) -> bool {
    root().join(relative_path).exists()
}

/// Lines in `mod.rs` files that do more than declare modules.
pub fn non_export_lines_in_mod_files(relative_dir: &str) -> Vec<Hit> {
    let mut hits = Vec::new();
    for file in rust_files(relative_dir) {
        if file.file_name().and_then(|s| s.to_str()) != Some("mod.rs") {
            continue;
        }
        for (idx, raw) in read(&file).lines().enumerate() {
            let line = raw.trim();
            let allowed = line.is_empty()
                || line.starts_with("//")
                || line.starts_with("pub mod ")
                || line.starts_with("mod ")
                || line.starts_with("#[cfg");
            if !allowed {
                hits.push(Hit {
                    file: relative_path(&file),
                    line: idx + 1,
                    text: raw.to_string(),
                });
            }
        }
    }
    hits
}
