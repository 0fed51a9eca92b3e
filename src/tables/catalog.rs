use crate::error::{PlotrunError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects plot-table database files whose names match the
/// given pattern, as sorted absolute paths.
pub fn scan_plot_dbs(input_dir: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    let input_dir = input_dir
        .canonicalize()
        .map_err(|_| PlotrunError::InvalidInputDir {
            path: input_dir.display().to_string(),
        })?;

    if !input_dir.is_dir() {
        return Err(PlotrunError::InvalidInputDir {
            path: input_dir.display().to_string(),
        });
    }

    let mut matched: Vec<PathBuf> = WalkDir::new(&input_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.is_match(name))
        })
        .map(|entry| entry.into_path())
        .collect();

    matched.sort();
    Ok(matched)
}

/// Writes one absolute path per line, creating parent directories as needed.
pub fn write_list_file(paths: &[PathBuf], output_list: &Path) -> Result<()> {
    if let Some(parent) = output_list.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut content = String::new();
    for path in paths {
        content.push_str(&path.display().to_string());
        content.push('\n');
    }
    std::fs::write(output_list, content)?;
    Ok(())
}

/// Reads a list file: one absolute SQLite path per line, blank lines
/// skipped. Every entry must be absolute and must exist; an empty list is
/// an error.
pub fn read_list_file(list_file: &Path) -> Result<Vec<PathBuf>> {
    if !list_file.exists() {
        return Err(PlotrunError::Config {
            message: format!("Input list file does not exist: {}", list_file.display()),
        });
    }

    let content = std::fs::read_to_string(list_file)?;
    let mut paths = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let path = PathBuf::from(line);
        if !path.is_absolute() {
            return Err(PlotrunError::InvalidListEntry {
                line: line.to_string(),
                reason: "expected an absolute path".to_string(),
            });
        }
        if !path.exists() {
            return Err(PlotrunError::InvalidListEntry {
                line: line.to_string(),
                reason: "file does not exist".to_string(),
            });
        }
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(PlotrunError::EmptyList {
            path: list_file.display().to_string(),
        });
    }

    Ok(paths)
}
