//! Suite file discovery

use crate::config::CollectionConfig;
use crate::error::CliError;
use probe_executor::SuiteSource;
use std::path::{Path, PathBuf};

/// Suite files of a collection, sorted by path and windowed by `start`/`limit`
pub fn discover(collection: &CollectionConfig) -> Result<Vec<SuiteSource>, CliError> {
    let mut files = Vec::new();
    if collection.path.is_file() {
        files.push(collection.path.clone());
    } else {
        walk(&collection.path, collection.recursive, &mut files)?;
    }
    files.sort();

    let window = files
        .into_iter()
        .skip(collection.start)
        .take(collection.limit.unwrap_or(usize::MAX));
    Ok(window
        .map(|path| SuiteSource {
            path,
            kind: collection.kind,
        })
        .collect())
}

fn walk(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<(), CliError> {
    let io_err = |source| CliError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            if recursive {
                walk(&path, recursive, files)?;
            }
        } else if path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    Ok(())
}
