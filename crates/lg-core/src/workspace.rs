//! Workspace discovery and loading

use crate::builder::GraphBuilder;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// A directory of SQL files plus its configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Absolute workspace root
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Open a workspace directory, reading lineage.yml when present
    pub fn open(path: &Path) -> CoreResult<Self> {
        let root = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        if !root.is_dir() {
            return Err(CoreError::WorkspaceNotFound {
                path: root.display().to_string(),
            });
        }

        let config = Config::load_from_dir(&root)?;
        Ok(Self { root, config })
    }

    /// Workspace with an explicit configuration
    pub fn with_config(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }

    /// Every `.sql` file under the configured `sql_paths`, sorted, with
    /// `exclude_paths` skipped
    pub fn discover(&self) -> CoreResult<Vec<PathBuf>> {
        let excludes = self.config.exclude_paths_absolute(&self.root);
        let mut files = Vec::new();
        for dir in self.config.sql_paths_absolute(&self.root) {
            if !dir.exists() {
                log::warn!("SQL path {} does not exist", dir.display());
                continue;
            }
            if dir.is_file() {
                if is_sql_file(&dir) {
                    files.push(dir);
                }
                continue;
            }
            discover_sql_recursive(&dir, &excludes, &mut files)?;
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Path relative to the root with forward slashes (the graph's file key)
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Absolute path of a graph file key
    pub fn absolute_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Whether a path is a `.sql` file this workspace indexes
    pub fn is_indexed(&self, path: &Path) -> bool {
        if !is_sql_file(path) {
            return false;
        }
        let path = self.absolute_path(&path.to_string_lossy());
        let excluded = self
            .config
            .exclude_paths_absolute(&self.root)
            .iter()
            .any(|e| path.starts_with(e));
        !excluded
            && self
                .config
                .sql_paths_absolute(&self.root)
                .iter()
                .any(|p| path.starts_with(p))
    }

    /// A builder configured for this workspace
    pub fn builder(&self) -> GraphBuilder {
        GraphBuilder::from_config(&self.config)
    }

    /// Read one file into the builder. Unreadable files are logged and
    /// dropped from the builder.
    pub fn load_file(&self, builder: &mut GraphBuilder, path: &Path) -> bool {
        let key = self.relative_path(path);
        match std::fs::read_to_string(path) {
            Ok(sql) => builder.set_file(&key, &sql),
            Err(e) => {
                log::warn!("Failed to read '{}': {}", path.display(), e);
                builder.remove_file(&key)
            }
        }
    }

    /// Discover every file and load it into a fresh builder
    pub fn load(&self) -> CoreResult<GraphBuilder> {
        let mut builder = self.builder();
        let files = self.discover()?;
        for path in &files {
            self.load_file(&mut builder, path);
        }
        log::info!(
            "Indexed {} SQL file(s) under {}",
            builder.file_count(),
            self.root.display()
        );
        Ok(builder)
    }
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("sql"))
}

fn discover_sql_recursive(dir: &Path, excludes: &[PathBuf], files: &mut Vec<PathBuf>) -> CoreResult<()> {
    if excludes.iter().any(|e| dir.starts_with(e)) {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })? {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            discover_sql_recursive(&path, excludes, files)?;
        } else if is_sql_file(&path) && !excludes.iter().any(|e| path.starts_with(e)) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
