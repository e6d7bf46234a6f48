use std::path::{Path, PathBuf};

use crate::error::LoaderError;
use crate::script::{parse_script, MigrationScript};

/// Ordered, immutable catalog of migration definitions discovered from the
/// source directory. Names are always iterated in ascending lexicographic
/// order; that order is the only ordering authority for "next" and "last".
#[derive(Debug, Clone)]
pub struct Registry {
    dir: PathBuf,
    names: Vec<String>,
}

impl Registry {
    /// Discover migration files in `dir`. Only regular `.sql` files count;
    /// directories, dotfiles, and anything else are ignored.
    pub fn discover(dir: &Path) -> Result<Self, LoaderError> {
        let entries = std::fs::read_dir(dir).map_err(|source| LoaderError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoaderError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(".sql") {
                continue;
            }
            names.push(name.to_string());
        }

        names.sort();

        Ok(Registry {
            dir: dir.to_path_buf(),
            names,
        })
    }

    /// All migration names in ascending order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        // names are sorted, discovery is the only writer
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// Lexicographically last migration name, if any.
    pub fn last(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Read and parse one migration file by name.
    pub fn load(&self, name: &str) -> Result<MigrationScript, LoaderError> {
        if !self.contains(name) {
            return Err(LoaderError::NotFound(name.to_string()));
        }

        let path = self.dir.join(name);
        let content = std::fs::read_to_string(&path).map_err(|source| LoaderError::ReadFile {
            path,
            source,
        })?;

        parse_script(name, &content)
    }
}
